mod ui;

use std::{
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use whack::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    grid::{HoleId, RandomHoleSelector},
    preferences::{Preferences, Theme},
    records::RecordKeeper,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    scheduler::{Scheduler, SystemClock},
    store::{KeyValueStore, MemoryStore, SqliteStore},
    Difficulty, Phase, SessionEngine, SessionEvent, SessionSummary,
};

/// Holes in row-major order, laid out like the left hand on a qwerty board.
pub const HOLE_KEYS: [char; 9] = ['q', 'w', 'e', 'a', 's', 'd', 'z', 'x', 'c'];

const FLASH_MS: u64 = 250;

/// whac-a-mole in your terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Moles pop up in a 3x3 grid of holes; whack them with q/w/e, a/s/d, z/x/c before they duck back down. Best scores are kept per difficulty."
)]
pub struct Cli {
    /// difficulty to start with (defaults to the last one played)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// prefix for persisted keys
    #[clap(long)]
    namespace: Option<String>,

    /// path of the high score database
    #[clap(long)]
    db_path: Option<PathBuf>,

    /// path of the JSON config file
    #[clap(long)]
    config: Option<PathBuf>,

    /// path of the log file
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// redraw interval in milliseconds
    #[clap(long)]
    tick_rate_ms: Option<u64>,

    /// seed for the mole placement, for reproducible games
    #[clap(long)]
    seed: Option<u64>,

    /// print the best score of every difficulty and exit
    #[clap(long)]
    scores: bool,

    /// clear the best score of a difficulty and exit
    #[clap(long, value_enum, value_name = "DIFFICULTY")]
    reset_high_score: Option<Difficulty>,
}

impl Cli {
    /// CLI flags win over the config file.
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(db_path) = &self.db_path {
            config.db_path = Some(db_path.clone());
        }
        if let Some(tick_rate_ms) = self.tick_rate_ms {
            config.tick_rate_ms = tick_rate_ms;
        }
        config
    }
}

type Store = Box<dyn KeyValueStore>;

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Board,
    GameOver(SessionSummary),
    ConfirmReset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlashKind {
    Hit,
    Miss,
}

/// Short-lived highlight on a hole after it was whacked
#[derive(Debug, Clone, Copy)]
pub struct Flash {
    pub hole: HoleId,
    pub kind: FlashKind,
    pub until: Instant,
}

pub struct App {
    pub engine: SessionEngine<SystemClock, Store>,
    pub prefs: Preferences<Store>,
    pub theme: Theme,
    pub state: AppState,
    pub flash: Option<Flash>,
}

impl App {
    pub fn new(engine: SessionEngine<SystemClock, Store>, prefs: Preferences<Store>) -> Self {
        let theme = prefs.load_theme();
        Self {
            engine,
            prefs,
            theme,
            state: AppState::Board,
            flash: None,
        }
    }

    pub fn on_tick(&mut self) {
        self.engine.pump();
        self.absorb_events();
        if self.flash.is_some_and(|f| f.until <= Instant::now()) {
            self.flash = None;
        }
    }

    fn absorb_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                SessionEvent::MoleHit { hole, .. } => self.flash_hole(hole, FlashKind::Hit),
                SessionEvent::Missed { hole } => self.flash_hole(hole, FlashKind::Miss),
                SessionEvent::Ended(summary) => {
                    self.flash = None;
                    self.state = AppState::GameOver(summary);
                }
                SessionEvent::MoleShown { .. }
                | SessionEvent::MoleRetracted { .. }
                | SessionEvent::ClockTick { .. } => {}
            }
        }
    }

    fn flash_hole(&mut self, hole: HoleId, kind: FlashKind) {
        self.flash = Some(Flash {
            hole,
            kind,
            until: Instant::now() + Duration::from_millis(FLASH_MS),
        });
    }

    /// Returns true when the app should quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        // timers that came due since the last tick fire before the key is judged
        self.engine.pump();

        match self.state.clone() {
            AppState::GameOver(_) => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => {
                    self.state = AppState::Board;
                    self.engine.start();
                }
                KeyCode::Esc => {
                    self.state = AppState::Board;
                    self.engine.new_game();
                }
                _ => {}
            },
            AppState::ConfirmReset => {
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    self.engine.reset_best_score();
                    info!(difficulty = %self.engine.difficulty(), "high score reset");
                }
                self.state = AppState::Board;
            }
            AppState::Board => return self.on_board_key(key),
        }
        self.absorb_events();
        false
    }

    fn on_board_key(&mut self, key: KeyEvent) -> bool {
        let in_progress = self.engine.state().in_progress();
        match key.code {
            KeyCode::Esc if in_progress => self.engine.new_game(),
            KeyCode::Esc => return true,
            KeyCode::Char(' ') => {
                if self.engine.phase() == Phase::Running {
                    self.engine.pause();
                } else {
                    self.engine.start();
                }
            }
            KeyCode::Char(c @ '1'..='3') => {
                let difficulty = Difficulty::ALL[usize::from(c as u8 - b'1')];
                if self.engine.select_difficulty(difficulty) {
                    self.prefs.save_difficulty(difficulty);
                }
            }
            KeyCode::Char('n') if !in_progress => self.engine.new_game(),
            KeyCode::Char('r') if !in_progress => self.state = AppState::ConfirmReset,
            KeyCode::Char('t') => {
                self.theme = self.theme.toggled();
                self.prefs.save_theme(self.theme);
            }
            KeyCode::Char(c) => {
                if let Some(hole) = HOLE_KEYS.iter().position(|k| *k == c.to_ascii_lowercase()) {
                    self.engine.on_hole_activated(hole);
                }
            }
            _ => {}
        }
        self.absorb_events();
        false
    }
}

fn open_store(config: &Config) -> Store {
    let path = config.db_path.clone().or_else(AppDirs::db_path);
    match path {
        Some(path) => match SqliteStore::open(&path) {
            Ok(store) => Box::new(store),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "high scores will not be saved");
                Box::new(MemoryStore::new())
            }
        },
        None => Box::new(MemoryStore::new()),
    }
}

fn init_logging(cli: &Cli, config: &Config) {
    let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) else {
        eprintln!("whack: no log directory found, logging disabled");
        return;
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("whack: cannot create {}: {e}", parent.display());
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("whack: logging disabled, cannot open {}: {e}", path.display());
            return;
        }
    };
    let filter = EnvFilter::try_from_env("WHACK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
    {
        eprintln!("whack: logging disabled: {e}");
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = cli.apply_to(config_store.load());
    init_logging(&cli, &config);

    let mut records = RecordKeeper::with_namespace(open_store(&config), config.namespace.clone());

    if let Some(difficulty) = cli.reset_high_score {
        records.clear(difficulty);
        println!("{difficulty} high score cleared");
        return Ok(());
    }
    if cli.scores {
        for (difficulty, best) in records.all() {
            println!("{difficulty}\t{best}");
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let prefs = Preferences::with_namespace(open_store(&config), config.namespace.clone());
    let difficulty = cli.difficulty.unwrap_or_else(|| prefs.load_difficulty());
    let selector = match cli.seed {
        Some(seed) => RandomHoleSelector::seeded(seed),
        None => RandomHoleSelector::new(),
    };
    let engine = SessionEngine::new(difficulty, Scheduler::new(SystemClock::new()), records)
        .with_selector(Box::new(selector));
    let mut app = App::new(engine, prefs);

    enable_raw_mode().context("enabling raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, Duration::from_millis(config.tick_rate_ms.max(1)));

    // an abandoned game still counts towards the high score
    app.engine.new_game();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: Duration,
) -> anyhow::Result<()> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick_rate));

    terminal.draw(|f| ui(app, f))?;
    loop {
        match runner.step() {
            GameEvent::Tick => app.on_tick(),
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if app.on_key(key) {
                    break;
                }
            }
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
