use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap},
};

use whack::{preferences::Theme, Difficulty, Phase};

use crate::{App, AppState, FlashKind, HOLE_KEYS};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const HOLE_HEIGHT: u16 = 5;
const HOLE_WIDTH: u16 = 13;

const MOLE: &str = "(•ᴥ•)";
const EMPTY_HOLE: &str = "·";

/// Colors for one theme
struct Palette {
    text: Color,
    dim: Color,
    accent: Color,
    mole: Color,
    hit: Color,
    miss: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                text: Color::White,
                dim: Color::DarkGray,
                accent: Color::Cyan,
                mole: Color::Rgb(205, 133, 63),
                hit: Color::Green,
                miss: Color::Red,
            },
            Theme::Light => Self {
                text: Color::Black,
                dim: Color::Gray,
                accent: Color::Blue,
                mole: Color::Rgb(139, 69, 19),
                hit: Color::Rgb(0, 128, 0),
                miss: Color::Rgb(178, 34, 34),
            },
        }
    }
}

fn difficulty_color(difficulty: Difficulty) -> Color {
    match difficulty {
        Difficulty::Easy => Color::Green,
        Difficulty::Medium => Color::Yellow,
        Difficulty::Hard => Color::Red,
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = Palette::for_theme(self.theme);
        let snapshot = self.engine.snapshot();
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let columns = grid_columns(snapshot.hole_count);
        let rows = snapshot.hole_count.div_ceil(columns) as u16;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),                 // title
                Constraint::Length(1),                 // score line
                Constraint::Length(1),                 // padding
                Constraint::Length(rows * HOLE_HEIGHT), // board
                Constraint::Length(1),                 // status
                Constraint::Min(0),
                Constraint::Length(2), // help
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("whac-a-mole", bold.fg(palette.accent)),
            Span::styled("  ·  ", Style::default().fg(palette.dim)),
            Span::styled(
                format!("{} Mode", snapshot.difficulty),
                bold.fg(difficulty_color(snapshot.difficulty)),
            ),
        ]);
        Paragraph::new(title)
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let timer_style = if snapshot.phase == Phase::Running && snapshot.time_remaining_secs <= 5 {
            bold.fg(palette.miss)
        } else {
            bold.fg(palette.text)
        };
        let scores = Line::from(vec![
            Span::styled("score ", Style::default().fg(palette.dim)),
            Span::styled(snapshot.score.to_string(), bold.fg(palette.text)),
            Span::styled("   best ", Style::default().fg(palette.dim)),
            Span::styled(snapshot.best_score.to_string(), bold.fg(palette.accent)),
            Span::styled("   time ", Style::default().fg(palette.dim)),
            Span::styled(format!("{}s", snapshot.time_remaining_secs), timer_style),
        ]);
        Paragraph::new(scores)
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        render_board(self, &palette, columns, chunks[3], buf);

        let status = match (&self.state, snapshot.phase) {
            (AppState::ConfirmReset, _) => String::new(),
            (_, Phase::Idle) => "press space to start".to_string(),
            (_, Phase::Running) => String::new(),
            (_, Phase::Paused) => "PAUSED - press space to resume".to_string(),
            (_, Phase::Ended) => "time's up".to_string(),
        };
        Paragraph::new(Span::styled(
            status,
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

        let help = if self.engine.state().in_progress() {
            "q w e / a s d / z x c whack · space pause/resume · esc abandon · t theme"
        } else {
            "space start · 1/2/3 difficulty · n new game · r reset best · t theme · esc quit"
        };
        Paragraph::new(Span::styled(help, Style::default().fg(palette.dim)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[6], buf);

        match &self.state {
            AppState::GameOver(summary) => {
                let mut lines = vec![
                    Line::from(Span::styled("Game Over", bold.fg(palette.accent))),
                    Line::from(""),
                    Line::from(vec![
                        Span::styled("final score ", Style::default().fg(palette.dim)),
                        Span::styled(summary.final_score.to_string(), bold.fg(palette.text)),
                    ]),
                    Line::from(Span::styled(
                        format!("{} Mode", summary.difficulty_name),
                        Style::default().fg(palette.text),
                    )),
                ];
                if summary.is_new_best {
                    lines.push(Line::from(Span::styled(
                        "new high score!",
                        bold.fg(palette.hit).add_modifier(Modifier::SLOW_BLINK),
                    )));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "space play again · esc close",
                    Style::default().fg(palette.dim),
                )));
                render_dialog(lines, &palette, area, buf);
            }
            AppState::ConfirmReset => {
                let lines = vec![
                    Line::from(Span::styled(
                        format!(
                            "Reset the high score for {} difficulty?",
                            snapshot.difficulty
                        ),
                        bold.fg(palette.text),
                    )),
                    Line::from(""),
                    Line::from(Span::styled("y yes · any other key no", Style::default().fg(palette.dim))),
                ];
                render_dialog(lines, &palette, area, buf);
            }
            AppState::Board => {}
        }
    }
}

/// Square-ish layout: 9 holes give 3 columns.
fn grid_columns(hole_count: usize) -> usize {
    let mut columns = 1;
    while columns * columns < hole_count {
        columns += 1;
    }
    columns
}

fn render_board(app: &App, palette: &Palette, columns: usize, area: Rect, buf: &mut Buffer) {
    let snapshot = app.engine.snapshot();
    let rows = snapshot.hole_count.div_ceil(columns);
    let board_width = (columns as u16 * HOLE_WIDTH).min(area.width);
    let board = Rect {
        x: area.x + (area.width - board_width) / 2,
        width: board_width,
        ..area
    };

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(HOLE_HEIGHT); rows])
        .split(board);

    for (row, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);

        for (column, cell) in cells.iter().enumerate() {
            let hole = row * columns + column;
            if hole >= snapshot.hole_count {
                break;
            }

            let flash = app.flash.filter(|f| f.hole == hole).map(|f| f.kind);
            let border_color = match flash {
                Some(FlashKind::Hit) => palette.hit,
                Some(FlashKind::Miss) => palette.miss,
                None => palette.dim,
            };
            let key_label = HOLE_KEYS
                .get(hole)
                .map(|k| format!(" {k} "))
                .unwrap_or_default();

            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border_color))
                .title(Span::styled(key_label, Style::default().fg(palette.dim)));

            let content = if snapshot.active_hole == Some(hole) {
                Span::styled(
                    MOLE,
                    Style::default().fg(palette.mole).add_modifier(Modifier::BOLD),
                )
            } else if flash == Some(FlashKind::Hit) {
                Span::styled("*bonk*", Style::default().fg(palette.hit))
            } else {
                Span::styled(EMPTY_HOLE, Style::default().fg(palette.dim))
            };

            let inner_height = cell.height.saturating_sub(2);
            let mut lines = vec![Line::from(""); usize::from(inner_height / 2)];
            lines.push(Line::from(content));

            Paragraph::new(lines)
                .block(block)
                .alignment(Alignment::Center)
                .render(*cell, buf);
        }
    }
}

fn render_dialog(lines: Vec<Line>, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let height = (lines.len() as u16 + 2).min(area.height);
    let width = 48.min(area.width);
    let dialog = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    Clear.render(dialog, buf);
    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(palette.accent)),
        )
        .alignment(Alignment::Center)
        .render(dialog, buf);
}
