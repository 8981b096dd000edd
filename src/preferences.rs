use tracing::warn;

use crate::difficulty::Difficulty;
use crate::records::DEFAULT_NAMESPACE;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Presentation preferences that survive restarts: theme and last difficulty.
#[derive(Debug)]
pub struct Preferences<S: KeyValueStore> {
    store: S,
    namespace: String,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self::with_namespace(store, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn load_theme(&self) -> Theme {
        match self.read("theme").as_deref() {
            Some("light") => Theme::Light,
            Some("dark") | None => Theme::Dark,
            Some(other) => {
                warn!(value = other, "unknown stored theme, using default");
                Theme::default()
            }
        }
    }

    pub fn save_theme(&mut self, theme: Theme) {
        self.write("theme", theme.key());
    }

    /// Last selected difficulty. Unrecognised stored values fall back to Easy.
    pub fn load_difficulty(&self) -> Difficulty {
        match self.read("difficulty") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(error = %e, "unknown stored difficulty, using default");
                Difficulty::default()
            }),
            None => Difficulty::default(),
        }
    }

    pub fn save_difficulty(&mut self, difficulty: Difficulty) {
        self.write("difficulty", difficulty.key());
    }

    fn read(&self, name: &str) -> Option<String> {
        let key = format!("{}-{}", self.namespace, name);
        self.store.get(&key).unwrap_or_else(|e| {
            warn!(%key, error = %e, "preference unavailable");
            None
        })
    }

    fn write(&mut self, name: &str, value: &str) {
        let key = format!("{}-{}", self.namespace, name);
        if let Err(e) = self.store.set(&key, value) {
            warn!(%key, error = %e, "failed to persist preference");
        }
    }
}
