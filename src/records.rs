use tracing::warn;

use crate::difficulty::Difficulty;
use crate::store::KeyValueStore;

pub const DEFAULT_NAMESPACE: &str = "whac-a-mole";

/// Best score per difficulty on top of a key-value store.
///
/// Store failures never reach the caller: an unreadable record counts as
/// "no record" and a failed write is logged and otherwise ignored.
#[derive(Debug)]
pub struct RecordKeeper<S: KeyValueStore> {
    store: S,
    namespace: String,
}

impl<S: KeyValueStore> RecordKeeper<S> {
    pub fn new(store: S) -> Self {
        Self::with_namespace(store, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn key(&self, difficulty: Difficulty) -> String {
        format!("{}-highscore-{}", self.namespace, difficulty.key())
    }

    /// Best recorded score, or 0 when there is none.
    pub fn load(&self, difficulty: Difficulty) -> u32 {
        self.recorded(difficulty).unwrap_or(0)
    }

    /// Persist `score` if it beats the current record. Returns whether it did.
    pub fn try_save(&mut self, difficulty: Difficulty, score: u32) -> bool {
        let is_new_best = match self.recorded(difficulty) {
            Some(best) => score > best,
            None => true,
        };

        if is_new_best {
            let key = self.key(difficulty);
            if let Err(e) = self.store.set(&key, &score.to_string()) {
                warn!(%key, error = %e, "failed to persist high score");
            }
        }
        is_new_best
    }

    pub fn clear(&mut self, difficulty: Difficulty) {
        let key = self.key(difficulty);
        if let Err(e) = self.store.remove(&key) {
            warn!(%key, error = %e, "failed to clear high score");
        }
    }

    /// Best score for every difficulty, in table order.
    pub fn all(&self) -> Vec<(Difficulty, u32)> {
        Difficulty::ALL
            .iter()
            .map(|&difficulty| (difficulty, self.load(difficulty)))
            .collect()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn recorded(&self, difficulty: Difficulty) -> Option<u32> {
        let key = self.key(difficulty);
        match self.store.get(&key) {
            Ok(Some(raw)) => match raw.trim().parse::<u32>() {
                Ok(best) => Some(best),
                Err(_) => {
                    warn!(%key, value = %raw, "ignoring malformed high score");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(%key, error = %e, "high score unavailable");
                None
            }
        }
    }
}
