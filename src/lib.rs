// Library surface: the session engine plus the persistence and runtime
// pieces the terminal binary is assembled from.
pub mod app_dirs;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod grid;
pub mod preferences;
pub mod records;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod store;

pub use difficulty::{resolve, Difficulty, DifficultyProfile};
pub use engine::SessionEngine;
pub use error::{Error, Result};
pub use session::{HitOutcome, Phase, SessionEvent, SessionSummary, Snapshot};
