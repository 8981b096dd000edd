use thiserror::Error;

/// Errors surfaced to callers of the session engine.
///
/// Invalid transitions are not errors: they are rejected silently and
/// reported through return values instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown difficulty `{0}` (expected easy, medium or hard)")]
    UnknownDifficulty(String),

    #[error("hole grid must contain at least one hole")]
    EmptyGrid,
}

pub type Result<T> = std::result::Result<T, Error>;
