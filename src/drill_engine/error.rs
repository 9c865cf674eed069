//! Error types for the drill engine.

use thiserror::Error;

/// Result type for drill operations.
pub type DrillResult<T> = Result<T, DrillError>;

/// Errors signaled synchronously to the caller.
///
/// Learner mistakes are never errors: a wrong move is a successful
/// operation whose payload says "incorrect".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrillError {
    /// `load_pgn` was called with empty text.
    #[error("PGN string cannot be empty")]
    EmptyPgn,

    /// A session was requested before any PGN was loaded.
    #[error("PGN not loaded, cannot start training session")]
    PgnNotLoaded,

    /// The loaded text held no game.
    #[error("PGN data is empty, cannot start training session")]
    EmptyTree,

    /// Flattening produced zero playable lines.
    #[error("no variations found in PGN, cannot start training session")]
    NoVariations,

    /// The learner's color could not be resolved for the selected line.
    #[error("could not determine user color for the selected line")]
    UndeterminedColor,

    /// A move was submitted with no session running.
    #[error("no active training session, start a session first")]
    NoActiveSession,

    /// A starting position could not be loaded into the rules engine.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// The PGN text could not be turned into a move tree.
    #[error("PGN parse error: {0}")]
    Pgn(String),

    /// A [`TrainingConfig`](crate::drill_engine::config::TrainingConfig)
    /// document could not be read.
    #[error("invalid training config: {0}")]
    Config(String),
}
