//! Core drill engine: PGN trees in, flat lines out, one learner move at a time.
//!
//! ## Module overview
//!
//! | Module         | Purpose |
//! |----------------|---------|
//! | `models`       | Shared types: move tree, flat lines, move input, line keys |
//! | `error`        | `DrillError` and the `DrillResult` alias |
//! | `pgn`          | `PgnParser` seam and the `pgn-reader` backed default |
//! | `rules`        | `RulesEngine` seam and the `shakmaty` backed `ChessBoard` |
//! | `flattener`    | Variation tree to a list of branch-free lines |
//! | `matcher`      | Does a learner move equal the scripted move? |
//! | `cursor`       | Position-in-line state machine |
//! | `session`      | One line drilled against a live board, replies auto-played |
//! | `ledger`       | Attempt/success counters keyed by line |
//! | `config`       | `TrainingConfig`, deserializable from JSON |
//! | `orchestrator` | Load, select, start, relay moves, record results |

pub mod config;
pub mod cursor;
pub mod error;
pub mod flattener;
pub mod ledger;
pub mod matcher;
pub mod models;
pub mod orchestrator;
pub mod pgn;
pub mod rules;
pub mod session;

// Re-export the public API surface so callers can use
// `drill_engine::TrainingOrchestrator` without reaching into sub-modules.
pub use config::{ColorInference, TrainingConfig};
pub use cursor::DrillCursor;
pub use error::{DrillError, DrillResult};
pub use flattener::{flatten, flatten_with, RavSemantics};
pub use ledger::{AttemptLedger, AttemptRecord, SharedLedger};
pub use matcher::is_match;
pub use models::{
    AppliedMove, FlatLine, Inconsistency, LineKey, MoveInput, MoveNode, MoveSequence, MoveTree,
    PlayerColor, PromotionPiece, ScriptedMove, LINE_KEY_DELIMITER,
};
pub use orchestrator::{
    infer_user_color, select_random_line, SessionState, TrainingMoveResult, TrainingOrchestrator,
};
pub use pgn::{PgnParser, PgnReaderParser};
pub use rules::{ChessBoard, RulesEngine};
pub use session::{DrillSession, MoveOutcome, PreludeOutcome};
