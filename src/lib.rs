//! # opening_drill
//!
//! Drill chess opening lines recorded in PGN, one move at a time.
//!
//! A repertoire PGN is a main line plus nested alternatives (RAVs). This
//! library turns that tree into every distinct playable line, picks one,
//! and walks a learner through it: each learner move is checked against
//! the scripted move, the scripted reply is played back automatically and
//! every attempt is counted per line.
//!
//! ## How it works
//!
//! 1. [`TrainingOrchestrator::load_pgn`] parses the text through a
//!    [`PgnParser`] (by default `pgn-reader`) into a [`MoveTree`].
//! 2. [`TrainingOrchestrator::start_training_session`] flattens the tree into
//!    [`FlatLine`]s, picks one at random, resolves the learner's color and
//!    starts a [`DrillSession`] on a [`ChessBoard`] (by default `shakmaty`).
//! 3. [`TrainingOrchestrator::handle_user_move`] matches each move, plays
//!    the reply and records the result in the [`AttemptLedger`].
//!
//! ## Key features
//!
//! - **Deterministic**: set `rng_seed` in [`TrainingConfig`] to pick the same
//!   line every time.
//! - **Pluggable seams**: any [`PgnParser`] or [`RulesEngine`] can stand in
//!   for the defaults.
//! - **Line keys**: each line is identified by its SAN sequence joined with
//!   `_` (e.g. `"e4_e5_Nf3"`), stable across loads, for tracking progress.
//! - **Typed consistency failures**: corrupt scripts surface as
//!   [`Inconsistency`] values rather than panics.
//!
//! ## Quick start
//!
//! ```rust
//! use opening_drill::{MoveInput, PlayerColor, TrainingConfig, TrainingOrchestrator};
//!
//! let mut trainer = TrainingOrchestrator::with_config(TrainingConfig::seeded(7));
//! trainer.load_pgn("1. e4 e5 2. Nf3 *").unwrap();
//! trainer.start_training_session(Some(PlayerColor::White)).unwrap();
//!
//! let result = trainer.handle_user_move(&MoveInput::squares("e2", "e4")).unwrap();
//! assert!(result.is_correct_move);
//! assert_eq!(result.opponent_move.map(|m| m.san).as_deref(), Some("e5"));
//!
//! let key = trainer.current_line_key().cloned().unwrap();
//! println!("{key}: {:?}", trainer.stats(&key));
//! ```

pub mod drill_engine;

// Convenience re-exports so callers can use `opening_drill::TrainingOrchestrator`
// directly without reaching into `drill_engine::`.
pub use drill_engine::{
    flatten, flatten_with, infer_user_color, is_match, select_random_line, AppliedMove,
    AttemptLedger, AttemptRecord, ChessBoard, ColorInference, DrillCursor, DrillError,
    DrillResult, DrillSession, FlatLine, Inconsistency, LineKey, MoveInput, MoveNode,
    MoveOutcome, MoveSequence, MoveTree, PgnParser, PgnReaderParser, PlayerColor,
    PreludeOutcome, PromotionPiece, RavSemantics, RulesEngine, ScriptedMove, SessionState,
    SharedLedger, TrainingConfig, TrainingMoveResult, TrainingOrchestrator,
};

#[cfg(test)]
mod tests;
