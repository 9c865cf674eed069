//! One learner drilling one line against a live board.
//!
//! The session owns its cursor and its rules engine. The learner moves for
//! one color; every reply for the other color is taken from the script and
//! played automatically.

use serde::Serialize;

use crate::drill_engine::{
    cursor::DrillCursor,
    error::DrillResult,
    matcher::is_match,
    models::{AppliedMove, FlatLine, Inconsistency, MoveInput, PlayerColor, ScriptedMove},
    rules::{ChessBoard, RulesEngine},
};

/// Result of one [`DrillSession::handle_user_move`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    /// The session handled the request. False when it was not the
    /// learner's turn or the board refused a matching move.
    pub success: bool,
    pub is_correct_move: bool,
    /// The learner's own move finished the line. A scripted reply that
    /// ends it afterwards shows up in [`DrillSession::is_drill_complete`].
    pub is_complete: bool,
    pub new_fen: String,
    /// Scripted reply that was auto-played, if any.
    pub opponent_move: Option<ScriptedMove>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inconsistency: Option<Inconsistency>,
}

/// Opponent moves played before the learner's first turn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PreludeOutcome {
    pub played: Vec<ScriptedMove>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inconsistency: Option<Inconsistency>,
}

pub struct DrillSession<E: RulesEngine = ChessBoard> {
    engine: E,
    line: FlatLine,
    user_color: PlayerColor,
    starting_position: Option<String>,
    cursor: DrillCursor,
    stalled: bool,
}

impl DrillSession<ChessBoard> {
    pub fn new(
        line: FlatLine,
        user_color: PlayerColor,
        starting_position: Option<&str>,
    ) -> DrillResult<Self> {
        DrillSession::with_engine(ChessBoard::new(), line, user_color, starting_position)
    }
}

impl<E: RulesEngine> DrillSession<E> {
    pub fn with_engine(
        mut engine: E,
        line: FlatLine,
        user_color: PlayerColor,
        starting_position: Option<&str>,
    ) -> DrillResult<Self> {
        match starting_position {
            Some(fen) => engine.load(fen)?,
            None      => engine.reset(),
        }
        let cursor = DrillCursor::new(line.moves.clone());
        Ok(DrillSession {
            engine,
            line,
            user_color,
            starting_position: starting_position.map(str::to_string),
            cursor,
            stalled: false,
        })
    }

    pub fn is_user_turn(&self) -> bool {
        if self.stalled || self.cursor.is_complete() {
            return false;
        }
        self.engine.side_to_move() == self.user_color
    }

    /// The move the learner should play now, if it is their turn.
    pub fn expected_move(&self) -> Option<&ScriptedMove> {
        if !self.is_user_turn() {
            return None;
        }
        self.cursor.expected_move()
    }

    pub fn handle_user_move(&mut self, input: &MoveInput) -> MoveOutcome {
        if !self.is_user_turn() {
            return self.refused(None);
        }
        let Some(expected) = self.expected_move().cloned() else {
            return self.refused(None);
        };

        let candidate = self.complete_input(&expected, input);
        if !is_match(&expected, &candidate) {
            log::debug!(
                "wrong move at ply {}: expected {}, got {:?}",
                self.cursor.position(),
                expected,
                candidate
            );
            return MoveOutcome {
                success: true,
                is_correct_move: false,
                is_complete: false,
                new_fen: self.current_fen(),
                opponent_move: None,
                inconsistency: None,
            };
        }

        if self.engine.play(&candidate).is_none() {
            let issue = Inconsistency::EngineRejectedExpectedMove {
                ply: self.cursor.position(),
                expected,
                input: candidate,
                fen: self.current_fen(),
            };
            log::error!("drill desynchronized: {issue}");
            return self.refused(Some(issue));
        }
        self.cursor.advance();

        if self.cursor.is_complete() {
            return self.accepted(true, None, None);
        }

        if self.is_user_turn() {
            return self.accepted(false, None, None);
        }

        match self.play_scripted_reply() {
            Ok(reply) => self.accepted(false, Some(reply), None),
            Err(issue) => self.accepted(false, None, Some(issue)),
        }
    }

    /// Auto-play scripted moves until it is the learner's turn or the line
    /// ends. Used when the learner does not move first.
    pub fn play_opponent_prelude(&mut self) -> PreludeOutcome {
        let mut prelude = PreludeOutcome::default();
        while !self.stalled
            && !self.cursor.is_complete()
            && self.engine.side_to_move() != self.user_color
        {
            match self.play_scripted_reply() {
                Ok(reply) => prelude.played.push(reply),
                Err(issue) => {
                    prelude.inconsistency = Some(issue);
                    break;
                }
            }
        }
        prelude
    }

    /// Back to the first ply on a fresh board.
    pub fn restart(&mut self) -> DrillResult<()> {
        match &self.starting_position {
            Some(fen) => self.engine.load(fen)?,
            None      => self.engine.reset(),
        }
        self.cursor.reset();
        self.stalled = false;
        Ok(())
    }

    pub fn is_drill_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    /// True once a scripted reply turned out illegal; the line cannot go on.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn current_fen(&self) -> String {
        self.engine.current_position()
    }

    pub fn line(&self) -> &FlatLine {
        &self.line
    }

    pub fn user_color(&self) -> PlayerColor {
        self.user_color
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor.position()
    }

    pub fn history(&self) -> &[AppliedMove] {
        self.engine.history()
    }

    // Give the input whatever form the script compares on. A SAN-only script
    // needs the input's SAN; a script with squares needs the input's squares.
    fn complete_input(&self, expected: &ScriptedMove, input: &MoveInput) -> MoveInput {
        let mut candidate = input.clone();
        let has_squares = candidate.from.is_some() && candidate.to.is_some();
        if !expected.has_squares() && candidate.san.is_none() {
            candidate.san = self.engine.san_of(input);
        } else if expected.has_squares() && !has_squares && candidate.san.is_some() {
            if let Some(preview) = self.engine.preview(input) {
                candidate.from = Some(preview.from);
                candidate.to = Some(preview.to);
                candidate.promotion = candidate.promotion.or(preview.promotion);
            }
        }
        candidate
    }

    fn play_scripted_reply(&mut self) -> Result<ScriptedMove, Inconsistency> {
        let ply = self.cursor.position();
        let Some(scripted) = self.cursor.expected_move().cloned() else {
            return Err(Inconsistency::IllegalScriptedReply {
                ply,
                scripted: ScriptedMove::default(),
                fen: self.current_fen(),
            });
        };

        if self.engine.play(&MoveInput::from(&scripted)).is_none() {
            self.stalled = true;
            let issue = Inconsistency::IllegalScriptedReply {
                ply,
                scripted,
                fen: self.current_fen(),
            };
            log::error!("CRITICAL: {issue}");
            return Err(issue);
        }

        self.cursor.advance();
        Ok(scripted)
    }

    fn accepted(
        &self,
        is_complete: bool,
        opponent_move: Option<ScriptedMove>,
        inconsistency: Option<Inconsistency>,
    ) -> MoveOutcome {
        MoveOutcome {
            success: true,
            is_correct_move: true,
            is_complete,
            new_fen: self.current_fen(),
            opponent_move,
            inconsistency,
        }
    }

    fn refused(&self, inconsistency: Option<Inconsistency>) -> MoveOutcome {
        MoveOutcome {
            success: false,
            is_correct_move: false,
            is_complete: self.is_drill_complete(),
            new_fen: self.current_fen(),
            opponent_move: None,
            inconsistency,
        }
    }
}
