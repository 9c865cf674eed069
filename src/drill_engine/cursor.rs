use crate::drill_engine::models::ScriptedMove;

/// Position-in-line pointer over one flat line.
///
/// `position` only grows during a drill; [`DrillCursor::reset`] is the only
/// way back to the start.
#[derive(Debug, Clone)]
pub struct DrillCursor {
    moves: Vec<ScriptedMove>,
    position: usize,
}

impl DrillCursor {
    pub fn new(moves: Vec<ScriptedMove>) -> Self {
        DrillCursor { moves, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of plies in the line.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The scripted move at the current position, `None` once complete.
    pub fn expected_move(&self) -> Option<&ScriptedMove> {
        self.moves.get(self.position)
    }

    /// Step past the current move; panics if the line is already complete.
    pub fn advance(&mut self) {
        assert!(
            self.position < self.moves.len(),
            "DrillCursor advanced past the end of the line ({} plies)",
            self.moves.len()
        );
        self.position += 1;
    }

    pub fn is_complete(&self) -> bool {
        self.position == self.moves.len()
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Plies already played.
    pub fn played(&self) -> &[ScriptedMove] {
        &self.moves[..self.position]
    }
}
