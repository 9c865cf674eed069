//! Rules engine seam and its `shakmaty` implementation.
//!
//! The drill never decides legality itself. It hands moves to a
//! [`RulesEngine`] and trusts the answer.

use shakmaty::{
    fen::Fen,
    san::SanPlus,
    uci::UciMove,
    CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role, Square,
};

use crate::drill_engine::{
    error::{DrillError, DrillResult},
    models::{AppliedMove, MoveInput, PlayerColor, PromotionPiece},
};

/// What a drill needs from a chess rules implementation.
pub trait RulesEngine {
    /// Back to the standard initial position, history cleared.
    fn reset(&mut self);

    /// Replace the position with the one encoded in `fen`, history cleared.
    fn load(&mut self, fen: &str) -> DrillResult<()>;

    /// Play `input` if legal. `None` means the move was rejected and the
    /// position is unchanged.
    fn play(&mut self, input: &MoveInput) -> Option<AppliedMove>;

    /// What playing `input` would produce, without playing it. `None` when
    /// the move is illegal.
    fn preview(&self, input: &MoveInput) -> Option<AppliedMove>;

    /// SAN of `input` in the current position, without playing it.
    fn san_of(&self, input: &MoveInput) -> Option<String> {
        self.preview(input).map(|m| m.san)
    }

    fn current_position(&self) -> String;

    fn side_to_move(&self) -> PlayerColor;

    fn history(&self) -> &[AppliedMove];
}

impl From<Color> for PlayerColor {
    fn from(c: Color) -> Self {
        match c {
            Color::White => PlayerColor::White,
            Color::Black => PlayerColor::Black,
        }
    }
}

fn role_of(piece: PromotionPiece) -> Role {
    match piece {
        PromotionPiece::Queen  => Role::Queen,
        PromotionPiece::Rook   => Role::Rook,
        PromotionPiece::Bishop => Role::Bishop,
        PromotionPiece::Knight => Role::Knight,
    }
}

fn piece_of(role: Role) -> Option<PromotionPiece> {
    match role {
        Role::Queen  => Some(PromotionPiece::Queen),
        Role::Rook   => Some(PromotionPiece::Rook),
        Role::Bishop => Some(PromotionPiece::Bishop),
        Role::Knight => Some(PromotionPiece::Knight),
        _            => None,
    }
}

/// Parse a FEN into a standard-chess position.
pub fn position_from_fen(text: &str) -> DrillResult<Chess> {
    let fen: Fen = text
        .trim()
        .parse()
        .map_err(|e| DrillError::InvalidPosition(format!("{text}: {e}")))?;
    fen.into_position(CastlingMode::Standard)
        .map_err(|e| DrillError::InvalidPosition(format!("{text}: {e}")))
}

pub fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Standard from/to squares of a legal move, castling as king-to-target
/// (`e1g1`), plus any promotion piece.
pub fn move_squares(m: &Move) -> Option<(String, String, Option<PromotionPiece>)> {
    match m.to_uci(CastlingMode::Standard) {
        UciMove::Normal { from, to, promotion } => {
            Some((from.to_string(), to.to_string(), promotion.and_then(piece_of)))
        }
        _ => None,
    }
}

fn apply(pos: &mut Chess, m: Move) -> Option<AppliedMove> {
    let (from, to, promotion) = move_squares(&m)?;
    let san = SanPlus::from_move_and_play_unchecked(pos, m);
    Some(AppliedMove {
        san: san.to_string(),
        from,
        to,
        promotion,
        fen_after: fen_of(pos),
    })
}

/// [`RulesEngine`] over a `shakmaty::Chess` position.
#[derive(Debug, Clone, Default)]
pub struct ChessBoard {
    position: Chess,
    history: Vec<AppliedMove>,
}

impl ChessBoard {
    pub fn new() -> Self {
        ChessBoard::default()
    }

    /// Resolve `input` to a legal move. Squares win over SAN when both are
    /// present.
    fn resolve(&self, input: &MoveInput) -> Option<Move> {
        if let (Some(from), Some(to)) = (&input.from, &input.to) {
            let uci = UciMove::Normal {
                from: from.parse::<Square>().ok()?,
                to: to.parse::<Square>().ok()?,
                promotion: input.promotion.map(role_of),
            };
            return uci.to_move(&self.position).ok();
        }

        let san = input.san.as_deref()?;
        let san_plus: SanPlus = san.parse().ok()?;
        san_plus.san.to_move(&self.position).ok()
    }
}

impl RulesEngine for ChessBoard {
    fn reset(&mut self) {
        self.position = Chess::default();
        self.history.clear();
    }

    fn load(&mut self, fen: &str) -> DrillResult<()> {
        self.position = position_from_fen(fen)?;
        self.history.clear();
        Ok(())
    }

    fn play(&mut self, input: &MoveInput) -> Option<AppliedMove> {
        let m = self.resolve(input)?;
        let applied = apply(&mut self.position, m)?;
        self.history.push(applied.clone());
        Some(applied)
    }

    fn preview(&self, input: &MoveInput) -> Option<AppliedMove> {
        let m = self.resolve(input)?;
        let mut scratch = self.position.clone();
        apply(&mut scratch, m)
    }

    fn current_position(&self) -> String {
        fen_of(&self.position)
    }

    fn side_to_move(&self) -> PlayerColor {
        self.position.turn().into()
    }

    fn history(&self) -> &[AppliedMove] {
        &self.history
    }
}
