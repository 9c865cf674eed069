use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sides and pieces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl fmt::Display for PlayerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerColor::White => write!(f, "White"),
            PlayerColor::Black => write!(f, "Black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionPiece {
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "n")]
    Knight,
}

impl PromotionPiece {
    pub fn char(self) -> char {
        match self {
            PromotionPiece::Queen  => 'q',
            PromotionPiece::Rook   => 'r',
            PromotionPiece::Bishop => 'b',
            PromotionPiece::Knight => 'n',
        }
    }
}

impl fmt::Display for PromotionPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

// ---------------------------------------------------------------------------
// Move tree (parser output)
// ---------------------------------------------------------------------------

/// The branch-free content of one ply: everything a [`MoveNode`] carries
/// except its variations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScriptedMove {
    /// SAN text, e.g. `"Nf3"` or `"exd8=Q+"`.
    #[serde(rename = "move")]
    pub san: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionPiece>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// NAG codes in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<u8>,
}

impl ScriptedMove {
    /// A SAN-only move with no square information.
    pub fn new(san: impl Into<String>) -> Self {
        ScriptedMove { san: san.into(), ..Default::default() }
    }

    pub fn with_squares(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self.to = Some(to.into());
        self
    }

    pub fn with_promotion(mut self, piece: PromotionPiece) -> Self {
        self.promotion = Some(piece);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// True when both `from` and `to` are known.
    pub fn has_squares(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }
}

impl fmt::Display for ScriptedMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.san)
    }
}

/// An ordered list of plies: the root line or one alternative.
pub type MoveSequence = Vec<MoveNode>;

/// One ply in the source tree plus the alternatives branching at it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveNode {
    #[serde(flatten)]
    pub ply: ScriptedMove,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variations: Vec<MoveSequence>,
}

impl MoveNode {
    pub fn leaf(ply: ScriptedMove) -> Self {
        MoveNode { ply, variations: Vec::new() }
    }

    pub fn with_variations(ply: ScriptedMove, variations: Vec<MoveSequence>) -> Self {
        MoveNode { ply, variations }
    }

    pub fn has_variations(&self) -> bool {
        !self.variations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveTree {
    pub moves: MoveSequence,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// FEN to seed the board; absent means the standard initial position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_position: Option<String>,
}

impl MoveTree {
    pub fn from_moves(moves: MoveSequence) -> Self {
        MoveTree { moves, ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Flat lines
// ---------------------------------------------------------------------------

/// Separator placed between SAN tokens in a [`LineKey`].
pub const LINE_KEY_DELIMITER: &str = "_";

/// Identity of a line's move content, used to key attempt statistics.
///
/// Two lines with the same SAN sequence share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineKey(String);

impl LineKey {
    pub fn new(key: impl Into<String>) -> Self {
        LineKey(key.into())
    }

    pub fn from_moves(moves: &[ScriptedMove]) -> Self {
        let sans: Vec<&str> = moves.iter().map(|m| m.san.as_str()).collect();
        LineKey(sans.join(LINE_KEY_DELIMITER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One fully resolved, branch-free line ready to drill.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlatLine {
    pub moves: Vec<ScriptedMove>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_position: Option<String>,
}

impl FlatLine {
    pub fn key(&self) -> LineKey {
        LineKey::from_moves(&self.moves)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Moves entering and leaving the rules engine
// ---------------------------------------------------------------------------

/// A move as submitted by the learner (or replayed from a script).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionPiece>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub san: Option<String>,
}

impl MoveInput {
    pub fn squares(from: impl Into<String>, to: impl Into<String>) -> Self {
        MoveInput {
            from: Some(from.into()),
            to: Some(to.into()),
            ..Default::default()
        }
    }

    /// SAN-only input. A drill session asks its board for the squares when
    /// the scripted move carries them.
    pub fn from_san(san: impl Into<String>) -> Self {
        MoveInput { san: Some(san.into()), ..Default::default() }
    }

    pub fn with_promotion(mut self, piece: PromotionPiece) -> Self {
        self.promotion = Some(piece);
        self
    }
}

impl From<&ScriptedMove> for MoveInput {
    fn from(m: &ScriptedMove) -> Self {
        MoveInput {
            from: m.from.clone(),
            to: m.to.clone(),
            promotion: m.promotion,
            san: Some(m.san.clone()),
        }
    }
}

/// One entry of the rules engine's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMove {
    pub san: String,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionPiece>,
    pub fen_after: String,
}

// ---------------------------------------------------------------------------
// Consistency failures
// ---------------------------------------------------------------------------

/// A disagreement between the scripted line and the live board.
///
/// These indicate corrupt PGN data or an engine bug, never a learner
/// mistake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    /// The learner's move matched the script but the engine refused it.
    EngineRejectedExpectedMove {
        ply: usize,
        expected: ScriptedMove,
        input: MoveInput,
        fen: String,
    },
    /// The scripted opponent move is illegal on the live board.
    IllegalScriptedReply {
        ply: usize,
        scripted: ScriptedMove,
        fen: String,
    },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::EngineRejectedExpectedMove { ply, expected, fen, .. } => write!(
                f,
                "engine rejected expected move {} at ply {} (position {})",
                expected, ply, fen
            ),
            Inconsistency::IllegalScriptedReply { ply, scripted, fen } => write!(
                f,
                "scripted reply {} at ply {} is illegal (position {})",
                scripted, ply, fen
            ),
        }
    }
}
