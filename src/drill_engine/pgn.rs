//! PGN text to [`MoveTree`], keeping every RAV.
//!
//! [`PgnReaderParser`] streams the text through a `pgn_reader::Visitor` and
//! replays each SAN on a `shakmaty` board so every node also knows its
//! `from`/`to` squares. A variation opened after move M starts from the
//! position before M and is attached to M.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use pgn_reader::{Nag, Outcome, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{Chess, Position};

use crate::drill_engine::{
    error::{DrillError, DrillResult},
    models::{MoveNode, MoveSequence, MoveTree, ScriptedMove},
    rules::{move_squares, position_from_fen},
};

/// Turns PGN text into a move tree.
pub trait PgnParser {
    /// `Ok(None)` when the text holds no game at all.
    fn parse(&self, text: &str) -> DrillResult<Option<MoveTree>>;
}

/// [`PgnParser`] backed by the `pgn-reader` crate. Reads the first game.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgnReaderParser;

impl PgnParser for PgnReaderParser {
    fn parse(&self, text: &str) -> DrillResult<Option<MoveTree>> {
        let mut reader = Reader::new(text.as_bytes());
        let mut visitor = TreeVisitor;
        match reader.read_game(&mut visitor) {
            Ok(Some(tree)) => tree.map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(DrillError::Pgn(e.to_string())),
        }
    }
}

/// One open sequence: the root line or a variation being read.
struct Frame {
    moves: MoveSequence,
    /// Position after the last move of `moves`.
    position: Chess,
    /// Position before the last move of `moves`; where a new RAV starts.
    before_last: Chess,
}

impl Frame {
    fn at(position: Chess) -> Self {
        Frame { moves: Vec::new(), before_last: position.clone(), position }
    }
}

/// Movetext state threaded through the visitor callbacks.
struct TreeBuilder {
    tags: BTreeMap<String, String>,
    starting_position: Option<String>,
    result: Option<String>,
    frames: Vec<Frame>,
    /// SAN tokens read so far, across all variations.
    tokens: usize,
}

impl TreeBuilder {
    fn current(&mut self) -> &mut Frame {
        // The root frame is pushed in `begin_movetext` and never popped.
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn finish(mut self) -> MoveTree {
        while self.frames.len() > 1 {
            self.close_variation();
        }
        let root = self.frames.pop().map(|f| f.moves).unwrap_or_default();
        MoveTree {
            moves: root,
            tags: self.tags,
            result: self.result,
            starting_position: self.starting_position,
        }
    }

    fn close_variation(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        let Some(frame) = self.frames.pop() else { return };
        if frame.moves.is_empty() {
            return;
        }
        if let Some(parent) = self.current().moves.last_mut() {
            parent.variations.push(frame.moves);
        }
    }
}

struct TreeVisitor;

impl Visitor for TreeVisitor {
    type Tags = BTreeMap<String, String>;
    type Movetext = TreeBuilder;
    type Output = DrillResult<MoveTree>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(BTreeMap::new())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let key = String::from_utf8_lossy(key).into_owned();
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        // First occurrence wins, as for duplicated headers elsewhere.
        tags.entry(key).or_insert(value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let starting_position = tags.get("FEN").map(|f| f.trim().to_string());
        let position = match &starting_position {
            Some(fen) => match position_from_fen(fen) {
                Ok(pos) => pos,
                Err(e) => return ControlFlow::Break(Err(DrillError::Pgn(e.to_string()))),
            },
            None => Chess::default(),
        };

        ControlFlow::Continue(TreeBuilder {
            tags,
            starting_position,
            result: None,
            frames: vec![Frame::at(position)],
            tokens: 0,
        })
    }

    fn san(&mut self, tree: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        tree.tokens += 1;
        let token = tree.tokens;
        let frame = tree.current();

        let m = match san_plus.san.to_move(&frame.position) {
            Ok(m) => m,
            Err(e) => {
                return ControlFlow::Break(Err(DrillError::Pgn(format!(
                    "illegal move {san_plus} (token {token}): {e}"
                ))));
            }
        };

        let mut scripted = ScriptedMove::new(san_plus.to_string());
        if let Some((from, to, promotion)) = move_squares(&m) {
            scripted.from = Some(from);
            scripted.to = Some(to);
            scripted.promotion = promotion;
        }

        frame.before_last = frame.position.clone();
        frame.position.play_unchecked(m);
        frame.moves.push(MoveNode::leaf(scripted));
        ControlFlow::Continue(())
    }

    fn nag(&mut self, tree: &mut Self::Movetext, nag: Nag) -> ControlFlow<Self::Output> {
        if let Some(last) = tree.current().moves.last_mut() {
            last.ply.annotations.push(nag.0);
        }
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        tree: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        let text = String::from_utf8_lossy(comment.as_bytes()).trim().to_string();
        if text.is_empty() {
            return ControlFlow::Continue(());
        }
        if let Some(last) = tree.current().moves.last_mut() {
            last.ply.comment = Some(match last.ply.comment.take() {
                Some(existing) => format!("{existing} {text}"),
                None => text,
            });
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, tree: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        let frame = tree.current();
        if frame.moves.is_empty() {
            log::warn!("skipping variation that precedes any move");
            return ControlFlow::Continue(Skip(true));
        }
        let start = frame.before_last.clone();
        tree.frames.push(Frame::at(start));
        ControlFlow::Continue(Skip(false))
    }

    fn end_variation(&mut self, tree: &mut Self::Movetext) -> ControlFlow<Self::Output> {
        tree.close_variation();
        ControlFlow::Continue(())
    }

    fn outcome(&mut self, tree: &mut Self::Movetext, outcome: Outcome) -> ControlFlow<Self::Output> {
        tree.result = Some(outcome.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, tree: Self::Movetext) -> Self::Output {
        Ok(tree.finish())
    }
}
