//! Turns a move tree with nested variations into flat, playable lines.
//!
//! Emission order: the main line comes first. Its variations follow in
//! ascending order of branch point (the ply they hang on), several
//! variations on one ply in source order. Each variation is emitted the same
//! way, its own line and then all of its sub-variations, before the next
//! variation starts. Every leaf of the tree (the last node of the root
//! sequence or of any non-empty variation) yields exactly one line.

use serde::{Deserialize, Serialize};

use crate::drill_engine::models::{FlatLine, MoveNode, MoveSequence, MoveTree, ScriptedMove};

/// How a variation attached to move M relates to M.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RavSemantics {
    /// The variation replaces M: its prefix is the path before M.
    /// Standard PGN, and what [`PgnReaderParser`](crate::drill_engine::pgn::PgnReaderParser)
    /// produces.
    #[default]
    Alternative,
    /// The variation follows M: its prefix is the path including M.
    Continuation,
}

/// Flatten with standard PGN semantics. `None` or an empty tree gives no lines.
pub fn flatten(tree: Option<&MoveTree>) -> Vec<FlatLine> {
    flatten_with(tree, RavSemantics::Alternative)
}

pub fn flatten_with(tree: Option<&MoveTree>, semantics: RavSemantics) -> Vec<FlatLine> {
    let Some(tree) = tree else {
        return Vec::new();
    };

    let mut walk = Walk { tree, semantics, lines: Vec::new() };
    walk.sequence(&tree.moves, Vec::new());
    log::debug!("flattened {} line(s) with {:?} semantics", walk.lines.len(), semantics);
    walk.lines
}

struct Walk<'a> {
    tree: &'a MoveTree,
    semantics: RavSemantics,
    lines: Vec<FlatLine>,
}

impl<'a> Walk<'a> {
    fn sequence(&mut self, seq: &'a [MoveNode], prefix: Vec<ScriptedMove>) {
        if seq.is_empty() {
            return;
        }

        let mut path = prefix;
        let mut branches: Vec<(Vec<ScriptedMove>, &'a [MoveSequence])> = Vec::new();

        for node in seq {
            if node.has_variations() && self.semantics == RavSemantics::Alternative {
                branches.push((path.clone(), &node.variations));
            }
            path.push(node.ply.clone());
            if node.has_variations() && self.semantics == RavSemantics::Continuation {
                branches.push((path.clone(), &node.variations));
            }
        }

        self.emit(path);

        for (branch_prefix, variations) in branches {
            for variation in variations {
                self.sequence(variation, branch_prefix.clone());
            }
        }
    }

    fn emit(&mut self, moves: Vec<ScriptedMove>) {
        self.lines.push(FlatLine {
            moves,
            tags: self.tree.tags.clone(),
            starting_position: self.tree.starting_position.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn node(san: &str) -> MoveNode {
        MoveNode::leaf(ScriptedMove::new(san))
    }

    fn branch(san: &str, variations: Vec<Vec<MoveNode>>) -> MoveNode {
        MoveNode::with_variations(ScriptedMove::new(san), variations)
    }

    fn sans(line: &FlatLine) -> Vec<&str> {
        line.moves.iter().map(|m| m.san.as_str()).collect()
    }

    /// 1. e4 (1. d4 d5) e5 2. Nf3 (2. Bc4)
    fn italian_or_queens() -> MoveTree {
        MoveTree::from_moves(vec![
            branch("e4", vec![vec![node("d4"), node("d5")]]),
            node("e5"),
            branch("Nf3", vec![vec![node("Bc4")]]),
        ])
    }

    fn leaves(seq: &[MoveNode]) -> usize {
        let own = usize::from(!seq.is_empty());
        own + seq
            .iter()
            .flat_map(|n| n.variations.iter())
            .map(|v| leaves(v))
            .sum::<usize>()
    }

    #[test]
    fn none_and_empty_trees_give_no_lines() {
        assert!(flatten(None).is_empty());
        assert!(flatten(Some(&MoveTree::default())).is_empty());
    }

    #[test]
    fn straight_line_gives_one_line() {
        let tree = MoveTree::from_moves(vec![node("e4"), node("e5"), node("Nf3")]);
        let lines = flatten(Some(&tree));
        assert_eq!(lines.len(), 1);
        assert_eq!(sans(&lines[0]), ["e4", "e5", "Nf3"]);
    }

    #[test]
    fn alternative_semantics_replace_the_branching_move() {
        let lines = flatten(Some(&italian_or_queens()));
        let got: Vec<Vec<&str>> = lines.iter().map(sans).collect();
        assert_eq!(
            got,
            vec![
                vec!["e4", "e5", "Nf3"],
                vec!["d4", "d5"],
                vec!["e4", "e5", "Bc4"],
            ]
        );
    }

    #[test]
    fn continuation_semantics_extend_the_branching_move() {
        let lines = flatten_with(Some(&italian_or_queens()), RavSemantics::Continuation);
        let got: Vec<Vec<&str>> = lines.iter().map(sans).collect();
        assert_eq!(
            got,
            vec![
                vec!["e4", "e5", "Nf3"],
                vec!["e4", "d4", "d5"],
                vec!["e4", "e5", "Nf3", "Bc4"],
            ]
        );
    }

    #[test]
    fn trailing_branch_node_is_itself_terminal() {
        // 1. e4 (1. d4) (1. c4)
        let tree = MoveTree::from_moves(vec![branch("e4", vec![vec![node("d4")], vec![node("c4")]])]);
        let lines = flatten(Some(&tree));
        let got: Vec<Vec<&str>> = lines.iter().map(sans).collect();
        assert_eq!(got, vec![vec!["e4"], vec!["d4"], vec!["c4"]]);
    }

    #[test]
    fn nested_variations_are_followed() {
        // 1. e4 e5 (1... c5 2. Nf3 (2. c3)) 2. Nf3
        let tree = MoveTree::from_moves(vec![
            node("e4"),
            branch("e5", vec![vec![node("c5"), branch("Nf3", vec![vec![node("c3")]])]]),
            node("Nf3"),
        ]);
        let lines = flatten(Some(&tree));
        let got: Vec<Vec<&str>> = lines.iter().map(sans).collect();
        assert_eq!(
            got,
            vec![
                vec!["e4", "e5", "Nf3"],
                vec!["e4", "c5", "Nf3"],
                vec!["e4", "c5", "c3"],
            ]
        );
    }

    #[test]
    fn deep_branch_is_finished_before_a_later_one() {
        // 1. e4 (1. d4 d5 (1... Nf6)) e5 2. Nf3 (2. Bc4)
        let tree = MoveTree::from_moves(vec![
            branch("e4", vec![vec![node("d4"), branch("d5", vec![vec![node("Nf6")]])]]),
            node("e5"),
            branch("Nf3", vec![vec![node("Bc4")]]),
        ]);
        let lines = flatten(Some(&tree));
        let got: Vec<Vec<&str>> = lines.iter().map(sans).collect();
        assert_eq!(
            got,
            vec![
                vec!["e4", "e5", "Nf3"],
                vec!["d4", "d5"],
                vec!["d4", "Nf6"],
                vec!["e4", "e5", "Bc4"],
            ]
        );
    }

    #[test]
    fn empty_variation_contributes_nothing() {
        let tree = MoveTree::from_moves(vec![branch("e4", vec![Vec::new()]), node("e5")]);
        assert_eq!(flatten(Some(&tree)).len(), 1);
    }

    #[test]
    fn tags_and_start_position_reach_every_line() {
        let mut tree = italian_or_queens();
        tree.tags.insert("Event".to_string(), "Repertoire".to_string());
        tree.starting_position =
            Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".to_string());

        for line in flatten(Some(&tree)) {
            assert_eq!(line.tags.get("Event").map(String::as_str), Some("Repertoire"));
            assert_eq!(line.starting_position, tree.starting_position);
        }
    }

    #[test]
    fn serialized_lines_carry_no_variations() {
        for line in flatten(Some(&italian_or_queens())) {
            let value = serde_json::to_value(&line).unwrap();
            for m in value["moves"].as_array().unwrap() {
                assert!(m.get("variations").is_none(), "leaked variations: {m}");
            }
        }
    }

    fn arb_node() -> impl Strategy<Value = MoveNode> {
        let leaf = "[a-h][1-8]".prop_map(|s| MoveNode::leaf(ScriptedMove::new(s)));
        leaf.prop_recursive(4, 48, 3, |inner| {
            (
                "[a-h][1-8]",
                prop::collection::vec(prop::collection::vec(inner, 0..4), 0..3),
            )
                .prop_map(|(san, vars)| MoveNode::with_variations(ScriptedMove::new(san), vars))
        })
    }

    proptest! {
        #[test]
        fn line_count_matches_leaf_count(seq in prop::collection::vec(arb_node(), 0..6)) {
            let tree = MoveTree::from_moves(seq);
            let expected = leaves(&tree.moves);
            prop_assert_eq!(flatten(Some(&tree)).len(), expected);
            prop_assert_eq!(flatten_with(Some(&tree), RavSemantics::Continuation).len(), expected);
        }

        #[test]
        fn unbranched_tree_round_trips(sans_in in prop::collection::vec("[a-h][1-8]", 1..12)) {
            let tree = MoveTree::from_moves(
                sans_in.iter().map(|s| MoveNode::leaf(ScriptedMove::new(s.clone()))).collect(),
            );
            let lines = flatten(Some(&tree));
            prop_assert_eq!(lines.len(), 1);
            let got: Vec<String> = lines[0].moves.iter().map(|m| m.san.clone()).collect();
            prop_assert_eq!(got, sans_in);
        }
    }
}
