//! End-to-end tests for the `opening_drill` crate.
//!
//! Included from `lib.rs` under `#[cfg(test)]`. Module-level behavior is
//! tested next to each module; these drive the full PGN-to-ledger path.
//!
//! # Coverage
//!
//! | Group | What is tested |
//! |-------|----------------|
//! | Repertoire | RAV-rich PGN → expected lines, keys and order; continuation semantics |
//! | Determinism | Same seed → same line; different seeds reach every line |
//! | Full drills | Every line played through as White and as Black, prelude included |
//! | Ledger | Wrong-then-right counts; snapshot after several drills |
//! | Start position | FEN tag → learner color and first expected move |
//! | Failure paths | Empty tree, ledger untouched by refused moves |
//! | Serialization | Host-facing result JSON shape |

use crate::drill_engine::{
    flatten, flatten_with, AttemptRecord, DrillError, LineKey, MoveInput, PgnParser,
    PgnReaderParser, PlayerColor, RavSemantics, SessionState, TrainingConfig,
    TrainingOrchestrator,
};

// ── helpers ──────────────────────────────────────────────────────────────────

/// Two Black defences plus a sideline in the Ruy Lopez.
const REPERTOIRE: &str = r#"[Event "Open games"]
[White "Repertoire"]

1. e4 e5 (1... c5 2. Nf3 d6) 2. Nf3 Nc6 (2... d6 3. d4) 3. Bb5 *"#;

const REPERTOIRE_KEYS: [&str; 3] = ["e4_e5_Nf3_Nc6_Bb5", "e4_c5_Nf3_d6", "e4_e5_Nf3_d6_d4"];

fn trainer(seed: u64) -> TrainingOrchestrator {
    let mut t = TrainingOrchestrator::with_config(TrainingConfig::seeded(seed));
    t.load_pgn(REPERTOIRE).expect("repertoire parses");
    t
}

/// Play the scripted move every time it is the learner's turn. Returns the
/// number of learner moves made.
fn play_out(t: &mut TrainingOrchestrator) -> u32 {
    let mut moves = 0;
    while let Some(expected) = t.expected_move().cloned() {
        let input = MoveInput::from(&expected);
        let result = t.handle_user_move(&input).expect("session is active");
        assert!(result.is_valid, "refused {expected} on {}", result.next_fen);
        assert!(result.is_correct_move, "scripted move {expected} judged wrong");
        assert!(result.inconsistency.is_none());
        moves += 1;
    }
    moves
}

// ── repertoire ───────────────────────────────────────────────────────────────

#[test]
fn repertoire_flattens_to_one_line_per_leaf() {
    let tree = PgnReaderParser.parse(REPERTOIRE).unwrap().unwrap();
    let keys: Vec<LineKey> = flatten(Some(&tree)).iter().map(|l| l.key()).collect();
    let expected: Vec<LineKey> = REPERTOIRE_KEYS.iter().map(|k| LineKey::new(*k)).collect();
    assert_eq!(keys, expected);
}

#[test]
fn continuation_semantics_keep_the_branching_move() {
    let tree = PgnReaderParser.parse(REPERTOIRE).unwrap().unwrap();
    let keys: Vec<String> = flatten_with(Some(&tree), RavSemantics::Continuation)
        .iter()
        .map(|l| l.key().to_string())
        .collect();
    assert_eq!(
        keys,
        ["e4_e5_Nf3_Nc6_Bb5", "e4_e5_c5_Nf3_d6", "e4_e5_Nf3_Nc6_d6_d4"]
    );
}

#[test]
fn every_line_keeps_the_headers() {
    let tree = PgnReaderParser.parse(REPERTOIRE).unwrap().unwrap();
    for line in flatten(Some(&tree)) {
        assert_eq!(line.tags.get("Event").map(String::as_str), Some("Open games"));
        assert!(line.moves.iter().all(|m| m.has_squares()), "{}", line.key());
    }
}

// ── determinism ──────────────────────────────────────────────────────────────

#[test]
fn same_seed_selects_the_same_line() {
    for seed in [1, 42, 999, 0xDEAD_BEEF, 7] {
        let mut a = trainer(seed);
        let mut b = trainer(seed);
        a.start_training_session(None).unwrap();
        b.start_training_session(None).unwrap();
        assert_eq!(a.current_line_key(), b.current_line_key(), "seed={seed}");
    }
}

#[test]
fn different_seeds_reach_every_line() {
    let mut seen = std::collections::BTreeSet::new();
    for seed in 0..60u64 {
        let mut t = trainer(seed);
        t.start_training_session(None).unwrap();
        seen.insert(t.current_line_key().unwrap().to_string());
    }
    let all: std::collections::BTreeSet<String> =
        REPERTOIRE_KEYS.iter().map(|k| k.to_string()).collect();
    assert_eq!(seen, all);
}

#[test]
fn entropy_seed_starts_a_valid_session() {
    let mut t = TrainingOrchestrator::new();
    t.load_pgn(REPERTOIRE).unwrap();
    t.start_training_session(None).unwrap();
    let key = t.current_line_key().unwrap().as_str();
    assert!(REPERTOIRE_KEYS.contains(&key), "unknown line {key}");
}

// ── full drills ──────────────────────────────────────────────────────────────

#[test]
fn every_line_can_be_played_as_white() {
    for seed in 0..12u64 {
        let mut t = trainer(seed);
        t.start_training_session(Some(PlayerColor::White)).unwrap();
        let key = t.current_line_key().cloned().unwrap();
        let len = t.current_line().unwrap().len() as u32;

        let moves = play_out(&mut t);
        assert_eq!(moves, (len + 1) / 2, "{key}");
        assert!(t.is_drill_complete());
        assert_eq!(t.state(), SessionState::SessionComplete);
        assert_eq!(t.stats(&key), AttemptRecord { attempts: moves, successes: moves });
    }
}

#[test]
fn every_line_can_be_played_as_black() {
    for seed in 0..12u64 {
        let mut t = trainer(seed);
        t.start_training_session(Some(PlayerColor::Black)).unwrap();
        // 1. e4 was auto-played.
        assert!(t.is_user_turn());
        assert_eq!(t.current_fen().unwrap().split(' ').nth(1), Some("b"));

        let len = t.current_line().unwrap().len() as u32;
        assert_eq!(play_out(&mut t), len / 2);
        assert!(t.is_drill_complete());
    }
}

#[test]
fn completed_line_reports_the_final_position() {
    let mut t = trainer(3);
    t.start_training_session(Some(PlayerColor::White)).unwrap();
    play_out(&mut t);
    let fen = t.current_fen().unwrap();
    let line = t.current_line().unwrap();
    // White moves last in two lines and Black in the other.
    let to_move = if line.len() % 2 == 0 { "w" } else { "b" };
    assert_eq!(fen.split(' ').nth(1), Some(to_move), "{fen}");
}

// ── ledger ───────────────────────────────────────────────────────────────────

#[test]
fn wrong_then_right_counts_two_attempts() {
    let mut t = trainer(5);
    t.start_training_session(Some(PlayerColor::White)).unwrap();
    let key = t.current_line_key().cloned().unwrap();

    let wrong = t.handle_user_move(&MoveInput::squares("d2", "d4")).unwrap();
    assert!(wrong.is_valid && !wrong.is_correct_move);
    assert_eq!(wrong.expected_move_san.as_deref(), Some("e4"));

    let right = t.handle_user_move(&MoveInput::squares("e2", "e4")).unwrap();
    assert!(right.is_correct_move);
    assert!(right.opponent_move.is_some());

    assert_eq!(t.stats(&key), AttemptRecord { attempts: 2, successes: 1 });
    assert!((t.success_rate(&key) - 0.5).abs() < 1e-9);
}

#[test]
fn ledger_survives_new_sessions_and_reloads() {
    let mut t = trainer(11);
    for _ in 0..3 {
        t.start_training_session(Some(PlayerColor::White)).unwrap();
        play_out(&mut t);
    }
    t.load_pgn(REPERTOIRE).unwrap();
    assert_eq!(t.state(), SessionState::Loaded);

    let total: u32 = t.ledger().snapshot().values().map(|r| r.attempts).sum();
    let lines_drilled: usize = t.ledger().len();
    assert!((1..=3).contains(&lines_drilled));
    // Three learner moves per five-ply line, two per four-ply line.
    assert!((6..=9).contains(&total), "total={total}");
}

// ── start position ──────────────────────────────────────────────────────────

#[test]
fn fen_tag_makes_the_learner_black() {
    let pgn = "[SetUp \"1\"]\n[FEN \"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1\"]\n\n1... c5 2. Nf3 d6 *";
    let mut t = TrainingOrchestrator::with_config(TrainingConfig::seeded(1));
    t.load_pgn(pgn).unwrap();
    t.start_training_session(None).unwrap();

    assert!(t.is_user_turn());
    assert_eq!(t.expected_move().map(|m| m.san.as_str()), Some("c5"));

    let result = t.handle_user_move(&MoveInput::squares("c7", "c5")).unwrap();
    assert!(result.is_correct_move);
    assert_eq!(result.opponent_move.map(|m| m.san).as_deref(), Some("Nf3"));
}

// ── failure paths ────────────────────────────────────────────────────────────

#[test]
fn empty_tree_reports_no_variations() {
    let mut t = TrainingOrchestrator::with_config(TrainingConfig::seeded(1));
    t.load_pgn("[Event \"Nothing yet\"]\n\n*").unwrap();
    assert!(flatten(t.parsed_tree()).is_empty());

    let err = t.start_training_session(None).unwrap_err();
    assert_eq!(err, DrillError::NoVariations);
    assert!(err.to_string().contains("no variations found"));
    assert!(!t.is_user_turn());
}

#[test]
fn refused_moves_leave_the_ledger_alone() {
    let mut t = trainer(2);
    t.start_training_session(Some(PlayerColor::Black)).unwrap();
    let key = t.current_line_key().cloned().unwrap();
    play_out(&mut t);
    let before = t.stats(&key);

    let late = t.handle_user_move(&MoveInput::squares("a7", "a6")).unwrap();
    assert!(!late.is_valid);
    assert_eq!(t.stats(&key), before);
    assert!(t.take_diagnostics().is_empty());
}

// ── serialization ────────────────────────────────────────────────────────────

#[test]
fn move_result_json_shape() {
    let mut t = trainer(4);
    t.start_training_session(Some(PlayerColor::White)).unwrap();
    let result = t.handle_user_move(&MoveInput::squares("e2", "e4")).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["is_valid"], true);
    assert_eq!(json["is_correct_move"], true);
    assert_eq!(json["expected_move_san"], "e4");
    assert!(json["opponent_move"]["move"].is_string());
    assert!(json.get("inconsistency").is_none());
}
