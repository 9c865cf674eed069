//! Drill a small repertoire end to end.
//!
//! Run with: `cargo run --example drill_demo`
//!
//! 1. **Flattening**: the repertoire's RAVs are expanded into every playable
//!    line, under both RAV semantics.
//! 2. **Perfect run**: one line is drilled as White with every move correct.
//! 3. **Mistakes**: a line is drilled as Black with a wrong first attempt,
//!    then the ledger is printed as JSON.
//!
//! A fixed seed keeps the output reproducible.

use opening_drill::{
    flatten_with, MoveInput, PgnParser, PgnReaderParser, PlayerColor, RavSemantics,
    TrainingConfig, TrainingOrchestrator,
};

const REPERTOIRE: &str = r#"[Event "Open games"]
[White "Repertoire"]

1. e4 e5 (1... c5 2. Nf3 d6 3. d4) 2. Nf3 Nc6 (2... d6 3. d4) 3. Bb5 a6 4. Ba4 *"#;

fn print_lines(semantics: RavSemantics) {
    let tree = match PgnReaderParser.parse(REPERTOIRE) {
        Ok(Some(tree)) => tree,
        Ok(None) => return println!("  (no game)"),
        Err(e) => return println!("  error: {e}"),
    };
    println!("  {semantics:?}:");
    for (i, line) in flatten_with(Some(&tree), semantics).iter().enumerate() {
        println!("    {}. {}", i + 1, line.key());
    }
}

/// Play the scripted move whenever it is the learner's turn.
fn drill_perfectly(trainer: &mut TrainingOrchestrator) {
    while let Some(expected) = trainer.expected_move().cloned() {
        match trainer.handle_user_move(&MoveInput::from(&expected)) {
            Ok(result) => {
                let reply = result
                    .opponent_move
                    .map(|m| m.san)
                    .unwrap_or_else(|| "-".to_string());
                println!("  you: {:<6} reply: {:<6} fen: {}", expected.san, reply, result.next_fen);
            }
            Err(e) => return println!("  error: {e}"),
        }
    }
}

fn main() {
    // ── Flattening ───────────────────────────────────────────────────────────
    println!();
    println!("══ Lines in the repertoire ══");
    println!();
    print_lines(RavSemantics::Alternative);
    print_lines(RavSemantics::Continuation);

    let mut trainer = TrainingOrchestrator::with_config(TrainingConfig::seeded(2024));
    if let Err(e) = trainer.load_pgn(REPERTOIRE) {
        eprintln!("could not load repertoire: {e}");
        return;
    }

    // ── Perfect run as White ─────────────────────────────────────────────────
    println!();
    println!("══ Perfect run as White ══");
    println!();
    if let Err(e) = trainer.start_training_session(Some(PlayerColor::White)) {
        eprintln!("could not start: {e}");
        return;
    }
    if let Some(key) = trainer.current_line_key() {
        println!("  line: {key}");
    }
    drill_perfectly(&mut trainer);
    println!("  complete: {}", trainer.is_drill_complete());

    // ── One mistake as Black ─────────────────────────────────────────────────
    // 1. e4 is auto-played before the learner's first turn.
    println!();
    println!("══ One mistake as Black ══");
    println!();
    if let Err(e) = trainer.start_training_session(Some(PlayerColor::Black)) {
        eprintln!("could not start: {e}");
        return;
    }
    if let Some(key) = trainer.current_line_key() {
        println!("  line: {key}");
    }
    match trainer.handle_user_move(&MoveInput::squares("a7", "a6")) {
        Ok(r) => println!(
            "  you: a6     correct: {}  expected: {}",
            r.is_correct_move,
            r.expected_move_san.unwrap_or_default()
        ),
        Err(e) => println!("  error: {e}"),
    }
    drill_perfectly(&mut trainer);

    // ── Ledger ───────────────────────────────────────────────────────────────
    println!();
    println!("══ Attempt ledger ══");
    println!();
    match serde_json::to_string_pretty(&trainer.ledger().snapshot()) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("could not serialize ledger: {e}"),
    }
    for issue in trainer.take_diagnostics() {
        eprintln!("consistency failure: {issue}");
    }
}
