//! Top-level training flow: load a PGN, pick a line, drill it, keep score.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use shakmaty::Position;

use crate::drill_engine::{
    config::{ColorInference, TrainingConfig},
    error::{DrillError, DrillResult},
    flattener::flatten_with,
    ledger::{AttemptLedger, AttemptRecord},
    models::{FlatLine, Inconsistency, LineKey, MoveInput, MoveTree, PlayerColor, ScriptedMove},
    pgn::{PgnParser, PgnReaderParser},
    rules::position_from_fen,
    session::{DrillSession, PreludeOutcome},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    NoSession,
    /// PGN loaded, no session started yet.
    Loaded,
    SessionActive,
    SessionComplete,
    /// A scripted reply was illegal; the line can only be restarted.
    Stalled,
}

/// What the host gets back for one learner move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingMoveResult {
    pub is_valid: bool,
    pub is_correct_move: bool,
    /// The line is finished, including any scripted reply played after
    /// the learner's move.
    pub is_variation_complete: bool,
    pub next_fen: String,
    pub opponent_move: Option<ScriptedMove>,
    /// SAN the learner was expected to play, captured before the move.
    pub expected_move_san: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inconsistency: Option<Inconsistency>,
}

/// Uniform pick among `lines`. A single line is returned without drawing
/// from `rng`.
pub fn select_random_line<'a, R: Rng>(
    lines: &'a [FlatLine],
    rng: &mut R,
) -> Option<&'a FlatLine> {
    match lines.len() {
        0 => None,
        1 => lines.first(),
        n => lines.get(rng.gen_range(0..n)),
    }
}

/// The color the learner plays on `line` under `rule`.
pub fn infer_user_color(line: &FlatLine, rule: ColorInference) -> DrillResult<PlayerColor> {
    let Some(first) = line.moves.first() else {
        return Err(DrillError::UndeterminedColor);
    };

    match rule {
        ColorInference::Fixed(color) => Ok(color),
        ColorInference::FirstMoveNotation => {
            if first.san.contains("...") {
                Ok(PlayerColor::Black)
            } else {
                Ok(PlayerColor::White)
            }
        }
        ColorInference::SideToMove => match &line.starting_position {
            None => Ok(PlayerColor::White),
            Some(fen) => position_from_fen(fen)
                .map(|pos| pos.turn().into())
                .map_err(|_| DrillError::UndeterminedColor),
        },
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    }
}

struct ActiveDrill {
    session: DrillSession,
    key: LineKey,
}

fn state_of(session: &DrillSession) -> SessionState {
    if session.is_drill_complete() {
        SessionState::SessionComplete
    } else if session.is_stalled() {
        SessionState::Stalled
    } else {
        SessionState::SessionActive
    }
}

fn log_prelude(prelude: &PreludeOutcome) {
    if !prelude.played.is_empty() {
        log::debug!("auto-played {} opening move(s)", prelude.played.len());
    }
}

/// Owns everything one learner needs across several drills: the parsed
/// repertoire, the running session and the attempt ledger.
pub struct TrainingOrchestrator<P: PgnParser = PgnReaderParser> {
    parser: P,
    config: TrainingConfig,
    rng: StdRng,
    loaded: bool,
    tree: Option<MoveTree>,
    active: Option<ActiveDrill>,
    ledger: AttemptLedger,
    diagnostics: Vec<Inconsistency>,
    state: SessionState,
}

impl TrainingOrchestrator<PgnReaderParser> {
    pub fn new() -> Self {
        TrainingOrchestrator::with_config(TrainingConfig::default())
    }

    pub fn with_config(config: TrainingConfig) -> Self {
        TrainingOrchestrator::with_parser(PgnReaderParser, config)
    }
}

impl Default for TrainingOrchestrator<PgnReaderParser> {
    fn default() -> Self {
        TrainingOrchestrator::new()
    }
}

impl<P: PgnParser> TrainingOrchestrator<P> {
    pub fn with_parser(parser: P, config: TrainingConfig) -> Self {
        TrainingOrchestrator {
            parser,
            rng: rng_for(config.rng_seed),
            config,
            loaded: false,
            tree: None,
            active: None,
            ledger: AttemptLedger::new(),
            diagnostics: Vec::new(),
            state: SessionState::NoSession,
        }
    }

    /// Parse `text` and keep its tree. Any running session is discarded,
    /// also when parsing fails.
    pub fn load_pgn(&mut self, text: &str) -> DrillResult<()> {
        if text.trim().is_empty() {
            return Err(DrillError::EmptyPgn);
        }

        self.active = None;
        self.loaded = false;
        self.tree = None;
        self.state = SessionState::NoSession;

        let tree = self.parser.parse(text)?;
        match &tree {
            Some(t) => log::info!("loaded PGN with {} root move(s)", t.moves.len()),
            None    => log::warn!("PGN text holds no game"),
        }
        self.tree = tree;
        self.loaded = true;
        self.state = SessionState::Loaded;
        Ok(())
    }

    /// Pick a line and start drilling it. `user_color` overrides the
    /// configured inference rule.
    pub fn start_training_session(&mut self, user_color: Option<PlayerColor>) -> DrillResult<()> {
        if !self.loaded {
            return Err(DrillError::PgnNotLoaded);
        }
        let tree = self.tree.as_ref().ok_or(DrillError::EmptyTree)?;

        let lines = flatten_with(Some(tree), self.config.rav_semantics);
        let line = select_random_line(&lines, &mut self.rng)
            .ok_or(DrillError::NoVariations)?
            .clone();

        let color = match user_color {
            Some(c) => c,
            None    => infer_user_color(&line, self.config.color_inference)?,
        };

        let key = line.key();
        let starting_position = line.starting_position.clone();
        let session = DrillSession::new(line, color, starting_position.as_deref())?;
        log::info!(
            "starting drill on line {} ({} of {} lines), learner plays {}",
            key,
            session.line().len(),
            lines.len(),
            color
        );

        self.active = Some(ActiveDrill { session, key });
        if self.config.auto_play_prelude {
            self.play_opponent_prelude()?;
        }
        self.settle();
        Ok(())
    }

    /// Play scripted moves until the learner is to move. Runs on its own at
    /// session start unless `auto_play_prelude` is off.
    pub fn play_opponent_prelude(&mut self) -> DrillResult<PreludeOutcome> {
        let active = self.active.as_mut().ok_or(DrillError::NoActiveSession)?;
        let prelude = active.session.play_opponent_prelude();
        log_prelude(&prelude);
        if let Some(issue) = &prelude.inconsistency {
            self.diagnostics.push(issue.clone());
        }
        self.settle();
        Ok(prelude)
    }

    /// Drill the current line again from its first ply. The attempt ledger
    /// keeps its counts.
    pub fn restart_session(&mut self) -> DrillResult<()> {
        let active = self.active.as_mut().ok_or(DrillError::NoActiveSession)?;
        active.session.restart()?;
        log::info!("restarting drill on line {}", active.key);
        if self.config.auto_play_prelude {
            self.play_opponent_prelude()?;
        }
        self.settle();
        Ok(())
    }

    fn settle(&mut self) {
        if let Some(active) = &self.active {
            self.state = state_of(&active.session);
        }
    }

    pub fn handle_user_move(&mut self, input: &MoveInput) -> DrillResult<TrainingMoveResult> {
        let active = self.active.as_mut().ok_or(DrillError::NoActiveSession)?;

        let expected_move_san = active.session.expected_move().map(|m| m.san.clone());
        let outcome = active.session.handle_user_move(input);

        if outcome.success {
            self.ledger.record_result(&active.key, outcome.is_correct_move);
        }
        if let Some(issue) = &outcome.inconsistency {
            self.diagnostics.push(issue.clone());
        }

        let is_variation_complete = active.session.is_drill_complete();
        self.state = state_of(&active.session);

        Ok(TrainingMoveResult {
            is_valid: outcome.success,
            is_correct_move: outcome.is_correct_move,
            is_variation_complete,
            next_fen: outcome.new_fen,
            opponent_move: outcome.opponent_move,
            expected_move_san,
            inconsistency: outcome.inconsistency,
        })
    }

    pub fn parsed_tree(&self) -> Option<&MoveTree> {
        self.tree.as_ref()
    }

    pub fn has_pgn_loaded(&self) -> bool {
        self.loaded
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn current_line(&self) -> Option<&FlatLine> {
        self.active.as_ref().map(|a| a.session.line())
    }

    pub fn current_line_key(&self) -> Option<&LineKey> {
        self.active.as_ref().map(|a| &a.key)
    }

    pub fn current_fen(&self) -> Option<String> {
        self.active.as_ref().map(|a| a.session.current_fen())
    }

    pub fn expected_move(&self) -> Option<&ScriptedMove> {
        self.active.as_ref().and_then(|a| a.session.expected_move())
    }

    pub fn is_user_turn(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.session.is_user_turn())
    }

    pub fn is_drill_complete(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.session.is_drill_complete())
    }

    pub fn stats(&self, key: &LineKey) -> AttemptRecord {
        self.ledger.stats(key)
    }

    pub fn play_count(&self, key: &LineKey) -> u32 {
        self.ledger.play_count(key)
    }

    pub fn success_rate(&self, key: &LineKey) -> f64 {
        self.ledger.success_rate(key)
    }

    pub fn ledger(&self) -> &AttemptLedger {
        &self.ledger
    }

    /// Drain the consistency failures seen since the last call.
    pub fn take_diagnostics(&mut self) -> Vec<Inconsistency> {
        std::mem::take(&mut self.diagnostics)
    }
}
