use serde::{Deserialize, Serialize};

use crate::drill_engine::{
    error::{DrillError, DrillResult},
    flattener::RavSemantics,
    models::PlayerColor,
};

/// How the learner's color is chosen when the caller does not pass one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorInference {
    /// Learner plays the side to move in the line's starting position.
    #[default]
    SideToMove,
    /// Black when the first SAN token carries `"..."`, White otherwise.
    FirstMoveNotation,
    Fixed(PlayerColor),
}

/// Tunables for a [`TrainingOrchestrator`](crate::drill_engine::orchestrator::TrainingOrchestrator).
///
/// Every field has a default, so `{}` is a valid JSON config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Seed for line selection. `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
    pub color_inference: ColorInference,
    pub rav_semantics: RavSemantics,
    /// Auto-play scripted moves until the learner is to move when a
    /// session starts.
    pub auto_play_prelude: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            rng_seed: None,
            color_inference: ColorInference::default(),
            rav_semantics: RavSemantics::default(),
            auto_play_prelude: true,
        }
    }
}

impl TrainingConfig {
    /// Seeded config with every other field at its default.
    pub fn seeded(seed: u64) -> Self {
        TrainingConfig { rng_seed: Some(seed), ..Default::default() }
    }

    pub fn from_json(text: &str) -> DrillResult<Self> {
        serde_json::from_str(text).map_err(|e| DrillError::Config(e.to_string()))
    }
}
