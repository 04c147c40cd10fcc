use std::path::Path;

use chrono::{DateTime, Utc};
use evonet_env::CartPoleConfig;
use evonet_training::{Agent, GeneticParams};
use serde::{Deserialize, Serialize};

use crate::util;

/// A trained controller together with the settings it was trained under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub final_fitness: f64,
    /// Seed of the training run; rerunning with it reproduces the model.
    pub seed: u64,
    pub params: GeneticParams,
    pub cart_pole: CartPoleConfig,
    pub agent: Agent,
}

impl AgentModel {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        util::read_json_file("model", path)
    }
}
