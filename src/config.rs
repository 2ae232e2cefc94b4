//! Run configuration.
//!
//! Every section has defaults matching the stock Pong training setup, so an empty JSON object is
//! a valid config file. Call [`RunConfig::finalize`] after loading or overriding values: it
//! derives the state size and message length from the game variant and validates ranges.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PongError, Result};
use crate::protocol::GameVariant;

/// Hyperparameters of one DDQN agent. Immutable once the agent is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub state_size: usize,
    pub action_size: usize,
    pub gamma: f32,
    pub learning_rate: f32,
    pub epsilon: f32,
    pub epsilon_decay: f32,
    pub epsilon_min: f32,
    /// Frames before epsilon starts decaying
    pub epsilon_delay: u64,
    pub memory_length: usize,
    pub hidden_layers: Vec<usize>,
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            state_size: GameVariant::WallPong.state_size(),
            action_size: 4,
            gamma: 0.99,
            learning_rate: 0.0005,
            epsilon: 1.0,
            epsilon_decay: 0.9999,
            epsilon_min: 0.05,
            epsilon_delay: 25_000,
            memory_length: 200_000,
            hidden_layers: vec![20, 20],
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.state_size == 0 || self.action_size == 0 {
            return Err(PongError::invalid_parameter("state_size/action_size", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(PongError::invalid_parameter("gamma", "must lie in [0, 1]"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(PongError::invalid_parameter("epsilon_decay", "must lie in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.epsilon) || !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(PongError::invalid_parameter("epsilon", "rates must lie in [0, 1]"));
        }
        if self.memory_length == 0 {
            return Err(PongError::invalid_parameter("memory_length", "must be positive"));
        }
        Ok(())
    }
}

/// Whether a session records transitions and trains, or only acts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionMode {
    Training,
    /// Fixed exploration rate, no memory or weight updates
    Evaluation { epsilon: f32 },
}

impl SessionMode {
    pub fn is_training(&self) -> bool {
        matches!(self, SessionMode::Training)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub variant: GameVariant,
    pub mode: SessionMode,
    pub num_episodes: usize,
    pub batch_size: usize,
    /// Frames between decision points; actions are held in between
    pub downsample: u64,
    /// Frames between target-network synchronizations
    pub target_update_interval: u64,
    /// Inbound message size in bytes; defaults to the variant's size
    pub message_len: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            variant: GameVariant::WallPong,
            mode: SessionMode::Training,
            num_episodes: 2000,
            batch_size: 28,
            downsample: 4,
            target_update_interval: 2000,
            message_len: None,
        }
    }
}

impl SessionConfig {
    pub fn message_len(&self) -> usize {
        self.message_len.unwrap_or_else(|| self.variant.message_len())
    }

    pub fn validate(&self) -> Result<()> {
        if self.downsample == 0 {
            return Err(PongError::invalid_parameter("downsample", "must be positive"));
        }
        if self.target_update_interval == 0 {
            return Err(PongError::invalid_parameter("target_update_interval", "must be positive"));
        }
        if self.message_len() == 0 {
            return Err(PongError::invalid_parameter("message_len", "must be positive"));
        }
        if let SessionMode::Evaluation { epsilon } = self.mode {
            if !(0.0..=1.0).contains(&epsilon) {
                return Err(PongError::invalid_parameter("epsilon", "must lie in [0, 1]"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    /// Read deadline per inbound message; `None` blocks indefinitely
    pub read_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: "127.0.0.1:10000".to_string(),
            read_timeout_ms: None,
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        // sockets reject a zero deadline; leave the field unset to block indefinitely
        if self.read_timeout_ms == Some(0) {
            return Err(PongError::invalid_parameter("read_timeout_ms", "must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Parent directory of the per-run output directory
    pub output_dir: PathBuf,
    pub run_prefix: String,
    /// Write a weight file per agent at every episode end (training only)
    pub save_weights: bool,
    /// Initial weight files, one per agent, in agent order
    pub load_weights: Vec<PathBuf>,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        ArtifactConfig {
            output_dir: PathBuf::from("."),
            run_prefix: "pongData".to_string(),
            save_weights: true,
            load_weights: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub agent: AgentConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| PongError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&data).map_err(|e| PongError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Derive variant-dependent fields and validate the whole configuration.
    pub fn finalize(mut self) -> Result<Self> {
        self.agent.state_size = self.session.variant.state_size();
        self.agent.validate()?;
        self.session.validate()?;
        self.server.validate()?;

        let agents = self.session.variant.num_agents();
        if !self.artifacts.load_weights.is_empty() && self.artifacts.load_weights.len() != agents {
            return Err(PongError::Config(format!(
                "{} weight files given for {} agents",
                self.artifacts.load_weights.len(),
                agents
            )));
        }
        if !self.session.mode.is_training() && self.artifacts.load_weights.is_empty() {
            return Err(PongError::Config("evaluation requires weight files for every agent".to_string()));
        }
        Ok(self)
    }
}
