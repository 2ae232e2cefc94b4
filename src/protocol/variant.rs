use serde::{Deserialize, Serialize};

use super::codec::{BALL_FIELDS, GameFrame};

/// Which Pong build the server talks to. Only the agent count and message size differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GameVariant {
    /// One paddle against a wall
    WallPong,
    /// Two paddles, one agent each
    MultiAgentPong,
}

impl GameVariant {
    pub fn num_agents(&self) -> usize {
        match self {
            GameVariant::WallPong => 1,
            GameVariant::MultiAgentPong => 2,
        }
    }

    /// Ball block plus one paddle per agent
    pub fn state_size(&self) -> usize {
        BALL_FIELDS + self.num_agents()
    }

    pub fn field_count(&self) -> usize {
        GameFrame::field_count(self.num_agents())
    }

    /// Inbound message size in bytes as sent by the game builds
    pub fn message_len(&self) -> usize {
        match self {
            GameVariant::WallPong => 33,
            GameVariant::MultiAgentPong => 42,
        }
    }

    /// Exploration rate used when evaluating trained agents
    pub fn default_eval_epsilon(&self) -> f32 {
        match self {
            GameVariant::WallPong => 0.0,
            GameVariant::MultiAgentPong => 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_sizes() {
        assert_eq!(GameVariant::WallPong.state_size(), 5);
        assert_eq!(GameVariant::WallPong.field_count(), 7);
        assert_eq!(GameVariant::MultiAgentPong.state_size(), 6);
        assert_eq!(GameVariant::MultiAgentPong.field_count(), 9);
    }
}
