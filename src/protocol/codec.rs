use ndarray::Array1;

use crate::error::{PongError, Result};

/// Shared ball fields at the start of every inbound message
pub const BALL_FIELDS: usize = 4;

/// Ball fields sent on a `[0, 2]` scale with 1.0 as the centre; shifted by -1 on ingestion
pub const CENTERED_BALL_FIELDS: [usize; 2] = [1, 3];

/// Map a wire reward code to a reward: `0 -> -1`, `1 -> 0`, `2 -> +1`. Other codes have no meaning.
pub fn decode_reward(code: f32) -> Option<f32> {
    if code == 0.0 || code == 1.0 || code == 2.0 {
        Some(code - 1.0)
    } else {
        None
    }
}

/// One decoded inbound game-state message.
#[derive(Debug, Clone, PartialEq)]
pub struct GameFrame {
    /// Ball block exactly as received
    pub ball: [f32; BALL_FIELDS],
    /// Paddle position per agent
    pub paddles: Vec<f32>,
    /// Decoded reward per agent, in `{-1, 0, 1}`
    pub rewards: Vec<f32>,
    pub terminal: bool,
}

impl GameFrame {
    pub fn field_count(num_agents: usize) -> usize {
        BALL_FIELDS + 2 * num_agents + 1
    }

    /// Decode a complete inbound message for `num_agents` paddles.
    pub fn decode(payload: &[u8], num_agents: usize) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| PongError::protocol("message is not ASCII", payload))?;

        let fields = text
            .split(|c: char| c.is_whitespace() || c == '\0')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| PongError::protocol(format!("bad numeric field {:?}", token), payload))
            })
            .collect::<Result<Vec<f32>>>()?;

        let expected = Self::field_count(num_agents);
        if fields.len() != expected {
            return Err(PongError::protocol(
                format!("expected {} fields, got {}", expected, fields.len()),
                payload,
            ));
        }

        let mut ball = [0.0; BALL_FIELDS];
        ball.copy_from_slice(&fields[..BALL_FIELDS]);
        let paddles = fields[BALL_FIELDS..BALL_FIELDS + num_agents].to_vec();
        let rewards = fields[BALL_FIELDS + num_agents..BALL_FIELDS + 2 * num_agents]
            .iter()
            .map(|&code| decode_reward(code).ok_or_else(|| PongError::invalid_reward_code(code, payload)))
            .collect::<Result<Vec<f32>>>()?;
        let terminal = fields[expected - 1] != 0.0;

        Ok(GameFrame {
            ball,
            paddles,
            rewards,
            terminal,
        })
    }

    pub fn num_agents(&self) -> usize {
        self.paddles.len()
    }

    /// State vector seen by `agent`: the centred ball block, its own paddle, then the
    /// other paddles in rotation order (`agent + 1, agent + 2, ...` wrapping around).
    pub fn state_for(&self, agent: usize) -> Array1<f32> {
        let n = self.paddles.len();
        let mut state = Vec::with_capacity(BALL_FIELDS + n);
        for (i, &value) in self.ball.iter().enumerate() {
            if CENTERED_BALL_FIELDS.contains(&i) {
                state.push(value - 1.0);
            } else {
                state.push(value);
            }
        }
        state.extend((0..n).map(|k| self.paddles[(agent + k) % n]));
        Array1::from_vec(state)
    }

    /// Encode as the game would send it, space padded to `message_len` bytes.
    pub fn to_wire(&self, message_len: usize) -> Result<Vec<u8>> {
        let mut text = String::new();
        for value in self.ball.iter().chain(self.paddles.iter()) {
            text.push_str(&format!("{:.2} ", value));
        }
        for reward in &self.rewards {
            text.push_str(&format!("{} ", (reward + 1.0).round() as i32));
        }
        text.push_str(if self.terminal { "1" } else { "0" });

        if text.len() > message_len {
            return Err(PongError::invalid_parameter(
                "message_len".to_string(),
                format!("frame needs {} bytes, message holds {}", text.len(), message_len),
            ));
        }
        let mut bytes = text.into_bytes();
        bytes.resize(message_len, b' ');
        Ok(bytes)
    }
}

/// Outbound control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Restart the episode; every action slot is sent as zero
    Reset,
    /// Actions to hold until the next decision point, one per agent
    Actions(Vec<usize>),
}

impl ControlMessage {
    /// Keep playing with action 0 for every agent
    pub fn noop(num_agents: usize) -> Self {
        ControlMessage::Actions(vec![0; num_agents])
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, ControlMessage::Reset)
    }

    pub fn encode(&self, num_agents: usize) -> String {
        let mut out = String::with_capacity(2 + 2 * num_agents);
        match self {
            ControlMessage::Reset => {
                out.push_str("1 ");
                for _ in 0..num_agents {
                    out.push_str("0 ");
                }
            }
            ControlMessage::Actions(actions) => {
                out.push_str("0 ");
                for action in actions {
                    out.push_str(&action.to_string());
                    out.push(' ');
                }
            }
        }
        out
    }
}
