//! # Game Wire Protocol
//!
//! Space-separated ASCII in both directions.
//!
//! - Inbound, fixed byte length per variant:
//!   `<ball_x> <ball_y> <ball_vx> <ball_vy> <paddle_1> [.. <paddle_n>] <reward_1> [.. <reward_n>] <done>`
//!   Rewards are sent as codes `0, 1, 2` standing for `-1, 0, +1`.
//! - Outbound: `"<reset> <action_1> [.. <action_n>] "`, with `reset = 1` asking the game to
//!   restart the episode (actions are then zero and ignored).

mod codec;
mod variant;

pub use codec::{decode_reward, ControlMessage, GameFrame, BALL_FIELDS, CENTERED_BALL_FIELDS};
pub use variant::GameVariant;
