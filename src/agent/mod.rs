//! # Agents
//!
//! A [`DdqnAgent`] is a double deep Q-learning agent:
//!
//! - **Replay memory**: a bounded FIFO of transitions sampled uniformly for training
//! - **Online network**: picks greedy actions and is trained every replay step
//! - **Target network**: evaluates the bootstrapped value of the action the online network
//!   picks, and only changes when [`DdqnAgent::update_target`] copies the online weights over
//! - **Epsilon schedule**: full exploration during a warm-up period, then geometric decay
//!   down to a floor
//!
//! ```rust,no_run
//! use pong_ddqn::agent::DdqnAgent;
//! use pong_ddqn::config::AgentConfig;
//! use ndarray::array;
//!
//! let mut agent = DdqnAgent::from_config(AgentConfig::default()).unwrap();
//! let state = array![0.5, 0.0, 0.5, 0.0, 0.5];
//! let action = agent.act(state.view());
//! agent.remember(state.clone(), action, 1.0, state.clone(), false);
//! agent.replay(28, 1).unwrap();
//! ```

mod ddqn;
mod epsilon;

pub use ddqn::{argmax, DdqnAgent};
pub use epsilon::EpsilonSchedule;
