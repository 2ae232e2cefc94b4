//! # Pong DDQN - Double Deep Q-Learning Agents for a Networked Pong Game
//!
//! The game runs as a separate process and connects over TCP. Every frame it sends the ball
//! and paddle positions, one reward code per paddle and a done flag; the server answers with
//! one action per paddle. Each paddle is driven by its own double-DQN agent.
//!
//! ## Key Features
//!
//! - **Agents**: double DQN with replay memory, target network and delayed epsilon decay
//! - **Networks**: small dense Q-networks trained with Adam, behind a swappable
//!   [`approximator::FunctionApproximator`] trait
//! - **Protocol**: fixed-size ASCII frames for single-paddle wall pong and two-paddle pong
//! - **Frame skipping**: actions are held for a configurable number of frames and rewards
//!   accumulated in between
//! - **Run artifacts**: parameter dumps, a per-episode CSV log and weight checkpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pong_ddqn::config::RunConfig;
//! use pong_ddqn::server::Server;
//!
//! let config = RunConfig::default().finalize().unwrap();
//! let mut server = Server::from_config(config).unwrap();
//! server.run().unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions (ReLU, linear)
//! - [`agent`] - The DDQN agent and its epsilon schedule
//! - [`approximator`] - Function approximator trait and the dense Q-network
//! - [`artifacts`] - Per-run output directory
//! - [`config`] - Agent, session, server and artifact settings
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialization
//! - [`network`] - Core neural network implementation
//! - [`optimizer`] - SGD and Adam
//! - [`protocol`] - Wire format of the game messages
//! - [`replay_buffer`] - Experience replay memory
//! - [`server`] - TCP accept loop
//! - [`session`] - Per-connection frame state machine

pub mod activations;
pub mod agent;
pub mod approximator;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod layers;
pub mod network;
pub mod optimizer;
pub mod protocol;
pub mod replay_buffer;
pub mod server;
pub mod session;

#[cfg(test)]
mod tests;
