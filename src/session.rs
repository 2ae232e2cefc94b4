//! # Session Protocol State Machine
//!
//! A [`Session`] lives for exactly one game connection. Each decoded [`GameFrame`] is fed to
//! [`Session::step`], which decides whether the frame is a decision point, an episode
//! boundary or a held frame, drives the agents accordingly and returns the control message to
//! send back. All counters live in [`SessionState`]; nothing survives the connection.
//!
//! Frame and episode counters start at 1, so with a downsample factor of `k` the first
//! decision is taken on frame `k`.

use ndarray::Array1;
use tracing::{debug, info};

use crate::agent::DdqnAgent;
use crate::approximator::FunctionApproximator;
use crate::config::SessionConfig;
use crate::error::{PongError, Result};
use crate::protocol::{ControlMessage, GameFrame};

/// Per-agent bookkeeping between decision points.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSlot {
    /// State observed at the last decision point
    pub previous_state: Array1<f32>,
    /// Action held until the next decision point
    pub pending_action: usize,
    /// Reward collected since the last decision point
    pub accumulated_reward: f32,
    /// Reward collected over the current episode, updated at decision points
    pub episode_reward: f32,
}

impl AgentSlot {
    fn new(state_size: usize) -> Self {
        AgentSlot {
            previous_state: Array1::zeros(state_size),
            pending_action: 0,
            accumulated_reward: 0.0,
            episode_reward: 0.0,
        }
    }

    fn reset_episode(&mut self) {
        self.pending_action = 0;
        self.accumulated_reward = 0.0;
        self.episode_reward = 0.0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub frame_count: u64,
    pub episode_count: usize,
    pub slots: Vec<AgentSlot>,
    /// Message repeated on held frames
    pub outbound: ControlMessage,
}

impl SessionState {
    pub fn new(state_sizes: &[usize]) -> Self {
        SessionState {
            frame_count: 1,
            episode_count: 1,
            slots: state_sizes.iter().map(|&s| AgentSlot::new(s)).collect(),
            outbound: ControlMessage::noop(state_sizes.len()),
        }
    }
}

/// What happened on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Between decision points; the previous actions are repeated
    Hold,
    /// New actions were chosen
    Decision,
    /// The episode ended and the game is asked to reset
    Terminal,
}

/// Metrics for one finished episode, one entry per agent in the vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub frame: u64,
    pub epsilons: Vec<f32>,
    pub rewards: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub kind: FrameKind,
    pub outbound: ControlMessage,
    pub episode: Option<EpisodeSummary>,
    /// Target networks were synchronized on this frame
    pub target_synced: bool,
}

pub struct Session {
    config: SessionConfig,
    state: SessionState,
}

impl Session {
    pub fn new<A: FunctionApproximator>(config: SessionConfig, agents: &[DdqnAgent<A>]) -> Self {
        let sizes: Vec<usize> = agents.iter().map(|a| a.config().state_size).collect();
        Session {
            config,
            state: SessionState::new(&sizes),
        }
    }

    /// Message sent as soon as the connection is accepted
    pub fn opening_message(&self) -> ControlMessage {
        ControlMessage::Reset
    }

    pub fn num_agents(&self) -> usize {
        self.state.slots.len()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True once the configured number of episodes has been played
    pub fn is_finished(&self) -> bool {
        self.state.episode_count > self.config.num_episodes
    }

    /// Process one inbound frame and return the message to send back.
    pub fn step<A: FunctionApproximator>(
        &mut self,
        agents: &mut [DdqnAgent<A>],
        frame: &GameFrame,
    ) -> Result<FrameOutcome> {
        let n = self.state.slots.len();
        if agents.len() != n || frame.num_agents() != n {
            return Err(PongError::dimension_mismatch(
                format!("{} agents", n),
                format!("{} agents and a {}-paddle frame", agents.len(), frame.num_agents()),
            ));
        }

        let training = self.config.mode.is_training();
        let frame_count = self.state.frame_count;
        let batch_size = self.config.batch_size;

        for (slot, reward) in self.state.slots.iter_mut().zip(&frame.rewards) {
            slot.accumulated_reward += reward;
        }

        let (kind, episode) = if frame.terminal {
            for (i, (agent, slot)) in agents.iter_mut().zip(self.state.slots.iter_mut()).enumerate() {
                slot.episode_reward += slot.accumulated_reward;
                if training {
                    agent.remember(
                        slot.previous_state.clone(),
                        slot.pending_action,
                        slot.accumulated_reward,
                        frame.state_for(i),
                        true,
                    );
                    agent.replay(batch_size, frame_count)?;
                }
            }

            let summary = EpisodeSummary {
                episode: self.state.episode_count,
                frame: frame_count,
                epsilons: agents.iter().map(|a| a.epsilon()).collect(),
                rewards: self.state.slots.iter().map(|s| s.episode_reward).collect(),
            };
            info!(
                episode = summary.episode,
                frame = summary.frame,
                epsilons = ?summary.epsilons,
                rewards = ?summary.rewards,
                "episode finished"
            );

            self.state.episode_count += 1;
            self.state.slots.iter_mut().for_each(AgentSlot::reset_episode);
            self.state.outbound = ControlMessage::Reset;
            (FrameKind::Terminal, Some(summary))
        } else if frame_count % self.config.downsample == 0 {
            let mut actions = Vec::with_capacity(n);
            for (i, (agent, slot)) in agents.iter_mut().zip(self.state.slots.iter_mut()).enumerate() {
                let current = frame.state_for(i);
                slot.episode_reward += slot.accumulated_reward;
                if training {
                    agent.remember(
                        slot.previous_state.clone(),
                        slot.pending_action,
                        slot.accumulated_reward,
                        current.clone(),
                        false,
                    );
                    agent.replay(batch_size, frame_count)?;
                }
                slot.pending_action = agent.act(current.view());
                slot.previous_state = current;
                slot.accumulated_reward = 0.0;
                actions.push(slot.pending_action);
            }
            debug!(frame = frame_count, ?actions, "decision point");
            self.state.outbound = ControlMessage::Actions(actions);
            (FrameKind::Decision, None)
        } else {
            (FrameKind::Hold, None)
        };

        let target_synced = training && frame_count % self.config.target_update_interval == 0;
        if target_synced {
            for agent in agents.iter_mut() {
                agent.update_target()?;
            }
            debug!(frame = frame_count, "target networks synchronized");
        }

        self.state.frame_count += 1;

        Ok(FrameOutcome {
            kind,
            outbound: self.state.outbound.clone(),
            episode,
            target_synced,
        })
    }
}
