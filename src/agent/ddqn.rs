use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::approximator::{FunctionApproximator, QNetwork};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::replay_buffer::{ReplayBuffer, Transition};

use super::epsilon::EpsilonSchedule;

/// Index of the largest value; ties go to the lowest index and NaNs never win.
pub fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

/// Double DQN agent over any [`FunctionApproximator`].
///
/// The online approximator selects actions (both when acting and when choosing the
/// bootstrap action for `s'`), the target approximator only evaluates them.
pub struct DdqnAgent<A: FunctionApproximator> {
    config: AgentConfig,
    online: A,
    target: A,
    memory: ReplayBuffer,
    schedule: EpsilonSchedule,
    rng: StdRng,
    train_steps: usize,
}

impl DdqnAgent<QNetwork> {
    /// Build the standard dense Q-network pair with the target synced to the online weights.
    pub fn from_config(config: AgentConfig) -> Result<Self> {
        let online = QNetwork::from_config(&config)?;
        let mut target = QNetwork::from_config(&config)?;
        target.set_weights(online.weights())?;
        Self::new(config, online, target)
    }
}

impl<A: FunctionApproximator> DdqnAgent<A> {
    pub fn new(config: AgentConfig, online: A, target: A) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(DdqnAgent {
            memory: ReplayBuffer::new(config.memory_length),
            schedule: EpsilonSchedule::from_config(&config),
            config,
            online,
            target,
            rng,
            train_steps: 0,
        })
    }

    /// Swap in a different exploration schedule, e.g. a fixed rate for evaluation.
    pub fn with_schedule(mut self, schedule: EpsilonSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn set_schedule(&mut self, schedule: EpsilonSchedule) {
        self.schedule = schedule;
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f32 {
        self.schedule.epsilon()
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn online(&self) -> &A {
        &self.online
    }

    pub fn target(&self) -> &A {
        &self.target
    }

    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    /// Greedy action of the online approximator
    pub fn greedy_action(&self, state: ArrayView1<f32>) -> usize {
        argmax(self.online.predict(state).view())
    }

    /// Epsilon-greedy action for `state`.
    pub fn act(&mut self, state: ArrayView1<f32>) -> usize {
        let greedy = self.greedy_action(state);
        self.schedule.sample_action(self.config.action_size, greedy, &mut self.rng)
    }

    pub fn remember(&mut self, state: Array1<f32>, action: usize, reward: f32, next_state: Array1<f32>, terminal: bool) {
        self.memory.append(Transition {
            state,
            action,
            reward,
            next_state,
            terminal,
        });
    }

    /// One learning step on a minibatch of at most `batch_size` remembered transitions.
    ///
    /// Returns the regression loss, or `None` when memory is empty and nothing was fitted.
    /// The epsilon schedule advances either way.
    pub fn replay(&mut self, batch_size: usize, frame_count: u64) -> Result<Option<f32>> {
        let batch = self.memory.sample(batch_size, &mut self.rng);
        if batch.is_empty() {
            self.schedule.decay_step(frame_count);
            return Ok(None);
        }

        let state_size = batch[0].state.len();
        let mut states = Array2::zeros((batch.len(), state_size));
        let mut next_states = Array2::zeros((batch.len(), state_size));
        for (i, transition) in batch.iter().enumerate() {
            states.row_mut(i).assign(&transition.state);
            next_states.row_mut(i).assign(&transition.next_state);
        }

        let mut targets = self.online.predict_batch(states.view());
        let next_online = self.online.predict_batch(next_states.view());
        let next_target = self.target.predict_batch(next_states.view());

        for (i, transition) in batch.iter().enumerate() {
            targets[[i, transition.action]] = if transition.terminal {
                transition.reward
            } else {
                let best_next = argmax(next_online.row(i));
                transition.reward + self.config.gamma * next_target[[i, best_next]]
            };
        }

        let loss = self.online.fit(states.view(), targets.view())?;
        self.train_steps += 1;
        self.schedule.decay_step(frame_count);

        debug!(batch = batch.len(), loss, epsilon = self.schedule.epsilon(), "replay step");
        Ok(Some(loss))
    }

    /// Copy the online weights into the target approximator.
    pub fn update_target(&mut self) -> Result<()> {
        self.target.set_weights(self.online.weights())
    }

    /// Forget all remembered transitions; epsilon and weights are kept.
    pub fn reset_memory(&mut self) {
        self.memory.clear();
    }

    /// Load online weights from `path` and sync the target to them.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.online.load(path)?;
        self.update_target()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.online.save(path)
    }
}
