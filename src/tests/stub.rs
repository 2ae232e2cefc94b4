use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::agent::DdqnAgent;
use crate::approximator::FunctionApproximator;
use crate::config::AgentConfig;
use crate::error::Result;

/// Approximator that returns the same action-values for every state and records fits.
#[derive(Clone, Debug)]
pub struct StubApproximator {
    pub values: Array1<f32>,
    pub fits: Vec<(Array2<f32>, Array2<f32>)>,
}

impl StubApproximator {
    pub fn new(values: &[f32]) -> Self {
        StubApproximator {
            values: Array1::from_vec(values.to_vec()),
            fits: Vec::new(),
        }
    }
}

impl FunctionApproximator for StubApproximator {
    type Weights = Array1<f32>;

    fn predict(&self, _state: ArrayView1<f32>) -> Array1<f32> {
        self.values.clone()
    }

    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        self.fits.push((states.to_owned(), targets.to_owned()));
        Ok(0.25)
    }

    fn weights(&self) -> Array1<f32> {
        self.values.clone()
    }

    fn set_weights(&mut self, weights: Array1<f32>) -> Result<()> {
        self.values = weights;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let values: Vec<f32> = serde_json::from_slice(&fs::read(path)?)?;
        self.values = Array1::from_vec(values);
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_vec(&self.values.to_vec())?)?;
        Ok(())
    }
}

/// Greedy single-paddle config: state size 5, four actions, no exploration.
pub fn greedy_config() -> AgentConfig {
    AgentConfig {
        state_size: 5,
        action_size: 4,
        epsilon: 0.0,
        epsilon_min: 0.0,
        memory_length: 100,
        seed: Some(7),
        ..AgentConfig::default()
    }
}

/// Online network prefers action 1; the target rates action 2 highest.
pub fn stub_agent(config: AgentConfig) -> DdqnAgent<StubApproximator> {
    DdqnAgent::new(
        config,
        StubApproximator::new(&[1.0, 5.0, 2.0, 0.0]),
        StubApproximator::new(&[10.0, 7.0, 30.0, 0.0]),
    )
    .unwrap()
}
