//! # Function Approximators
//!
//! The DDQN agent only ever talks to its networks through [`FunctionApproximator`]. Anything
//! that can predict action-values, regress towards target rows and hand its weights around
//! can back an agent; [`QNetwork`] is the dense network used by the game drivers.

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activations::Activation;
use crate::config::AgentConfig;
use crate::error::Result;
use crate::layers::WeightInit;
use crate::network::{NetworkWeights, NeuralNetwork};
use crate::optimizer::{Adam, OptimizerWrapper};

/// Action-value model with weight transfer and persistence.
pub trait FunctionApproximator {
    /// Parameter snapshot exchanged by `weights`/`set_weights`
    type Weights: Clone;

    /// Action-values for a single state
    fn predict(&self, state: ArrayView1<f32>) -> Array1<f32>;

    /// Action-values for a batch of states, one per row
    fn predict_batch(&self, states: ArrayView2<f32>) -> Array2<f32> {
        let rows: Vec<Array1<f32>> = states.outer_iter().map(|s| self.predict(s)).collect();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut out = Array2::zeros((rows.len(), width));
        for (mut dst, src) in out.outer_iter_mut().zip(rows) {
            dst.assign(&src);
        }
        out
    }

    /// One regression pass over `(states, targets)`; returns the batch loss
    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32>;

    fn weights(&self) -> Self::Weights;

    fn set_weights(&mut self, weights: Self::Weights) -> Result<()>;

    fn load(&mut self, path: &Path) -> Result<()>;

    fn save(&self, path: &Path) -> Result<()>;
}

/// Dense Q-network: `state -> 20 relu -> 20 relu -> actions linear`, trained with Adam on MSE.
#[derive(Clone)]
pub struct QNetwork {
    network: NeuralNetwork,
    learning_rate: f32,
}

impl QNetwork {
    pub fn new(
        state_size: usize,
        hidden: &[usize],
        action_size: usize,
        learning_rate: f32,
    ) -> Result<Self> {
        Self::new_using(state_size, hidden, action_size, learning_rate, &mut rand::thread_rng())
    }

    /// Same as [`QNetwork::new`] with initial weights drawn from `rng`.
    pub fn new_using<R: Rng + ?Sized>(
        state_size: usize,
        hidden: &[usize],
        action_size: usize,
        learning_rate: f32,
        rng: &mut R,
    ) -> Result<Self> {
        let mut sizes = Vec::with_capacity(hidden.len() + 2);
        sizes.push(state_size);
        sizes.extend_from_slice(hidden);
        sizes.push(action_size);

        let mut activations = vec![Activation::Relu; hidden.len()];
        activations.push(Activation::Linear);

        // first and output layers use Glorot, deeper hidden layers a small uniform range
        let inits: Vec<WeightInit> = (0..activations.len())
            .map(|i| {
                if i == 0 || i == activations.len() - 1 {
                    WeightInit::XavierUniform
                } else {
                    WeightInit::Uniform { min: -0.05, max: 0.05 }
                }
            })
            .collect();

        let optimizer = OptimizerWrapper::Adam(Adam::default());
        let network = NeuralNetwork::with_inits(&sizes, &activations, &inits, optimizer, rng)?;
        Ok(QNetwork { network, learning_rate })
    }

    /// Build from agent settings; a configured seed makes the initial weights reproducible.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new_using(
            config.state_size,
            &config.hidden_layers,
            config.action_size,
            config.learning_rate,
            &mut rng,
        )
    }

    pub fn network(&self) -> &NeuralNetwork {
        &self.network
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

impl FunctionApproximator for QNetwork {
    type Weights = NetworkWeights;

    fn predict(&self, state: ArrayView1<f32>) -> Array1<f32> {
        self.network.predict(state)
    }

    fn predict_batch(&self, states: ArrayView2<f32>) -> Array2<f32> {
        self.network.predict_batch(states)
    }

    fn fit(&mut self, states: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        if states.len_of(Axis(0)) == 0 {
            return Ok(0.0);
        }
        self.network.train_minibatch(states, targets, self.learning_rate)
    }

    fn weights(&self) -> NetworkWeights {
        self.network.weights()
    }

    fn set_weights(&mut self, weights: NetworkWeights) -> Result<()> {
        self.network.set_weights(weights)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let data = fs::read(path)?;
        let weights: NetworkWeights = bincode::deserialize(&data)?;
        self.network.set_weights(weights)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let serialized = bincode::serialize(&self.network.weights())?;
        fs::write(path, serialized)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PongError;
    use ndarray::array;

    #[test]
    fn test_qnetwork_layout() {
        let q = QNetwork::new(5, &[20, 20], 4, 0.0005).unwrap();
        assert_eq!(q.weights().shapes(), vec![(5, 20), (20, 20), (20, 4)]);
        assert_eq!(q.predict(array![0.1, 0.2, 0.3, 0.4, 0.5].view()).len(), 4);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a1w_ep1.bin");

        let q = QNetwork::new(5, &[20, 20], 4, 0.0005).unwrap();
        q.save(&path).unwrap();

        let mut restored = QNetwork::new(5, &[20, 20], 4, 0.0005).unwrap();
        assert_ne!(restored.weights(), q.weights());
        restored.load(&path).unwrap();
        assert_eq!(restored.weights(), q.weights());
    }

    #[test]
    fn test_load_rejects_wrong_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.bin");
        QNetwork::new(6, &[20, 20], 4, 0.0005).unwrap().save(&path).unwrap();

        let mut q = QNetwork::new(5, &[20, 20], 4, 0.0005).unwrap();
        assert!(matches!(q.load(&path), Err(PongError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let mut q = QNetwork::new(5, &[20, 20], 4, 0.0005).unwrap();
        let err = q.load(Path::new("/nonexistent/weights.bin")).unwrap_err();
        assert!(matches!(err, PongError::Io(_)));
    }

    #[test]
    fn test_seed_fixes_initial_weights() {
        let config = AgentConfig {
            seed: Some(42),
            ..AgentConfig::default()
        };
        let a = QNetwork::from_config(&config).unwrap();
        let b = QNetwork::from_config(&config).unwrap();
        assert_eq!(a.weights(), b.weights());

        let other = QNetwork::from_config(&AgentConfig {
            seed: Some(43),
            ..AgentConfig::default()
        })
        .unwrap();
        assert_ne!(a.weights(), other.weights());
    }

    #[test]
    fn test_empty_fit_is_noop() {
        let mut q = QNetwork::new(5, &[20, 20], 4, 0.0005).unwrap();
        let before = q.weights();
        let loss = q.fit(Array2::zeros((0, 5)).view(), Array2::zeros((0, 4)).view()).unwrap();
        assert_eq!(loss, 0.0);
        assert_eq!(q.weights(), before);
    }
}
