use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{PongError, Result};
use crate::layers::{DenseLayer, WeightInit};
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// Trainable parameters of a [`NeuralNetwork`], one `(weights, biases)` pair per layer.
///
/// This is what gets copied from the online network into the target network and what is
/// written to a weight file. Optimizer state is not included.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NetworkWeights {
    pub layers: Vec<(Array2<f32>, Array1<f32>)>,
}

impl NetworkWeights {
    /// Layer shapes as `(fan_in, fan_out)`
    pub fn shapes(&self) -> Vec<(usize, usize)> {
        self.layers.iter().map(|(w, _)| w.dim()).collect()
    }
}

/// A feed-forward network of dense layers with an optimizer for minibatch regression.
#[derive(Serialize, Deserialize, Clone)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
}

impl NeuralNetwork {
    /// Create a new neural network with the given layer sizes, activations, and optimizer.
    ///
    /// `layer_sizes` lists the input width followed by every layer's output width, so
    /// `activations` must be one shorter.
    pub fn new(layer_sizes: &[usize], activations: &[Activation], optimizer: OptimizerWrapper) -> Result<Self> {
        let inits = vec![WeightInit::XavierUniform; activations.len()];
        Self::with_inits(layer_sizes, activations, &inits, optimizer, &mut rand::thread_rng())
    }

    /// Like [`NeuralNetwork::new`] with one initializer per layer; weights are drawn from `rng`.
    pub fn with_inits<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        inits: &[WeightInit],
        optimizer: OptimizerWrapper,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(PongError::invalid_parameter(
                "layer_sizes",
                "Network must have at least input and output layers",
            ));
        }
        if layer_sizes.len() - 1 != activations.len() || activations.len() != inits.len() {
            return Err(PongError::dimension_mismatch(
                format!("{} activations and initializers", layer_sizes.len() - 1),
                format!("{} activations, {} initializers", activations.len(), inits.len()),
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter().zip(inits))
            .map(|(window, (&activation, &init))| {
                DenseLayer::new_with_init(window[0], window[1], activation, init, &mut *rng)
            })
            .collect();

        Ok(NeuralNetwork { layers, optimizer })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.output_size()).unwrap_or(0)
    }

    /// Inference for a single input vector.
    pub fn predict(&self, input: ArrayView1<f32>) -> Array1<f32> {
        let output = self.predict_batch(input.insert_axis(Axis(0)));
        output.index_axis_move(Axis(0), 0)
    }

    /// Inference for a batch of inputs, one per row. Does not touch training caches.
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &self.layers {
            current_output = layer.infer_batch(current_output.view());
        }
        current_output
    }

    fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        current_output
    }

    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Vec<(Array2<f32>, Array1<f32>)> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer.backward_batch(current_error.view());
            gradients.push((weight_gradients, bias_gradients));
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        gradients
    }

    /// One gradient step of mean-squared-error regression towards `targets`.
    ///
    /// Returns the loss measured before the update. Gradients are averaged over the batch.
    pub fn train_minibatch(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>, learning_rate: f32) -> Result<f32> {
        if inputs.nrows() != targets.nrows() || targets.ncols() != self.output_size() {
            return Err(PongError::dimension_mismatch(
                format!("targets of shape ({}, {})", inputs.nrows(), self.output_size()),
                format!("{:?}", targets.shape()),
            ));
        }
        if inputs.ncols() != self.input_size() {
            return Err(PongError::dimension_mismatch(
                format!("inputs with {} columns", self.input_size()),
                format!("{:?}", inputs.shape()),
            ));
        }

        let outputs = self.forward_batch(inputs);
        let diff = &outputs - &targets;
        let loss = diff.mapv(|x| x * x).mean().unwrap_or(0.0);

        let scale = 2.0 / (diff.len().max(1) as f32);
        let output_errors = diff * scale;
        let gradients = self.backward_batch(output_errors.view());

        for (i, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            self.optimizer.update_weights(i, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(i, &mut layer.biases, &bias_gradients, learning_rate);
            layer.clear_cache();
        }
        self.optimizer.finish_step();

        Ok(loss)
    }

    pub fn weights(&self) -> NetworkWeights {
        NetworkWeights {
            layers: self.layers.iter().map(|l| (l.weights.clone(), l.biases.clone())).collect(),
        }
    }

    /// Replace every layer's parameters; shapes must match exactly.
    pub fn set_weights(&mut self, weights: NetworkWeights) -> Result<()> {
        let expected: Vec<(usize, usize)> = self.layers.iter().map(|l| l.weights.dim()).collect();
        let bias_ok = self.layers.iter().zip(&weights.layers).all(|(l, (_, b))| l.biases.len() == b.len());
        if weights.shapes() != expected || !bias_ok {
            return Err(PongError::dimension_mismatch(
                format!("{:?}", expected),
                format!("{:?}", weights.shapes()),
            ));
        }

        for (layer, (w, b)) in self.layers.iter_mut().zip(weights.layers) {
            layer.weights = w;
            layer.biases = b;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::SGD;
    use ndarray::array;

    fn small_network() -> NeuralNetwork {
        NeuralNetwork::new(
            &[2, 4, 2],
            &[Activation::Relu, Activation::Linear],
            OptimizerWrapper::SGD(SGD::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_mismatched_activations() {
        let result = NeuralNetwork::new(&[2, 4, 2], &[Activation::Relu], OptimizerWrapper::SGD(SGD::new()));
        assert!(matches!(result, Err(PongError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_predict_shape() {
        let network = small_network();
        assert_eq!(network.predict(array![0.1, 0.2].view()).len(), 2);
        assert_eq!(network.predict_batch(array![[0.1, 0.2], [0.3, 0.4]].view()).dim(), (2, 2));
    }

    #[test]
    fn test_training_reduces_loss() {
        let mut network = small_network();
        let x = array![[0.5, -0.5], [1.0, 0.25]];
        let y = array![[1.0, -1.0], [0.5, 0.0]];
        let first = network.train_minibatch(x.view(), y.view(), 0.05).unwrap();
        let mut last = first;
        for _ in 0..200 {
            last = network.train_minibatch(x.view(), y.view(), 0.05).unwrap();
        }
        assert!(last < first);
    }

    #[test]
    fn test_set_weights_shape_check() {
        let mut network = small_network();
        let other = NeuralNetwork::new(
            &[3, 4, 2],
            &[Activation::Relu, Activation::Linear],
            OptimizerWrapper::SGD(SGD::new()),
        )
        .unwrap();
        assert!(network.set_weights(other.weights()).is_err());

        let mut copy = small_network();
        copy.set_weights(network.weights()).unwrap();
        assert_eq!(copy.weights(), network.weights());
    }
}
