use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

/// Weight initialization strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightInit {
    /// Xavier/Glorot uniform initialization
    XavierUniform,

    /// Uniform distribution with custom range
    Uniform { min: f32, max: f32 },
}

impl WeightInit {
    /// Initialize a `(fan_in, fan_out)` weight matrix, drawing from `rng`
    pub fn initialize_weights<R: Rng + ?Sized>(&self, shape: (usize, usize), rng: &mut R) -> Array2<f32> {
        let (fan_in, fan_out) = shape;

        match self {
            WeightInit::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }
            WeightInit::Uniform { min, max } => {
                Array2::random_using(shape, Uniform::new_inclusive(*min, *max), rng)
            }
        }
    }

    /// Biases always start at zero
    pub fn initialize_biases(&self, size: usize) -> Array1<f32> {
        Array1::zeros(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xavier_bounds() {
        let w = WeightInit::XavierUniform.initialize_weights((6, 20), &mut rand::thread_rng());
        let limit = (6.0f32 / 26.0).sqrt();
        assert_eq!(w.dim(), (6, 20));
        assert!(w.iter().all(|v| v.abs() <= limit));
    }

    #[test]
    fn test_uniform_range() {
        let w = WeightInit::Uniform { min: -0.05, max: 0.05 }.initialize_weights((20, 20), &mut rand::thread_rng());
        assert!(w.iter().all(|v| (-0.05..=0.05).contains(v)));
    }

    #[test]
    fn test_seeded_draws_repeat() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let a = WeightInit::XavierUniform.initialize_weights((5, 20), &mut StdRng::seed_from_u64(42));
        let b = WeightInit::XavierUniform.initialize_weights((5, 20), &mut StdRng::seed_from_u64(42));
        let c = WeightInit::XavierUniform.initialize_weights((5, 20), &mut StdRng::seed_from_u64(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
