use rand::Rng;

use crate::config::AgentConfig;

/// Exploration rate with a warm-up phase followed by floored geometric decay.
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonSchedule {
    epsilon: f32,
    epsilon_min: f32,
    epsilon_decay: f32,
    epsilon_delay: u64,
}

impl EpsilonSchedule {
    pub fn new(epsilon: f32, epsilon_min: f32, epsilon_decay: f32, epsilon_delay: u64) -> Self {
        EpsilonSchedule {
            epsilon,
            epsilon_min,
            epsilon_decay,
            epsilon_delay,
        }
    }

    /// A rate that never changes, used when evaluating trained agents
    pub fn fixed(epsilon: f32) -> Self {
        Self::new(epsilon, epsilon, 1.0, u64::MAX)
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.epsilon, config.epsilon_min, config.epsilon_decay, config.epsilon_delay)
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn epsilon_min(&self) -> f32 {
        self.epsilon_min
    }

    /// Decay once if `frame_count` is past the warm-up delay and epsilon is above the floor.
    pub fn decay_step(&mut self, frame_count: u64) {
        if frame_count > self.epsilon_delay && self.epsilon > self.epsilon_min {
            self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
        }
    }

    /// Uniform random action with probability epsilon, otherwise `greedy`.
    pub fn sample_action<R: Rng + ?Sized>(&self, action_size: usize, greedy: usize, rng: &mut R) -> usize {
        if action_size > 0 && rng.gen::<f32>() < self.epsilon {
            rng.gen_range(0..action_size)
        } else {
            greedy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_no_decay_during_warm_up() {
        let mut schedule = EpsilonSchedule::new(1.0, 0.05, 0.5, 10);
        for frame in 0..=10 {
            schedule.decay_step(frame);
        }
        assert_eq!(schedule.epsilon(), 1.0);
        schedule.decay_step(11);
        assert_eq!(schedule.epsilon(), 0.5);
    }

    #[test]
    fn test_decay_floors_at_minimum() {
        let mut schedule = EpsilonSchedule::new(0.1, 0.05, 0.3, 0);
        schedule.decay_step(1);
        assert_eq!(schedule.epsilon(), 0.05);
        schedule.decay_step(2);
        assert_eq!(schedule.epsilon(), 0.05);
    }

    #[test]
    fn test_fixed_schedule_never_moves() {
        let mut schedule = EpsilonSchedule::fixed(0.1);
        schedule.decay_step(u64::MAX - 1);
        assert_eq!(schedule.epsilon(), 0.1);
    }

    #[test]
    fn test_sample_action_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        let greedy = EpsilonSchedule::fixed(0.0);
        assert!((0..100).all(|_| greedy.sample_action(4, 2, &mut rng) == 2));

        let random = EpsilonSchedule::fixed(1.0);
        let picks: Vec<usize> = (0..200).map(|_| random.sample_action(4, 2, &mut rng)).collect();
        assert!(picks.iter().all(|&a| a < 4));
        assert!(picks.iter().any(|&a| a != 2));
    }
}
