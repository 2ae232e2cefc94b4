use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::replay_buffer::{ReplayBuffer, Transition};

fn transition(i: usize) -> Transition {
    Transition {
        state: array![i as f32],
        action: i % 4,
        reward: i as f32,
        next_state: array![(i + 1) as f32],
        terminal: false,
    }
}

#[test]
fn test_replay_buffer_add_and_sample() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut replay_buffer = ReplayBuffer::new(10);
    let experience = transition(0);
    replay_buffer.append(experience.clone());
    assert_eq!(replay_buffer.len(), 1);
    let sample = replay_buffer.sample(1, &mut rng);
    assert_eq!(sample[0], &experience);
}

#[test]
fn test_replay_buffer_capacity() {
    let mut buffer = ReplayBuffer::new(3);

    for i in 0..5 {
        buffer.append(transition(i));
    }

    // Only the last 3 remain, oldest first
    assert_eq!(buffer.len(), 3);
    let states: Vec<f32> = buffer.iter().map(|t| t.state[0]).collect();
    assert_eq!(states, vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_replay_buffer_is_empty() {
    let mut buffer = ReplayBuffer::new(10);
    assert!(buffer.is_empty());
    buffer.append(transition(0));
    assert!(!buffer.is_empty());
    buffer.clear();
    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), 10);
}

#[test]
fn test_replay_buffer_sample_size() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut buffer = ReplayBuffer::new(10);
    for i in 0..5 {
        buffer.append(transition(i));
    }

    assert_eq!(buffer.sample(1, &mut rng).len(), 1);
    assert_eq!(buffer.sample(3, &mut rng).len(), 3);
    // Asking for more than stored returns everything
    assert_eq!(buffer.sample(28, &mut rng).len(), 5);
    assert!(buffer.sample(0, &mut rng).is_empty());
}

#[test]
fn test_sample_without_replacement() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut buffer = ReplayBuffer::new(8);
    for i in 0..8 {
        buffer.append(transition(i));
    }

    for _ in 0..20 {
        let mut states: Vec<f32> = buffer.sample(8, &mut rng).iter().map(|t| t.state[0]).collect();
        states.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(states, (0..8).map(|i| i as f32).collect::<Vec<_>>());
    }
}

#[test]
fn test_sample_empty_buffer() {
    let mut rng = StdRng::seed_from_u64(3);
    let buffer = ReplayBuffer::new(10);
    assert!(buffer.sample(28, &mut rng).is_empty());
}

#[test]
fn test_zero_capacity_stores_nothing() {
    let mut buffer = ReplayBuffer::new(0);
    buffer.append(transition(0));
    assert!(buffer.is_empty());
}
