#[cfg(test)]
mod property_tests {
    use ndarray::array;
    use proptest::prelude::*;
    use pong_ddqn::agent::EpsilonSchedule;
    use pong_ddqn::protocol::{GameFrame, BALL_FIELDS};
    use pong_ddqn::replay_buffer::{ReplayBuffer, Transition};

    fn transition(i: usize) -> Transition {
        Transition {
            state: array![i as f32],
            action: 0,
            reward: 0.0,
            next_state: array![i as f32 + 1.0],
            terminal: false,
        }
    }

    // Strategy for generating paddle positions for one or two agents
    fn paddles_strategy() -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(0.0f32..1.0, 1..=2)
    }

    proptest! {
        #[test]
        fn test_buffer_keeps_newest_entries(capacity in 1usize..64, appends in 0usize..200) {
            let mut buffer = ReplayBuffer::new(capacity);
            for i in 0..appends {
                buffer.append(transition(i));
            }

            prop_assert_eq!(buffer.len(), appends.min(capacity));
            let first = appends.saturating_sub(capacity);
            let states: Vec<f32> = buffer.iter().map(|t| t.state[0]).collect();
            let expected: Vec<f32> = (first..appends).map(|i| i as f32).collect();
            prop_assert_eq!(states, expected);
        }

        #[test]
        fn test_epsilon_is_monotone_and_floored(
            start in 0.05f32..=1.0,
            floor in 0.0f32..0.05,
            decay in 0.5f32..=1.0,
            delay in 0u64..50,
        ) {
            let mut schedule = EpsilonSchedule::new(start, floor, decay, delay);
            let mut last = schedule.epsilon();
            for frame in 1..200u64 {
                schedule.decay_step(frame);
                prop_assert!(schedule.epsilon() <= last);
                prop_assert!(schedule.epsilon() >= floor);
                if frame <= delay {
                    prop_assert_eq!(schedule.epsilon(), start);
                }
                last = schedule.epsilon();
            }
        }

        #[test]
        fn test_state_rotation_puts_own_paddle_first(paddles in paddles_strategy()) {
            let n = paddles.len();
            let frame = GameFrame {
                ball: [0.5, 1.0, 0.5, 1.0],
                paddles: paddles.clone(),
                rewards: vec![0.0; n],
                terminal: false,
            };

            for agent in 0..n {
                let state = frame.state_for(agent);
                prop_assert_eq!(state.len(), BALL_FIELDS + n);
                prop_assert_eq!(state[BALL_FIELDS], paddles[agent]);

                let mut seen: Vec<f32> = state.iter().skip(BALL_FIELDS).copied().collect();
                let mut all = paddles.clone();
                seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
                all.sort_by(|a, b| a.partial_cmp(b).unwrap());
                prop_assert_eq!(seen, all);
            }
        }

        #[test]
        fn test_decoder_never_panics(payload in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = GameFrame::decode(&payload, 1);
            let _ = GameFrame::decode(&payload, 2);
        }
    }
}
