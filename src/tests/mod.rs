// Test modules for the agent, replay memory and per-connection state machine
pub mod stub;
pub mod test_replay_buffer;
