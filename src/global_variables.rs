use std::time::Duration;

// Signal timings
pub const YELLOW_DURATION: Duration = Duration::from_secs(3);
pub const GREEN_DURATION: Duration = Duration::from_secs(10);
// Longest phase a config file may ask for.
pub const MAX_PHASE_DURATION: Duration = Duration::from_secs(3600);

// Transition event fan-out
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

// Environment variable naming an optional JSON config file
pub const CONFIG_ENV_VAR: &str = "TLC_CONFIG";
