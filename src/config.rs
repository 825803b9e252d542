use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Constraints passed to capture device acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConstraints {
    /// Sample rate in Hz (16kHz is what the agent's STT expects)
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz mono for STT
            channels: 1,
        }
    }
}

/// Client options, fixed at build time
///
/// There is deliberately no config file, CLI surface, or environment
/// lookup behind these; callers construct them in code.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Unique session identifier (e.g., "session-<uuid>")
    pub session_id: String,

    /// Emission cadence of the capture source: one chunk per interval
    pub chunk_interval: Duration,

    /// Constraints passed to capture device acquisition
    pub constraints: CaptureConstraints,

    /// NATS server URL
    pub server_url: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            chunk_interval: Duration::from_millis(1000), // ~1s chunks
            constraints: CaptureConstraints::default(),
            server_url: "nats://localhost:4222".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chunk_interval_is_one_second() {
        let opts = ClientOptions::default();
        assert_eq!(opts.chunk_interval, Duration::from_millis(1000));
    }

    #[test]
    fn default_constraints_are_16k_mono() {
        let constraints = CaptureConstraints::default();
        assert_eq!(constraints.sample_rate, 16000);
        assert_eq!(constraints.channels, 1);
    }
}
