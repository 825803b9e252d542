use serde::Serialize;

/// The three states of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the user to start capture
    Idle,
    /// Capture source active, chunks streaming out
    Recording,
    /// Utterance complete, waiting for the service reply
    Processing,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Recording => write!(f, "Recording"),
            SessionState::Processing => write!(f, "Processing"),
        }
    }
}
