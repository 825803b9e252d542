//! State → view projection
//!
//! The presenter holds no state of its own: every render is a pure
//! function of the current session state plus the latest output. Anything
//! that could diverge from the session lives in the session instead.

use crate::session::SessionState;
use serde::Serialize;

/// Latest renderable output, owned by the session
#[derive(Debug, Clone, Default)]
pub struct SessionOutput {
    /// Whether the transport channel is currently up
    pub connected: bool,

    /// Status line override (access errors, service errors, disconnects)
    pub status: Option<String>,

    /// Agent response text for the output panel
    pub response_text: Option<String>,

    /// Base64-encoded synthesized speech for the audio element (WAV)
    pub tts_audio: Option<String>,
}

/// Everything a front-end needs to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    /// Raw session state, for renderers that key off it directly
    pub state: SessionState,

    /// Record control
    pub control_icon: &'static str,
    pub control_label: &'static str,
    pub control_enabled: bool,
    /// Accessible pressed/unpressed state of the toggle
    pub control_pressed: bool,

    /// Status line
    pub status: String,
    pub connected: bool,

    /// Animations
    pub mic_pulse: bool,
    pub spinner_visible: bool,

    /// Output panels
    pub response_text: Option<String>,
    /// Source for the audio element; played back as a WAV-typed payload
    pub tts_audio: Option<String>,
}

/// Project session state and latest output into a view
pub fn project(state: SessionState, output: &SessionOutput) -> ViewState {
    let (icon, label) = match state {
        SessionState::Idle => ("mic", "Start recording"),
        SessionState::Recording => ("stop", "Stop recording"),
        SessionState::Processing => ("hourglass", "Processing"),
    };

    let status = output.status.clone().unwrap_or_else(|| {
        match state {
            SessionState::Idle => "Ready",
            SessionState::Recording => "Listening...",
            SessionState::Processing => "Processing...",
        }
        .to_string()
    });

    ViewState {
        state,
        control_icon: icon,
        control_label: label,
        control_enabled: state != SessionState::Processing,
        control_pressed: state == SessionState::Recording,
        status,
        connected: output.connected,
        mic_pulse: state == SessionState::Recording,
        spinner_visible: state == SessionState::Processing,
        response_text: output.response_text.clone(),
        tts_audio: output.tts_audio.clone(),
    }
}
