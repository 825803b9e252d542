use crate::config::CaptureConstraints;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from capture device acquisition and streaming
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No capture device available, or access to it was denied
    #[error("microphone unavailable: {0}")]
    Access(String),

    /// A capture source is already running
    #[error("capture already active")]
    AlreadyActive,

    /// Device-level failure after the stream was opened
    #[error("capture stream failed: {0}")]
    Stream(String),
}

/// One raw segment of captured audio (i16 PCM, interleaved)
///
/// Sequence position is implied by emission order; the segment is handed
/// to the encoder and discarded.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Raw audio samples
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Milliseconds since capture began
    pub timestamp_ms: u64,
}

impl AudioChunk {
    /// Little-endian PCM bytes, the form the wire encoding wraps
    pub fn pcm_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

/// Capture source abstraction
///
/// Implementations:
/// - `MicSource`: cpal microphone input
/// - test fakes driven by hand-fed chunks
#[async_trait::async_trait]
pub trait CaptureSource: Send {
    /// Acquire the device and begin periodic emission
    ///
    /// Returns a channel receiver that yields one `AudioChunk` per
    /// `interval` while the source is active. Device acquisition failure
    /// (no device, permission denied) surfaces as `CaptureError::Access`
    /// without the source becoming active.
    async fn begin(
        &mut self,
        constraints: &CaptureConstraints,
        interval: Duration,
    ) -> Result<mpsc::Receiver<AudioChunk>, CaptureError>;

    /// Stop emission and release the device; idempotent
    async fn halt(&mut self);

    /// Whether the source is currently capturing
    fn is_active(&self) -> bool;

    /// Source name for logging
    fn name(&self) -> &str;
}
