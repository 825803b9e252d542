use super::messages::{EncodedChunkMessage, ErrorPayload, ReplyPayload};
use anyhow::Result;

/// Inbound event from the transport, dispatched into the session
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Channel (re)established
    Connected,
    /// Channel lost; the library handles reconnection on its own
    Disconnected,
    /// `audio_reply` from the service
    Reply(ReplyPayload),
    /// `error` from the service
    Error(ErrorPayload),
}

/// Outbound contract over the persistent bidirectional channel
///
/// All sends are fire-and-forget: no delivery confirmation, no retry. A
/// dropped chunk degrades transcription quality but never fails the
/// session.
#[async_trait::async_trait]
pub trait TransportChannel: Send + Sync {
    /// Emit one `audio_chunk` message
    async fn send_chunk(&self, msg: EncodedChunkMessage) -> Result<()>;

    /// Emit the `end_audio` end-of-utterance signal
    async fn send_end_of_utterance(&self) -> Result<()>;
}
