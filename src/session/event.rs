use crate::capture::AudioChunk;
use crate::transport::{ErrorPayload, ReplyPayload, TransportEvent};

/// Typed triggers consumed by the session from one ordered queue
#[derive(Debug)]
pub enum SessionEvent {
    /// User pressed the record control while unpressed
    StartPressed,
    /// User pressed the record control while pressed
    StopPressed,
    /// Capture source emitted one raw segment
    ChunkCaptured(AudioChunk),
    /// Service reply arrived
    Reply(ReplyPayload),
    /// Service reported an error
    ServiceError(ErrorPayload),
    /// Transport channel (re)established
    Connected,
    /// Transport channel lost
    Disconnected,
    /// Capture source died without being halted (device loss, revoked access)
    CaptureLost,
}

impl From<TransportEvent> for SessionEvent {
    fn from(event: TransportEvent) -> Self {
        match event {
            TransportEvent::Connected => SessionEvent::Connected,
            TransportEvent::Disconnected => SessionEvent::Disconnected,
            TransportEvent::Reply(reply) => SessionEvent::Reply(reply),
            TransportEvent::Error(err) => SessionEvent::ServiceError(err),
        }
    }
}
