pub mod channel;
pub mod messages;
pub mod nats;

pub use channel::{TransportChannel, TransportEvent};
pub use messages::{EncodedChunkMessage, ErrorPayload, ReplyPayload};
pub use nats::NatsTransport;
