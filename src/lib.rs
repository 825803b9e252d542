pub mod capture;
pub mod config;
pub mod encode;
pub mod session;
pub mod transport;
pub mod ui;

pub use capture::{AudioChunk, CaptureError, CaptureSource, MicSource};
pub use config::{CaptureConstraints, ClientOptions};
pub use session::{Session, SessionEvent, SessionHandle, SessionState};
pub use transport::{
    EncodedChunkMessage, ErrorPayload, NatsTransport, ReplyPayload, TransportChannel,
    TransportEvent,
};
pub use ui::{SessionOutput, ViewState};
