//! Recording session state machine
//!
//! The core of the client: owns the recording lifecycle
//! (Idle → Recording → Processing → Idle), gates every transition, and is
//! the only writer of UI state. Asynchronous triggers (user intent,
//! captured chunks, service replies, transport lifecycle) arrive as typed
//! events on one ordered queue.

mod event;
mod machine;
mod state;

pub use event::SessionEvent;
pub use machine::{Session, SessionHandle};
pub use state::SessionState;
