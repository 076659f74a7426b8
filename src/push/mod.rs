//! Server push channel (Socket.IO over WebSocket) delivering conversion
//! progress.

mod channel;
pub mod frame;

pub use channel::{PushEvent, PushHandle, connect};
