pub mod connection;
pub mod router;
pub mod sender;
pub mod session;
pub mod status;
pub mod transport;

use thiserror::Error;

pub use connection::{ConnEvent, ConnEventKind, ConnState, ConnectionManager};
pub use router::{MessageRouter, RouteError, Routed};
pub use sender::OutboundSender;
pub use session::{Session, SessionUpdate};
pub use status::{Severity, StatusUpdate};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected")]
    NotConnected,
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error(transparent)]
    Frame(#[from] sidecar_core::FrameError),
    #[error("connection channel closed")]
    ChannelClosed,
}
