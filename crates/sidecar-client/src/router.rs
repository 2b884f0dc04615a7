use serde_json::Value;
use sidecar_core::wire::{decode_frame, Action, FrameError, DEFAULT_MAX_FRAME_BYTES};
use sidecar_core::{CategoryRegistry, HistoryStore};
use std::sync::Arc;
use thiserror::Error;

/// Outcome of routing one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// An info payload was retained; subscribers should be notified.
    Stored { category: String, payload: Value },
    /// Requests are outbound-only from this client; inbound ones are ignored.
    IgnoredRequest { category: String },
}

/// Both variants are non-fatal: the frame is dropped and the connection
/// stays open.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error(transparent)]
    Parse(#[from] FrameError),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// Decodes inbound frames and dispatches them to the history store, strictly
/// in delivery order.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    registry: Arc<CategoryRegistry>,
    max_frame_bytes: usize,
}

impl MessageRouter {
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self {
            registry,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    pub fn route(&self, raw: &str, history: &mut HistoryStore) -> Result<Routed, RouteError> {
        let envelope = decode_frame(raw, self.max_frame_bytes)?;
        if !self.registry.contains(&envelope.category) {
            return Err(RouteError::UnknownCategory(envelope.category));
        }
        match envelope.action {
            Action::Info => {
                history
                    .append(&envelope.category, envelope.message.clone())
                    .map_err(|err| RouteError::UnknownCategory(err.0))?;
                Ok(Routed::Stored {
                    category: envelope.category,
                    payload: envelope.message,
                })
            }
            Action::Request => Ok(Routed::IgnoredRequest {
                category: envelope.category,
            }),
        }
    }
}
