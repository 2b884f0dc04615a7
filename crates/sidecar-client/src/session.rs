use crate::connection::{Accepted, ConnEvent, ConnState, ConnectionManager};
use crate::router::{MessageRouter, RouteError, Routed};
use crate::sender::OutboundSender;
use crate::status::{report, StatusUpdate};
use crate::{transport, ClientError};
use serde_json::Value;
use sidecar_core::wire::Action;
use sidecar_core::{CategoryRegistry, HistoryEntry, HistoryStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Cadence of the defensive status poll, layered on top of the event-driven
/// path.
pub const STATUS_TICK: Duration = Duration::from_secs(1);

/// What the UI collaborator sees: status-banner changes and retained
/// category payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Status(StatusUpdate),
    Category { category: String, payload: Value },
}

/// One dashboard session: the connection manager, the category table, the
/// bounded history, and the single consumer of transport events. Constructed
/// by the caller and passed around explicitly; several sessions can coexist.
pub struct Session {
    manager: ConnectionManager,
    registry: Arc<CategoryRegistry>,
    history: HistoryStore,
    router: MessageRouter,
    sender: OutboundSender,
    events_tx: mpsc::UnboundedSender<ConnEvent>,
    events_rx: mpsc::UnboundedReceiver<ConnEvent>,
    updates: mpsc::UnboundedSender<SessionUpdate>,
}

impl Session {
    pub fn new(registry: CategoryRegistry) -> (Self, mpsc::UnboundedReceiver<SessionUpdate>) {
        let registry = Arc::new(registry);
        let history = HistoryStore::new(&registry);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let session = Self {
            manager: ConnectionManager::new(),
            history,
            router: MessageRouter::new(registry.clone()),
            sender: OutboundSender::new(registry.clone()),
            registry,
            events_tx,
            events_rx,
            updates: updates_tx,
        };
        (session, updates_rx)
    }

    pub fn state(&self) -> ConnState {
        self.manager.state()
    }

    pub fn generation(&self) -> u64 {
        self.manager.generation()
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn history(&self, category: &str) -> Vec<HistoryEntry> {
        self.history.get(category)
    }

    pub fn clear_history(&mut self, category: Option<&str>) {
        match category {
            Some(category) => self.history.clear(category),
            None => self.history.clear_all(),
        }
    }

    /// Start a new connection attempt without spawning the WebSocket driver.
    /// The caller owns the outbound frame receiver; `connect` wires it to the
    /// real transport, tests stand in for it.
    pub fn begin_connect(&mut self, url: &str) -> (u64, mpsc::UnboundedReceiver<String>) {
        let (generation, outbound) = self.manager.connect(url);
        info!(%url, generation, "connecting");
        self.emit_status();
        (generation, outbound)
    }

    /// Supersede any current connection and attach to the relay at `url`.
    pub fn connect(&mut self, url: &str) {
        let (generation, outbound) = self.begin_connect(url);
        tokio::spawn(transport::run(
            url.to_string(),
            generation,
            outbound,
            self.events_tx.clone(),
        ));
    }

    pub fn disconnect(&mut self) {
        if self.manager.disconnect() {
            info!("disconnected");
            self.emit_status();
        }
    }

    /// Validate, encode and transmit an operator command. Send failures are
    /// returned to the caller, never swallowed.
    pub fn publish(
        &mut self,
        category: &str,
        action: Action,
        raw_text: &str,
    ) -> Result<(), ClientError> {
        let envelope = self.sender.build(category, action, raw_text)?;
        let frame = self.sender.encode(&envelope)?;
        self.manager.send(frame)?;
        info!(%category, action = action.as_str(), "published");
        Ok(())
    }

    /// Ask the relay to rebroadcast a category's current contents.
    pub fn request_refresh(&mut self, category: &str) -> Result<(), ClientError> {
        let envelope = self.sender.build_refresh(category)?;
        let frame = self.sender.encode(&envelope)?;
        self.manager.send(frame)?;
        info!(%category, "refresh requested");
        Ok(())
    }

    /// Where transport events come in; exposed so alternative drivers can
    /// feed the same single-consumer channel.
    pub fn events_sender(&self) -> mpsc::UnboundedSender<ConnEvent> {
        self.events_tx.clone()
    }

    pub async fn next_event(&mut self) -> Option<ConnEvent> {
        self.events_rx.recv().await
    }

    /// Gate on generation, then dispatch. Frames are handled strictly in the
    /// order this is called.
    pub fn handle_event(&mut self, event: ConnEvent) {
        match self.manager.apply(event) {
            None => {}
            Some(Accepted::Opened) => {
                info!(url = self.manager.url().unwrap_or(""), "connection open");
                self.emit_status();
            }
            Some(Accepted::Closed { reason }) => {
                warn!(%reason, "connection closed");
                self.emit_status();
            }
            Some(Accepted::Frame(text)) => self.handle_frame(&text),
        }
    }

    /// The defensive poll: re-emit current status even without a transition.
    pub fn poll_status(&mut self) {
        self.emit_status();
    }

    /// Consume transport events and the status tick until the session is
    /// dropped externally. Commands still work between events through the
    /// owning task.
    pub async fn run(&mut self) {
        let mut ticker = tokio::time::interval(STATUS_TICK);
        loop {
            tokio::select! {
                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = ticker.tick() => self.poll_status(),
            }
        }
    }

    fn handle_frame(&mut self, raw: &str) {
        match self.router.route(raw, &mut self.history) {
            Ok(Routed::Stored { category, payload }) => {
                debug!(%category, "stored info payload");
                let _ = self.updates.send(SessionUpdate::Category { category, payload });
            }
            Ok(Routed::IgnoredRequest { category }) => {
                debug!(%category, "ignoring inbound request");
            }
            Err(RouteError::Parse(err)) => {
                warn!("dropping malformed frame: {err}");
            }
            Err(RouteError::UnknownCategory(category)) => {
                warn!(%category, "dropping frame for unknown category");
            }
        }
    }

    fn emit_status(&mut self) {
        let update = report(self.manager.state(), self.manager.url());
        let _ = self.updates.send(SessionUpdate::Status(update));
    }
}
