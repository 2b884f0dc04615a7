use crate::ClientError;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Idle,
    Connecting,
    Open,
    Closed,
}

impl ConnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnState::Idle => "idle",
            ConnState::Connecting => "connecting",
            ConnState::Open => "open",
            ConnState::Closed => "closed",
        }
    }
}

/// A transport event, tagged with the generation of the connection attempt
/// it originated from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnEvent {
    pub generation: u64,
    pub kind: ConnEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnEventKind {
    Opened,
    Frame(String),
    Closed(String),
}

/// An event that survived the generation gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Accepted {
    Opened,
    Frame(String),
    Closed { reason: String },
}

/// Owns the single logical connection: its state, its URL, and the
/// monotonically increasing generation counter used to discard events from
/// superseded connection attempts.
#[derive(Debug)]
pub struct ConnectionManager {
    state: ConnState,
    generation: u64,
    url: Option<String>,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            state: ConnState::Idle,
            generation: 0,
            url: None,
            outbound: None,
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Supersede any current connection and start a new attempt. Transitions
    /// to Connecting immediately and returns the new generation together with
    /// the outbound frame receiver the transport driver must consume.
    /// Dropping the previous outbound sender is what winds the old transport
    /// down; its remaining events carry a stale generation and are inert.
    pub fn connect(&mut self, url: &str) -> (u64, mpsc::UnboundedReceiver<String>) {
        if self.outbound.take().is_some() {
            info!(
                old_url = self.url.as_deref().unwrap_or(""),
                old_generation = self.generation,
                "superseding current connection"
            );
        }
        self.generation += 1;
        self.state = ConnState::Connecting;
        self.url = Some(url.to_string());
        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound = Some(tx);
        (self.generation, rx)
    }

    /// Close the current connection, if any, and return to Idle. Returns
    /// false (after logging) when there was nothing to close.
    pub fn disconnect(&mut self) -> bool {
        if self.state == ConnState::Idle {
            debug!("disconnect: no active connection");
            return false;
        }
        // cancel interest in anything the outgoing transport still emits
        self.generation += 1;
        self.outbound = None;
        self.state = ConnState::Idle;
        true
    }

    /// Gate an event on its generation, then apply it. Events from a
    /// superseded connection are discarded unconditionally, before any state
    /// mutation.
    pub fn apply(&mut self, event: ConnEvent) -> Option<Accepted> {
        if event.generation != self.generation {
            debug!(
                event_generation = event.generation,
                current_generation = self.generation,
                "discarding stale connection event"
            );
            return None;
        }
        match event.kind {
            ConnEventKind::Opened => {
                self.state = ConnState::Open;
                Some(Accepted::Opened)
            }
            ConnEventKind::Frame(text) => {
                if self.state != ConnState::Open {
                    debug!("dropping frame received while not open");
                    return None;
                }
                Some(Accepted::Frame(text))
            }
            ConnEventKind::Closed(reason) => {
                self.state = ConnState::Closed;
                self.outbound = None;
                Some(Accepted::Closed { reason })
            }
        }
    }

    /// Hand a frame to the transport. Only legal while Open; otherwise fails
    /// without any I/O.
    pub fn send(&mut self, frame: String) -> Result<(), ClientError> {
        if self.state != ConnState::Open {
            return Err(ClientError::NotConnected);
        }
        let outbound = self.outbound.as_ref().ok_or(ClientError::NotConnected)?;
        outbound
            .send(frame)
            .map_err(|_| ClientError::ChannelClosed)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
