use crate::connection::ConnState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Neutral,
    Caution,
    Normal,
    Alarm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub state: ConnState,
    pub url: Option<String>,
    pub label: String,
    pub severity: Severity,
}

/// Pure projection from connection state to a human-readable banner. Callers
/// re-evaluate this on every accepted state change and on a periodic tick,
/// since some transports change readiness without a distinct event.
pub fn report(state: ConnState, url: Option<&str>) -> StatusUpdate {
    let shown = url.unwrap_or("(no url)");
    let (label, severity) = match state {
        ConnState::Idle => ("idle".to_string(), Severity::Neutral),
        ConnState::Connecting => (format!("connecting to {shown}"), Severity::Caution),
        ConnState::Open => (format!("connected to {shown}"), Severity::Normal),
        ConnState::Closed => (format!("connection closed to {shown}"), Severity::Alarm),
    };
    StatusUpdate {
        state,
        url: url.map(str::to_string),
        label,
        severity,
    }
}
