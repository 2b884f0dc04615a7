use serde_json::json;
use sidecar_client::connection::{ConnEvent, ConnEventKind, ConnState};
use sidecar_client::session::{Session, SessionUpdate};
use sidecar_core::wire::{decode_frame, Action, DEFAULT_MAX_FRAME_BYTES};
use sidecar_core::CategoryRegistry;

fn event(generation: u64, kind: ConnEventKind) -> ConnEvent {
    ConnEvent { generation, kind }
}

#[test]
fn full_lease_refresh_cycle_with_stale_suppression() {
    let (mut session, mut updates) = Session::new(CategoryRegistry::sidecar_default());
    assert_eq!(session.state(), ConnState::Idle);

    // attach to the devel relay; the transport acknowledges
    let (generation, mut outbound) = session.begin_connect("ws://localhost:10000/");
    assert_eq!(session.state(), ConnState::Connecting);
    session.handle_event(event(generation, ConnEventKind::Opened));
    assert_eq!(session.state(), ConnState::Open);

    // operator asks for the lease schedule
    session
        .publish("leases", Action::Request, "\"PLEASE\"")
        .expect("request sent");
    let frame = outbound.try_recv().expect("request reached the transport");
    let envelope = decode_frame(&frame, DEFAULT_MAX_FRAME_BYTES).expect("valid frame");
    assert_eq!(envelope.category, "leases");
    assert_eq!(envelope.action, Action::Request);
    assert_eq!(envelope.message, json!("PLEASE"));

    // the relay answers with the current schedule
    let info = concat!(
        r#"{"category":"leases","action":"info","message":"#,
        r#"[{"slicename":"s1","valid_from":"2024-01-01T00:00:00","#,
        r#""valid_until":"2024-01-02T00:00:00"}]}"#
    );
    session.handle_event(event(generation, ConnEventKind::Frame(info.to_string())));

    let entries = session.history("leases");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].payload[0]["slicename"], json!("s1"));
    assert_eq!(entries[0].payload[0]["valid_from"], json!("2024-01-01T00:00:00"));
    assert_eq!(entries[0].payload[0]["valid_until"], json!("2024-01-02T00:00:00"));

    // detach; anything the old socket still emits is a no-op
    session.disconnect();
    assert_eq!(session.state(), ConnState::Idle);
    session.handle_event(event(generation, ConnEventKind::Closed("late eof".into())));
    session.handle_event(event(
        generation,
        ConnEventKind::Frame(r#"{"category":"leases","action":"info","message":[]}"#.to_string()),
    ));
    assert_eq!(session.state(), ConnState::Idle);
    assert_eq!(session.history("leases").len(), 1, "history survives disconnect");

    // observed banner sequence
    let mut states = Vec::new();
    while let Ok(update) = updates.try_recv() {
        if let SessionUpdate::Status(status) = update {
            states.push(status.state);
        }
    }
    assert_eq!(
        states,
        vec![ConnState::Connecting, ConnState::Open, ConnState::Idle]
    );
}

#[test]
fn reconnect_to_a_second_relay_keeps_only_current_events() {
    let (mut session, _updates) = Session::new(CategoryRegistry::sidecar_default());

    let (stale, _outbound_a) = session.begin_connect("ws://relay-a:10000/");
    let (current, _outbound_b) = session.begin_connect("ws://relay-b:10000/");
    assert!(current > stale);

    session.handle_event(event(stale, ConnEventKind::Opened));
    assert_eq!(session.state(), ConnState::Connecting);

    session.handle_event(event(current, ConnEventKind::Opened));
    assert_eq!(session.state(), ConnState::Open);

    // data from the superseded socket never reaches the store
    session.handle_event(event(
        stale,
        ConnEventKind::Frame(r#"{"category":"pdus","action":"info","message":[{"id":1}]}"#.into()),
    ));
    assert!(session.history("pdus").is_empty());

    session.handle_event(event(
        current,
        ConnEventKind::Frame(r#"{"category":"pdus","action":"info","message":[{"id":2}]}"#.into()),
    ));
    let entries = session.history("pdus");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].payload, json!([{"id": 2}]));
}
