use crate::connection::{ConnEvent, ConnEventKind};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Drive one WebSocket connection attempt. Every event is tagged with the
/// generation handed out by the manager; once the manager moves on, these
/// events fail its generation gate and the dropped outbound sender makes
/// `outbound.recv()` yield None, which winds this task down.
pub async fn run(
    url: String,
    generation: u64,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<ConnEvent>,
) {
    let emit = move |kind: ConnEventKind| {
        let _ = events.send(ConnEvent { generation, kind });
    };

    let (mut ws, _) = match connect_async(url.as_str()).await {
        Ok(value) => value,
        Err(err) => {
            warn!(%url, generation, "connect failed: {err}");
            emit(ConnEventKind::Closed(err.to_string()));
            return;
        }
    };
    emit(ConnEventKind::Opened);

    loop {
        tokio::select! {
            inbound = ws.next() => match inbound {
                Some(Ok(Message::Text(text))) => emit(ConnEventKind::Frame(text)),
                Some(Ok(Message::Close(_))) | None => {
                    emit(ConnEventKind::Closed("closed by peer".to_string()));
                    break;
                }
                // pings are answered by tungstenite; binary frames are not
                // part of the protocol
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    emit(ConnEventKind::Closed(err.to_string()));
                    break;
                }
            },
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if let Err(err) = ws.send(Message::Text(frame)).await {
                        emit(ConnEventKind::Closed(err.to_string()));
                        break;
                    }
                }
                None => {
                    debug!(%url, generation, "transport superseded, closing");
                    let _ = ws.close(None).await;
                    break;
                }
            },
        }
    }
}
