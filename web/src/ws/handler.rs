use crate::error::Result;
use crate::extractors::handshake::Handshake;
use crate::ws::frame::{ClientFrame, ErrorReason, ServerFrame};
use crate::AppState;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use log::*;
use relay::{ChannelSink, Error as RelayError, Outbound, OutboundSink, Session};
use tokio::sync::mpsc;

/// WebSocket endpoint. The connection is authenticated and registered before
/// the upgrade completes; a handshake without an identity gets 401 instead.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    Handshake(handshake): Handshake,
    State(app_state): State<AppState>,
) -> Result<Response> {
    let (sink, outbound) = app_state.relay.config().channel();
    let notices = sink.clone();

    let session = app_state.relay.open_session(&handshake, sink)?;
    debug!(
        "Upgrading connection {} for {}",
        session.id(),
        session.identity()
    );

    // If the upgrade never happens the closure, and with it the session, is
    // dropped, which deregisters the connection.
    Ok(ws.on_upgrade(move |socket| run_session(socket, session, notices, outbound)))
}

async fn run_session(
    socket: WebSocket,
    session: Session,
    notices: ChannelSink,
    mut outbound: mpsc::Receiver<Outbound>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Drains this connection's queue. Ends once every sender is gone, which
    // happens after the session below is dropped.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = ws_tx.send(WsMessage::Text(frame.as_str().to_owned())).await {
                debug!("WebSocket write failed: {e}");
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    while let Some(message) = ws_rx.next().await {
        match message {
            Ok(WsMessage::Text(text)) => handle_frame(&session, &notices, &text),
            Ok(WsMessage::Close(_)) => break,
            // Pings are answered by axum; binary frames carry nothing for us.
            Ok(_) => {}
            Err(e) => {
                debug!("WebSocket error on connection {}: {e}", session.id());
                break;
            }
        }
    }

    debug!("Connection {} for {} closing", session.id(), session.identity());
    drop(session);
    drop(notices);

    if let Err(e) = writer.await {
        warn!("WebSocket writer task failed: {e}");
    }
}

fn handle_frame(session: &Session, notices: &ChannelSink, text: &str) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Malformed frame on connection {}: {e}", session.id());
            notify(notices, &ServerFrame::error(ErrorReason::MalformedFrame));
            return;
        }
    };

    let result = match &frame {
        ClientFrame::Broadcast { body } => session.broadcast(body),
        ClientFrame::SendTo { to, body } => session.send_to(to, body),
    };

    match result {
        Ok(delivered) => trace!(
            "Frame from {} delivered to {delivered} connection(s)",
            session.identity()
        ),
        Err(RelayError::RecipientOffline(recipient)) => {
            notify(notices, &ServerFrame::recipient_offline(&recipient))
        }
        Err(e) => {
            warn!("Rejected frame from connection {}: {e}", session.id());
            notify(notices, &ServerFrame::error(ErrorReason::Unauthenticated));
        }
    }
}

fn notify(notices: &ChannelSink, frame: &ServerFrame<'_>) {
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server frame: {e}");
            return;
        }
    };

    if let Err(e) = notices.send(Outbound::from(json)) {
        warn!("Failed to queue notice: {e}");
    }
}
