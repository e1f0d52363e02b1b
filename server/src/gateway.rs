use crate::error::LobbyError;
use crate::registry::ConnId;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use rps_protocol::{ClientToServer, ServerToClient};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let (tx_out, mut rx_out) = mpsc::unbounded_channel::<ServerToClient>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx_out.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "dropping unserializable message");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let my_id = uuid::Uuid::new_v4();
    let _ = tx_out.send(ServerToClient::Hello { your_id: my_id });
    debug!(conn = %short(my_id), "socket opened");

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(t) => route_text(&state, my_id, &t, &tx_out),
            Message::Close(_) => break,
            _ => {}
        }
    }

    // close frame, stream end and transport error all mean the player is gone
    state.lobby.lock().disconnect(my_id);
    drop(tx_out);
    let _ = writer.await;
    debug!(conn = %short(my_id), "socket closed");
}

fn route_text(
    state: &AppState,
    my_id: ConnId,
    text: &str,
    tx_out: &mpsc::UnboundedSender<ServerToClient>,
) {
    let result = match serde_json::from_str::<ClientToServer>(text) {
        Ok(cmd) => {
            debug!(conn = %short(my_id), ?cmd, "intent");
            state.lobby.lock().handle(my_id, cmd, tx_out)
        }
        Err(e) => Err(LobbyError::Malformed(e.to_string())),
    };

    if let Err(e) = result {
        warn!(conn = %short(my_id), error = %e, "intent rejected");
        let _ = tx_out.send(ServerToClient::Error { message: e.to_string() });
    }
}

fn short(id: ConnId) -> String {
    id.to_string()[..8].to_string()
}
