//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::Response,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ClientId, Session},
    infrastructure::dto::websocket::{InboundMessage, OutboundMessage},
    ui::state::AppState,
    usecase::ConnectError,
};

const NOT_LOGGED_IN: &str = "Not logged in";

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// 接続するクライアントの ID。省略した場合は最初の `login` メッセージで名乗る
    #[serde(default, alias = "client_id")]
    pub key: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<Response, StatusCode> {
    let Some(key) = query.key else {
        tracing::debug!("Anonymous connection, waiting for login");
        return Ok(ws.on_upgrade(move |socket| handle_anonymous_socket(socket, state)));
    };

    // Convert String -> ClientId (Domain Model)
    let client_id = match ClientId::try_from(key) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid client id: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // Create a channel for this client to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    match state.connect_client_usecase.execute(client_id, tx).await {
        Ok(session) => {
            tracing::info!("Client '{}' connected and registered", session.client_id);
            let failed_state = state.clone();
            let failed_session = session.clone();
            Ok(ws
                .on_failed_upgrade(move |e| {
                    tracing::warn!(
                        "WebSocket upgrade failed for '{}': {}",
                        failed_session.client_id,
                        e
                    );
                    tokio::spawn(async move {
                        release_session(&failed_state, &failed_session).await;
                    });
                })
                .on_upgrade(move |socket| handle_socket(socket, state, session, rx)))
        }
        Err(ConnectError::DuplicateClientId(id)) => {
            tracing::warn!(
                "Client with ID '{}' is already connected. Rejecting connection.",
                id
            );
            Err(StatusCode::CONFLICT)
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    session: Session,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, receiver) = socket.split();
    run_session(state, session, sender, receiver, rx).await;
}

async fn handle_anonymous_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let Some((session, rx)) = await_login(&state, &mut sender, &mut receiver).await else {
        tracing::debug!("Anonymous connection closed before login");
        return;
    };

    run_session(state, session, sender, receiver, rx).await;
}

/// `login` を受け取って登録できるまで待つ
///
/// それ以外のメッセージには `Not logged in` を返す。登録前に接続が閉じた場合は `None`。
async fn await_login(
    state: &AppState,
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
) -> Option<(Session, mpsc::UnboundedReceiver<String>)> {
    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => return None,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("WebSocket error before login: {}", e);
                return None;
            }
        };

        let reply = match InboundMessage::parse(text.as_str()) {
            InboundMessage::Login(request) => match ClientId::new(request.name) {
                Ok(client_id) => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    match state.connect_client_usecase.execute(client_id, tx).await {
                        Ok(session) => {
                            tracing::info!("Client '{}' logged in", session.client_id);
                            // 送信に失敗しても、この後の受信ループが終了して切断処理が走る
                            if let Err(e) =
                                send_message(sender, &OutboundMessage::Login { success: true })
                                    .await
                            {
                                tracing::debug!("Failed to send login reply: {}", e);
                            }
                            return Some((session, rx));
                        }
                        Err(e) => {
                            tracing::warn!("Login rejected: {}", e);
                            OutboundMessage::Login { success: false }
                        }
                    }
                }
                Err(_) => OutboundMessage::Login { success: false },
            },
            _ => OutboundMessage::Error {
                message: NOT_LOGGED_IN.to_string(),
            },
        };

        if send_message(sender, &reply).await.is_err() {
            return None;
        }
    }
    None
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &OutboundMessage,
) -> Result<(), axum::Error> {
    let json = message.to_json().map_err(axum::Error::new)?;
    sender.send(Message::Text(json.into())).await
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// When every sender of the channel is dropped (the client was disconnected or
/// replaced by a newer connection) the socket is closed.
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.close().await;
    })
}

async fn run_session(
    state: Arc<AppState>,
    session: Session,
    sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let recv_state = state.clone();
    let recv_session = session.clone();

    // Spawn a task to receive messages from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!("WebSocket error from '{}': {}", recv_session.client_id, e);
                    break;
                }
            };

            match frame {
                Message::Text(text) => {
                    recv_state
                        .route_message_usecase
                        .execute(&recv_session, text.as_str())
                        .await;
                }
                Message::Binary(_) => {
                    tracing::debug!("Ignoring binary frame from '{}'", recv_session.client_id);
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", recv_session.client_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push messages from other clients to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    release_session(&state, &session).await;
}

/// 切断処理を実行して登録を解除する
async fn release_session(state: &AppState, session: &Session) {
    match state.disconnect_client_usecase.execute(session).await {
        Ok(outcome) => {
            tracing::info!(
                "Client '{}' disconnected (quit sent to {}, leave sent to {})",
                session.client_id,
                outcome.room_notified.len(),
                outcome.peers_notified.len()
            );
        }
        Err(e) => {
            tracing::debug!("{}", e);
        }
    }
}
