//! WebSocket connection handlers.
//!
//! 接続確立時に Identity Gate で認証し、以後のイベントをユースケースに
//! 振り分ける。マルチキャストの JSON はここで組み立て、配信対象の計算は
//! ユースケース側のスナップショットに従う。

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, ConnectionIdFactory, EvictedRoom, RoomId, Roster,
    },
    infrastructure::dto::{
        conversion::roster_to_dto,
        websocket::{
            ChatMessage, ClientEvent, ErrorMessage, MessageDto, MessageType, MyRoomsMessage,
            RoomCatalogChangedMessage, RoomCreatedMessage, RoomHistoryMessage, RoomJoinedMessage,
            RoomSummaryDto, RosterUpdateMessage, TypingStartMessage, TypingStopMessage,
        },
    },
    ui::state::AppState,
    usecase::{JoinOutcome, SendOutcome},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // 認証が通るまで接続は保留。拒否ならルーム側の副作用は一切ない。
    let identity = match state.identity_gate.authenticate(&query.token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Authentication failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    let connection_id = ConnectionIdFactory::generate()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Create a channel for this connection to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    let username = identity.username.as_str().to_string();
    let roster = state
        .connect_session_usecase
        .execute(connection_id.clone(), identity, tx)
        .await;

    tracing::info!(
        "Connection '{}' authenticated as '{}'",
        connection_id.as_str(),
        username
    );

    // デフォルトルームのロスターを新規接続込みで配る。新規接続への分は
    // チャンネルに積まれ、アップグレード完了後に届く。
    let targets: Vec<ConnectionId> = roster.keys().cloned().collect();
    let roster_json = roster_update_json(&RoomId::default_room(), roster);
    if let Err(e) = state
        .connect_session_usecase
        .broadcast_roster(targets, &roster_json)
        .await
    {
        tracing::warn!("Failed to broadcast roster-update: {}", e);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id, rx)))
}

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this connection
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    // Spawn a task to push messages from other connections to this client
    let mut send_task = pusher_loop(rx, sender);

    let state_clone = state.clone();
    let connection_id_clone = connection_id.clone();

    // Spawn a task to receive events from this connection
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!("Failed to parse client event: {}", e);
                            continue;
                        }
                    };
                    dispatch_event(&state_clone, &connection_id_clone, event).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!(
                        "Connection '{}' requested close",
                        connection_id_clone.as_str()
                    );
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // トランスポート切断による後始末。クライアントが disconnecting を
    // 送っていた場合は 2 回目の呼び出しになるが、冪等なので安全。
    run_disconnect(&state, &connection_id).await;
    tracing::info!("Connection '{}' cleaned up", connection_id.as_str());
}

/// インバウンドイベントをユースケースに振り分ける
async fn dispatch_event(state: &Arc<AppState>, connection_id: &ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::JoinRoom { room_id } => {
            let Ok(room_id) = RoomId::new(room_id) else {
                unicast_error(state, connection_id, "room-not-found", "room not found").await;
                return;
            };
            match state
                .join_room_usecase
                .execute(connection_id, room_id)
                .await
            {
                Ok(outcome) => apply_join_outcome(state, connection_id, outcome).await,
                Err(e) => {
                    unicast_error(state, connection_id, e.reason(), &e.to_string()).await;
                }
            }
        }
        ClientEvent::LeaveRoom { room_id } => {
            let Ok(room_id) = RoomId::new(room_id) else {
                return;
            };
            if let Some(effect) = state
                .leave_room_usecase
                .execute(connection_id, &room_id)
                .await
            {
                let targets: Vec<ConnectionId> = effect.roster.keys().cloned().collect();
                let roster_json = roster_update_json(&room_id, effect.roster);
                broadcast_or_warn(
                    state
                        .leave_room_usecase
                        .broadcast_roster(targets.clone(), &roster_json)
                        .await,
                );
                if effect.typing_stopped {
                    let stop_json = typing_stop_json(&room_id, connection_id);
                    broadcast_or_warn(
                        state
                            .leave_room_usecase
                            .broadcast_roster(targets, &stop_json)
                            .await,
                    );
                }
            }
        }
        ClientEvent::CreateRoom { name } => {
            match state.create_room_usecase.execute(connection_id, name).await {
                Ok(room) => {
                    let created_json = serde_json::to_string(&RoomCreatedMessage {
                        r#type: MessageType::RoomCreated,
                        room_id: room.id.as_str().to_string(),
                        invite_code: room.invite_code.as_str().to_string(),
                    })
                    .unwrap();
                    unicast(state, connection_id, &created_json).await;

                    // 作成した接続の暗黙 join
                    implicit_join(state, connection_id, room.id.clone()).await;

                    // カタログ変更のヒント
                    let targets = state.create_room_usecase.catalog_hint_targets().await;
                    broadcast_or_warn(
                        state
                            .create_room_usecase
                            .broadcast_catalog_changed(targets, &catalog_changed_json())
                            .await,
                    );
                }
                Err(e) => {
                    unicast_error(state, connection_id, e.reason(), &e.to_string()).await;
                }
            }
        }
        ClientEvent::JoinByCode { code } => {
            match state
                .join_by_invite_usecase
                .execute(connection_id, code)
                .await
            {
                Ok(room) => {
                    let joined_json = serde_json::to_string(&RoomJoinedMessage {
                        r#type: MessageType::RoomJoined,
                        room_id: room.id.as_str().to_string(),
                    })
                    .unwrap();
                    unicast(state, connection_id, &joined_json).await;

                    // 参加した接続の暗黙 join
                    implicit_join(state, connection_id, room.id.clone()).await;

                    // カタログ変更のヒント
                    let targets = state.join_by_invite_usecase.catalog_hint_targets().await;
                    broadcast_or_warn(
                        state
                            .join_by_invite_usecase
                            .broadcast_catalog_changed(targets, &catalog_changed_json())
                            .await,
                    );
                }
                Err(e) => {
                    unicast_error(state, connection_id, e.reason(), &e.to_string()).await;
                }
            }
        }
        ClientEvent::ListMyRooms => {
            match state.list_rooms_usecase.execute(connection_id).await {
                Ok(rooms) => {
                    let my_rooms_json = serde_json::to_string(&MyRoomsMessage {
                        r#type: MessageType::MyRooms,
                        rooms: rooms.into_iter().map(RoomSummaryDto::from).collect(),
                    })
                    .unwrap();
                    unicast(state, connection_id, &my_rooms_json).await;
                }
                Err(e) => {
                    unicast_error(state, connection_id, e.reason(), &e.to_string()).await;
                }
            }
        }
        ClientEvent::SendMessage { room_id, body } => {
            let Ok(room_id) = RoomId::new(room_id) else {
                tracing::warn!("send-message with blank room id ignored");
                return;
            };
            match state
                .send_message_usecase
                .execute(connection_id, room_id.clone(), body)
                .await
            {
                Ok(SendOutcome::Delivered(delivered)) => {
                    let chat_json =
                        serde_json::to_string(&ChatMessage::from(delivered.message)).unwrap();
                    broadcast_or_warn(
                        state
                            .send_message_usecase
                            .broadcast_room_event(delivered.targets.clone(), &chat_json)
                            .await,
                    );
                    // 送信の副作用としての typing-stop（送信者以外へ）
                    if delivered.typing_stopped {
                        let stop_json = typing_stop_json(&room_id, connection_id);
                        let others: Vec<ConnectionId> = delivered
                            .targets
                            .into_iter()
                            .filter(|id| id != connection_id)
                            .collect();
                        broadcast_or_warn(
                            state
                                .send_message_usecase
                                .broadcast_room_event(others, &stop_json)
                                .await,
                        );
                    }
                }
                Ok(SendOutcome::Ignored) => {
                    // 空本文は黙殺（エラーにもしない）
                }
                Err(e) => {
                    unicast_error(state, connection_id, e.reason(), &e.to_string()).await;
                }
            }
        }
        ClientEvent::StartTyping { room_id } => {
            let Ok(room_id) = RoomId::new(room_id) else {
                return;
            };
            if let Some(start) = state.typing_usecase.start(connection_id, &room_id).await {
                let start_json = serde_json::to_string(&TypingStartMessage {
                    r#type: MessageType::TypingStart,
                    room_id: room_id.as_str().to_string(),
                    connection_id: connection_id.as_str().to_string(),
                    username: start.username.into_string(),
                })
                .unwrap();
                broadcast_or_warn(
                    state
                        .typing_usecase
                        .broadcast_typing(start.targets, &start_json)
                        .await,
                );
            }
        }
        ClientEvent::StopTyping { room_id } => {
            let Ok(room_id) = RoomId::new(room_id) else {
                return;
            };
            if let Some(targets) = state.typing_usecase.stop(connection_id, &room_id).await {
                let stop_json = typing_stop_json(&room_id, connection_id);
                broadcast_or_warn(
                    state
                        .typing_usecase
                        .broadcast_typing(targets, &stop_json)
                        .await,
                );
            }
        }
        ClientEvent::Disconnecting => {
            // 明示的な切断通知。後続のトランスポート close とは冪等に
            // 共存する。
            run_disconnect(state, connection_id).await;
        }
    }
}

/// join の結果を配信する（履歴ユニキャスト + ロスター更新）
async fn apply_join_outcome(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    outcome: JoinOutcome,
) {
    // 旧ルームからの退室を先に知らせる
    if let Some(evicted) = outcome.evicted {
        broadcast_eviction(state, connection_id, evicted).await;
    }

    // 履歴は要求元にだけ返す
    let history_json = serde_json::to_string(&RoomHistoryMessage {
        r#type: MessageType::RoomHistory,
        room_id: outcome.room_id.as_str().to_string(),
        messages: outcome.history.into_iter().map(MessageDto::from).collect(),
    })
    .unwrap();
    unicast(state, connection_id, &history_json).await;

    // 参加先ルームのロスター更新
    let targets: Vec<ConnectionId> = outcome.roster.keys().cloned().collect();
    let roster_json = roster_update_json(&outcome.room_id, outcome.roster);
    broadcast_or_warn(
        state
            .join_room_usecase
            .broadcast_roster(targets, &roster_json)
            .await,
    );
}

/// create-room / join-by-code の後続の暗黙 join
async fn implicit_join(state: &Arc<AppState>, connection_id: &ConnectionId, room_id: RoomId) {
    match state
        .join_room_usecase
        .execute(connection_id, room_id)
        .await
    {
        Ok(outcome) => apply_join_outcome(state, connection_id, outcome).await,
        Err(e) => {
            tracing::warn!("Implicit join failed: {}", e);
            unicast_error(state, connection_id, e.reason(), &e.to_string()).await;
        }
    }
}

/// 退室させられた旧ルームへの通知（ロスター + typing-stop）
async fn broadcast_eviction(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    evicted: EvictedRoom,
) {
    let targets: Vec<ConnectionId> = evicted.roster.keys().cloned().collect();
    let roster_json = roster_update_json(&evicted.room_id, evicted.roster);
    broadcast_or_warn(
        state
            .join_room_usecase
            .broadcast_roster(targets.clone(), &roster_json)
            .await,
    );
    if evicted.typing_stopped {
        let stop_json = typing_stop_json(&evicted.room_id, connection_id);
        broadcast_or_warn(
            state
                .join_room_usecase
                .broadcast_roster(targets, &stop_json)
                .await,
        );
    }
}

/// 切断の後始末（disconnecting イベントと close の両方から呼ばれる）
async fn run_disconnect(state: &Arc<AppState>, connection_id: &ConnectionId) {
    let effect = state
        .disconnect_session_usecase
        .execute(connection_id)
        .await;
    for room in effect.rooms {
        let targets: Vec<ConnectionId> = room.roster.keys().cloned().collect();
        let roster_json = roster_update_json(&room.room_id, room.roster);
        broadcast_or_warn(
            state
                .disconnect_session_usecase
                .broadcast_room_update(targets.clone(), &roster_json)
                .await,
        );
        if room.typing_stopped {
            let stop_json = typing_stop_json(&room.room_id, connection_id);
            broadcast_or_warn(
                state
                    .disconnect_session_usecase
                    .broadcast_room_update(targets, &stop_json)
                    .await,
            );
        }
    }
}

fn roster_update_json(room_id: &RoomId, roster: Roster) -> String {
    serde_json::to_string(&RosterUpdateMessage {
        r#type: MessageType::RosterUpdate,
        room_id: room_id.as_str().to_string(),
        users: roster_to_dto(roster),
    })
    .unwrap()
}

fn typing_stop_json(room_id: &RoomId, connection_id: &ConnectionId) -> String {
    serde_json::to_string(&TypingStopMessage {
        r#type: MessageType::TypingStop,
        room_id: room_id.as_str().to_string(),
        connection_id: connection_id.as_str().to_string(),
    })
    .unwrap()
}

fn catalog_changed_json() -> String {
    serde_json::to_string(&RoomCatalogChangedMessage {
        r#type: MessageType::RoomCatalogChanged,
    })
    .unwrap()
}

/// 要求元へのユニキャスト
async fn unicast(state: &Arc<AppState>, connection_id: &ConnectionId, message: &str) {
    if let Err(e) = state.message_pusher.push_to(connection_id, message).await {
        tracing::warn!(
            "Failed to push to connection '{}': {}",
            connection_id.as_str(),
            e
        );
    }
}

/// 構造化されたエラーイベントを要求元に返す
async fn unicast_error(
    state: &Arc<AppState>,
    connection_id: &ConnectionId,
    reason: &str,
    message: &str,
) {
    let error_json = serde_json::to_string(&ErrorMessage {
        r#type: MessageType::Error,
        reason: reason.to_string(),
        message: message.to_string(),
    })
    .unwrap();
    unicast(state, connection_id, &error_json).await;
}

fn broadcast_or_warn(result: Result<(), String>) {
    if let Err(e) = result {
        tracing::warn!("Broadcast failed: {}", e);
    }
}
