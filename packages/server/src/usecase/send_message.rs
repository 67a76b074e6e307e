//! UseCase: メッセージ送信処理
//!
//! 送信者のアイデンティティは接続のセッションから解決する（クライアント
//! 申告の名前は信用しない）。タイムスタンプはサーバー側で打つ。
//! 空本文はエラーではなく黙殺（`SendOutcome::Ignored`）。
//!
//! 永続ルームへの送信は Directory への永続化を先に済ませ、在室状態への
//! 反映（タイピング解除・配信対象の確定）をロック区間でまとめて行う。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ConnectionId, MessageBody, MessagePusher, RoomDirectory, RoomId, RoomRegistry,
    Timestamp,
};

use super::error::SendMessageError;

/// 配信されたメッセージのスナップショット
#[derive(Debug, Clone)]
pub struct DeliveredMessage {
    pub message: ChatMessage,
    /// 配信対象（送信者を含むルームの全ライブ接続）
    pub targets: Vec<ConnectionId>,
    /// 送信者のタイピング表示を消した場合 true
    pub typing_stopped: bool,
}

/// 送信処理の結果
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// 空本文のため黙って無視した（配信も履歴変更もなし）
    Ignored,
    /// 配信された
    Delivered(DeliveredMessage),
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// 在室状態の唯一の所有者
    registry: Arc<Mutex<RoomRegistry>>,
    /// Room Directory（永続ストアの抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        registry: Arc<Mutex<RoomRegistry>>,
        directory: Arc<dyn RoomDirectory>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            directory,
            message_pusher,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 送信した接続
    /// * `room_id` - 送信先ルーム
    /// * `raw_body` - クライアントが送った本文（未検証）
    ///
    /// # Returns
    ///
    /// * `Ok(SendOutcome)` - 配信結果（空本文なら `Ignored`）
    /// * `Err(SendMessageError)` - 送信失敗（在室状態は変更されない）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
        raw_body: String,
    ) -> Result<SendOutcome, SendMessageError> {
        use idobata_shared::time::get_epoch_millis;

        // 1. 空本文は黙殺
        let body = match MessageBody::new(raw_body) {
            Ok(body) => body,
            Err(_) => return Ok(SendOutcome::Ignored),
        };

        // 2. 送信者のアイデンティティをセッションから解決
        let identity = {
            let registry = self.registry.lock().await;
            registry
                .identity_of(connection_id)
                .cloned()
                .ok_or(SendMessageError::UnknownSession)?
        };

        let message = ChatMessage {
            room_id: room_id.clone(),
            author_user_id: identity.user_id.clone(),
            author_username: identity.username.clone(),
            author_connection_id: Some(connection_id.clone()),
            body: body.clone(),
            timestamp: Timestamp::new(get_epoch_millis()),
        };

        // 3. 永続ルームならロック外で先に永続化
        if !room_id.is_default() {
            self.directory
                .append_message(
                    &room_id,
                    identity.user_id,
                    identity.username,
                    body,
                    message.timestamp.value(),
                )
                .await
                .map_err(|e| {
                    tracing::error!("Message persistence failed: {}", e);
                    SendMessageError::Storage(e)
                })?;
        }

        // 4. 在室状態への反映（リング追記・タイピング解除・配信対象）
        let effect = {
            let mut registry = self.registry.lock().await;
            registry.apply_send(connection_id, message.clone())
        };

        Ok(SendOutcome::Delivered(DeliveredMessage {
            message,
            targets: effect.targets,
            typing_stopped: effect.typing_stopped,
        }))
    }

    /// メッセージと typing-stop をルームのメンバーにブロードキャスト
    pub async fn broadcast_room_event(
        &self,
        targets: Vec<ConnectionId>,
        message: &str,
    ) -> Result<(), String> {
        self.message_pusher
            .broadcast(targets, message)
            .await
            .map_err(|e| e.to_string())
    }
}
