//! UseCase: ルーム入室処理
//!
//! アクセス制御と履歴取得を Directory で済ませてから、在室状態への
//! 反映をロック区間でまとめて適用する。アクセス拒否は要求元にだけ
//! 返り、グローバルな状態には何の副作用も残さない。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ConnectionId, DirectoryError, EvictedRoom, MessagePusher, RoomDirectory, RoomId,
    RoomRegistry, Roster,
};

use super::error::JoinRoomError;

/// join 時に返す履歴の上限件数
pub const HISTORY_FETCH_LIMIT: usize = 100;

/// 入室に成功したときのスナップショット
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub room_id: RoomId,
    /// 要求元にユニキャストする履歴（時系列順）
    pub history: Vec<ChatMessage>,
    /// 参加先ルームの適用後ロスター
    pub roster: Roster,
    /// 追い出された旧ルーム（あれば）
    pub evicted: Option<EvictedRoom>,
}

/// ルーム入室のユースケース
pub struct JoinRoomUseCase {
    /// 在室状態の唯一の所有者
    registry: Arc<Mutex<RoomRegistry>>,
    /// Room Directory（永続ストアの抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
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

    /// ルーム入室を実行
    ///
    /// 前提: デフォルトルームは誰でも入れる。それ以外は Directory の
    /// メンバーシップ判定（オーナー含む）を通ること。
    ///
    /// # Returns
    ///
    /// * `Ok(JoinOutcome)` - 入室成功（履歴・ロスター・退室情報）
    /// * `Err(JoinRoomError)` - 入室失敗（状態は変更されない）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: RoomId,
    ) -> Result<JoinOutcome, JoinRoomError> {
        // 1. アイデンティティの解決（ロックは即座に手放す）
        let identity = {
            let registry = self.registry.lock().await;
            registry
                .identity_of(connection_id)
                .cloned()
                .ok_or(JoinRoomError::UnknownSession)?
        };

        // 2. アクセス制御と履歴取得（ロック外の I/O）
        let fetched_history = if room_id.is_default() {
            None
        } else {
            let allowed = self
                .directory
                .is_member(&room_id, &identity.user_id)
                .await
                .map_err(|e| match e {
                    DirectoryError::RoomNotFound => JoinRoomError::RoomNotFound,
                    other => {
                        tracing::error!("Membership check failed: {}", other);
                        JoinRoomError::Storage(other)
                    }
                })?;
            if !allowed {
                return Err(JoinRoomError::AccessDenied);
            }
            let messages = self
                .directory
                .get_messages(&room_id, HISTORY_FETCH_LIMIT)
                .await
                .map_err(|e| match e {
                    DirectoryError::RoomNotFound => JoinRoomError::RoomNotFound,
                    other => {
                        tracing::error!("History fetch failed: {}", other);
                        JoinRoomError::Storage(other)
                    }
                })?;
            Some(messages)
        };

        // 3. 在室状態への反映（ロック区間でスナップショットまで計算）
        let effect = {
            let mut registry = self.registry.lock().await;
            registry
                .join(connection_id, &room_id)
                .ok_or(JoinRoomError::UnknownSession)?
        };

        let history = match fetched_history {
            Some(messages) => messages,
            None => effect.history.unwrap_or_default(),
        };

        Ok(JoinOutcome {
            room_id,
            history,
            roster: effect.roster,
            evicted: effect.evicted,
        })
    }

    /// ロスター更新をルームのメンバーにブロードキャスト
    pub async fn broadcast_roster(
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
