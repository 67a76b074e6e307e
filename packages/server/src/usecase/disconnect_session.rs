//! UseCase: セッション切断処理
//!
//! 明示的な disconnecting イベントとトランスポートの close の両方から
//! 呼ばれるため、冪等であることが要件。2 回目の呼び出しは状態を
//! 変えず、ブロードキャストの対象も返さない。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, DisconnectEffect, MessagePusher, RoomRegistry};

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    /// 在室状態の唯一の所有者
    registry: Arc<Mutex<RoomRegistry>>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectSessionUseCase {
    /// 新しい DisconnectSessionUseCase を作成
    pub fn new(registry: Arc<Mutex<RoomRegistry>>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// セッション切断を実行（冪等）
    ///
    /// # Returns
    ///
    /// 影響を受けたルームごとの適用後ロスターと typing-stop の要否。
    /// 既に切断済みなら空。
    pub async fn execute(&self, connection_id: &ConnectionId) -> DisconnectEffect {
        let effect = {
            let mut registry = self.registry.lock().await;
            registry.disconnect(connection_id)
        };
        self.message_pusher
            .unregister_connection(connection_id)
            .await;
        effect
    }

    /// 後始末のイベントを残りのメンバーにブロードキャスト
    pub async fn broadcast_room_update(
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
