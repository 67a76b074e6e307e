//! UseCase: タイピングインジケーター処理
//!
//! サーバーはタイピング状態のタイムアウトを持たない。明示的な stop、
//! 送信成功、切断だけがエントリを消す（静穏期間の自動 stop は
//! クライアント側の責務）。イベントは常に (room_id, connection_id) で
//! スコープされる。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePusher, RoomId, RoomRegistry, TypingStart};

/// タイピングインジケーターのユースケース
pub struct TypingUseCase {
    /// 在室状態の唯一の所有者
    registry: Arc<Mutex<RoomRegistry>>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl TypingUseCase {
    /// 新しい TypingUseCase を作成
    pub fn new(registry: Arc<Mutex<RoomRegistry>>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// タイピング開始を記録
    ///
    /// # Returns
    ///
    /// * `Some(TypingStart)` - 通知対象（送信者以外）と表示名
    /// * `None` - ルームに在室していない接続からの信号（無視）
    pub async fn start(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Option<TypingStart> {
        let mut registry = self.registry.lock().await;
        registry.start_typing(connection_id, room_id)
    }

    /// タイピング停止を記録
    ///
    /// # Returns
    ///
    /// * `Some(targets)` - 通知対象（送信者以外）
    /// * `None` - エントリが無かった（冪等、通知不要）
    pub async fn stop(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Option<Vec<ConnectionId>> {
        let mut registry = self.registry.lock().await;
        registry.stop_typing(connection_id, room_id)
    }

    /// タイピングイベントをルームの他メンバーにブロードキャスト
    pub async fn broadcast_typing(
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, UserId, Username};
    use crate::infrastructure::message_pusher::WebSocketMessagePusher;

    fn identity(user_id: &str, username: &str) -> Identity {
        Identity::new(
            UserId::new(user_id.to_string()).unwrap(),
            Username::new(username.to_string()).unwrap(),
        )
    }

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn usecase(registry: Arc<Mutex<RoomRegistry>>) -> TypingUseCase {
        TypingUseCase::new(registry, Arc::new(WebSocketMessagePusher::new()))
    }

    #[tokio::test]
    async fn test_start_typing_notifies_other_members_only() {
        // テスト項目: typing-start の通知対象は送信者以外のメンバー
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let usecase = usecase(registry.clone());
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("alice", "Alice"));
            lock.connect(conn("c2"), identity("bob", "Bob"));
        }

        // when (操作):
        let start = usecase
            .start(&conn("c1"), &RoomId::default_room())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(start.username.as_str(), "Alice");
        assert_eq!(start.targets, vec![conn("c2")]);
    }

    #[tokio::test]
    async fn test_stop_typing_is_idempotent() {
        // テスト項目: エントリの無い stop は None（通知しない）
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let usecase = usecase(registry.clone());
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("alice", "Alice"));
        }
        usecase.start(&conn("c1"), &RoomId::default_room()).await;

        // when (操作):
        let first = usecase.stop(&conn("c1"), &RoomId::default_room()).await;
        let second = usecase.stop(&conn("c1"), &RoomId::default_room()).await;

        // then (期待する結果):
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_typing_in_unjoined_room_is_ignored() {
        // テスト項目: 在室していないルームへの typing-start は無視される
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let usecase = usecase(registry.clone());
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("alice", "Alice"));
        }

        // when (操作):
        let result = usecase
            .start(&conn("c1"), &RoomId::new("room-a".to_string()).unwrap())
            .await;

        // then (期待する結果):
        assert!(result.is_none());
    }
}
