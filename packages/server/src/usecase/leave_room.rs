//! UseCase: ルーム退室処理
//!
//! 在室していないルームからの退室はエラーではなく no-op。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, LeaveEffect, MessagePusher, RoomId, RoomRegistry};

/// ルーム退室のユースケース
pub struct LeaveRoomUseCase {
    /// 在室状態の唯一の所有者
    registry: Arc<Mutex<RoomRegistry>>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(registry: Arc<Mutex<RoomRegistry>>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// ルーム退室を実行
    ///
    /// # Returns
    ///
    /// * `Some(LeaveEffect)` - 退室した（残りメンバーへの通知が必要）
    /// * `None` - 在室していなかった（通知不要の no-op）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Option<LeaveEffect> {
        let mut registry = self.registry.lock().await;
        registry.leave(connection_id, room_id)
    }

    /// ロスター更新を残りのメンバーにブロードキャスト
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

    #[tokio::test]
    async fn test_leave_returns_remaining_roster() {
        // テスト項目: 退室で残りメンバーのロスターが返る
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let usecase =
            LeaveRoomUseCase::new(registry.clone(), Arc::new(WebSocketMessagePusher::new()));
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("alice", "Alice"));
            lock.connect(conn("c2"), identity("bob", "Bob"));
        }

        // when (操作):
        let effect = usecase
            .execute(&conn("c1"), &RoomId::default_room())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(effect.roster.len(), 1);
        assert!(effect.roster.contains_key(&conn("c2")));
    }

    #[tokio::test]
    async fn test_leave_when_not_member_is_noop() {
        // テスト項目: 在室していないルームからの退室は None（no-op）
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let usecase =
            LeaveRoomUseCase::new(registry.clone(), Arc::new(WebSocketMessagePusher::new()));
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("alice", "Alice"));
        }

        // when (操作):
        let result = usecase
            .execute(&conn("c1"), &RoomId::new("room-a".to_string()).unwrap())
            .await;

        // then (期待する結果):
        assert!(result.is_none());
    }
}
