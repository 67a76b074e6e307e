//! UseCase: セッション接続処理
//!
//! 認証を通過した接続を登録し、デフォルトルームに入室させる。
//! 認証そのものは UI 層が Identity Gate で済ませてから呼ぶこと。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, Identity, MessagePusher, PusherChannel, RoomRegistry, Roster,
};

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    /// 在室状態の唯一の所有者
    registry: Arc<Mutex<RoomRegistry>>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectSessionUseCase {
    /// 新しい ConnectSessionUseCase を作成
    pub fn new(registry: Arc<Mutex<RoomRegistry>>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// セッション接続を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - サーバーが採番した接続 ID
    /// * `identity` - Identity Gate が返した認証済みアイデンティティ
    /// * `sender` - この接続へのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// デフォルトルームの適用後ロスター（入室した本人を含む）
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        identity: Identity,
        sender: PusherChannel,
    ) -> Roster {
        self.message_pusher
            .register_connection(connection_id.clone(), sender)
            .await;

        let mut registry = self.registry.lock().await;
        registry.connect(connection_id, identity)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoomId, UserId, Username};
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
    async fn test_connect_admits_to_default_room() {
        // テスト項目: 接続がデフォルトルームに入室し、ロスターに載る
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let usecase = ConnectSessionUseCase::new(
            registry.clone(),
            Arc::new(WebSocketMessagePusher::new()),
        );

        // when (操作):
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let roster = usecase
            .execute(conn("c1"), identity("alice", "Alice"), tx)
            .await;

        // then (期待する結果):
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get(&conn("c1")).unwrap().as_str(), "Alice");
        let registry = registry.lock().await;
        assert!(registry.identity_of(&conn("c1")).is_some());
        assert_eq!(registry.roster(&RoomId::default_room()).len(), 1);
    }

    #[tokio::test]
    async fn test_connect_registers_pusher_channel() {
        // テスト項目: 接続の送信チャンネルが Pusher に登録される
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = ConnectSessionUseCase::new(registry, pusher.clone());

        // when (操作):
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        usecase
            .execute(conn("c1"), identity("alice", "Alice"), tx)
            .await;

        // then (期待する結果): 登録済みチャンネルへ届く
        usecase
            .broadcast_roster(vec![conn("c1")], "hello")
            .await
            .unwrap();
        assert_eq!(rx.recv().await, Some("hello".to_string()));
    }
}
