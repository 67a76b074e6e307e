//! UseCase: ルーム作成処理
//!
//! Directory にルームを永続化し、採番された招待コードを返す。
//! 作成した接続の暗黙 join は UI 層が JoinRoomUseCase で続けて行う。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, MessagePusher, Room, RoomDirectory, RoomName, RoomRegistry,
};

use super::error::CreateRoomError;

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    /// 在室状態の唯一の所有者
    registry: Arc<Mutex<RoomRegistry>>,
    /// Room Directory（永続ストアの抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl CreateRoomUseCase {
    /// 新しい CreateRoomUseCase を作成
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

    /// ルーム作成を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 作成を要求した接続
    /// * `raw_name` - クライアントが指定したルーム名（未検証）
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - 作成されたルーム（招待コードを含む）
    /// * `Err(CreateRoomError)` - 作成失敗
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        raw_name: String,
    ) -> Result<Room, CreateRoomError> {
        let identity = {
            let registry = self.registry.lock().await;
            registry
                .identity_of(connection_id)
                .cloned()
                .ok_or(CreateRoomError::UnknownSession)?
        };

        let name = RoomName::new(raw_name).map_err(|_| CreateRoomError::InvalidName)?;

        let room = self
            .directory
            .create_room(identity.user_id, name)
            .await
            .map_err(|e| {
                tracing::error!("Room creation failed: {}", e);
                CreateRoomError::Storage(e)
            })?;

        tracing::info!(
            "Room '{}' created by '{}'",
            room.id.as_str(),
            room.owner.as_str()
        );
        Ok(room)
    }

    /// カタログ変更ヒントの配信対象（登録済みの全接続）
    pub async fn catalog_hint_targets(&self) -> Vec<ConnectionId> {
        let registry = self.registry.lock().await;
        registry.all_connections()
    }

    /// カタログ変更ヒントをブロードキャスト
    pub async fn broadcast_catalog_changed(
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
    use crate::infrastructure::repository::InMemoryRoomDirectory;

    fn identity(user_id: &str, username: &str) -> Identity {
        Identity::new(
            UserId::new(user_id.to_string()).unwrap(),
            Username::new(username.to_string()).unwrap(),
        )
    }

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn usecase_with(
        registry: Arc<Mutex<RoomRegistry>>,
        directory: Arc<dyn RoomDirectory>,
    ) -> CreateRoomUseCase {
        CreateRoomUseCase::new(registry, directory, Arc::new(WebSocketMessagePusher::new()))
    }

    #[tokio::test]
    async fn test_create_room_success() {
        // テスト項目: ルームが作成され、要求者がオーナーになる
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let directory = Arc::new(InMemoryRoomDirectory::new());
        let usecase = usecase_with(registry.clone(), directory.clone());
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("alice", "Alice"));
        }

        // when (操作):
        let room = usecase
            .execute(&conn("c1"), "Team Idobata".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(room.owner.as_str(), "alice");
        assert_eq!(room.name.as_str(), "Team Idobata");
        assert_eq!(room.invite_code.as_str().len(), 8);
        // Directory にも永続化されている
        assert!(directory
            .is_member(&room.id, &UserId::new("alice".to_string()).unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_create_room_rejects_blank_name() {
        // テスト項目: トリム後に空のルーム名は InvalidName
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let usecase = usecase_with(registry.clone(), Arc::new(InMemoryRoomDirectory::new()));
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("alice", "Alice"));
        }

        // when (操作):
        let result = usecase.execute(&conn("c1"), "   ".to_string()).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), CreateRoomError::InvalidName);
    }

    #[tokio::test]
    async fn test_create_room_unknown_session() {
        // テスト項目: セッションの無い接続からの作成は UnknownSession
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let usecase = usecase_with(registry, Arc::new(InMemoryRoomDirectory::new()));

        // when (操作):
        let result = usecase.execute(&conn("ghost"), "Team".to_string()).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), CreateRoomError::UnknownSession);
    }

    #[tokio::test]
    async fn test_catalog_hint_targets_cover_all_connections() {
        // テスト項目: カタログ変更ヒントは登録済みの全接続が対象
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let usecase = usecase_with(registry.clone(), Arc::new(InMemoryRoomDirectory::new()));
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("alice", "Alice"));
            lock.connect(conn("c2"), identity("bob", "Bob"));
        }

        // when (操作):
        let targets = usecase.catalog_hint_targets().await;

        // then (期待する結果):
        assert_eq!(targets.len(), 2);
        assert!(targets.contains(&conn("c1")));
        assert!(targets.contains(&conn("c2")));
    }
}
