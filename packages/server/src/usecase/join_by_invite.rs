//! UseCase: 招待コードによる参加処理
//!
//! コードを Directory で解決し、永続メンバーシップを追加する。
//! 既にメンバーならエラーではなく成功として扱う（冪等）。
//! ライブな入室は UI 層が JoinRoomUseCase で続けて行う。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, InviteCode, MessagePusher, Room, RoomDirectory, RoomRegistry,
};

use super::error::JoinByCodeError;

/// 招待コード参加のユースケース
pub struct JoinByInviteCodeUseCase {
    /// 在室状態の唯一の所有者
    registry: Arc<Mutex<RoomRegistry>>,
    /// Room Directory（永続ストアの抽象化）
    directory: Arc<dyn RoomDirectory>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl JoinByInviteCodeUseCase {
    /// 新しい JoinByInviteCodeUseCase を作成
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

    /// 招待コードによる参加を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - 参加したルーム（既メンバーの場合も成功）
    /// * `Err(JoinByCodeError)` - 参加失敗
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        raw_code: String,
    ) -> Result<Room, JoinByCodeError> {
        let identity = {
            let registry = self.registry.lock().await;
            registry
                .identity_of(connection_id)
                .cloned()
                .ok_or(JoinByCodeError::UnknownSession)?
        };

        let code =
            InviteCode::new(raw_code).map_err(|_| JoinByCodeError::InvalidInviteCode)?;

        let room = self
            .directory
            .find_by_invite_code(&code)
            .await
            .map_err(|e| {
                tracing::error!("Invite code lookup failed: {}", e);
                JoinByCodeError::Storage(e)
            })?
            .ok_or(JoinByCodeError::InvalidInviteCode)?;

        // 既にメンバーなら冪等に成功扱い
        if room.is_member(&identity.user_id) {
            return Ok(room);
        }

        self.directory
            .add_member(&room.id, identity.user_id.clone())
            .await
            .map_err(|e| {
                tracing::error!("Adding member failed: {}", e);
                JoinByCodeError::Storage(e)
            })?;

        tracing::info!(
            "User '{}' joined room '{}' by invite code",
            identity.user_id.as_str(),
            room.id.as_str()
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
    use crate::domain::{Identity, RoomName, UserId, Username};
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
    ) -> JoinByInviteCodeUseCase {
        JoinByInviteCodeUseCase::new(registry, directory, Arc::new(WebSocketMessagePusher::new()))
    }

    async fn create_team_room(directory: &InMemoryRoomDirectory) -> Room {
        directory
            .create_room(
                UserId::new("alice".to_string()).unwrap(),
                RoomName::new("Team".to_string()).unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_join_by_code_adds_durable_membership() {
        // テスト項目: 招待コードで永続メンバーシップが追加される
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let directory = Arc::new(InMemoryRoomDirectory::new());
        let room = create_team_room(&directory).await;
        let usecase = usecase_with(registry.clone(), directory.clone());
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("bob", "Bob"));
        }

        // when (操作):
        let joined = usecase
            .execute(&conn("c1"), room.invite_code.as_str().to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(joined.id, room.id);
        assert!(directory
            .is_member(&room.id, &UserId::new("bob".to_string()).unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_join_by_code_is_idempotent_for_members() {
        // テスト項目: 既メンバーの参加はエラーではなく成功
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let directory = Arc::new(InMemoryRoomDirectory::new());
        let room = create_team_room(&directory).await;
        let usecase = usecase_with(registry.clone(), directory.clone());
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("alice", "Alice"));
        }

        // when (操作): オーナー自身がコードで参加を試みる
        let result = usecase
            .execute(&conn("c1"), room.invite_code.as_str().to_string())
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap().id, room.id);
    }

    #[tokio::test]
    async fn test_join_by_unknown_code_is_rejected() {
        // テスト項目: 解決できないコードは InvalidInviteCode
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let directory = Arc::new(InMemoryRoomDirectory::new());
        create_team_room(&directory).await;
        let usecase = usecase_with(registry.clone(), directory);
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("bob", "Bob"));
        }

        // when (操作):
        let result = usecase.execute(&conn("c1"), "00000000".to_string()).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), JoinByCodeError::InvalidInviteCode);
    }

    #[tokio::test]
    async fn test_join_by_blank_code_is_rejected() {
        // テスト項目: 空のコードは Directory に問い合わせず拒否される
        // given (前提条件):
        let registry = Arc::new(Mutex::new(RoomRegistry::new()));
        let usecase = usecase_with(registry.clone(), Arc::new(InMemoryRoomDirectory::new()));
        {
            let mut lock = registry.lock().await;
            lock.connect(conn("c1"), identity("bob", "Bob"));
        }

        // when (操作):
        let result = usecase.execute(&conn("c1"), "  ".to_string()).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), JoinByCodeError::InvalidInviteCode);
    }
}
