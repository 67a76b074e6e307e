//! UseCase: 所属ルーム一覧取得処理

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, Room, RoomDirectory, RoomRegistry};

use super::error::ListRoomsError;

/// 所属ルーム一覧取得のユースケース
///
/// デフォルトルームは一覧に含まれない（クライアントは常に知っている）。
pub struct ListRoomsUseCase {
    /// 在室状態の唯一の所有者
    registry: Arc<Mutex<RoomRegistry>>,
    /// Room Directory（永続ストアの抽象化）
    directory: Arc<dyn RoomDirectory>,
}

impl ListRoomsUseCase {
    /// 新しい ListRoomsUseCase を作成
    pub fn new(registry: Arc<Mutex<RoomRegistry>>, directory: Arc<dyn RoomDirectory>) -> Self {
        Self {
            registry,
            directory,
        }
    }

    /// 要求元ユーザーの所属ルーム一覧を取得（新しい順）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Result<Vec<Room>, ListRoomsError> {
        let identity = {
            let registry = self.registry.lock().await;
            registry
                .identity_of(connection_id)
                .cloned()
                .ok_or(ListRoomsError::UnknownSession)?
        };

        self.directory
            .find_rooms_for_user(&identity.user_id)
            .await
            .map_err(|e| {
                tracing::error!("Room listing failed: {}", e);
                ListRoomsError::Storage(e)
            })
    }
}
