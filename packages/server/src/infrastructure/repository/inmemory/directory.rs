//! InMemory Room Directory 実装
//!
//! ドメイン層が定義する RoomDirectory trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 技術的負債
//!
//! 現在、ドメインモデル（`Room` / `ChatMessage`）を直接ストレージと
//! して使用しています。これは InMemory 実装では許容される妥協ですが、
//! 将来 PostgreSQL などの DBMS を実装する際は、以下の変換層が必要に
//! なります：
//!
//! ```text
//! DB Row/JSON → RoomRecord (DTO) → Room (ドメインモデル)
//! ```
//!
//! PostgreSQL 実装時に対応予定。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, DirectoryError, InviteCode, InviteCodeFactory, MessageBody, Room, RoomDirectory,
    RoomId, RoomIdFactory, RoomName, Timestamp, UserId, Username,
};
use idobata_shared::time::get_epoch_millis;

/// 招待コード再生成の上限回数
const INVITE_CODE_ATTEMPTS: usize = 16;

#[derive(Debug, Default)]
struct Store {
    rooms: HashMap<RoomId, Room>,
    messages: HashMap<RoomId, Vec<ChatMessage>>,
}

/// インメモリ Room Directory 実装
pub struct InMemoryRoomDirectory {
    store: Mutex<Store>,
}

impl InMemoryRoomDirectory {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
        }
    }

    /// 全ルームを通して一意な招待コードを採番する
    fn generate_unique_invite_code(store: &Store) -> Result<InviteCode, DirectoryError> {
        for _ in 0..INVITE_CODE_ATTEMPTS {
            let code = InviteCodeFactory::generate()
                .map_err(|e| DirectoryError::Backend(e.to_string()))?;
            let taken = store
                .rooms
                .values()
                .any(|room| room.invite_code == code);
            if !taken {
                return Ok(code);
            }
        }
        Err(DirectoryError::Backend(
            "invite code space exhausted".to_string(),
        ))
    }
}

impl Default for InMemoryRoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn create_room(&self, owner: UserId, name: RoomName) -> Result<Room, DirectoryError> {
        let mut store = self.store.lock().await;
        let id =
            RoomIdFactory::generate().map_err(|e| DirectoryError::Backend(e.to_string()))?;
        let invite_code = Self::generate_unique_invite_code(&store)?;
        let room = Room::new(
            id.clone(),
            name,
            owner,
            invite_code,
            Timestamp::new(get_epoch_millis()),
        );
        store.rooms.insert(id, room.clone());
        Ok(room)
    }

    async fn find_by_invite_code(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Room>, DirectoryError> {
        let store = self.store.lock().await;
        Ok(store
            .rooms
            .values()
            .find(|room| room.invite_code == *code)
            .cloned())
    }

    async fn find_rooms_for_user(&self, user_id: &UserId) -> Result<Vec<Room>, DirectoryError> {
        let store = self.store.lock().await;
        let mut rooms: Vec<Room> = store
            .rooms
            .values()
            .filter(|room| room.is_member(user_id))
            .cloned()
            .collect();
        // 新しい順
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rooms)
    }

    async fn add_member(&self, room_id: &RoomId, user_id: UserId) -> Result<(), DirectoryError> {
        let mut store = self.store.lock().await;
        let room = store
            .rooms
            .get_mut(room_id)
            .ok_or(DirectoryError::RoomNotFound)?;
        room.add_member(user_id);
        Ok(())
    }

    async fn is_member(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<bool, DirectoryError> {
        let store = self.store.lock().await;
        let room = store
            .rooms
            .get(room_id)
            .ok_or(DirectoryError::RoomNotFound)?;
        Ok(room.is_member(user_id))
    }

    async fn append_message(
        &self,
        room_id: &RoomId,
        author_user_id: UserId,
        author_username: Username,
        body: MessageBody,
        timestamp_millis: i64,
    ) -> Result<ChatMessage, DirectoryError> {
        let mut store = self.store.lock().await;
        if !store.rooms.contains_key(room_id) {
            return Err(DirectoryError::RoomNotFound);
        }
        let message = ChatMessage {
            room_id: room_id.clone(),
            author_user_id,
            author_username,
            author_connection_id: None,
            body,
            timestamp: Timestamp::new(timestamp_millis),
        };
        store
            .messages
            .entry(room_id.clone())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn get_messages(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, DirectoryError> {
        let store = self.store.lock().await;
        if !store.rooms.contains_key(room_id) {
            return Err(DirectoryError::RoomNotFound);
        }
        let messages = store.messages.get(room_id).cloned().unwrap_or_default();
        // 直近 limit 件を時系列順で返す
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.into_iter().skip(skip).collect())
    }
}
