//! Conversion logic between DTOs and domain entities.

use std::collections::HashMap;

use crate::domain::{entity, Roster};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<entity::ChatMessage> for dto::MessageDto {
    fn from(model: entity::ChatMessage) -> Self {
        Self {
            body: model.body.into_string(),
            author_username: model.author_username.into_string(),
            author_user_id: model.author_user_id.into_string(),
            author_connection_id: model.author_connection_id.map(|id| id.into_string()),
            timestamp: model.timestamp.value(),
        }
    }
}

impl From<entity::ChatMessage> for dto::ChatMessage {
    fn from(model: entity::ChatMessage) -> Self {
        Self {
            r#type: dto::MessageType::Chat,
            room_id: model.room_id.into_string(),
            body: model.body.into_string(),
            author_username: model.author_username.into_string(),
            author_user_id: model.author_user_id.into_string(),
            author_connection_id: model.author_connection_id.map(|id| id.into_string()),
            timestamp: model.timestamp.value(),
        }
    }
}

impl From<entity::Room> for dto::RoomSummaryDto {
    fn from(model: entity::Room) -> Self {
        Self {
            room_id: model.id.into_string(),
            name: model.name.into_string(),
            owner_user_id: model.owner.into_string(),
            invite_code: model.invite_code.into_string(),
        }
    }
}

/// ロスターのスナップショットを DTO のマップに変換
pub fn roster_to_dto(roster: Roster) -> HashMap<String, String> {
    roster
        .into_iter()
        .map(|(connection_id, username)| (connection_id.into_string(), username.into_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ConnectionId, InviteCode, MessageBody, RoomId, RoomName, Timestamp, UserId, Username,
    };

    #[test]
    fn test_domain_chat_message_to_message_dto() {
        // テスト項目: ドメインの ChatMessage が履歴 DTO に変換される
        // given (前提条件):
        let model = entity::ChatMessage {
            room_id: RoomId::default_room(),
            author_user_id: UserId::new("alice".to_string()).unwrap(),
            author_username: Username::new("Alice".to_string()).unwrap(),
            author_connection_id: Some(ConnectionId::new("c1".to_string()).unwrap()),
            body: MessageBody::new("Hello!".to_string()).unwrap(),
            timestamp: Timestamp::new(1000),
        };

        // when (操作):
        let dto_msg: dto::MessageDto = model.into();

        // then (期待する結果):
        assert_eq!(dto_msg.body, "Hello!");
        assert_eq!(dto_msg.author_username, "Alice");
        assert_eq!(dto_msg.author_user_id, "alice");
        assert_eq!(dto_msg.author_connection_id.as_deref(), Some("c1"));
        assert_eq!(dto_msg.timestamp, 1000);
    }

    #[test]
    fn test_stored_message_converts_without_connection_id() {
        // テスト項目: ストア由来のメッセージは接続 ID 無しで変換される
        // given (前提条件):
        let model = entity::ChatMessage {
            room_id: RoomId::new("room-1".to_string()).unwrap(),
            author_user_id: UserId::new("bob".to_string()).unwrap(),
            author_username: Username::new("Bob".to_string()).unwrap(),
            author_connection_id: None,
            body: MessageBody::new("Hi!".to_string()).unwrap(),
            timestamp: Timestamp::new(2000),
        };

        // when (操作):
        let dto_msg: dto::ChatMessage = model.into();

        // then (期待する結果):
        assert_eq!(dto_msg.author_connection_id, None);
        assert_eq!(dto_msg.room_id, "room-1");
        assert!(matches!(dto_msg.r#type, dto::MessageType::Chat));
    }

    #[test]
    fn test_domain_room_to_summary_dto() {
        // テスト項目: ドメインの Room が概要 DTO に変換される
        // given (前提条件):
        let model = entity::Room::new(
            RoomId::new("room-1".to_string()).unwrap(),
            RoomName::new("Team".to_string()).unwrap(),
            UserId::new("alice".to_string()).unwrap(),
            InviteCode::new("deadbeef".to_string()).unwrap(),
            Timestamp::new(1000),
        );

        // when (操作):
        let summary: dto::RoomSummaryDto = model.into();

        // then (期待する結果):
        assert_eq!(summary.room_id, "room-1");
        assert_eq!(summary.name, "Team");
        assert_eq!(summary.owner_user_id, "alice");
        assert_eq!(summary.invite_code, "deadbeef");
    }

    #[test]
    fn test_roster_to_dto_keys_by_connection_id() {
        // テスト項目: ロスターが connection_id → username のマップに
        //             変換される
        // given (前提条件):
        let mut roster = Roster::default();
        roster.insert(
            ConnectionId::new("c1".to_string()).unwrap(),
            Username::new("Alice".to_string()).unwrap(),
        );

        // when (操作):
        let map = roster_to_dto(roster);

        // then (期待する結果):
        assert_eq!(map.get("c1").map(String::as_str), Some("Alice"));
    }
}
