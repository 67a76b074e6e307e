//! WebSocket ワイヤフォーマットの DTO 定義
//!
//! すべてのフレームは JSON テキストで、`type` タグ（ケバブケース）で
//! 識別される。インバウンドはタグ付き enum で受け、アウトバウンドは
//! イベントごとの構造体で送る。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// クライアント → サーバーのイベント
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "join-room")]
    JoinRoom { room_id: String },
    #[serde(rename = "leave-room")]
    LeaveRoom { room_id: String },
    #[serde(rename = "create-room")]
    CreateRoom { name: String },
    #[serde(rename = "join-by-code")]
    JoinByCode { code: String },
    #[serde(rename = "list-my-rooms")]
    ListMyRooms,
    #[serde(rename = "send-message")]
    SendMessage { room_id: String, body: String },
    #[serde(rename = "start-typing")]
    StartTyping { room_id: String },
    #[serde(rename = "stop-typing")]
    StopTyping { room_id: String },
    /// トランスポートの close に先行する明示的な切断通知
    #[serde(rename = "disconnecting")]
    Disconnecting,
}

/// サーバー → クライアントのイベント種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "room-history")]
    RoomHistory,
    #[serde(rename = "roster-update")]
    RosterUpdate,
    #[serde(rename = "message")]
    Chat,
    #[serde(rename = "typing-start")]
    TypingStart,
    #[serde(rename = "typing-stop")]
    TypingStop,
    #[serde(rename = "room-created")]
    RoomCreated,
    #[serde(rename = "room-joined")]
    RoomJoined,
    #[serde(rename = "my-rooms")]
    MyRooms,
    #[serde(rename = "room-catalog-changed")]
    RoomCatalogChanged,
    #[serde(rename = "error")]
    Error,
}

/// 履歴・配信メッセージの共通表現
///
/// `author_connection_id` はストアから読み戻した履歴では null。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub body: String,
    pub author_username: String,
    pub author_user_id: String,
    pub author_connection_id: Option<String>,
    pub timestamp: i64,
}

/// ルームの概要（list-my-rooms の要素）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub name: String,
    pub owner_user_id: String,
    pub invite_code: String,
}

/// join 時に要求元へユニキャストされる履歴
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomHistoryMessage {
    pub r#type: MessageType,
    pub room_id: String,
    pub messages: Vec<MessageDto>,
}

/// ルームの現在のロスター（在室変化のたびにマルチキャスト）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterUpdateMessage {
    pub r#type: MessageType,
    pub room_id: String,
    /// connection_id → username
    pub users: HashMap<String, String>,
}

/// チャットメッセージの配信イベント
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub r#type: MessageType,
    pub room_id: String,
    pub body: String,
    pub author_username: String,
    pub author_user_id: String,
    pub author_connection_id: Option<String>,
    pub timestamp: i64,
}

/// タイピング開始（送信者以外にマルチキャスト）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingStartMessage {
    pub r#type: MessageType,
    pub room_id: String,
    pub connection_id: String,
    pub username: String,
}

/// タイピング停止（常にルームでスコープされる）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingStopMessage {
    pub r#type: MessageType,
    pub room_id: String,
    pub connection_id: String,
}

/// create-room への ACK（要求元にユニキャスト）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreatedMessage {
    pub r#type: MessageType,
    pub room_id: String,
    pub invite_code: String,
}

/// join-by-code への ACK（要求元にユニキャスト）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomJoinedMessage {
    pub r#type: MessageType,
    pub room_id: String,
}

/// list-my-rooms への応答（要求元にユニキャスト）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyRoomsMessage {
    pub r#type: MessageType,
    pub rooms: Vec<RoomSummaryDto>,
}

/// ルームカタログが変わったことのヒント（全接続にブロードキャスト）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCatalogChangedMessage {
    pub r#type: MessageType,
}

/// 操作失敗の通知（要求元にユニキャスト）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub r#type: MessageType,
    /// 機械可読な失敗理由（例: "access-denied"）
    pub reason: String,
    /// 人間可読な説明
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_join_room_deserializes() {
        // テスト項目: join-room イベントがタグ付きでデシリアライズできる
        // given (前提条件):
        let json = r#"{"type":"join-room","room_id":"public"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert!(matches!(event, ClientEvent::JoinRoom { room_id } if room_id == "public"));
    }

    #[test]
    fn test_client_event_unit_variant_deserializes() {
        // テスト項目: ペイロードの無いイベントもデシリアライズできる
        // given (前提条件):
        let json = r#"{"type":"list-my-rooms"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert!(matches!(event, ClientEvent::ListMyRooms));
    }

    #[test]
    fn test_client_event_unknown_type_is_an_error() {
        // テスト項目: 未知の type はデシリアライズエラーになる
        // given (前提条件):
        let json = r#"{"type":"no-such-event"}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientEvent>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_server_event_type_tags_are_kebab_case() {
        // テスト項目: アウトバウンドの type タグがケバブケースで出る
        // given (前提条件):
        let msg = RosterUpdateMessage {
            r#type: MessageType::RosterUpdate,
            room_id: "public".to_string(),
            users: HashMap::new(),
        };

        // when (操作):
        let json = serde_json::to_string(&msg).unwrap();

        // then (期待する結果):
        assert!(json.contains(r#""type":"roster-update""#));
    }

    #[test]
    fn test_error_message_carries_reason_and_text() {
        // テスト項目: error イベントが機械可読理由と説明文を持つ
        // given (前提条件):
        let msg = ErrorMessage {
            r#type: MessageType::Error,
            reason: "access-denied".to_string(),
            message: "you do not have access to this room".to_string(),
        };

        // when (操作):
        let json = serde_json::to_string(&msg).unwrap();

        // then (期待する結果):
        assert!(json.contains(r#""reason":"access-denied""#));
        assert!(json.contains(r#""type":"error""#));
    }
}
