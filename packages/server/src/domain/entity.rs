//! ドメインエンティティ定義
//!
//! `Room` は Room Directory が永続化するルームのメタデータ。
//! ライブな在室状態は持たない（それは `RoomRegistry` の責務）。

use super::value_object::{
    ConnectionId, InviteCode, MessageBody, RoomId, RoomName, Timestamp, UserId, Username,
};

/// 認証済みの利用者（接続ごとに不変）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// 永続的なユーザー ID
    pub user_id: UserId,
    /// 表示名
    pub username: Username,
}

impl Identity {
    pub fn new(user_id: UserId, username: Username) -> Self {
        Self { user_id, username }
    }
}

/// ユーザー作成ルームの永続メタデータ
///
/// 不変条件: オーナーは常に `members` に含まれる。
/// デフォルトルーム（`public`）はここには存在しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub name: RoomName,
    pub owner: UserId,
    pub members: Vec<UserId>,
    pub invite_code: InviteCode,
    pub created_at: Timestamp,
}

impl Room {
    /// Create a new room with the owner as the first member
    pub fn new(
        id: RoomId,
        name: RoomName,
        owner: UserId,
        invite_code: InviteCode,
        created_at: Timestamp,
    ) -> Self {
        let members = vec![owner.clone()];
        Self {
            id,
            name,
            owner,
            members,
            invite_code,
            created_at,
        }
    }

    /// オーナーもメンバーとして扱う
    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.owner == *user_id || self.members.contains(user_id)
    }

    /// メンバーを追加（既にメンバーなら何もしない）
    pub fn add_member(&mut self, user_id: UserId) {
        if !self.is_member(&user_id) {
            self.members.push(user_id);
        }
    }
}

/// チャットメッセージ
///
/// `author_connection_id` はライブ配信時のみ Some。ストアから
/// 読み戻した履歴では、元の接続は既に存在しないため None になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub author_user_id: UserId,
    pub author_username: Username,
    pub author_connection_id: Option<ConnectionId>,
    pub body: MessageBody,
    pub timestamp: Timestamp,
}
