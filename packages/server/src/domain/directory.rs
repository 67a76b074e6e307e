//! Room Directory trait 定義
//!
//! ルームのメタデータ・メンバーシップ・永続メッセージ履歴を所有する
//! 外部ストアへのインターフェース。UseCase 層はこの trait に依存し、
//! Infrastructure 層の具体的な実装には依存しない（依存性の逆転）。
//!
//! デフォルトルーム（`public`）はこのストアには存在しない。

use async_trait::async_trait;

use super::entity::{ChatMessage, Room};
use super::value_object::{InviteCode, MessageBody, RoomId, RoomName, UserId, Username};

/// Directory 操作の失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// 指定されたルームが存在しない
    #[error("room not found")]
    RoomNotFound,
    /// 招待コードが既に使われている
    #[error("invite code '{0}' already exists")]
    DuplicateInviteCode(String),
    /// ストア自体の障害
    #[error("directory backend error: {0}")]
    Backend(String),
}

/// 永続ルームストアへのインターフェース
///
/// ## 不変条件
///
/// - 招待コードは全ルームを通して一意
/// - ルームのオーナーは常にメンバー集合に含まれる
/// - メッセージは追記専用で、時系列順に読み戻せる
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// ルームを作成する（オーナーを最初のメンバーとして登録し、
    /// 一意な招待コードを採番する）
    async fn create_room(&self, owner: UserId, name: RoomName) -> Result<Room, DirectoryError>;

    /// 招待コードからルームを引く
    async fn find_by_invite_code(
        &self,
        code: &InviteCode,
    ) -> Result<Option<Room>, DirectoryError>;

    /// ユーザーが所有または所属するルームの一覧（新しい順）
    async fn find_rooms_for_user(&self, user_id: &UserId) -> Result<Vec<Room>, DirectoryError>;

    /// ルームに永続メンバーを追加する
    async fn add_member(&self, room_id: &RoomId, user_id: UserId) -> Result<(), DirectoryError>;

    /// ユーザーがルームのメンバー（またはオーナー）かどうか
    async fn is_member(&self, room_id: &RoomId, user_id: &UserId)
        -> Result<bool, DirectoryError>;

    /// メッセージを追記し、保存されたメッセージを返す
    async fn append_message(
        &self,
        room_id: &RoomId,
        author_user_id: UserId,
        author_username: Username,
        body: MessageBody,
        timestamp_millis: i64,
    ) -> Result<ChatMessage, DirectoryError>;

    /// ルームのメッセージを時系列順に読み出す（最大 limit 件、
    /// 直近のものを優先）
    async fn get_messages(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, DirectoryError>;
}
