//! UseCase 層のエラー定義
//!
//! 認証・アクセス系の失敗は要求元の接続にだけ同期的に返す。
//! ストア障害は汎用の失敗としてログとともに返し、プロセスは落とさない。
//! どのエラーも在室状態を部分更新のまま残さない。

use crate::domain::DirectoryError;

/// join-room の失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinRoomError {
    #[error("you do not have access to this room")]
    AccessDenied,
    #[error("room not found")]
    RoomNotFound,
    #[error("connection has no authenticated session")]
    UnknownSession,
    #[error("storage failure: {0}")]
    Storage(DirectoryError),
}

impl JoinRoomError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::AccessDenied => "access-denied",
            Self::RoomNotFound => "room-not-found",
            Self::UnknownSession => "unknown-session",
            Self::Storage(_) => "storage-error",
        }
    }
}

/// create-room の失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateRoomError {
    #[error("room name must not be empty")]
    InvalidName,
    #[error("connection has no authenticated session")]
    UnknownSession,
    #[error("storage failure: {0}")]
    Storage(DirectoryError),
}

impl CreateRoomError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidName => "invalid-name",
            Self::UnknownSession => "unknown-session",
            Self::Storage(_) => "storage-error",
        }
    }
}

/// join-by-code の失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinByCodeError {
    #[error("invalid invite code")]
    InvalidInviteCode,
    #[error("connection has no authenticated session")]
    UnknownSession,
    #[error("storage failure: {0}")]
    Storage(DirectoryError),
}

impl JoinByCodeError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidInviteCode => "invalid-invite-code",
            Self::UnknownSession => "unknown-session",
            Self::Storage(_) => "storage-error",
        }
    }
}

/// list-my-rooms の失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListRoomsError {
    #[error("connection has no authenticated session")]
    UnknownSession,
    #[error("storage failure: {0}")]
    Storage(DirectoryError),
}

impl ListRoomsError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownSession => "unknown-session",
            Self::Storage(_) => "storage-error",
        }
    }
}

/// send-message の失敗
///
/// 空本文はエラーではなく黙殺される（`SendOutcome::Ignored`）。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendMessageError {
    #[error("connection has no authenticated session")]
    UnknownSession,
    #[error("storage failure: {0}")]
    Storage(DirectoryError),
}

impl SendMessageError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownSession => "unknown-session",
            Self::Storage(_) => "storage-error",
        }
    }
}
