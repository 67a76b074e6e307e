//! MessagePusher trait 定義
//!
//! 接続へのメッセージ配信の抽象化。UseCase 層はこの trait に依存し、
//! WebSocket などの具体的な配信手段には依存しない。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::value_object::ConnectionId;

/// 接続ごとの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// 配信の失敗
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessagePushError {
    /// 対象の接続が登録されていない
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),
    /// チャンネルへの送信に失敗した
    #[error("push failed: {0}")]
    PushFailed(String),
}

/// 接続へのメッセージ配信インターフェース
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録する
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを登録解除する（冪等）
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 特定の接続へ送信する
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続へ送信する（一部の失敗は許容する）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
