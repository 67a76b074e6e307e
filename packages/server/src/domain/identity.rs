//! Identity Gate trait 定義
//!
//! 接続確立時に一度だけ呼ばれる認証のインターフェース。成功すると
//! 接続の生存期間を通して不変な `Identity` が得られる。

use async_trait::async_trait;

use super::entity::Identity;

/// 認証の失敗（接続レベル、接続試行ごと打ち切り）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// 資格情報が欠落している
    #[error("authentication required")]
    MissingCredential,
    /// 資格情報が不正または期限切れ
    #[error("invalid credential")]
    InvalidCredential,
}

/// ベアラ資格情報の検証インターフェース
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityGate: Send + Sync {
    /// 資格情報を検証し、認証済みアイデンティティを返す
    async fn authenticate(&self, credential: &str) -> Result<Identity, AuthError>;
}
