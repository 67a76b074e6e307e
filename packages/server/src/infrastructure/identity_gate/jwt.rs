//! JWT を使った Identity Gate 実装
//!
//! 接続時に提示されるベアラトークン（HS256）を検証し、認証済みの
//! `Identity` を返します。クレームは `sub`（ユーザー ID）、`name`
//! （表示名）、`exp`（有効期限）。

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthError, Identity, IdentityGate, UserId, Username};

/// トークンの有効期間（秒）
const TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    name: String,
    exp: i64,
}

/// HS256 JWT による IdentityGate 実装
pub struct JwtIdentityGate {
    secret: String,
}

impl JwtIdentityGate {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// ユーザー ID と表示名からトークンを発行する
    ///
    /// 運用上の発行は外部の認証サービスの責務。ここでの実装は
    /// テストと開発ツール用。
    pub fn sign(&self, user_id: &str, username: &str) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            name: username.to_string(),
            exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|_| AuthError::InvalidCredential)
    }
}

#[async_trait]
impl IdentityGate for JwtIdentityGate {
    async fn authenticate(&self, credential: &str) -> Result<Identity, AuthError> {
        if credential.trim().is_empty() {
            return Err(AuthError::MissingCredential);
        }
        let data = decode::<Claims>(
            credential,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            tracing::warn!("Token validation failed: {}", e);
            AuthError::InvalidCredential
        })?;

        let user_id =
            UserId::new(data.claims.sub).map_err(|_| AuthError::InvalidCredential)?;
        let username =
            Username::new(data.claims.name).map_err(|_| AuthError::InvalidCredential)?;
        Ok(Identity::new(user_id, username))
    }
}
