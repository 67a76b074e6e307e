//! 値オブジェクト定義
//!
//! 文字列をそのまま引き回さず、検証済みの newtype として扱います。
//! 生成に失敗した値はドメイン層に入りません。

use uuid::Uuid;

/// Validation failure when constructing a value object
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

macro_rules! string_value_object {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueError> {
                if value.trim().is_empty() {
                    return Err(ValueError::Empty($label));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

string_value_object!(
    /// 接続ごとにサーバーが採番する一時的な識別子
    ///
    /// ユーザー ID とは別物。同一ユーザーが複数の接続を持ち得る。
    ConnectionId,
    "connection id"
);

string_value_object!(
    /// 認証済みユーザーの永続的な識別子
    UserId,
    "user id"
);

string_value_object!(
    /// 表示名（再接続間で一意とは限らない）
    Username,
    "username"
);

string_value_object!(
    /// 招待コード（8 文字の 16 進文字列、全体で一意）
    InviteCode,
    "invite code"
);

/// 論理ルームの識別子
///
/// `"public"` はデフォルトルーム（オーナーなし・招待コードなし・
/// 自由参加）を表す予約 ID。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// The always-available open room
    pub const DEFAULT: &'static str = "public";

    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.trim().is_empty() {
            return Err(ValueError::Empty("room id"));
        }
        Ok(Self(value))
    }

    /// The distinguished default/public room
    pub fn default_room() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// ルーム名（トリム後に空でないこと、50 文字以内）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomName(String);

impl RoomName {
    pub const MAX_LEN: usize = 50;

    pub fn new(value: String) -> Result<Self, ValueError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueError::Empty("room name"));
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(ValueError::TooLong {
                field: "room name",
                max: Self::MAX_LEN,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// メッセージ本文（トリム済み、空でないこと）
///
/// 空白のみの本文はここで弾かれ、送信処理では黙って無視される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(value: String) -> Result<Self, ValueError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueError::Empty("message body"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// ConnectionId の採番（UUID v4）
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> Result<ConnectionId, ValueError> {
        ConnectionId::new(Uuid::new_v4().to_string())
    }
}

/// RoomId の採番（UUID v4）
pub struct RoomIdFactory;

impl RoomIdFactory {
    pub fn generate() -> Result<RoomId, ValueError> {
        RoomId::new(Uuid::new_v4().to_string())
    }
}

/// 招待コードの採番
///
/// 4 バイトの乱数を 16 進表記した 8 文字のコード。一意性の保証は
/// Room Directory 側の責務（衝突時は再生成）。
pub struct InviteCodeFactory;

impl InviteCodeFactory {
    pub fn generate() -> Result<InviteCode, ValueError> {
        let bytes: [u8; 4] = rand::random();
        let code = bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>();
        InviteCode::new(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_rejects_empty() {
        // テスト項目: 空文字列から ConnectionId を生成できない
        // given (前提条件):
        let value = "".to_string();

        // when (操作):
        let result = ConnectionId::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueError::Empty("connection id")));
    }

    #[test]
    fn test_room_id_default_room() {
        // テスト項目: デフォルトルームの RoomId が正しく判定される
        // given (前提条件):
        let default = RoomId::default_room();
        let other = RoomId::new("team-a".to_string()).unwrap();

        // when (操作) / then (期待する結果):
        assert!(default.is_default());
        assert_eq!(default.as_str(), "public");
        assert!(!other.is_default());
    }

    #[test]
    fn test_room_name_trims_whitespace() {
        // テスト項目: ルーム名は前後の空白を除去して保持される
        // given (前提条件):
        let value = "  Team Idobata  ".to_string();

        // when (操作):
        let name = RoomName::new(value).unwrap();

        // then (期待する結果):
        assert_eq!(name.as_str(), "Team Idobata");
    }

    #[test]
    fn test_room_name_rejects_blank() {
        // テスト項目: 空白のみのルーム名は拒否される
        // given (前提条件):
        let value = "   ".to_string();

        // when (操作):
        let result = RoomName::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueError::Empty("room name")));
    }

    #[test]
    fn test_room_name_rejects_too_long() {
        // テスト項目: 50 文字を超えるルーム名は拒否される
        // given (前提条件):
        let value = "x".repeat(51);

        // when (操作):
        let result = RoomName::new(value);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueError::TooLong {
                field: "room name",
                max: 50
            })
        );
    }

    #[test]
    fn test_message_body_rejects_whitespace_only() {
        // テスト項目: 空白のみの本文は拒否される
        // given (前提条件):
        let value = " \t\n ".to_string();

        // when (操作):
        let result = MessageBody::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueError::Empty("message body")));
    }

    #[test]
    fn test_message_body_trims_whitespace() {
        // テスト項目: 本文は前後の空白を除去して保持される
        // given (前提条件):
        let value = "  hi there  ".to_string();

        // when (操作):
        let body = MessageBody::new(value).unwrap();

        // then (期待する結果):
        assert_eq!(body.as_str(), "hi there");
    }

    #[test]
    fn test_connection_id_factory_generates_unique_ids() {
        // テスト項目: ConnectionIdFactory が毎回異なる ID を生成する
        // given (前提条件):

        // when (操作):
        let id1 = ConnectionIdFactory::generate().unwrap();
        let id2 = ConnectionIdFactory::generate().unwrap();

        // then (期待する結果):
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_invite_code_factory_generates_hex_code() {
        // テスト項目: InviteCodeFactory が 8 文字の 16 進コードを生成する
        // given (前提条件):

        // when (操作):
        let code = InviteCodeFactory::generate().unwrap();

        // then (期待する結果):
        assert_eq!(code.as_str().len(), 8);
        assert!(code.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
