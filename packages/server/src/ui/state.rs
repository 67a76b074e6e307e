//! Server state and connection management.

use std::sync::Arc;

use crate::domain::{IdentityGate, MessagePusher};
use crate::usecase::{
    ConnectSessionUseCase, CreateRoomUseCase, DisconnectSessionUseCase, JoinByInviteCodeUseCase,
    JoinRoomUseCase, LeaveRoomUseCase, ListRoomsUseCase, SendMessageUseCase, TypingUseCase,
};

/// Shared application state
pub struct AppState {
    /// Identity Gate（接続時認証の抽象化）
    pub identity_gate: Arc<dyn IdentityGate>,
    /// MessagePusher（要求元へのユニキャスト ACK 用）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// ConnectSessionUseCase（セッション接続のユースケース）
    pub connect_session_usecase: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（セッション切断のユースケース）
    pub disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// JoinRoomUseCase（ルーム入室のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム退室のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// CreateRoomUseCase（ルーム作成のユースケース）
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    /// JoinByInviteCodeUseCase（招待コード参加のユースケース）
    pub join_by_invite_usecase: Arc<JoinByInviteCodeUseCase>,
    /// ListRoomsUseCase（所属ルーム一覧のユースケース）
    pub list_rooms_usecase: Arc<ListRoomsUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// TypingUseCase（タイピングインジケーターのユースケース）
    pub typing_usecase: Arc<TypingUseCase>,
}
