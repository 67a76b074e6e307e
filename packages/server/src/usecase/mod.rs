//! UseCase layer: one use case per inbound operation.
//!
//! 各ユースケースは Repository / Pusher の抽象と、在室状態を直列化する
//! `Arc<Mutex<RoomRegistry>>` だけに依存します。Directory への await は
//! レジストリのロックを保持せずに行い、インメモリ状態への反映は
//! ロック区間でまとめて適用します。

pub mod connect_session;
pub mod create_room;
pub mod disconnect_session;
pub mod error;
pub mod join_by_invite;
pub mod join_room;
pub mod leave_room;
pub mod list_rooms;
pub mod send_message;
pub mod typing;

pub use connect_session::ConnectSessionUseCase;
pub use create_room::CreateRoomUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{
    CreateRoomError, JoinByCodeError, JoinRoomError, ListRoomsError, SendMessageError,
};
pub use join_by_invite::JoinByInviteCodeUseCase;
pub use join_room::{JoinOutcome, JoinRoomUseCase};
pub use leave_room::LeaveRoomUseCase;
pub use list_rooms::ListRoomsUseCase;
pub use send_message::{DeliveredMessage, SendMessageUseCase, SendOutcome};
pub use typing::TypingUseCase;
