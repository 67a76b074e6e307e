//! Domain layer: value objects, entities, live room state and the
//! collaborator interfaces required by the use cases.

pub mod directory;
pub mod entity;
pub mod identity;
pub mod pusher;
pub mod registry;
pub mod value_object;

pub use directory::{DirectoryError, RoomDirectory};
pub use entity::{ChatMessage, Identity, Room};
pub use identity::{AuthError, IdentityGate};
pub use pusher::{MessagePushError, MessagePusher, PusherChannel};
pub use registry::{
    AffectedRoom, DisconnectEffect, EvictedRoom, JoinEffect, LeaveEffect, RoomRegistry, Roster,
    SendEffect, TypingStart, LOBBY_HISTORY_CAP,
};
pub use value_object::{
    ConnectionId, ConnectionIdFactory, InviteCode, InviteCodeFactory, MessageBody, RoomId,
    RoomIdFactory, RoomName, Timestamp, UserId, Username, ValueError,
};

#[cfg(test)]
pub use directory::MockRoomDirectory;
#[cfg(test)]
pub use identity::MockIdentityGate;
#[cfg(test)]
pub use pusher::MockMessagePusher;
