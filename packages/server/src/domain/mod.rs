//! Domain layer
//!
//! シグナリング中継のドメインモデルと、外側の層が実装すべきインターフェースを定義します。
//!
//! - `value_object`: ClientId, RoomId などの値オブジェクト
//! - `entity`: Room, ClientConnection などのエンティティ
//! - `repository`: ConnectionRegistry / RoomRepository trait
//! - `message_pusher`: MessagePusher trait（メッセージ配送の抽象化）

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{
    ClientConnection, DEFAULT_ROOM_CAPACITY, JoinOutcome, LeaveOutcome, Member, Room, Session,
};
pub use error::{MessagePushError, ValueObjectError};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{ConnectionRegistry, RoomRepository};
pub use value_object::{ClientId, ConnectionId, Payload, RoomId, Timestamp};
