//! UseCase layer
//!
//! Connection Registry / Room Repository / MessagePusher を組み合わせて、
//! シグナリング中継のユースケースを実装します。
//!
//! - 接続・切断: `ConnectClientUseCase`, `DisconnectClientUseCase`
//! - ルーム: `JoinRoomUseCase`, `QuitRoomUseCase`
//! - 1:1 の中継: `RelaySignalUseCase`, `CheckOnlineUseCase`
//! - 受信メッセージの振り分け: `RouteMessageUseCase`
//! - HTTP API: `GetRoomsUseCase`, `GetRoomDetailUseCase`

use std::sync::Arc;

use tokio::sync::Mutex;

mod check_online;
mod connect_client;
mod delivery;
mod disconnect_client;
mod error;
mod get_room_detail;
mod get_rooms;
mod join_room;
mod membership;
mod quit_room;
mod relay_signal;
mod route_message;

#[cfg(test)]
pub(crate) mod test_support;

pub use check_online::CheckOnlineUseCase;
pub use connect_client::{ConnectClientUseCase, DuplicateIdentityPolicy};
pub use disconnect_client::{DisconnectClientUseCase, DisconnectOutcome};
pub use error::{ConnectError, GetRoomDetailError, SessionError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use quit_room::QuitRoomUseCase;
pub use relay_signal::RelaySignalUseCase;
pub use route_message::{RouteMessageUseCase, RouteOutcome};

/// 2 つの Registry をまたいで読み書きする処理（接続・join・quit・close・切断）を直列化するロック
pub type MembershipLock = Arc<Mutex<()>>;

pub fn new_membership_lock() -> MembershipLock {
    Arc::new(Mutex::new(()))
}
