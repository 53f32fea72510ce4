//! UseCase 層のエラー型

use thiserror::Error;

/// 接続（ClientId の登録）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// `DuplicateIdentityPolicy::Reject` の下で、同じ ClientId が既に接続している
    #[error("Client ID '{0}' is already connected")]
    DuplicateClientId(String),
}

/// セッションのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// チャンネルが既に切断されているか、新しい接続に置き換えられている
    #[error("Session of client '{0}' is no longer active")]
    Inactive(String),
}

/// ルーム詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("Room '{0}' not found")]
    RoomNotFound(String),
}
