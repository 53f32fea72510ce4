//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクト生成時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("ClientId must not be empty")]
    EmptyClientId,

    #[error("RoomId must not be empty")]
    EmptyRoomId,
}

/// メッセージ配送のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 宛先のクライアントが ConnectionRegistry に存在しない
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    /// チャンネルが既に閉じられている
    #[error("Failed to push message: {0}")]
    PushFailed(String),
}
