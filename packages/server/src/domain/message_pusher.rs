//! MessagePusher trait 定義
//!
//! クライアントへのメッセージ配送（通知）の抽象化。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ClientId, MessagePushError};

/// クライアントへメッセージを送るためのチャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// メッセージ配送のインターフェース
///
/// 宛先は ConnectionRegistry で解決される。配送は fire-and-forget で、リトライは行わない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 特定のクライアントにメッセージを送信
    async fn push_to(&self, client_id: &ClientId, content: &str) -> Result<(), MessagePushError>;

    /// 宛先が存在すれば送信する
    ///
    /// 宛先が存在しない・チャンネルが閉じている場合はエラーにせず `false` を返す。
    async fn send_if_present(&self, client_id: &ClientId, content: &str) -> bool;

    /// 複数のクライアントに送信し、送信を試みた宛先を返す
    ///
    /// 一部の宛先が存在しなくても全体は失敗しない。
    async fn broadcast(&self, targets: &[ClientId], content: &str) -> Vec<ClientId>;
}
