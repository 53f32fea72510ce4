//! UseCase: クライアント接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectClientUseCase::execute() メソッド
//! - 同じ ClientId での再接続をポリシー（replace / notify / reject）どおりに扱うこと
//!
//! ### なぜこのテストが必要か
//! - 1 つの ClientId に登録は 1 つだけという不変条件を保証する
//! - 置き換えられた古いチャンネルが閉じられることを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規クライアントの接続
//! - 再接続：ポリシーごとの振る舞い、ルームに参加中の再接続

use std::sync::Arc;

use crate::{
    domain::{
        ClientConnection, ClientId, ConnectionRegistry, MessagePusher, PusherChannel,
        RoomRepository, Session,
    },
    infrastructure::dto::websocket::OutboundMessage,
};

use super::{MembershipLock, delivery::deliver, error::ConnectError, membership::leave_room};

/// 同じ ClientId で接続済みのクライアントがいる場合の扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DuplicateIdentityPolicy {
    /// 新しい接続で置き換える（last-write-wins）。古いチャンネルは何も通知されずに閉じる
    #[default]
    Replace,
    /// 新しい接続で置き換え、古いチャンネルに `{"type":"replaced"}` を送ってから閉じる
    Notify,
    /// 新しい接続を拒否する
    Reject,
}

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    lock: MembershipLock,
    policy: DuplicateIdentityPolicy,
}

impl ConnectClientUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        lock: MembershipLock,
        policy: DuplicateIdentityPolicy,
    ) -> Self {
        Self {
            registry,
            rooms,
            message_pusher,
            lock,
            policy,
        }
    }

    /// クライアント接続を実行
    ///
    /// # Arguments
    ///
    /// * `client_id` - 接続するクライアントの ID
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - 接続成功
    /// * `Err(ConnectError)` - `Reject` ポリシーで既に同じ ClientId が接続している
    pub async fn execute(
        &self,
        client_id: ClientId,
        sender: PusherChannel,
    ) -> Result<Session, ConnectError> {
        let _guard = self.lock.lock().await;

        if self.registry.contains(&client_id).await {
            match self.policy {
                DuplicateIdentityPolicy::Reject => {
                    return Err(ConnectError::DuplicateClientId(client_id.into_string()));
                }
                DuplicateIdentityPolicy::Notify => {
                    deliver(
                        self.message_pusher.as_ref(),
                        &client_id,
                        &OutboundMessage::Replaced,
                    )
                    .await;
                }
                DuplicateIdentityPolicy::Replace => {}
            }

            // 置き換えで参加中のルームが None に戻るので、先にルームからも抜けておく
            if let Some(room_id) = self.registry.current_room(&client_id).await {
                leave_room(
                    self.registry.as_ref(),
                    self.rooms.as_ref(),
                    self.message_pusher.as_ref(),
                    &client_id,
                    &room_id,
                )
                .await;
            }
        }

        let connection = ClientConnection::new(sender);
        let session = Session {
            client_id: client_id.clone(),
            connection_id: connection.id,
        };

        // 古い sender を drop すると、古い WebSocket の送信タスクが終了して接続が閉じる
        if let Some(previous) = self.registry.register(client_id, connection).await {
            tracing::info!(
                "Client '{}' took over from connection {}",
                session.client_id,
                previous.id
            );
        }

        Ok(session)
    }
}
