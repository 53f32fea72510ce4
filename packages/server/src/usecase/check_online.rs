//! UseCase: オンライン状態の問い合わせ

use std::sync::Arc;

use crate::{
    domain::{ClientId, ConnectionRegistry, MessagePusher},
    infrastructure::dto::websocket::OutboundMessage,
};

use super::delivery::deliver;

/// オンライン状態確認のユースケース
pub struct CheckOnlineUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl CheckOnlineUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// `ids` の各要素が接続中かどうかを同じ順序で返し、問い合わせ元にも `online` で応答する
    ///
    /// 空文字列の ID は常に `false`。
    pub async fn execute(&self, requester: &ClientId, ids: &[String]) -> Vec<bool> {
        let mut online = Vec::with_capacity(ids.len());
        for id in ids {
            let connected = match ClientId::new(id.clone()) {
                Ok(client_id) => self.registry.contains(&client_id).await,
                Err(_) => false,
            };
            online.push(connected);
        }

        deliver(
            self.message_pusher.as_ref(),
            requester,
            &OutboundMessage::Online {
                online: online.clone(),
            },
        )
        .await;

        online
    }
}
