//! UseCase: シグナリングメッセージの中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - offer / answer / candidate / friend / close を宛先のクライアントに 1 通だけ届けること
//! - 送信元の ClientId が `from` として付与されること
//!
//! ### なぜこのテストが必要か
//! - 宛先が存在しない場合は黙って捨て、送信者にもエラーを返さない
//! - close は宛先のルーム参加状態もリセットする
//!
//! ### どのような状況を想定しているか
//! - 正常系：offer → answer の往復
//! - 宛先不在：どこにも何も届かない
//! - close：宛先がルームから抜け、残りのメンバーに quit が届く

use std::sync::Arc;

use serde_json::Map;

use crate::{
    domain::{ClientId, ConnectionRegistry, MessagePusher, Payload, RoomRepository},
    infrastructure::dto::websocket::OutboundMessage,
};

use super::{MembershipLock, delivery::deliver, membership::leave_room};

/// シグナリング中継のユースケース
pub struct RelaySignalUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    lock: MembershipLock,
}

impl RelaySignalUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        lock: MembershipLock,
    ) -> Self {
        Self {
            registry,
            rooms,
            message_pusher,
            lock,
        }
    }

    /// SDP offer を中継する。offer 以外のフィールドもそのまま届ける
    pub async fn offer(
        &self,
        from: &ClientId,
        to: &ClientId,
        offer: Payload,
        passthrough: Map<String, Payload>,
    ) -> bool {
        let message = OutboundMessage::Offer {
            offer,
            from: from.to_string(),
            passthrough,
        };
        self.forward("offer", from, to, &message).await
    }

    /// SDP answer を中継する
    pub async fn answer(&self, from: &ClientId, to: &ClientId, answer: Payload) -> bool {
        let message = OutboundMessage::Answer {
            answer,
            from: from.to_string(),
        };
        self.forward("answer", from, to, &message).await
    }

    /// ICE candidate を中継する
    pub async fn candidate(&self, from: &ClientId, to: &ClientId, candidate: Payload) -> bool {
        let message = OutboundMessage::Candidate {
            candidate,
            from: from.to_string(),
        };
        self.forward("candidate", from, to, &message).await
    }

    /// フレンド申請を中継する。`from` は付与しない
    pub async fn friend(
        &self,
        from: &ClientId,
        to: &ClientId,
        name: Payload,
        img: Payload,
        account_id: Payload,
    ) -> bool {
        let message = OutboundMessage::Friend {
            name,
            img,
            account_id,
        };
        self.forward("friend", from, to, &message).await
    }

    /// 宛先に close を届け、宛先をルームから抜けさせる
    ///
    /// 宛先のチャンネルが閉じていても、ルームからの退出は行う。
    pub async fn close(&self, from: &ClientId, to: &ClientId) -> bool {
        let _guard = self.lock.lock().await;

        let delivered = self.forward("close", from, to, &OutboundMessage::Close).await;

        if let Some(room_id) = self.registry.current_room(to).await {
            leave_room(
                self.registry.as_ref(),
                self.rooms.as_ref(),
                self.message_pusher.as_ref(),
                to,
                &room_id,
            )
            .await;
        }

        delivered
    }

    async fn forward(
        &self,
        kind: &str,
        from: &ClientId,
        to: &ClientId,
        message: &OutboundMessage,
    ) -> bool {
        let delivered = deliver(self.message_pusher.as_ref(), to, message).await;
        if delivered {
            tracing::debug!("Relayed {} from '{}' to '{}'", kind, from, to);
        } else {
            tracing::debug!("Dropped {} from '{}': '{}' is not connected", kind, from, to);
        }
        delivered
    }
}
