//! UseCase: 受信メッセージのルーティング
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RouteMessageUseCase::execute() メソッド
//! - `type` ごとの振り分けと、不正なメッセージの扱い
//!
//! ### なぜこのテストが必要か
//! - 不正なメッセージで接続が落ちないこと、送信者にだけエラーが返ることを保証する
//! - 置き換えられたチャンネルからのメッセージを処理しないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：offer / online / join / quit の振り分け
//! - 異常系：未知の type、JSON でない入力、必須フィールドの欠落、空の宛先

use std::sync::Arc;

use crate::{
    domain::{ClientId, ConnectionRegistry, MessagePusher, RoomId, Session},
    infrastructure::dto::websocket::{InboundMessage, OutboundMessage},
};

use super::{
    CheckOnlineUseCase, JoinRoomUseCase, QuitRoomUseCase, RelaySignalUseCase, delivery::deliver,
};

/// ルーティングの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// 他のクライアント 1 件宛てのメッセージを中継した（宛先がいなければ `delivered == false`）
    Forwarded { delivered: bool },
    /// 送信者に応答した
    Replied,
    /// ルームのメンバーに通知した
    Broadcast { targets: Vec<ClientId> },
    /// セッションが無効なので何もしなかった
    Discarded,
}

/// メッセージルーティングのユースケース
pub struct RouteMessageUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    relay: Arc<RelaySignalUseCase>,
    check_online: Arc<CheckOnlineUseCase>,
    join_room: Arc<JoinRoomUseCase>,
    quit_room: Arc<QuitRoomUseCase>,
}

impl RouteMessageUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        relay: Arc<RelaySignalUseCase>,
        check_online: Arc<CheckOnlineUseCase>,
        join_room: Arc<JoinRoomUseCase>,
        quit_room: Arc<QuitRoomUseCase>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            relay,
            check_online,
            join_room,
            quit_room,
        }
    }

    /// テキストフレームを 1 つ処理する
    ///
    /// どんな入力に対してもパニックせず、エラーは送信者への `error` 応答になる。
    pub async fn execute(&self, session: &Session, text: &str) -> RouteOutcome {
        let source = &session.client_id;

        if !self
            .registry
            .is_current(source, session.connection_id)
            .await
        {
            tracing::debug!("Discarding frame from superseded channel of '{}'", source);
            return RouteOutcome::Discarded;
        }

        let message = InboundMessage::parse(text);
        tracing::debug!("Routing '{}' from '{}'", message.message_type(), source);

        match message {
            InboundMessage::Offer(request) => {
                let Some(to) = target(request.to_id) else {
                    return RouteOutcome::dropped();
                };
                let delivered = self
                    .relay
                    .offer(source, &to, request.offer, request.passthrough)
                    .await;
                RouteOutcome::Forwarded { delivered }
            }
            InboundMessage::Answer(request) => {
                let Some(to) = target(request.to_id) else {
                    return RouteOutcome::dropped();
                };
                let delivered = self.relay.answer(source, &to, request.answer).await;
                RouteOutcome::Forwarded { delivered }
            }
            InboundMessage::Candidate(request) => {
                let Some(to) = target(request.to_id) else {
                    return RouteOutcome::dropped();
                };
                let delivered = self.relay.candidate(source, &to, request.candidate).await;
                RouteOutcome::Forwarded { delivered }
            }
            InboundMessage::Close(request) => {
                let Some(to) = target(request.to_id) else {
                    return RouteOutcome::dropped();
                };
                let delivered = self.relay.close(source, &to).await;
                RouteOutcome::Forwarded { delivered }
            }
            InboundMessage::Friend(request) => {
                let Some(to) = target(request.to_id) else {
                    return RouteOutcome::dropped();
                };
                let delivered = self
                    .relay
                    .friend(source, &to, request.name, request.img, request.account_id)
                    .await;
                RouteOutcome::Forwarded { delivered }
            }
            InboundMessage::Online(request) => {
                self.check_online.execute(source, &request.ids).await;
                RouteOutcome::Replied
            }
            InboundMessage::Join(request) => {
                let Ok(room_id) = RoomId::new(request.room) else {
                    return self.reply_unrecognized(source, "join").await;
                };
                match self.join_room.execute(session, room_id, request.play).await {
                    Ok(_) => RouteOutcome::Replied,
                    Err(_) => RouteOutcome::Discarded,
                }
            }
            InboundMessage::Quit(request) => {
                let Ok(room_id) = RoomId::new(request.room) else {
                    return self.reply_unrecognized(source, "quit").await;
                };
                match self.quit_room.execute(session, &room_id).await {
                    Ok(targets) => RouteOutcome::Broadcast { targets },
                    Err(_) => RouteOutcome::Discarded,
                }
            }
            InboundMessage::Login(_) => {
                tracing::debug!("'{}' is already logged in", source);
                deliver(
                    self.message_pusher.as_ref(),
                    source,
                    &OutboundMessage::Login { success: false },
                )
                .await;
                RouteOutcome::Replied
            }
            InboundMessage::Unrecognized { message_type } => {
                self.reply_unrecognized(source, &message_type).await
            }
        }
    }

    async fn reply_unrecognized(&self, source: &ClientId, message_type: &str) -> RouteOutcome {
        tracing::warn!("Unrecognized command '{}' from '{}'", message_type, source);
        deliver(
            self.message_pusher.as_ref(),
            source,
            &OutboundMessage::unrecognized(message_type),
        )
        .await;
        RouteOutcome::Replied
    }
}

impl RouteOutcome {
    fn dropped() -> Self {
        Self::Forwarded { delivered: false }
    }
}

/// 宛先の ID。空文字列は誰にも届かない
fn target(to_id: String) -> Option<ClientId> {
    ClientId::new(to_id).ok()
}
