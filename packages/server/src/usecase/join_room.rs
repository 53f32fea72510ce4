//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 参加者への応答（スナップショット or 満員）と ConnectionRegistry の更新
//!
//! ### なぜこのテストが必要か
//! - 「ルームのメンバーなら Registry のルームもそのルームを指す」という不変条件を保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加とスナップショットの応答
//! - 満員：Registry のルームは変わらない
//! - 別のルームに参加中：参加できたら元のルームから抜け、満員なら元のルームに残る

use std::sync::Arc;

use crate::{
    domain::{
        ConnectionRegistry, JoinOutcome, MessagePusher, Payload, RoomId, RoomRepository, Session,
    },
    infrastructure::dto::websocket::OutboundMessage,
};

use super::{MembershipLock, delivery::deliver, error::SessionError, membership::leave_room};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    lock: MembershipLock,
}

impl JoinRoomUseCase {
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

    /// ルーム参加を実行し、参加者に `join` を応答する
    ///
    /// 参加できた場合だけ元のルームから抜け、Registry のルームを `room_id` に更新する。
    /// 満員で断られた場合は、元のルームの参加状態をそのまま残す。
    pub async fn execute(
        &self,
        session: &Session,
        room_id: RoomId,
        payload: Payload,
    ) -> Result<JoinOutcome, SessionError> {
        let _guard = self.lock.lock().await;
        let client_id = &session.client_id;

        if !self
            .registry
            .is_current(client_id, session.connection_id)
            .await
        {
            return Err(SessionError::Inactive(client_id.to_string()));
        }

        let outcome = self
            .rooms
            .join(room_id.clone(), client_id.clone(), payload)
            .await;

        let plays = match &outcome {
            JoinOutcome::Joined { snapshot } => {
                // 参加できた場合だけ元のルームから抜ける
                if let Some(previous) = self.registry.current_room(client_id).await
                    && previous != room_id
                {
                    leave_room(
                        self.registry.as_ref(),
                        self.rooms.as_ref(),
                        self.message_pusher.as_ref(),
                        client_id,
                        &previous,
                    )
                    .await;
                }
                tracing::info!("Client '{}' joined room '{}'", client_id, room_id);
                self.registry.set_room(client_id, Some(room_id)).await;
                Some(snapshot.clone())
            }
            JoinOutcome::RoomFull => {
                tracing::info!("Room '{}' is full, refused '{}'", room_id, client_id);
                None
            }
        };

        deliver(
            self.message_pusher.as_ref(),
            client_id,
            &OutboundMessage::Join { plays },
        )
        .await;

        Ok(outcome)
    }
}
