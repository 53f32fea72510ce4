//! UseCase: ルーム退出処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - QuitRoomUseCase::execute() メソッド
//! - 残りのメンバーへの quit 通知と、空になったルームの削除
//!
//! ### どのような状況を想定しているか
//! - 正常系：残りのメンバー全員に通知（退出者自身には届かない）
//! - エッジケース：最後のメンバーの退出、参加していないルームの quit

use std::sync::Arc;

use crate::domain::{ClientId, ConnectionRegistry, MessagePusher, RoomId, RoomRepository, Session};

use super::{MembershipLock, error::SessionError, membership::leave_room};

/// ルーム退出のユースケース
pub struct QuitRoomUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    lock: MembershipLock,
}

impl QuitRoomUseCase {
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

    /// ルーム退出を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ClientId>)` - quit を通知したクライアント（参加順）
    /// * `Err(SessionError)` - セッションが既に無効
    pub async fn execute(
        &self,
        session: &Session,
        room_id: &RoomId,
    ) -> Result<Vec<ClientId>, SessionError> {
        let _guard = self.lock.lock().await;

        if !self
            .registry
            .is_current(&session.client_id, session.connection_id)
            .await
        {
            return Err(SessionError::Inactive(session.client_id.to_string()));
        }

        Ok(leave_room(
            self.registry.as_ref(),
            self.rooms.as_ref(),
            self.message_pusher.as_ref(),
            &session.client_id,
            room_id,
        )
        .await)
    }
}
