//! ルームからの退出処理
//!
//! quit / close / 切断 / 別ルームへの join / 再接続 の全てで同じ手順を踏むため共通化している。
//! 呼び出し側が `MembershipLock` を保持していること。

use crate::{
    domain::{ClientId, ConnectionRegistry, LeaveOutcome, MessagePusher, RoomId, RoomRepository},
    infrastructure::dto::websocket::OutboundMessage,
};

use super::delivery::deliver_all;

/// `client_id` を `room_id` から退出させ、残りのメンバーに quit を通知する
///
/// ConnectionRegistry のルームは、それが `room_id` を指している場合だけ `None` に戻す。
/// quit 通知を送った宛先を返す。
pub(crate) async fn leave_room(
    registry: &dyn ConnectionRegistry,
    rooms: &dyn RoomRepository,
    pusher: &dyn MessagePusher,
    client_id: &ClientId,
    room_id: &RoomId,
) -> Vec<ClientId> {
    if registry.current_room(client_id).await.as_ref() == Some(room_id) {
        registry.set_room(client_id, None).await;
    }

    match rooms.leave(room_id, client_id).await {
        LeaveOutcome::Left { remaining } => {
            tracing::info!("Client '{}' left room '{}'", client_id, room_id);
            let quit = OutboundMessage::Quit {
                key: client_id.to_string(),
            };
            deliver_all(pusher, &remaining, &quit).await
        }
        LeaveOutcome::RoomClosed => {
            tracing::info!("Client '{}' left room '{}', room closed", client_id, room_id);
            Vec::new()
        }
        LeaveOutcome::NotMember => Vec::new(),
    }
}
