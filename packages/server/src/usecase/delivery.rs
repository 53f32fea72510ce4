//! OutboundMessage を JSON にして MessagePusher に渡すヘルパー

use crate::{
    domain::{ClientId, MessagePusher},
    infrastructure::dto::websocket::OutboundMessage,
};

/// 1 つの宛先に送る。送信を試みた場合は `true`
pub(crate) async fn deliver(
    pusher: &dyn MessagePusher,
    target: &ClientId,
    message: &OutboundMessage,
) -> bool {
    match message.to_json() {
        Ok(json) => pusher.send_if_present(target, &json).await,
        Err(e) => {
            tracing::error!("Failed to encode message for '{}': {}", target, e);
            false
        }
    }
}

/// 複数の宛先に送り、送信を試みた宛先を返す
pub(crate) async fn deliver_all(
    pusher: &dyn MessagePusher,
    targets: &[ClientId],
    message: &OutboundMessage,
) -> Vec<ClientId> {
    if targets.is_empty() {
        return Vec::new();
    }
    match message.to_json() {
        Ok(json) => pusher.broadcast(targets, &json).await,
        Err(e) => {
            tracing::error!("Failed to encode broadcast message: {}", e);
            Vec::new()
        }
    }
}
