//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - ConnectionRegistry で宛先のチャンネルを解決する
//! - クライアントへのメッセージ送信（push_to, send_if_present, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket とチャンネルの生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! チャンネルは ConnectionRegistry に登録され、この実装はそれを参照して送信するだけです。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ClientId, ConnectionRegistry, MessagePushError, MessagePusher};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    registry: Arc<dyn ConnectionRegistry>,
}

impl WebSocketMessagePusher {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn push_to(&self, client_id: &ClientId, content: &str) -> Result<(), MessagePushError> {
        let sender = self
            .registry
            .lookup(client_id)
            .await
            .ok_or_else(|| MessagePushError::ClientNotFound(client_id.to_string()))?;

        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to client '{}'", client_id);
        Ok(())
    }

    async fn send_if_present(&self, client_id: &ClientId, content: &str) -> bool {
        match self.push_to(client_id, content).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Dropped message for '{}': {}", client_id, e);
                false
            }
        }
    }

    async fn broadcast(&self, targets: &[ClientId], content: &str) -> Vec<ClientId> {
        let mut delivered = Vec::with_capacity(targets.len());
        for target in targets {
            if self.send_if_present(target, content).await {
                delivered.push(target.clone());
            }
        }
        delivered
    }
}
