//! メッセージ送信（通知）の実装
//!
//! - `websocket`: WebSocket ハンドラが生成したチャンネルを使う実装

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
