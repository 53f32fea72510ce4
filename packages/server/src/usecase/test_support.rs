//! UseCase のテスト用ヘルパー

use std::sync::Arc;

use kakehashi_shared::time::FixedClock;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    domain::{ClientConnection, ClientId, ConnectionRegistry, RoomId, Session},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionRegistry, InMemoryRoomRepository},
    },
};

use super::{
    CheckOnlineUseCase, ConnectClientUseCase, DisconnectClientUseCase, DuplicateIdentityPolicy,
    JoinRoomUseCase, MembershipLock, QuitRoomUseCase, RelaySignalUseCase, RouteMessageUseCase,
    new_membership_lock,
};

pub(crate) fn client(name: &str) -> ClientId {
    ClientId::new(name.to_string()).unwrap()
}

pub(crate) fn room(name: &str) -> RoomId {
    RoomId::new(name.to_string()).unwrap()
}

/// 受信済みのメッセージを全て取り出して JSON として返す
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut messages = Vec::new();
    while let Ok(text) = rx.try_recv() {
        messages.push(serde_json::from_str(&text).unwrap());
    }
    messages
}

/// インメモリ実装一式
pub(crate) struct Fixture {
    pub registry: Arc<InMemoryConnectionRegistry>,
    pub rooms: Arc<InMemoryRoomRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub lock: MembershipLock,
}

impl Fixture {
    pub fn new() -> Self {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let rooms = Arc::new(InMemoryRoomRepository::new(Arc::new(FixedClock::new(0))));
        let pusher = Arc::new(WebSocketMessagePusher::new(registry.clone()));
        Self {
            registry,
            rooms,
            pusher,
            lock: new_membership_lock(),
        }
    }

    /// ConnectionRegistry に直接登録する
    pub async fn connect(&self, name: &str) -> (Session, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = ClientConnection::new(tx);
        let session = Session {
            client_id: client(name),
            connection_id: connection.id,
        };
        self.registry.register(client(name), connection).await;
        (session, rx)
    }

    pub fn connect_usecase(&self, policy: DuplicateIdentityPolicy) -> ConnectClientUseCase {
        ConnectClientUseCase::new(
            self.registry.clone(),
            self.rooms.clone(),
            self.pusher.clone(),
            self.lock.clone(),
            policy,
        )
    }

    pub fn disconnect_usecase(&self) -> DisconnectClientUseCase {
        DisconnectClientUseCase::new(
            self.registry.clone(),
            self.rooms.clone(),
            self.pusher.clone(),
            self.lock.clone(),
        )
    }

    pub fn join_room_usecase(&self) -> JoinRoomUseCase {
        JoinRoomUseCase::new(
            self.registry.clone(),
            self.rooms.clone(),
            self.pusher.clone(),
            self.lock.clone(),
        )
    }

    pub fn quit_room_usecase(&self) -> QuitRoomUseCase {
        QuitRoomUseCase::new(
            self.registry.clone(),
            self.rooms.clone(),
            self.pusher.clone(),
            self.lock.clone(),
        )
    }

    pub fn relay_signal_usecase(&self) -> RelaySignalUseCase {
        RelaySignalUseCase::new(
            self.registry.clone(),
            self.rooms.clone(),
            self.pusher.clone(),
            self.lock.clone(),
        )
    }

    pub fn check_online_usecase(&self) -> CheckOnlineUseCase {
        CheckOnlineUseCase::new(self.registry.clone(), self.pusher.clone())
    }

    pub fn route_message_usecase(&self) -> RouteMessageUseCase {
        RouteMessageUseCase::new(
            self.registry.clone(),
            self.pusher.clone(),
            Arc::new(self.relay_signal_usecase()),
            Arc::new(self.check_online_usecase()),
            Arc::new(self.join_room_usecase()),
            Arc::new(self.quit_room_usecase()),
        )
    }
}
