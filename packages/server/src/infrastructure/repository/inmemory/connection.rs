//! InMemory Connection Registry 実装
//!
//! ClientId ごとに現在のチャンネルと参加中のルームを保持します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ClientConnection, ClientId, ConnectionId, ConnectionRegistry, PusherChannel, RoomId,
};

/// Registry のエントリ
struct ConnectionEntry {
    connection: ClientConnection,
    room: Option<RoomId>,
}

/// インメモリ Connection Registry 実装
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    entries: Mutex<HashMap<ClientId, ConnectionEntry>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(
        &self,
        client_id: ClientId,
        connection: ClientConnection,
    ) -> Option<ClientConnection> {
        let mut entries = self.entries.lock().await;
        tracing::debug!(
            "Client '{}' registered with connection {}",
            client_id,
            connection.id
        );
        entries
            .insert(
                client_id,
                ConnectionEntry {
                    connection,
                    room: None,
                },
            )
            .map(|previous| previous.connection)
    }

    async fn lookup(&self, client_id: &ClientId) -> Option<PusherChannel> {
        let entries = self.entries.lock().await;
        entries
            .get(client_id)
            .map(|entry| entry.connection.sender.clone())
    }

    async fn is_current(&self, client_id: &ClientId, connection_id: ConnectionId) -> bool {
        let entries = self.entries.lock().await;
        entries
            .get(client_id)
            .is_some_and(|entry| entry.connection.id == connection_id)
    }

    async fn current_room(&self, client_id: &ClientId) -> Option<RoomId> {
        let entries = self.entries.lock().await;
        entries.get(client_id).and_then(|entry| entry.room.clone())
    }

    async fn set_room(&self, client_id: &ClientId, room_id: Option<RoomId>) {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(client_id) {
            Some(entry) => entry.room = room_id,
            None => tracing::warn!("set_room called for unregistered client '{}'", client_id),
        }
    }

    async fn unregister(&self, client_id: &ClientId) -> Option<RoomId> {
        let mut entries = self.entries.lock().await;
        let entry = entries.remove(client_id)?;
        tracing::debug!("Client '{}' unregistered", client_id);
        entry.room
    }

    async fn contains(&self, client_id: &ClientId) -> bool {
        self.entries.lock().await.contains_key(client_id)
    }

    async fn client_ids(&self) -> Vec<ClientId> {
        let entries = self.entries.lock().await;
        let mut ids: Vec<ClientId> = entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 登録・参照・削除と、参加中ルームの更新
    //
    // 【なぜこのテストが必要か】
    // - 1 つの ClientId に登録は 1 つだけ（last-write-wins）という不変条件を保証する
    // - 削除時に最後のルームを返すことで、切断処理がルームを片付けられる
    // ========================================

    fn client(name: &str) -> ClientId {
        ClientId::new(name.to_string()).unwrap()
    }

    fn room(name: &str) -> RoomId {
        RoomId::new(name.to_string()).unwrap()
    }

    fn connection() -> (ClientConnection, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientConnection::new(tx), rx)
    }

    #[tokio::test]
    async fn test_register_twice_last_write_wins() {
        // テスト項目: 同じ ClientId で 2 回登録すると後の登録が有効になる
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (c1, mut rx1) = connection();
        let (c2, mut rx2) = connection();
        let c1_id = c1.id;
        let c2_id = c2.id;

        // when (操作):
        let first = registry.register(client("alice"), c1).await;
        let second = registry.register(client("alice"), c2).await;

        // then (期待する結果): 古いチャンネルが返され、lookup は新しいチャンネルを返す
        assert!(first.is_none());
        assert_eq!(second.map(|c| c.id), Some(c1_id));
        assert!(registry.is_current(&client("alice"), c2_id).await);
        assert!(!registry.is_current(&client("alice"), c1_id).await);
        assert_eq!(registry.count().await, 1);

        let sender = registry.lookup(&client("alice")).await.unwrap();
        sender.send("hello".to_string()).unwrap();
        assert_eq!(rx2.recv().await, Some("hello".to_string()));
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reregister_resets_room() {
        // テスト項目: 再登録すると参加中のルームは None に戻る
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (c1, _rx1) = connection();
        registry.register(client("alice"), c1).await;
        registry.set_room(&client("alice"), Some(room("lobby"))).await;

        // when (操作):
        let (c2, _rx2) = connection();
        registry.register(client("alice"), c2).await;

        // then (期待する結果):
        assert_eq!(registry.current_room(&client("alice")).await, None);
    }

    #[tokio::test]
    async fn test_lookup_unknown_client_returns_none() {
        // テスト項目: 未登録の ClientId の lookup は None
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();

        // when (操作) / then (期待する結果):
        assert!(registry.lookup(&client("ghost")).await.is_none());
        assert!(!registry.contains(&client("ghost")).await);
    }

    #[tokio::test]
    async fn test_set_room_for_unregistered_client_is_noop() {
        // テスト項目: 未登録の ClientId への set_room は何もしない
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();

        // when (操作):
        registry.set_room(&client("ghost"), Some(room("lobby"))).await;

        // then (期待する結果):
        assert_eq!(registry.count().await, 0);
        assert_eq!(registry.current_room(&client("ghost")).await, None);
    }

    #[tokio::test]
    async fn test_unregister_returns_prior_room_and_is_idempotent() {
        // テスト項目: 削除すると最後のルームが返り、2 回目の削除は None
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let (c1, _rx1) = connection();
        registry.register(client("alice"), c1).await;
        registry.set_room(&client("alice"), Some(room("lobby"))).await;

        // when (操作):
        let first = registry.unregister(&client("alice")).await;
        let second = registry.unregister(&client("alice")).await;

        // then (期待する結果):
        assert_eq!(first, Some(room("lobby")));
        assert_eq!(second, None);
        assert!(!registry.contains(&client("alice")).await);
    }

    #[tokio::test]
    async fn test_client_ids_are_sorted() {
        // テスト項目: client_ids はソート済みで返る
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        for name in ["charlie", "alice", "bob"] {
            let (c, _rx) = connection();
            registry.register(client(name), c).await;
        }

        // when (操作):
        let ids = registry.client_ids().await;

        // then (期待する結果):
        assert_eq!(ids, vec![client("alice"), client("bob"), client("charlie")]);
    }
}
