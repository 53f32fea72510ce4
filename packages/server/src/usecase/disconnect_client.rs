//! UseCase: クライアント切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectClientUseCase::execute() メソッド
//! - 切断の順序：ルームからの退出（quit 通知）→ 登録解除 → 全員への leave 通知
//!
//! ### なぜこのテストが必要か
//! - quit はルームのメンバーだけ、leave は接続中の全員に届くという 2 種類の通知を区別する
//! - 置き換えられた古いチャンネルの切断で新しい登録が消えないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルームに参加中のクライアントの切断
//! - エッジケース：最後のクライアントの切断、置き換え済みのセッションの切断

use std::sync::Arc;

use crate::{
    domain::{ClientId, ConnectionRegistry, MessagePusher, RoomRepository, Session},
    infrastructure::dto::websocket::OutboundMessage,
};

use super::{
    MembershipLock, delivery::deliver_all, error::SessionError, membership::leave_room,
};

/// 切断時に通知したクライアント
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// 同じルームにいて quit を受け取ったクライアント
    pub room_notified: Vec<ClientId>,
    /// leave を受け取った、接続中の他の全てのクライアント
    pub peers_notified: Vec<ClientId>,
}

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    lock: MembershipLock,
}

impl DisconnectClientUseCase {
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

    /// クライアント切断を実行
    ///
    /// # Returns
    ///
    /// * `Ok(DisconnectOutcome)` - 切断成功
    /// * `Err(SessionError)` - このチャンネルは既に登録されていない（置き換え済み・切断済み）
    pub async fn execute(&self, session: &Session) -> Result<DisconnectOutcome, SessionError> {
        let _guard = self.lock.lock().await;
        let client_id = &session.client_id;

        if !self
            .registry
            .is_current(client_id, session.connection_id)
            .await
        {
            return Err(SessionError::Inactive(client_id.to_string()));
        }

        // 1. 参加中のルームから抜ける
        let room_notified = match self.registry.current_room(client_id).await {
            Some(room_id) => {
                leave_room(
                    self.registry.as_ref(),
                    self.rooms.as_ref(),
                    self.message_pusher.as_ref(),
                    client_id,
                    &room_id,
                )
                .await
            }
            None => Vec::new(),
        };

        // 2. 登録解除
        self.registry.unregister(client_id).await;

        // 3. 残りの全員に通知
        let peers = self.registry.client_ids().await;
        let leave = OutboundMessage::Leave {
            key: client_id.to_string(),
        };
        let peers_notified = deliver_all(self.message_pusher.as_ref(), &peers, &leave).await;

        Ok(DisconnectOutcome {
            room_notified,
            peers_notified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ClientConnection, message_pusher::MockMessagePusher},
        infrastructure::repository::{InMemoryConnectionRegistry, InMemoryRoomRepository},
        usecase::{
            new_membership_lock,
            test_support::{Fixture, client, drain, room},
        },
    };
    use kakehashi_shared::time::FixedClock;
    use serde_json::json;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_disconnect_fans_out_quit_and_leave() {
        // テスト項目: A, B, C が接続し A と B が同じルームにいるとき、A の切断で
        //             B には quit と leave、C には leave だけが届き、A には何も届かない
        // given (前提条件):
        let fixture = Fixture::new();
        let join = fixture.join_room_usecase();
        let usecase = fixture.disconnect_usecase();
        let (a, mut rx_a) = fixture.connect("A").await;
        let (b, mut rx_b) = fixture.connect("B").await;
        let (_c, mut rx_c) = fixture.connect("C").await;
        join.execute(&a, room("R"), json!("pA")).await.unwrap();
        join.execute(&b, room("R"), json!("pB")).await.unwrap();
        drain(&mut rx_a);
        drain(&mut rx_b);

        // when (操作):
        let outcome = usecase.execute(&a).await.unwrap();

        // then (期待する結果):
        assert_eq!(outcome.room_notified, vec![client("B")]);
        assert_eq!(outcome.peers_notified, vec![client("B"), client("C")]);
        assert_eq!(
            drain(&mut rx_b),
            vec![
                json!({"type": "quit", "key": "A"}),
                json!({"type": "leave", "key": "A"})
            ]
        );
        assert_eq!(drain(&mut rx_c), vec![json!({"type": "leave", "key": "A"})]);
        assert!(drain(&mut rx_a).is_empty());

        assert!(!fixture.registry.contains(&client("A")).await);
        let r = fixture.rooms.get_room(&room("R")).await.unwrap();
        assert_eq!(r.member_ids(), vec![client("B")]);
        assert_eq!(fixture.registry.count().await, 2);
    }

    #[tokio::test]
    async fn test_disconnect_last_member_removes_room() {
        // テスト項目: ルームの最後のメンバーが切断するとルームが削除される
        // given (前提条件):
        let fixture = Fixture::new();
        let join = fixture.join_room_usecase();
        let usecase = fixture.disconnect_usecase();
        let (alice, _rx) = fixture.connect("alice").await;
        join.execute(&alice, room("R"), json!(null)).await.unwrap();

        // when (操作):
        let outcome = usecase.execute(&alice).await.unwrap();

        // then (期待する結果):
        assert_eq!(outcome, DisconnectOutcome::default());
        assert!(fixture.rooms.get_room(&room("R")).await.is_none());
        assert_eq!(fixture.registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_superseded_session_keeps_new_registration() {
        // テスト項目: 置き換えられた古いチャンネルの切断は、新しい登録に影響しない
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = fixture.disconnect_usecase();
        let (stale, _rx_old) = fixture.connect("alice").await;
        let (current, _rx_new) = fixture.connect("alice").await;
        let (_bob, mut rx_bob) = fixture.connect("bob").await;

        // when (操作):
        let result = usecase.execute(&stale).await;

        // then (期待する結果): 誰にも leave は届かない
        assert_eq!(result, Err(SessionError::Inactive("alice".to_string())));
        assert!(
            fixture
                .registry
                .is_current(&client("alice"), current.connection_id)
                .await
        );
        assert!(drain(&mut rx_bob).is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_twice_is_rejected() {
        // テスト項目: 同じセッションの 2 回目の切断はエラーになり、通知も行われない
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = fixture.disconnect_usecase();
        let (alice, _rx) = fixture.connect("alice").await;
        usecase.execute(&alice).await.unwrap();

        // when (操作):
        let result = usecase.execute(&alice).await;

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_disconnect_broadcast_targets_with_mock_pusher() {
        // テスト項目: quit はルームの残りのメンバーだけ、leave は自分以外の全員に向けて送られる
        // given (前提条件): Registry と Room は実装を使い、MessagePusher だけモックにする
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let rooms = Arc::new(InMemoryRoomRepository::new(Arc::new(FixedClock::new(0))));
        let mut receivers = Vec::new();
        let mut alice = None;
        for name in ["alice", "bob", "charlie"] {
            let (tx, rx) = mpsc::unbounded_channel();
            receivers.push(rx);
            let connection = ClientConnection::new(tx);
            if name == "alice" {
                alice = Some(Session {
                    client_id: client(name),
                    connection_id: connection.id,
                });
            }
            registry.register(client(name), connection).await;
        }
        for name in ["alice", "bob"] {
            rooms.join(room("R"), client(name), json!(null)).await;
            registry.set_room(&client(name), Some(room("R"))).await;
        }

        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(|targets, content| targets == [client("bob")] && content.contains("\"quit\""))
            .times(1)
            .returning(|targets, _| targets.to_vec());
        pusher
            .expect_broadcast()
            .withf(|targets, content| {
                targets == [client("bob"), client("charlie")] && content.contains("\"leave\"")
            })
            .times(1)
            .returning(|targets, _| targets.to_vec());

        let usecase = DisconnectClientUseCase::new(
            registry.clone(),
            rooms,
            Arc::new(pusher),
            new_membership_lock(),
        );

        // when (操作):
        let outcome = usecase.execute(&alice.unwrap()).await.unwrap();

        // then (期待する結果):
        assert_eq!(outcome.room_notified, vec![client("bob")]);
        assert_eq!(outcome.peers_notified, vec![client("bob"), client("charlie")]);
    }
}
