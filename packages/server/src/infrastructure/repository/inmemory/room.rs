//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ルームは最初の join で作成され、最後のメンバーが抜けた時点で削除されます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use kakehashi_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    ClientId, DEFAULT_ROOM_CAPACITY, JoinOutcome, LeaveOutcome, Payload, Room, RoomId,
    RoomRepository, Timestamp,
};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomId, Room>>,
    /// 新しく作成するルームの定員
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    /// 定員 `DEFAULT_ROOM_CAPACITY` で作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(DEFAULT_ROOM_CAPACITY, clock)
    }

    pub fn with_capacity(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            capacity,
            clock,
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn join(&self, room_id: RoomId, client_id: ClientId, payload: Payload) -> JoinOutcome {
        let now = Timestamp::new(self.clock.now_jst_millis());
        let mut rooms = self.rooms.lock().await;

        let room = rooms.entry(room_id.clone()).or_insert_with(|| {
            tracing::debug!("Room '{}' created", room_id);
            Room::with_capacity(room_id.clone(), now, self.capacity)
        });
        let outcome = room.join(client_id, payload, now);

        // 定員 0 のルームは作成直後でも参加できないので残さない
        if room.is_empty() {
            rooms.remove(&room_id);
        }

        outcome
    }

    async fn leave(&self, room_id: &RoomId, client_id: &ClientId) -> LeaveOutcome {
        let mut rooms = self.rooms.lock().await;

        let Some(room) = rooms.get_mut(room_id) else {
            return LeaveOutcome::NotMember;
        };
        if !room.leave(client_id) {
            return LeaveOutcome::NotMember;
        }
        if room.is_empty() {
            rooms.remove(room_id);
            tracing::debug!("Room '{}' removed (no members left)", room_id);
            return LeaveOutcome::RoomClosed;
        }

        LeaveOutcome::Left {
            remaining: room.member_ids(),
        }
    }

    async fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        self.rooms.lock().await.get(room_id).cloned()
    }

    async fn get_rooms(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        let mut rooms: Vec<Room> = rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.id.cmp(&b.id));
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kakehashi_shared::time::FixedClock;
    use serde_json::json;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - join: ルームの遅延作成、スナップショット、定員
    // - leave: 通知対象の選定、空になったルームの削除
    //
    // 【なぜこのテストが必要か】
    // - 定員（15 人）と「空のルームは残らない」という不変条件を保証する
    // ========================================

    fn create_test_repository() -> InMemoryRoomRepository {
        InMemoryRoomRepository::new(Arc::new(FixedClock::new(1_000)))
    }

    fn client(name: &str) -> ClientId {
        ClientId::new(name.to_string()).unwrap()
    }

    fn room(name: &str) -> RoomId {
        RoomId::new(name.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_join_creates_room_lazily() {
        // テスト項目: 存在しないルームへの join でルームが作成される
        // given (前提条件):
        let repo = create_test_repository();
        assert!(repo.get_room(&room("lobby")).await.is_none());

        // when (操作):
        let outcome = repo.join(room("lobby"), client("alice"), json!("pA")).await;

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::Joined { snapshot: vec![] });
        let lobby = repo.get_room(&room("lobby")).await.unwrap();
        assert_eq!(lobby.member_ids(), vec![client("alice")]);
        assert_eq!(lobby.created_at, Timestamp::new(1_000));
    }

    #[tokio::test]
    async fn test_join_snapshot_ordering() {
        // テスト項目: A, B の順に参加した後の C は [pA, pB] を受け取る
        // given (前提条件):
        let repo = create_test_repository();
        repo.join(room("R"), client("A"), json!("pA")).await;
        repo.join(room("R"), client("B"), json!("pB")).await;

        // when (操作):
        let outcome = repo.join(room("R"), client("C"), json!("pC")).await;

        // then (期待する結果):
        assert_eq!(
            outcome,
            JoinOutcome::Joined {
                snapshot: vec![json!("pA"), json!("pB")]
            }
        );
    }

    #[tokio::test]
    async fn test_room_capacity_is_fifteen() {
        // テスト項目: 16 人が join すると 15 人だけが参加でき、16 人目は RoomFull
        // given (前提条件):
        let repo = create_test_repository();
        for i in 0..15 {
            let outcome = repo.join(room("R"), client(&format!("user{i}")), json!(i)).await;
            assert!(matches!(outcome, JoinOutcome::Joined { .. }));
        }

        // when (操作):
        let outcome = repo.join(room("R"), client("user15"), json!(15)).await;

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::RoomFull);
        assert_eq!(repo.get_room(&room("R")).await.unwrap().len(), 15);

        // 1 人抜ければ再び参加できる
        repo.leave(&room("R"), &client("user3")).await;
        let outcome = repo.join(room("R"), client("user15"), json!(15)).await;
        assert!(matches!(outcome, JoinOutcome::Joined { .. }));
        assert_eq!(repo.get_room(&room("R")).await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_leave_returns_remaining_members_in_order() {
        // テスト項目: 退出すると残りのメンバーが参加順に返り、退出者自身は含まれない
        // given (前提条件):
        let repo = create_test_repository();
        for name in ["alice", "bob", "charlie"] {
            repo.join(room("R"), client(name), json!(name)).await;
        }

        // when (操作):
        let outcome = repo.leave(&room("R"), &client("alice")).await;

        // then (期待する結果):
        assert_eq!(
            outcome,
            LeaveOutcome::Left {
                remaining: vec![client("bob"), client("charlie")]
            }
        );
    }

    #[tokio::test]
    async fn test_last_member_leaving_removes_room() {
        // テスト項目: 最後のメンバーが抜けるとルームが削除され、次の join で新しく作られる
        // given (前提条件):
        let repo = create_test_repository();
        repo.join(room("R"), client("alice"), json!("old")).await;

        // when (操作):
        let outcome = repo.leave(&room("R"), &client("alice")).await;

        // then (期待する結果):
        assert_eq!(outcome, LeaveOutcome::RoomClosed);
        assert!(repo.get_room(&room("R")).await.is_none());
        assert!(repo.get_rooms().await.is_empty());

        let outcome = repo.join(room("R"), client("bob"), json!("new")).await;
        assert_eq!(outcome, JoinOutcome::Joined { snapshot: vec![] });
    }

    #[tokio::test]
    async fn test_leave_unknown_room_or_member_is_noop() {
        // テスト項目: 存在しないルーム・メンバーでない ID の退出は NotMember
        // given (前提条件):
        let repo = create_test_repository();
        repo.join(room("R"), client("alice"), json!(null)).await;

        // when (操作):
        let unknown_room = repo.leave(&room("nowhere"), &client("alice")).await;
        let unknown_member = repo.leave(&room("R"), &client("bob")).await;

        // then (期待する結果):
        assert_eq!(unknown_room, LeaveOutcome::NotMember);
        assert_eq!(unknown_member, LeaveOutcome::NotMember);
        assert_eq!(repo.get_room(&room("R")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_capacity_room_is_not_kept() {
        // テスト項目: 定員 0 の場合、参加できずルームも残らない
        // given (前提条件):
        let repo = InMemoryRoomRepository::with_capacity(0, Arc::new(FixedClock::new(0)));

        // when (操作):
        let outcome = repo.join(room("R"), client("alice"), json!(null)).await;

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::RoomFull);
        assert!(repo.get_room(&room("R")).await.is_none());
    }

    #[tokio::test]
    async fn test_get_rooms_sorted_by_id() {
        // テスト項目: get_rooms は RoomId でソートされている
        // given (前提条件):
        let repo = create_test_repository();
        repo.join(room("b"), client("alice"), json!(null)).await;
        repo.join(room("a"), client("bob"), json!(null)).await;

        // when (操作):
        let rooms = repo.get_rooms().await;

        // then (期待する結果):
        let ids: Vec<&str> = rooms.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
