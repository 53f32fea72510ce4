//! エンティティ
//!
//! - `Room`: 定員付きのルーム。メンバーは参加順に保持する
//! - `ClientConnection`: ConnectionRegistry に登録される 1 本のチャンネル
//! - `Session`: チャンネルと ClientId の組

use indexmap::IndexMap;

use super::{
    message_pusher::PusherChannel,
    value_object::{ClientId, ConnectionId, Payload, RoomId, Timestamp},
};

/// ルームの定員
pub const DEFAULT_ROOM_CAPACITY: usize = 15;

/// ConnectionRegistry に登録されるチャンネル
///
/// `sender` は UI 層（WebSocket ハンドラ）と共有される。Registry はチャンネルの寿命を管理せず、
/// 対応関係だけを保持する。
#[derive(Debug, Clone)]
pub struct ClientConnection {
    pub id: ConnectionId,
    pub sender: PusherChannel,
}

impl ClientConnection {
    pub fn new(sender: PusherChannel) -> Self {
        Self {
            id: ConnectionId::generate(),
            sender,
        }
    }
}

/// 1 本のチャンネルに紐づいた接続済みのクライアント
///
/// チャンネルの寿命の間 ClientId は変わらない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub client_id: ClientId,
    pub connection_id: ConnectionId,
}

/// ルームのメンバー
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub payload: Payload,
    pub joined_at: Timestamp,
}

/// `Room::join` の結果
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// 参加できた。`snapshot` は参加前からいたメンバーの payload（参加順）
    Joined { snapshot: Vec<Payload> },
    /// 定員に達しているため参加できなかった
    RoomFull,
}

/// `RoomRepository::leave` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// メンバーではなかった（ルームが存在しない場合も含む）
    NotMember,
    /// 最後のメンバーが抜けたためルームが削除された
    RoomClosed,
    /// 退出した。`remaining` には quit 通知の宛先となる残りのメンバーが参加順に入る
    Left { remaining: Vec<ClientId> },
}

/// ルーム
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub created_at: Timestamp,
    members: IndexMap<ClientId, Member>,
    capacity: usize,
}

impl Room {
    /// 定員 `DEFAULT_ROOM_CAPACITY` のルームを作成
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self::with_capacity(id, created_at, DEFAULT_ROOM_CAPACITY)
    }

    pub fn with_capacity(id: RoomId, created_at: Timestamp, capacity: usize) -> Self {
        Self {
            id,
            created_at,
            members: IndexMap::new(),
            capacity,
        }
    }

    /// メンバーとして参加する
    ///
    /// 既にメンバーの場合は payload を同じ位置で置き換え、定員チェックは行わない。
    /// スナップショットには参加者自身の payload は含まれない。
    pub fn join(&mut self, client_id: ClientId, payload: Payload, joined_at: Timestamp) -> JoinOutcome {
        if let Some(member) = self.members.get_mut(&client_id) {
            member.payload = payload;
            let snapshot = self
                .members
                .iter()
                .filter(|(id, _)| **id != client_id)
                .map(|(_, m)| m.payload.clone())
                .collect();
            return JoinOutcome::Joined { snapshot };
        }

        if self.is_full() {
            return JoinOutcome::RoomFull;
        }

        let snapshot = self.members.values().map(|m| m.payload.clone()).collect();
        self.members.insert(client_id, Member { payload, joined_at });
        JoinOutcome::Joined { snapshot }
    }

    /// メンバーから外す。メンバーだった場合は `true`
    pub fn leave(&mut self, client_id: &ClientId) -> bool {
        // 残りのメンバーの順序を保つため shift_remove を使う
        self.members.shift_remove(client_id).is_some()
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.members.contains_key(client_id)
    }

    /// メンバーの ID を参加順に返す
    pub fn member_ids(&self) -> Vec<ClientId> {
        self.members.keys().cloned().collect()
    }

    pub fn members(&self) -> impl Iterator<Item = (&ClientId, &Member)> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
