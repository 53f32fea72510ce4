//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    ClientConnection, ClientId, ConnectionId, JoinOutcome, LeaveOutcome, Payload, PusherChannel,
    Room, RoomId,
};

/// Connection Registry
///
/// ClientId から現在のチャンネルと参加中のルームへの対応を保持する唯一のテーブル。
/// 1 つの ClientId に対して登録は常に 1 つだけ。
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// チャンネルを登録する
    ///
    /// 既存の登録は無条件に上書きされ（last-write-wins）、参加中のルームは `None` に戻る。
    /// 上書きされた古いチャンネルを返すので、閉じるのは呼び出し側の責務。
    async fn register(
        &self,
        client_id: ClientId,
        connection: ClientConnection,
    ) -> Option<ClientConnection>;

    /// 現在のチャンネルを取得
    async fn lookup(&self, client_id: &ClientId) -> Option<PusherChannel>;

    /// `connection_id` が現在登録されているチャンネルかどうか
    async fn is_current(&self, client_id: &ClientId, connection_id: ConnectionId) -> bool;

    /// 参加中のルームを取得
    async fn current_room(&self, client_id: &ClientId) -> Option<RoomId>;

    /// 参加中のルームを更新する（未登録の ClientId なら何もしない）
    async fn set_room(&self, client_id: &ClientId, room_id: Option<RoomId>);

    /// 登録を削除し、最後に参加していたルームを返す（未登録なら `None`）
    async fn unregister(&self, client_id: &ClientId) -> Option<RoomId>;

    /// 登録されているかどうか
    async fn contains(&self, client_id: &ClientId) -> bool;

    /// 登録中の全ての ClientId（ソート済み）
    async fn client_ids(&self) -> Vec<ClientId>;

    /// 登録数
    async fn count(&self) -> usize;
}

/// Room Repository
///
/// RoomId から定員付きのルームへの対応を保持する。空になったルームは即座に削除される。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームに参加する（ルームが存在しなければ作成する）
    async fn join(&self, room_id: RoomId, client_id: ClientId, payload: Payload) -> JoinOutcome;

    /// ルームから退出する
    async fn leave(&self, room_id: &RoomId, client_id: &ClientId) -> LeaveOutcome;

    /// ルームを取得
    async fn get_room(&self, room_id: &RoomId) -> Option<Room>;

    /// 全てのルームを取得（RoomId でソート済み）
    async fn get_rooms(&self) -> Vec<Room>;
}
