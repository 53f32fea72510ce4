//! UseCase: ルーム詳細取得

use std::sync::Arc;

use crate::domain::{Room, RoomId, RoomRepository};

use super::error::GetRoomDetailError;

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// ルーム詳細を取得
    ///
    /// # Returns
    ///
    /// * `Ok(Room)` - ルームが存在する
    /// * `Err(GetRoomDetailError::RoomNotFound)` - ルームが存在しない（空の ID を含む）
    pub async fn execute(&self, room_id: String) -> Result<Room, GetRoomDetailError> {
        let id = RoomId::new(room_id.clone())
            .map_err(|_| GetRoomDetailError::RoomNotFound(room_id.clone()))?;

        self.rooms
            .get_room(&id)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound(room_id))
    }
}
