//! Conversion logic from domain entities to DTOs.

use kakehashi_shared::time::timestamp_to_jst_rfc3339;

use crate::domain::entity::Room;
use crate::infrastructure::dto::http::{MemberDetailDto, RoomDetailDto, RoomSummaryDto};

impl From<&Room> for RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            members: room
                .member_ids()
                .into_iter()
                .map(|id| id.into_string())
                .collect(),
            created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            capacity: room.capacity(),
            members: room
                .members()
                .map(|(id, member)| MemberDetailDto {
                    client_id: id.as_str().to_string(),
                    joined_at: timestamp_to_jst_rfc3339(member.joined_at.value()),
                    payload: member.payload.clone(),
                })
                .collect(),
            created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClientId, RoomId, Timestamp};
    use serde_json::json;

    fn lobby() -> Room {
        // 2023-01-01 00:00:00 JST
        let mut room = Room::new(
            RoomId::new("lobby".to_string()).unwrap(),
            Timestamp::new(1672498800000),
        );
        room.join(
            ClientId::new("bob".to_string()).unwrap(),
            json!({"screen": true}),
            Timestamp::new(1672498801000),
        );
        room.join(
            ClientId::new("alice".to_string()).unwrap(),
            json!(null),
            Timestamp::new(1672498802000),
        );
        room
    }

    #[test]
    fn test_domain_room_to_summary_dto() {
        // テスト項目: Room が RoomSummaryDto に変換され、メンバーは参加順に並ぶ
        // when (操作):
        let dto = RoomSummaryDto::from(&lobby());

        // then (期待する結果):
        assert_eq!(dto.id, "lobby");
        assert_eq!(dto.members, vec!["bob".to_string(), "alice".to_string()]);
        assert!(dto.created_at.starts_with("2023-01-01T00:00:00"));
    }

    #[test]
    fn test_domain_room_to_detail_dto() {
        // テスト項目: Room が RoomDetailDto に変換され、payload がそのまま含まれる
        // when (操作):
        let dto = RoomDetailDto::from(&lobby());

        // then (期待する結果):
        assert_eq!(dto.capacity, 15);
        assert_eq!(dto.members.len(), 2);
        assert_eq!(dto.members[0].client_id, "bob");
        assert_eq!(dto.members[0].payload, json!({"screen": true}));
        assert!(dto.members[0].joined_at.starts_with("2023-01-01T00:00:01"));
        assert_eq!(dto.members[1].payload, json!(null));
    }
}
