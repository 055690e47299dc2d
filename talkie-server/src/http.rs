//! Debug-only room inspection API. Observability aid, not part of the
//! signaling contract.

use crate::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use talkie_core::{RoomId, UserId};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub participants: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    pub user_id: UserId,
    pub connected: bool,
    pub joined_secs_ago: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    pub room_id: RoomId,
    pub participants: Vec<ParticipantSummary>,
}

pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    let mut rooms: Vec<_> = state
        .registry
        .snapshot()
        .into_iter()
        .map(|(room_id, participants)| RoomSummary {
            room_id,
            participants,
        })
        .collect();
    rooms.sort_by(|a, b| a.room_id.0.cmp(&b.room_id.0));

    Json(rooms)
}

pub async fn room_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RoomDetail>, StatusCode> {
    let room_id = RoomId::from(id);

    let participants = state
        .registry
        .room_detail(&room_id)
        .ok_or(StatusCode::NOT_FOUND)?
        .into_iter()
        .map(|(user_id, connected, joined_secs_ago)| ParticipantSummary {
            user_id,
            connected,
            joined_secs_ago,
        })
        .collect();

    Ok(Json(RoomDetail {
        room_id,
        participants,
    }))
}
