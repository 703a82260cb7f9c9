use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use roomboard_types::api::VoteRequest;
use roomboard_types::events::BoardEvent;
use roomboard_types::models::Message;
use roomboard_types::vote::VoteType;

use crate::error::ApiError;
use crate::messages::to_message;
use crate::state::{AppState, run_db};

/// POST /messages/{message_id}/vote — like, dislike, or clear.
///
/// `user_name` is the voter key and is not verified, so any client can
/// act as any voter by reusing their name.
pub async fn vote_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<Message>, ApiError> {
    let requested = VoteType::from_request(&req.vote_type);
    let vote_id = Uuid::new_v4();

    let row = run_db(&state, move |db| {
        db.apply_vote(
            &vote_id.to_string(),
            &message_id.to_string(),
            &req.user_name,
            requested,
        )
    })
    .await?
    .ok_or(ApiError::NotFound("Message"))?;

    state
        .hub
        .publish(&row.room_id, BoardEvent::MessageUpdated(message_id))
        .await;

    Ok(Json(to_message(row)))
}
