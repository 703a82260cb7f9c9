use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use roomboard_db::CreateOutcome;
use roomboard_db::models::{MessageRow, NewMessage};
use roomboard_types::api::MessageRequest;
use roomboard_types::events::BoardEvent;
use roomboard_types::models::Message;

use crate::error::ApiError;
use crate::state::{AppState, run_db};

/// GET /messages/{room_id} — every message in the room, newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let rows = run_db(&state, move |db| db.get_messages(&room_id)).await?;
    Ok(Json(rows.into_iter().map(to_message).collect()))
}

/// POST /messages — no identity check: `sender_name` is whatever the
/// client claims.
pub async fn create_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let message_id = Uuid::new_v4();
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    let outcome = run_db(&state, move |db| {
        let parent_id = req.parent_id.map(|p| p.to_string());
        db.create_message(&NewMessage {
            id: &message_id.to_string(),
            created_at: &created_at,
            room_id: &req.room_id,
            parent_id: parent_id.as_deref(),
            sender_name: &req.sender_name,
            content: &req.content,
            media_url: req.media_url.as_deref(),
            media_type: req.media_type.as_deref(),
            is_anonymous: req.is_anonymous,
        })
    })
    .await?;

    let row = match outcome {
        CreateOutcome::Created(row) => row,
        CreateOutcome::ParentMissing => return Err(ApiError::NotFound("Parent message")),
    };

    info!("Message {} posted to room '{}'", message_id, row.room_id);
    state
        .hub
        .publish(&row.room_id, BoardEvent::MessageCreated(message_id))
        .await;

    Ok(Json(to_message(row)))
}

/// PUT /messages/{message_id} — takes the full message shape but only
/// replaces `content`.
pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let row = run_db(&state, move |db| {
        db.update_message_content(&message_id.to_string(), &req.content)
    })
    .await?
    .ok_or(ApiError::NotFound("Message"))?;

    state
        .hub
        .publish(&row.room_id, BoardEvent::MessageUpdated(message_id))
        .await;

    Ok(Json(to_message(row)))
}

pub(crate) fn to_message(row: MessageRow) -> Message {
    Message {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt message id '{}': {}", row.id, e);
            Uuid::default()
        }),
        created_at: parse_timestamp(&row.created_at).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on message '{}'", row.created_at, row.id);
            DateTime::default()
        }),
        parent_id: row.parent_id.as_deref().and_then(|p| match p.parse() {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Corrupt parent_id '{}' on message '{}': {}", p, row.id, e);
                None
            }
        }),
        room_id: row.room_id,
        sender_name: row.sender_name,
        content: row.content,
        media_url: row.media_url,
        media_type: row.media_type,
        is_anonymous: row.is_anonymous,
        likes: row.likes,
        dislikes: row.dislikes,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') format: "YYYY-MM-DD HH:MM:SS", no timezone.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_timestamp_formats() {
        let rfc = parse_timestamp("2026-03-04T05:06:07.123456Z").unwrap();
        assert_eq!(rfc.timestamp_subsec_micros(), 123456);

        let sqlite = parse_timestamp("2026-03-04 05:06:07").unwrap();
        assert_eq!(sqlite.to_rfc3339(), "2026-03-04T05:06:07+00:00");

        assert!(parse_timestamp("yesterday").is_none());
    }
}
