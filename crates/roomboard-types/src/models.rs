use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A board message as returned by every message endpoint.
///
/// `likes` and `dislikes` are denormalized counters; they always equal the
/// number of votes of each type recorded against this message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub room_id: String,
    pub parent_id: Option<Uuid>,
    pub sender_name: String,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub is_anonymous: bool,
    pub likes: i64,
    pub dislikes: i64,
}
