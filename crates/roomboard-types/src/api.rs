use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Messages --

/// Body of `POST /messages` and `PUT /messages/{id}`.
/// Updates accept the same shape but only apply `content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub room_id: String,
    pub content: String,
    pub sender_name: String,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
}

// -- Votes --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub user_name: String,
    /// `like`, `dislike`, or anything else to clear the vote.
    pub vote_type: String,
}

// -- Uploads --

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub url: String,
}
