/// Database row types — these map directly to SQLite rows.
/// Distinct from roomboard-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub created_at: String,
    pub room_id: String,
    pub parent_id: Option<String>,
    pub sender_name: String,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub is_anonymous: bool,
    pub likes: i64,
    pub dislikes: i64,
}

#[derive(Debug, Clone)]
pub struct VoteRow {
    pub id: String,
    pub vote_type: String,
}

/// Fields supplied by the client when posting a message.
pub struct NewMessage<'a> {
    pub id: &'a str,
    pub created_at: &'a str,
    pub room_id: &'a str,
    pub parent_id: Option<&'a str>,
    pub sender_name: &'a str,
    pub content: &'a str,
    pub media_url: Option<&'a str>,
    pub media_type: Option<&'a str>,
    pub is_anonymous: bool,
}
