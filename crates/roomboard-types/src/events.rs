use std::fmt;

use uuid::Uuid;

const UPDATE_PREFIX: &str = "update:";

/// Notifications pushed to live subscribers.
///
/// The wire form is a bare text frame, not JSON: a new message is announced
/// by its id alone, an edit or vote by `update:<id>`. Ids are rendered as
/// 32 lowercase hex digits without hyphens. Receivers treat any payload as a
/// signal to refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// A message was posted
    MessageCreated(Uuid),

    /// A message's content or vote counters changed
    MessageUpdated(Uuid),
}

impl fmt::Display for BoardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageCreated(id) => write!(f, "{}", id.simple()),
            Self::MessageUpdated(id) => write!(f, "{}{}", UPDATE_PREFIX, id.simple()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_is_bare_hex_id() {
        let id = Uuid::parse_str("6f1c2a1e-9d7b-4c1e-8f0a-2b3c4d5e6f70").unwrap();
        assert_eq!(
            BoardEvent::MessageCreated(id).to_string(),
            "6f1c2a1e9d7b4c1e8f0a2b3c4d5e6f70"
        );
    }

    #[test]
    fn updated_is_prefixed() {
        let id = Uuid::parse_str("6f1c2a1e-9d7b-4c1e-8f0a-2b3c4d5e6f70").unwrap();
        assert_eq!(
            BoardEvent::MessageUpdated(id).to_string(),
            "update:6f1c2a1e9d7b4c1e8f0a2b3c4d5e6f70"
        );
    }
}
