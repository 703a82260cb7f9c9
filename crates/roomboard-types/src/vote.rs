use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Like,
    Dislike,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    /// Interpret a client-submitted `vote_type`. Anything other than
    /// `like` or `dislike` (including `none`) is an explicit un-vote.
    pub fn from_request(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVoteType(pub String);

impl fmt::Display for UnknownVoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown vote type '{}'", self.0)
    }
}

impl std::error::Error for UnknownVoteType {}

impl FromStr for VoteType {
    type Err = UnknownVoteType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(UnknownVoteType(other.to_string())),
        }
    }
}

/// Outcome of a vote request: the voter's new vote (if any) and the
/// adjustments to apply to the message's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteResolution {
    pub vote: Option<VoteType>,
    pub like_delta: i64,
    pub dislike_delta: i64,
}

impl VoteResolution {
    fn add(&mut self, vote_type: VoteType, delta: i64) {
        match vote_type {
            VoteType::Like => self.like_delta += delta,
            VoteType::Dislike => self.dislike_delta += delta,
        }
    }
}

/// Compute the transition for one voter on one message.
///
/// An existing vote is always withdrawn first. Re-submitting the held type
/// toggles it off, submitting the other type switches, and `None` clears.
/// With no existing vote, `None` is a no-op.
pub fn resolve_vote(current: Option<VoteType>, requested: Option<VoteType>) -> VoteResolution {
    let mut resolution = VoteResolution {
        vote: None,
        like_delta: 0,
        dislike_delta: 0,
    };

    match current {
        None => {
            if let Some(new_type) = requested {
                resolution.vote = Some(new_type);
                resolution.add(new_type, 1);
            }
        }
        Some(existing) => {
            resolution.add(existing, -1);
            match requested {
                Some(new_type) if new_type == existing => {} // toggle off
                Some(new_type) => {
                    resolution.vote = Some(new_type);
                    resolution.add(new_type, 1);
                }
                None => {}
            }
        }
    }

    resolution
}
