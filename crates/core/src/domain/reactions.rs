use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionType {
    Like,
    Dislike,
}

impl ReactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionType::Like => "Like",
            ReactionType::Dislike => "Dislike",
        }
    }
}

impl FromStr for ReactionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Like" => Ok(ReactionType::Like),
            "Dislike" => Ok(ReactionType::Dislike),
            other => Err(CoreError::InvalidReactionType(other.to_string())),
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a reaction points at. Stored as the tag strings "Comment" / "Reply".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    Comment,
    Reply,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Comment => "Comment",
            TargetType::Reply => "Reply",
        }
    }
}

impl FromStr for TargetType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Comment" => Ok(TargetType::Comment),
            "Reply" => Ok(TargetType::Reply),
            other => Err(CoreError::InvalidTargetType(other.to_string())),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: ObjectId,
    pub target_id: ObjectId,
    pub target_type: TargetType,
    pub author_id: String,
    pub reaction_type: ReactionType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReaction {
    pub target_id: ObjectId,
    pub target_type: TargetType,
    pub author_id: String,
    pub reaction_type: ReactionType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_type_is_case_sensitive() {
        assert_eq!("Comment".parse::<TargetType>().unwrap(), TargetType::Comment);
        assert_eq!("Reply".parse::<TargetType>().unwrap(), TargetType::Reply);
        let err = "comment".parse::<TargetType>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidTargetType(_)));
        assert!("Advertisement".parse::<TargetType>().is_err());
    }

    #[test]
    fn reaction_type_round_trips_through_display() {
        for kind in [ReactionType::Like, ReactionType::Dislike] {
            assert_eq!(kind.to_string().parse::<ReactionType>().unwrap(), kind);
        }
        assert!("Love".parse::<ReactionType>().is_err());
    }
}
