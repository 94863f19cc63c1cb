//! Status lanes

use crate::error::BoardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A status column of the board. A task belongs to exactly one lane.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl Lane {
    /// All lanes in board order (left to right)
    pub const ALL: [Lane; 4] = [Lane::Todo, Lane::InProgress, Lane::Review, Lane::Done];

    /// The terminal lane, ordered by completion recency rather than manual order
    pub const TERMINAL: Lane = Lane::Done;

    pub fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }

    /// Wire name, matching the serde representation
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }

    /// Position of the lane on the board
    pub fn order(self) -> usize {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::Review => 2,
            Self::Done => 3,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lane {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" | "doing" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            _ => Err(BoardError::UnknownLane {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_done_is_terminal() {
        let terminal: Vec<_> = Lane::ALL.iter().filter(|l| l.is_terminal()).collect();
        assert_eq!(terminal, vec![&Lane::Done]);
    }

    #[test]
    fn test_parse_accepts_aliases() {
        assert_eq!("in-progress".parse::<Lane>().unwrap(), Lane::InProgress);
        assert_eq!("doing".parse::<Lane>().unwrap(), Lane::InProgress);
        assert_eq!("DONE".parse::<Lane>().unwrap(), Lane::Done);
        assert!(matches!(
            "backlog".parse::<Lane>(),
            Err(BoardError::UnknownLane { .. })
        ));
    }

    #[test]
    fn test_serde_matches_as_str() {
        for lane in Lane::ALL {
            let json = serde_json::to_string(&lane).unwrap();
            assert_eq!(json, format!("\"{}\"", lane.as_str()));
        }
    }
}
