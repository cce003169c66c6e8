//! Perception boundary
//!
//! The detector producing depth, direction and tag signals lives outside this
//! crate. The controller only sees it through the [`Perception`] trait.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse bearing of the target relative to the camera view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    Front,
    #[default]
    None,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Front => "front",
            Direction::None => "none",
        }
    }

    pub(crate) fn to_code(self) -> u8 {
        match self {
            Direction::Left => 1,
            Direction::Right => 2,
            Direction::Up => 3,
            Direction::Down => 4,
            Direction::Front => 5,
            Direction::None => 0,
        }
    }

    pub(crate) fn from_code(code: u8) -> Self {
        match code {
            1 => Direction::Left,
            2 => Direction::Right,
            3 => Direction::Up,
            4 => Direction::Down,
            5 => Direction::Front,
            _ => Direction::None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "front" => Ok(Direction::Front),
            "none" | "" => Ok(Direction::None),
            other => Err(anyhow::anyhow!("Unknown direction '{}'", other)),
        }
    }
}

/// Tag visibility as reported by perception; `"0"` on the wire means absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSignal {
    Absent,
    Visible(String),
}

impl TagSignal {
    pub fn from_raw(raw: &str) -> Self {
        if raw == "0" {
            TagSignal::Absent
        } else {
            TagSignal::Visible(raw.to_string())
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, TagSignal::Visible(_))
    }
}

/// Synchronous point queries into the perception collaborator.
///
/// `Ok(None)` means the detector had nothing to report; the feeds treat it
/// the same way as an error. Accessors may block: the feeds call them on
/// tokio's blocking pool, the mission loop between its own settle waits.
pub trait Perception: Send + Sync {
    fn object_depth(&self) -> anyhow::Result<Option<f64>>;

    fn object_direction(&self) -> anyhow::Result<Option<Direction>>;

    fn tag_exist_signal(&self) -> anyhow::Result<TagSignal>;

    /// Last known target position; only used for logging
    fn target_position(&self) -> anyhow::Result<Option<[f64; 3]>>;

    /// Tell the detector which tag to track ("None" clears it)
    fn publish_tag_name(&self, name: &str) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse_and_code() {
        for dir in [
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
            Direction::Front,
            Direction::None,
        ] {
            assert_eq!(dir.as_str().parse::<Direction>().unwrap(), dir);
            assert_eq!(Direction::from_code(dir.to_code()), dir);
        }
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::from_code(42), Direction::None);
    }

    #[test]
    fn test_tag_signal_zero_is_absent() {
        assert_eq!(TagSignal::from_raw("0"), TagSignal::Absent);
        assert!(TagSignal::from_raw("bottle").is_visible());
    }
}
