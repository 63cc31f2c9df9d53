//! Core enums used throughout the crate.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pipeline component producing a timed artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Script,
    Audio,
    Video,
    Subtitles,
}

impl ComponentKind {
    /// All kinds, in pipeline order.
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Script,
        ComponentKind::Audio,
        ComponentKind::Video,
        ComponentKind::Subtitles,
    ];
}

/// A component name that is not one of the known kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown component kind '{0}'")]
pub struct UnknownComponentKind(pub String);

impl FromStr for ComponentKind {
    type Err = UnknownComponentKind;

    /// Parse a lowercase kind name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" => Ok(ComponentKind::Script),
            "audio" => Ok(ComponentKind::Audio),
            "video" => Ok(ComponentKind::Video),
            "subtitles" => Ok(ComponentKind::Subtitles),
            other => Err(UnknownComponentKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKind::Script => write!(f, "script"),
            ComponentKind::Audio => write!(f, "audio"),
            ComponentKind::Video => write!(f, "video"),
            ComponentKind::Subtitles => write!(f, "subtitles"),
        }
    }
}

/// How a subtitle was cut from its audio segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// One caption spans the whole audio segment.
    #[default]
    Single,
    /// The segment was divided into equal time slices.
    EvenSplit,
}

impl std::fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitMethod::Single => write!(f, "single"),
            SplitMethod::EvenSplit => write!(f, "even_split"),
        }
    }
}
