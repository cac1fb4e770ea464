use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque job identifier issued by the orchestrator.
///
/// Immutable once assigned; the client never inspects its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Session counter, bumped every time a new submission begins (or the
/// session is reset). Reports tagged with an older value are stale.
pub type Generation = u64;

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// The inference tools that run through the asynchronous job pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// Photo to pencil-sketch generation.
    Sketch,
    /// AI upscaling.
    SuperResolution,
    /// Old-photo restoration (scratches, faces, colour).
    PhotoRestoration,
}

impl ToolKind {
    /// All tools, in display order.
    pub const ALL: [ToolKind; 3] = [
        ToolKind::Sketch,
        ToolKind::SuperResolution,
        ToolKind::PhotoRestoration,
    ];

    /// URL and CLI slug for the tool.
    pub fn slug(self) -> &'static str {
        match self {
            ToolKind::Sketch => "sketch",
            ToolKind::SuperResolution => "super-resolution",
            ToolKind::PhotoRestoration => "photo-restoration",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Returned when a string does not name a known tool.
#[derive(Debug, thiserror::Error)]
#[error("Unknown tool '{0}' (expected one of: sketch, super-resolution, photo-restoration)")]
pub struct UnknownTool(pub String);

impl FromStr for ToolKind {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|tool| tool.slug() == s)
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}
