//! Pipeline direction.

use serde::{Deserialize, Serialize};

/// Which side of a call a schema, format path, or failure belongs to.
///
/// `Outbound` is the request document travelling to the remote service
/// (validated by the input schema); `Inbound` is the response document
/// coming back (validated by the output schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    /// The conventional line-schema spelling (`in` for the request side,
    /// `out` for the response side).
    pub fn as_schema_str(self) -> &'static str {
        match self {
            Self::Outbound => "in",
            Self::Inbound => "out",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outbound => write!(f, "outbound"),
            Self::Inbound => write!(f, "inbound"),
        }
    }
}
