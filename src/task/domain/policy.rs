//! Handling of tasks whose manager or employee lost their role.

use super::ParseOrphanPolicyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Policy for tasks whose manager or employee no longer holds the role the
/// task was created under.
///
/// Tasks are never reassigned automatically under either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// The assigned employee can keep updating the task.
    #[default]
    Retain,
    /// Status changes are refused until both parties hold their roles in
    /// the task's organization again.
    Freeze,
}

impl OrphanPolicy {
    /// Returns the canonical configuration representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retain => "retain",
            Self::Freeze => "freeze",
        }
    }
}

impl fmt::Display for OrphanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OrphanPolicy {
    type Error = ParseOrphanPolicyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "freeze" => Ok(Self::Freeze),
            _ => Err(ParseOrphanPolicyError(value.to_owned())),
        }
    }
}
