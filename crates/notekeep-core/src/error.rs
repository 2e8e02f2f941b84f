//! Error kinds shared across the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable classification of every failure the core can report.
///
/// Layers carry richer error enums, but each of them maps onto exactly one
/// kind. Callers branch on the kind, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The target id does not resolve to an existing, accessible row.
    NotFound,
    /// The ownership guard rejected the acting user.
    Unauthorized,
    /// A precondition failed before any write (bounds, uniqueness, length).
    Conflict,
    /// The session behind a refresh token is revoked or expired.
    RevokedSession,
    /// A token failed verification or does not match its session.
    InvalidToken,
    /// Storage or signing failure not attributable to caller input.
    Internal,
}

impl ErrorKind {
    /// Machine-readable name of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Conflict => "conflict",
            Self::RevokedSession => "revoked_session",
            Self::InvalidToken => "invalid_token",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::RevokedSession).unwrap();
        assert_eq!(json, "\"revoked_session\"");
        assert_eq!(ErrorKind::RevokedSession.to_string(), "revoked_session");
    }
}
