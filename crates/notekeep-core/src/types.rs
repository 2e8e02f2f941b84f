//! Core data types for notekeep.
//!
//! A user owns notes; a note owns an ordered sequence of content nodes.
//! For a fixed note the node orders are always exactly `0..n`, which is
//! maintained by the node sequencer in `notekeep-store`. The types here only
//! describe the shapes.
//!
//! All types derive `Debug`, `Clone`, `Serialize`, and `Deserialize` for
//! inspection, copying, and JSON serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Longest accepted note title, in characters.
pub const MAX_TITLE_CHARS: usize = 31;

/// Returns true when `title` fits the note title limit.
pub fn title_fits(title: &str) -> bool {
    title.chars().count() <= MAX_TITLE_CHARS
}

// ============================================================================
// ID Types
// ============================================================================

/// Opaque identifier of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Creates a new random UserId using UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Opaque identifier of a refresh-token session.
///
/// Embedded in the signed refresh token as the `token_id` claim and used as
/// the primary lookup key of the session ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Creates a new random SessionId using UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Store-assigned identifier of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Store-assigned identifier of a note node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// ============================================================================
// Content
// ============================================================================

/// Kind of content a node carries.
///
/// Image nodes store an opaque file path in their content; the core never
/// inspects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    List,
    Image,
}

impl ContentType {
    /// Storage and wire name of the content type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::List => "list",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ContentTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "list" => Ok(Self::List),
            "image" => Ok(Self::Image),
            other => Err(ContentTypeParseError(other.to_string())),
        }
    }
}

/// Error type for parsing a ContentType from its name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown content type: {0}")]
pub struct ContentTypeParseError(pub String);

// ============================================================================
// Entities
// ============================================================================

/// A registered user, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One ordered content unit of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteNode {
    pub id: NodeId,
    pub note_id: NoteId,
    /// Zero-based contiguous rank within the parent note.
    pub order: i32,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub content: String,
}

/// A note together with its nodes sorted by order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: UserId,
    pub title: String,
    pub is_public: bool,
    pub public_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    pub nodes: Vec<NoteNode>,
}

impl Note {
    /// Returns true when the note is archived.
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Returns true when the node orders are exactly `0..nodes.len()` in
    /// sequence.
    pub fn orders_contiguous(&self) -> bool {
        self.nodes
            .iter()
            .enumerate()
            .all(|(i, node)| node.order as usize == i)
    }
}

/// Listing row for a user's notes, without nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePreview {
    pub id: NoteId,
    pub title: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

/// New content for one node inside a full-note update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeContentUpdate {
    pub id: NodeId,
    pub content: String,
}

/// Payload of a full-note update: a new title plus per-node content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullNoteUpdate {
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<NodeContentUpdate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, order: i32) -> NoteNode {
        NoteNode {
            id: NodeId(id),
            note_id: NoteId(1),
            order,
            content_type: ContentType::Text,
            content: String::new(),
        }
    }

    fn note_with(nodes: Vec<NoteNode>) -> Note {
        let now = Utc::now();
        Note {
            id: NoteId(1),
            user_id: UserId::new(),
            title: "groceries".to_string(),
            is_public: false,
            public_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            archived_at: None,
            nodes,
        }
    }

    #[test]
    fn test_content_type_round_trips_through_name() {
        for ct in [ContentType::Text, ContentType::List, ContentType::Image] {
            assert_eq!(ct.as_str().parse::<ContentType>().unwrap(), ct);
        }
        assert!("video".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_content_type_serializes_lowercase() {
        let json = serde_json::to_string(&ContentType::Image).unwrap();
        assert_eq!(json, "\"image\"");
    }

    #[test]
    fn test_node_serializes_type_field() {
        let json = serde_json::to_value(node(7, 0)).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["id"], 7);
        assert_eq!(json["note_id"], 1);
    }

    #[test]
    fn test_title_limit_counts_characters() {
        assert!(title_fits(""));
        assert!(title_fits(&"a".repeat(31)));
        assert!(!title_fits(&"a".repeat(32)));
        // multi-byte characters count once
        assert!(title_fits(&"ж".repeat(31)));
    }

    #[test]
    fn test_orders_contiguous() {
        assert!(note_with(vec![]).orders_contiguous());
        assert!(note_with(vec![node(1, 0), node(2, 1), node(3, 2)]).orders_contiguous());
        assert!(!note_with(vec![node(1, 0), node(3, 2)]).orders_contiguous());
        assert!(!note_with(vec![node(1, 1)]).orders_contiguous());
    }

    #[test]
    fn test_archived_at_omitted_when_none() {
        let json = serde_json::to_value(note_with(vec![])).unwrap();
        assert!(json.get("archived_at").is_none());
        assert!(!note_with(vec![]).is_archived());
    }

    #[test]
    fn test_ids_parse_from_str() {
        assert_eq!("42".parse::<NoteId>().unwrap(), NoteId(42));
        assert_eq!("9".parse::<NodeId>().unwrap(), NodeId(9));
        let user = UserId::new();
        assert_eq!(user.to_string().parse::<UserId>().unwrap(), user);
        assert!("nope".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_full_note_update_defaults_nodes() {
        let update: FullNoteUpdate = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert!(update.nodes.is_empty());
    }
}
