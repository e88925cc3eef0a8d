//! Item identities and projection roles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a membership row an owner occupies.
///
/// Self-referential relations expose two projections over the same rows:
/// the subject side (outgoing, e.g. "following") and the object side
/// (incoming, e.g. "followers").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Owner wrote the row (outgoing direction)
    Subject,
    /// Owner is the row's target (incoming direction)
    Object,
}

impl Role {
    /// Returns true for the subject (outgoing) side
    pub fn is_subject(self) -> bool {
        matches!(self, Self::Subject)
    }

    /// The opposite projection
    pub fn invert(self) -> Self {
        match self {
            Self::Subject => Self::Object,
            Self::Object => Self::Subject,
        }
    }
}

/// Tagged item identity used as both the set element and the row key.
///
/// For polymorphic relations the `kind` tag disambiguates items of different
/// types that share a numeric id; single-type relations leave it `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub id: i64,
    pub kind: Option<String>,
}

impl ItemKey {
    /// Identity for a single-type relation
    pub fn plain(id: i64) -> Self {
        Self { id, kind: None }
    }

    /// Type-tagged identity for a polymorphic relation
    pub fn tagged(kind: impl Into<String>, id: i64) -> Self {
        Self {
            id,
            kind: Some(kind.into()),
        }
    }

    /// Returns true if this identity carries a type tag
    pub fn is_tagged(&self) -> bool {
        self.kind.is_some()
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{}#{}", kind, self.id),
            None => write!(f, "#{}", self.id),
        }
    }
}
