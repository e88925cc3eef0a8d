//! Relation Store - durable storage interface for membership rows

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::descriptor::RelationDescriptor;
use crate::error::StoreError;
use crate::item::{ItemKey, Role};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A durable membership row.
///
/// One row per membership: the subject wrote the row, the object is the item,
/// and the kind tag is present only for polymorphic relations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationRow {
    pub subject_id: i64,
    pub item_id: i64,
    pub item_kind: Option<String>,
}

impl RelationRow {
    /// Build a row from a subject and an item identity
    pub fn new(subject_id: i64, item: &ItemKey) -> Self {
        Self {
            subject_id,
            item_id: item.id,
            item_kind: item.kind.clone(),
        }
    }

    /// The identity visible from the given role's side of this row
    pub fn endpoint(&self, role: Role) -> ItemKey {
        match role {
            Role::Subject => ItemKey {
                id: self.item_id,
                kind: self.item_kind.clone(),
            },
            Role::Object => ItemKey::plain(self.subject_id),
        }
    }

    /// Whether the owner occupies the given role in this row
    pub fn matches(&self, owner_id: i64, role: Role) -> bool {
        match role {
            Role::Subject => self.subject_id == owner_id,
            Role::Object => self.item_id == owner_id && self.item_kind.is_none(),
        }
    }
}

/// Durable storage for relation membership rows.
///
/// The store is the single source of truth; cache lists are derived
/// projections over it. Implementations must enforce the at-most-one-row
/// invariant per (subject, item id, item kind) and report violations as
/// [`StoreError::Duplicate`]. Object-role reads are meaningful only for
/// self-referential relations, whose rows carry no kind tag.
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Insert a membership row. Fails with `Duplicate` if the row exists.
    async fn insert(
        &self,
        relation: &RelationDescriptor,
        subject_id: i64,
        item: &ItemKey,
    ) -> StoreResult<()>;

    /// Delete the matching row(s), returning how many were removed
    async fn delete(
        &self,
        relation: &RelationDescriptor,
        subject_id: i64,
        item: &ItemKey,
    ) -> StoreResult<u64>;

    /// Enumerate the identities related to the owner in the given role
    async fn members(
        &self,
        relation: &RelationDescriptor,
        owner_id: i64,
        role: Role,
    ) -> StoreResult<Vec<ItemKey>>;

    /// Count the rows where the owner occupies the given role
    async fn count(
        &self,
        relation: &RelationDescriptor,
        owner_id: i64,
        role: Role,
    ) -> StoreResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_endpoints() {
        let row = RelationRow::new(1, &ItemKey::tagged("Movie", 7));

        assert_eq!(row.endpoint(Role::Subject), ItemKey::tagged("Movie", 7));
        assert_eq!(row.endpoint(Role::Object), ItemKey::plain(1));
    }

    #[test]
    fn test_row_matching() {
        let follow = RelationRow::new(1, &ItemKey::plain(2));

        assert!(follow.matches(1, Role::Subject));
        assert!(!follow.matches(2, Role::Subject));
        assert!(follow.matches(2, Role::Object));
        assert!(!follow.matches(1, Role::Object));

        // tagged rows never match the object role
        let like = RelationRow::new(1, &ItemKey::tagged("Movie", 2));
        assert!(!like.matches(2, Role::Object));
    }
}
