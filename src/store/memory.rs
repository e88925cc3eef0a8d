//! In-memory Relation Store - DashMap-backed adapter for tests and embedded use

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::descriptor::RelationDescriptor;
use crate::error::StoreError;
use crate::item::{ItemKey, Role};

use super::{RelationRow, RelationStore, StoreResult};

/// Process-local relation store keyed by table name.
///
/// Writing through the trait directly (bypassing any cache list) doubles as
/// an out-of-band mutation in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: DashMap<String, HashSet<RelationRow>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows held for a table
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|rows| rows.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RelationStore for MemoryStore {
    async fn insert(
        &self,
        relation: &RelationDescriptor,
        subject_id: i64,
        item: &ItemKey,
    ) -> StoreResult<()> {
        let row = RelationRow::new(subject_id, item);
        let mut rows = self.tables.entry(relation.table.clone()).or_default();

        if !rows.insert(row) {
            return Err(StoreError::Duplicate);
        }
        Ok(())
    }

    async fn delete(
        &self,
        relation: &RelationDescriptor,
        subject_id: i64,
        item: &ItemKey,
    ) -> StoreResult<u64> {
        let row = RelationRow::new(subject_id, item);

        match self.tables.get_mut(&relation.table) {
            Some(mut rows) => Ok(if rows.remove(&row) { 1 } else { 0 }),
            None => Ok(0),
        }
    }

    async fn members(
        &self,
        relation: &RelationDescriptor,
        owner_id: i64,
        role: Role,
    ) -> StoreResult<Vec<ItemKey>> {
        let members = self
            .tables
            .get(&relation.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.matches(owner_id, role))
                    .map(|row| row.endpoint(role))
                    .collect()
            })
            .unwrap_or_default();

        Ok(members)
    }

    async fn count(
        &self,
        relation: &RelationDescriptor,
        owner_id: i64,
        role: Role,
    ) -> StoreResult<u64> {
        let count = self
            .tables
            .get(&relation.table)
            .map(|rows| rows.iter().filter(|row| row.matches(owner_id, role)).count())
            .unwrap_or(0);

        Ok(count as u64)
    }
}
