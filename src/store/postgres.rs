//! Postgres Relation Store - sqlx-backed adapter

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use crate::descriptor::RelationDescriptor;
use crate::error::StoreError;
use crate::item::{ItemKey, Role};

use super::{RelationStore, StoreResult};

/// Relation store backed by a Postgres connection pool.
///
/// Duplicate-row prevention is delegated to the database: inserts use
/// `ON CONFLICT DO NOTHING` over the table's uniqueness constraint and report
/// an untouched insert as [`StoreError::Duplicate`].
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a store over an existing pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Access the underlying pool
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

fn owner_column(relation: &RelationDescriptor, role: Role) -> &str {
    match role {
        Role::Subject => &relation.subject_column,
        Role::Object => &relation.object_column,
    }
}

fn insert_sql(relation: &RelationDescriptor) -> String {
    match &relation.type_column {
        Some(type_column) => format!(
            "INSERT INTO {} ({}, {}, {}) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
            relation.table, relation.subject_column, relation.object_column, type_column
        ),
        None => format!(
            "INSERT INTO {} ({}, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            relation.table, relation.subject_column, relation.object_column
        ),
    }
}

fn delete_sql(relation: &RelationDescriptor) -> String {
    match &relation.type_column {
        Some(type_column) => format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2 AND {} = $3",
            relation.table, relation.subject_column, relation.object_column, type_column
        ),
        None => format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2",
            relation.table, relation.subject_column, relation.object_column
        ),
    }
}

fn members_sql(relation: &RelationDescriptor, role: Role) -> String {
    match (role, &relation.type_column) {
        (Role::Subject, Some(type_column)) => format!(
            "SELECT {}, {} FROM {} WHERE {} = $1",
            relation.object_column, type_column, relation.table, relation.subject_column
        ),
        (Role::Subject, None) => format!(
            "SELECT {} FROM {} WHERE {} = $1",
            relation.object_column, relation.table, relation.subject_column
        ),
        (Role::Object, _) => format!(
            "SELECT {} FROM {} WHERE {} = $1",
            relation.subject_column, relation.table, relation.object_column
        ),
    }
}

fn count_sql(relation: &RelationDescriptor, role: Role) -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE {} = $1",
        relation.table,
        owner_column(relation, role)
    )
}

#[async_trait]
impl RelationStore for PostgresStore {
    async fn insert(
        &self,
        relation: &RelationDescriptor,
        subject_id: i64,
        item: &ItemKey,
    ) -> StoreResult<()> {
        let sql = insert_sql(relation);
        let query = sqlx::query(&sql).bind(subject_id).bind(item.id);
        let query = match &relation.type_column {
            Some(_) => query.bind(item.kind.as_deref()),
            None => query,
        };

        let result = query.execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate);
        }

        debug!(relation = %relation.name, subject_id, item = %item, "inserted membership row");
        Ok(())
    }

    async fn delete(
        &self,
        relation: &RelationDescriptor,
        subject_id: i64,
        item: &ItemKey,
    ) -> StoreResult<u64> {
        let sql = delete_sql(relation);
        let query = sqlx::query(&sql).bind(subject_id).bind(item.id);
        let query = match &relation.type_column {
            Some(_) => query.bind(item.kind.as_deref()),
            None => query,
        };

        let result = query.execute(&self.pool).await?;

        debug!(relation = %relation.name, subject_id, item = %item,
               rows = result.rows_affected(), "deleted membership rows");
        Ok(result.rows_affected())
    }

    async fn members(
        &self,
        relation: &RelationDescriptor,
        owner_id: i64,
        role: Role,
    ) -> StoreResult<Vec<ItemKey>> {
        let sql = members_sql(relation, role);
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        let tagged = role.is_subject() && relation.is_polymorphic();
        let mut members = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get(0)?;
            let kind: Option<String> = if tagged { row.try_get(1)? } else { None };
            members.push(ItemKey { id, kind });
        }

        Ok(members)
    }

    async fn count(
        &self,
        relation: &RelationDescriptor,
        owner_id: i64,
        role: Role,
    ) -> StoreResult<u64> {
        let sql = count_sql(relation, role);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}
