//! Relation Bindings - per-owner operation sets generated from registered descriptors
//!
//! A `RelationSet` is the explicit, factory-built counterpart of generated
//! relation methods: it holds one lazily constructed [`CacheList`] per
//! (relation, projection role) for a single owner instance and forwards the
//! named operations to it by relation name.

use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::CacheList;
use crate::descriptor::RelationDescriptor;
use crate::error::{KinshipError, KinshipResult};
use crate::item::{ItemKey, Role};
use crate::registry::RelationRegistry;
use crate::store::RelationStore;

/// All relation caches belonging to one owner instance.
///
/// Binding the same owner id again (e.g. after re-fetching the owner) yields
/// a fresh instance with fresh, unloaded caches; nothing is shared between
/// instances.
pub struct RelationSet {
    owner_id: i64,
    registry: RelationRegistry,
    store: Arc<dyn RelationStore>,
    lists: DashMap<(String, Role), Arc<CacheList>>,
}

impl RelationSet {
    /// Bind an owner instance to its registered relations
    pub fn new(registry: RelationRegistry, store: Arc<dyn RelationStore>, owner_id: i64) -> Self {
        Self {
            owner_id,
            registry,
            store,
            lists: DashMap::new(),
        }
    }

    /// The bound owner's id
    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    fn descriptor(&self, relation: &str) -> KinshipResult<Arc<RelationDescriptor>> {
        self.registry
            .get(relation)
            .ok_or_else(|| KinshipError::UnknownRelation(relation.to_string()))
    }

    /// Get or construct the cache list for a (relation, role) slot
    fn list(&self, relation: &str, role: Role) -> KinshipResult<Arc<CacheList>> {
        let key = (relation.to_string(), role);
        if let Some(list) = self.lists.get(&key).map(|entry| entry.value().clone()) {
            return Ok(list);
        }

        let descriptor = self.descriptor(relation)?;
        if role == Role::Object && !descriptor.self_referential {
            return Err(KinshipError::Configuration(format!(
                "relation '{}' is not self-referential and has no incoming projection",
                relation
            )));
        }

        let list = Arc::new(CacheList::with_role(
            descriptor,
            self.store.clone(),
            self.owner_id,
            role,
        ));
        Ok(self.lists.entry(key).or_insert(list).value().clone())
    }

    /// Apply a cache-only delta to a projection, if it has been materialized
    async fn note(&self, relation: &str, role: Role, item: ItemKey, added: bool) {
        let list = self
            .lists
            .get(&(relation.to_string(), role))
            .map(|entry| entry.value().clone());

        if let Some(list) = list {
            if added {
                list.note_added(item).await;
            } else {
                list.note_removed(&item).await;
            }
        }
    }

    /// Membership test for the named relation
    pub async fn has(&self, relation: &str, item: &ItemKey) -> KinshipResult<bool> {
        self.list(relation, Role::Subject)?.contains(item).await
    }

    /// Add an item to the named relation
    pub async fn add(&self, relation: &str, item: &ItemKey) -> KinshipResult<bool> {
        self.list(relation, Role::Subject)?.add(item).await
    }

    /// Remove an item from the named relation
    pub async fn remove(&self, relation: &str, item: &ItemKey) -> KinshipResult<bool> {
        self.list(relation, Role::Subject)?.remove(item).await
    }

    /// Flip or force membership in the named relation
    pub async fn toggle(
        &self,
        relation: &str,
        item: &ItemKey,
        desired: Option<bool>,
    ) -> KinshipResult<bool> {
        self.list(relation, Role::Subject)?.toggle(item, desired).await
    }

    /// Count of items in the named relation
    pub async fn count(&self, relation: &str) -> KinshipResult<usize> {
        self.list(relation, Role::Subject)?.count().await
    }

    /// Enumerate the items in the named relation
    pub async fn members(&self, relation: &str) -> KinshipResult<Vec<ItemKey>> {
        self.list(relation, Role::Subject)?.members().await
    }

    /// Discard the named relation's cached projections
    pub async fn reset(&self, relation: &str) -> KinshipResult<()> {
        self.descriptor(relation)?;

        for role in [Role::Subject, Role::Object] {
            let list = self
                .lists
                .get(&(relation.to_string(), role))
                .map(|entry| entry.value().clone());
            if let Some(list) = list {
                list.reset().await;
            }
        }
        Ok(())
    }

    /// Discard every cached projection held by this instance
    pub async fn reset_all(&self) {
        let lists: Vec<Arc<CacheList>> = self
            .lists
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for list in lists {
            list.reset().await;
        }
    }

    fn directional(&self, relation: &str) -> KinshipResult<Arc<RelationDescriptor>> {
        let descriptor = self.descriptor(relation)?;
        if !descriptor.self_referential {
            return Err(KinshipError::Configuration(format!(
                "relation '{}' is not self-referential",
                relation
            )));
        }
        Ok(descriptor)
    }

    /// Directional action: this owner links to the other (e.g. follow).
    ///
    /// Writes one row. The caller's outgoing cache and the other endpoint's
    /// incoming cache both observe the change; the two opposite projections
    /// are untouched.
    pub async fn link(&self, relation: &str, other: &RelationSet) -> KinshipResult<bool> {
        self.directional(relation)?;

        let changed = self
            .list(relation, Role::Subject)?
            .add(&ItemKey::plain(other.owner_id))
            .await?;
        if changed {
            other
                .note(relation, Role::Object, ItemKey::plain(self.owner_id), true)
                .await;
        }
        Ok(changed)
    }

    /// Reverse of [`link`](RelationSet::link) (e.g. unfollow)
    pub async fn unlink(&self, relation: &str, other: &RelationSet) -> KinshipResult<bool> {
        self.directional(relation)?;

        let changed = self
            .list(relation, Role::Subject)?
            .remove(&ItemKey::plain(other.owner_id))
            .await?;
        if changed {
            other
                .note(relation, Role::Object, ItemKey::plain(self.owner_id), false)
                .await;
        }
        Ok(changed)
    }

    /// Owners this instance links to (outgoing enumeration)
    pub async fn outgoing(&self, relation: &str) -> KinshipResult<Vec<ItemKey>> {
        self.directional(relation)?;
        self.list(relation, Role::Subject)?.members().await
    }

    /// Owners linking to this instance (incoming enumeration)
    pub async fn incoming(&self, relation: &str) -> KinshipResult<Vec<ItemKey>> {
        self.directional(relation)?;
        self.list(relation, Role::Object)?.members().await
    }

    /// Outgoing counter, independent of the incoming one
    pub async fn outgoing_count(&self, relation: &str) -> KinshipResult<usize> {
        self.directional(relation)?;
        self.list(relation, Role::Subject)?.count().await
    }

    /// Incoming counter, independent of the outgoing one
    pub async fn incoming_count(&self, relation: &str) -> KinshipResult<usize> {
        self.directional(relation)?;
        self.list(relation, Role::Object)?.count().await
    }
}
