//! Cache List Engine - lazily materialized membership sets
//!
//! A `CacheList` is the in-memory projection of one relation's membership for
//! one owner instance. It starts unloaded, materializes from the relation
//! store on first access, and is kept consistent by routing every mutation
//! through it: the store is written first, the cached set second, so a failed
//! store write never leaves the cache ahead of the durable state.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockMappedWriteGuard, RwLockWriteGuard};
use tracing::debug;

use crate::descriptor::RelationDescriptor;
use crate::error::{KinshipError, KinshipResult, StoreError};
use crate::item::{ItemKey, Role};
use crate::store::RelationStore;

/// Per-owner-instance cached membership set for one relation projection.
///
/// The set is private to its owner instance: it is never shared across
/// instances or processes, and drift caused by out-of-band store writes is
/// corrected only by an explicit [`reset`](CacheList::reset).
pub struct CacheList {
    descriptor: Arc<RelationDescriptor>,
    store: Arc<dyn RelationStore>,
    owner_id: i64,
    role: Role,
    state: RwLock<Option<HashSet<ItemKey>>>,
}

impl CacheList {
    /// Create an unloaded cache list for the owner's subject (outgoing) side
    pub fn new(
        descriptor: Arc<RelationDescriptor>,
        store: Arc<dyn RelationStore>,
        owner_id: i64,
    ) -> Self {
        Self::with_role(descriptor, store, owner_id, Role::Subject)
    }

    /// Create an unloaded cache list for an explicit projection role
    pub fn with_role(
        descriptor: Arc<RelationDescriptor>,
        store: Arc<dyn RelationStore>,
        owner_id: i64,
        role: Role,
    ) -> Self {
        Self {
            descriptor,
            store,
            owner_id,
            role,
            state: RwLock::new(None),
        }
    }

    /// The relation this list projects
    pub fn descriptor(&self) -> &RelationDescriptor {
        &self.descriptor
    }

    /// The owning instance's id
    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    /// Which side of the rows this list reads
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the set has been materialized
    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Materialize the set if unloaded and hand back a write guard over it.
    ///
    /// A loaded set is never refreshed against the store; the whole
    /// ensure-loaded / mutate sequence runs under one write guard so a single
    /// mutation is atomic with respect to its own cache.
    async fn ensure_loaded(&self) -> KinshipResult<RwLockMappedWriteGuard<'_, HashSet<ItemKey>>> {
        let mut state = self.state.write().await;

        if state.is_none() {
            let members = self
                .store
                .members(&self.descriptor, self.owner_id, self.role)
                .await
                .map_err(KinshipError::from)?;
            debug!(
                relation = %self.descriptor.name,
                owner_id = self.owner_id,
                role = ?self.role,
                members = members.len(),
                "materialized cache list"
            );
            *state = Some(members.into_iter().collect());
        }

        Ok(RwLockWriteGuard::map(state, |s| {
            s.get_or_insert_with(HashSet::new)
        }))
    }

    /// Membership test; consults identity and type tag
    pub async fn contains(&self, item: &ItemKey) -> KinshipResult<bool> {
        self.descriptor.validate_item(item)?;
        let members = self.ensure_loaded().await?;
        Ok(members.contains(item))
    }

    /// Number of distinct members
    pub async fn count(&self) -> KinshipResult<usize> {
        let members = self.ensure_loaded().await?;
        Ok(members.len())
    }

    /// The materialized member identities, in no particular order
    pub async fn members(&self) -> KinshipResult<Vec<ItemKey>> {
        let members = self.ensure_loaded().await?;
        Ok(members.iter().cloned().collect())
    }

    /// Add the item to the relation.
    ///
    /// Idempotent: an existing member is left alone with no store write.
    /// Otherwise the row is inserted into the store first, then the cached
    /// set. Returns whether membership changed.
    pub async fn add(&self, item: &ItemKey) -> KinshipResult<bool> {
        self.descriptor.validate_item(item)?;
        let mut members = self.ensure_loaded().await?;

        if members.contains(item) {
            return Ok(false);
        }

        let (subject_id, row_item) = self.row_endpoints(item);
        match self.store.insert(&self.descriptor, subject_id, &row_item).await {
            Ok(()) => {}
            // row surfaced out of band since our load; membership holds either way
            Err(StoreError::Duplicate) => {}
            Err(err) => return Err(err.into()),
        }

        members.insert(item.clone());
        debug!(
            relation = %self.descriptor.name,
            owner_id = self.owner_id,
            item = %item,
            "added membership"
        );
        Ok(true)
    }

    /// Remove the item from the relation.
    ///
    /// A non-member is a no-op. Otherwise the store row is deleted first,
    /// then the cached entry. Returns whether membership changed.
    pub async fn remove(&self, item: &ItemKey) -> KinshipResult<bool> {
        self.descriptor.validate_item(item)?;
        let mut members = self.ensure_loaded().await?;

        if !members.contains(item) {
            return Ok(false);
        }

        let (subject_id, row_item) = self.row_endpoints(item);
        self.store
            .delete(&self.descriptor, subject_id, &row_item)
            .await
            .map_err(KinshipError::from)?;

        members.remove(item);
        debug!(
            relation = %self.descriptor.name,
            owner_id = self.owner_id,
            item = %item,
            "removed membership"
        );
        Ok(true)
    }

    /// Flip or force membership.
    ///
    /// With `desired: None` the current membership is flipped. With
    /// `Some(state)` membership is forced to that state; forcing the current
    /// state is a no-op with no store write. Returns the resulting
    /// membership.
    pub async fn toggle(&self, item: &ItemKey, desired: Option<bool>) -> KinshipResult<bool> {
        let present = self.contains(item).await?;
        let target = desired.unwrap_or(!present);

        if target != present {
            if target {
                self.add(item).await?;
            } else {
                self.remove(item).await?;
            }
        }

        Ok(target)
    }

    /// Discard the cached set, returning to the unloaded state.
    ///
    /// The next access triggers a fresh load, making out-of-band store
    /// writes visible.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = None;
        debug!(
            relation = %self.descriptor.name,
            owner_id = self.owner_id,
            role = ?self.role,
            "cache list reset"
        );
    }

    /// Record a membership the store already gained, without writing it.
    ///
    /// Applied to the counterpart projection after a directional mutation.
    /// An unloaded list is left alone; its next lazy load observes the row.
    pub(crate) async fn note_added(&self, item: ItemKey) {
        let mut state = self.state.write().await;
        if let Some(members) = state.as_mut() {
            members.insert(item);
        }
    }

    /// Record a membership the store already lost, without writing it
    pub(crate) async fn note_removed(&self, item: &ItemKey) {
        let mut state = self.state.write().await;
        if let Some(members) = state.as_mut() {
            members.remove(item);
        }
    }

    /// Map a cached identity onto the row's (subject, item) endpoints.
    ///
    /// For the object role the owner is the row's target, so the endpoints
    /// are reversed.
    fn row_endpoints(&self, item: &ItemKey) -> (i64, ItemKey) {
        match self.role {
            Role::Subject => (self.owner_id, item.clone()),
            Role::Object => (item.id, ItemKey::plain(self.owner_id)),
        }
    }
}
