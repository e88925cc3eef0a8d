//! End-to-end behavior of cached membership relations
//!
//! Drives the public surface the way an application would: a registry of
//! declared relations, a shared store, and per-owner relation sets. Covers
//! single-type and polymorphic relations, toggle semantics, out-of-band
//! store writes, and directional follow counters.

use std::sync::Arc;

use kinship::{
    ItemKey, MemoryStore, RelationDescriptor, RelationRegistry, RelationSet, RelationStore,
};

fn registry() -> RelationRegistry {
    let registry = RelationRegistry::new();
    registry
        .register(
            RelationDescriptor::new("movies", "user_movies", "User")
                .with_columns("user_id", "movie_id"),
        )
        .unwrap();
    registry
        .register(
            RelationDescriptor::new("likes", "likes", "User")
                .with_columns("user_id", "item_id")
                .with_type_column("item_type")
                .with_allowed_kinds(vec!["Movie".to_string(), "Song".to_string()]),
        )
        .unwrap();
    registry
        .register(
            RelationDescriptor::new("follows", "follows", "User")
                .with_columns("follower_id", "followed_id")
                .self_referential(),
        )
        .unwrap();
    registry
}

fn user(registry: &RelationRegistry, store: &Arc<MemoryStore>, id: i64) -> RelationSet {
    RelationSet::new(
        registry.clone(),
        store.clone() as Arc<dyn RelationStore>,
        id,
    )
}

#[tokio::test]
async fn single_type_add_remove_has() {
    let registry = registry();
    let store = Arc::new(MemoryStore::new());
    let owner = user(&registry, &store, 1);

    let movie1 = ItemKey::plain(1);
    let movie2 = ItemKey::plain(2);

    assert!(!owner.has("movies", &movie1).await.unwrap());
    owner.add("movies", &movie1).await.unwrap();
    assert!(owner.has("movies", &movie1).await.unwrap());

    owner.add("movies", &movie2).await.unwrap();
    assert!(owner.has("movies", &movie2).await.unwrap());

    owner.remove("movies", &movie1).await.unwrap();
    assert!(!owner.has("movies", &movie1).await.unwrap());
    assert!(owner.has("movies", &movie2).await.unwrap());

    // re-fetching the owner yields a fresh instance backed by the same rows
    let refetched = user(&registry, &store, 1);
    assert!(!refetched.has("movies", &movie1).await.unwrap());
    assert!(refetched.has("movies", &movie2).await.unwrap());
}

#[tokio::test]
async fn polymorphic_add_remove_counts() {
    let registry = registry();
    let store = Arc::new(MemoryStore::new());
    let owner = user(&registry, &store, 1);

    let movie1 = ItemKey::tagged("Movie", 2);
    let movie2 = ItemKey::tagged("Movie", 3);

    assert_eq!(owner.count("likes").await.unwrap(), 0);
    assert!(!owner.has("likes", &movie1).await.unwrap());

    owner.add("likes", &movie1).await.unwrap();
    owner.add("likes", &movie2).await.unwrap();
    assert_eq!(owner.count("likes").await.unwrap(), 2);
    assert!(owner.has("likes", &movie1).await.unwrap());
    assert!(owner.has("likes", &movie2).await.unwrap());

    owner.remove("likes", &movie1).await.unwrap();
    assert_eq!(owner.count("likes").await.unwrap(), 1);
    assert!(!owner.has("likes", &movie1).await.unwrap());

    let refetched = user(&registry, &store, 1);
    assert!(!refetched.has("likes", &movie1).await.unwrap());
    assert!(refetched.has("likes", &movie2).await.unwrap());
}

#[tokio::test]
async fn same_id_different_kind_are_distinct() {
    let registry = registry();
    let store = Arc::new(MemoryStore::new());
    let owner = user(&registry, &store, 1);

    owner.add("likes", &ItemKey::tagged("Movie", 7)).await.unwrap();

    assert!(owner.has("likes", &ItemKey::tagged("Movie", 7)).await.unwrap());
    assert!(!owner.has("likes", &ItemKey::tagged("Song", 7)).await.unwrap());
    assert_eq!(owner.count("likes").await.unwrap(), 1);

    owner.add("likes", &ItemKey::tagged("Song", 7)).await.unwrap();
    assert_eq!(owner.count("likes").await.unwrap(), 2);
}

#[tokio::test]
async fn rows_written_out_of_band_are_visible_on_first_load() {
    let registry = registry();
    let store = Arc::new(MemoryStore::new());
    let likes = registry.get("likes").unwrap();

    // rows created without going through any relation set
    store
        .insert(&likes, 1, &ItemKey::tagged("Movie", 1))
        .await
        .unwrap();
    store
        .insert(&likes, 1, &ItemKey::tagged("Movie", 2))
        .await
        .unwrap();

    let owner = user(&registry, &store, 1);
    assert!(owner.has("likes", &ItemKey::tagged("Movie", 1)).await.unwrap());
    assert!(owner.has("likes", &ItemKey::tagged("Movie", 2)).await.unwrap());
}

#[tokio::test]
async fn toggle_flips_and_forces_membership() {
    let registry = registry();
    let store = Arc::new(MemoryStore::new());
    let owner = user(&registry, &store, 1);
    let movie = ItemKey::tagged("Movie", 1);

    assert!(!owner.has("likes", &movie).await.unwrap());
    owner.toggle("likes", &movie, None).await.unwrap();
    assert!(owner.has("likes", &movie).await.unwrap());

    owner.toggle("likes", &movie, None).await.unwrap();
    assert!(!owner.has("likes", &movie).await.unwrap());

    owner.add("likes", &movie).await.unwrap();
    assert!(owner.has("likes", &movie).await.unwrap());

    owner.toggle("likes", &movie, Some(false)).await.unwrap();
    assert!(!owner.has("likes", &movie).await.unwrap());

    owner.toggle("likes", &movie, Some(true)).await.unwrap();
    assert!(owner.has("likes", &movie).await.unwrap());
}

#[tokio::test]
async fn stale_cache_recovers_after_reset() {
    let registry = registry();
    let store = Arc::new(MemoryStore::new());
    let owner = user(&registry, &store, 1);
    let movie = ItemKey::tagged("Movie", 1);

    // this materializes the cache
    assert!(!owner.has("likes", &movie).await.unwrap());

    // this doesn't update the cache
    store
        .insert(&registry.get("likes").unwrap(), 1, &movie)
        .await
        .unwrap();
    assert!(!owner.has("likes", &movie).await.unwrap());

    owner.reset("likes").await.unwrap();
    assert!(owner.has("likes", &movie).await.unwrap());
}

#[tokio::test]
async fn follow_counters_change_independently() {
    let registry = registry();
    let store = Arc::new(MemoryStore::new());
    let follower = user(&registry, &store, 1);
    let followed = user(&registry, &store, 2);

    assert_eq!(follower.incoming_count("follows").await.unwrap(), 0);
    assert_eq!(follower.outgoing_count("follows").await.unwrap(), 0);
    assert_eq!(followed.incoming_count("follows").await.unwrap(), 0);
    assert_eq!(followed.outgoing_count("follows").await.unwrap(), 0);

    follower.link("follows", &followed).await.unwrap();

    // the two affected projections move by one, the other two don't move
    assert_eq!(follower.outgoing_count("follows").await.unwrap(), 1);
    assert_eq!(followed.incoming_count("follows").await.unwrap(), 1);
    assert_eq!(follower.incoming_count("follows").await.unwrap(), 0);
    assert_eq!(followed.outgoing_count("follows").await.unwrap(), 0);

    follower.unlink("follows", &followed).await.unwrap();

    assert_eq!(follower.outgoing_count("follows").await.unwrap(), 0);
    assert_eq!(followed.incoming_count("follows").await.unwrap(), 0);
    assert_eq!(follower.incoming_count("follows").await.unwrap(), 0);
    assert_eq!(followed.outgoing_count("follows").await.unwrap(), 0);
}

#[tokio::test]
async fn repeated_adds_never_duplicate_rows() {
    let registry = registry();
    let store = Arc::new(MemoryStore::new());
    let owner = user(&registry, &store, 1);
    let movie = ItemKey::tagged("Movie", 1);

    assert!(owner.add("likes", &movie).await.unwrap());
    assert!(!owner.add("likes", &movie).await.unwrap());
    assert!(!owner.add("likes", &movie).await.unwrap());

    assert_eq!(owner.count("likes").await.unwrap(), 1);
    assert_eq!(store.row_count("likes"), 1);

    // and a fresh instance agrees
    let refetched = user(&registry, &store, 1);
    assert_eq!(refetched.count("likes").await.unwrap(), 1);
}

#[tokio::test]
async fn count_matches_enumeration() {
    let registry = registry();
    let store = Arc::new(MemoryStore::new());
    let owner = user(&registry, &store, 1);

    assert_eq!(owner.count("likes").await.unwrap(), 0);
    assert!(owner.members("likes").await.unwrap().is_empty());

    for id in 1..=5 {
        owner.add("likes", &ItemKey::tagged("Movie", id)).await.unwrap();
    }
    owner.remove("likes", &ItemKey::tagged("Movie", 3)).await.unwrap();

    let members = owner.members("likes").await.unwrap();
    assert_eq!(owner.count("likes").await.unwrap(), members.len());
    assert_eq!(members.len(), 4);
}
