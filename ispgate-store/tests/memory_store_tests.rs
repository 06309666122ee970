mod common;

use common::{base_time, new_identity, new_license, new_resource};
use ispgate_store::{IdentityStore, LicenseStore, MemoryStore, StoreError};
use ispgate_types::{ResourceStatus, Role};

#[tokio::test]
async fn agent_lookup_matches_key_and_hardware() {
    let store = MemoryStore::new();
    let hw1 = store.insert_resource(new_resource("HW1")).await.unwrap();
    store.insert_resource(new_resource("HW2")).await.unwrap();
    store.insert_license(new_license(hw1.id, "K1", 30)).await.unwrap();

    assert!(store.find_agent_license("K1", "HW1").await.unwrap().is_some());
    assert!(store.find_agent_license("K1", "HW2").await.unwrap().is_none());
}

#[tokio::test]
async fn suspension_is_visible_through_join() {
    let store = MemoryStore::new();
    let isp = store.insert_resource(new_resource("HW1")).await.unwrap();
    store.insert_license(new_license(isp.id, "K1", 30)).await.unwrap();
    store
        .set_resource_status(isp.id, ResourceStatus::Suspended)
        .await
        .unwrap();
    let found = store.find_agent_license("K1", "HW1").await.unwrap().unwrap();
    assert_eq!(found.resource_status, ResourceStatus::Suspended);
}

#[tokio::test]
async fn offline_store_fails_every_call() {
    let store = MemoryStore::new();
    store.set_offline(true);
    let err = store.find_identity_by_email("a@b.com").await.unwrap_err();
    assert!(err.is_unavailable());
    assert!(store.find_agent_license("K", "H").await.unwrap_err().is_unavailable());

    store.set_offline(false);
    assert!(store.find_identity_by_email("a@b.com").await.unwrap().is_none());
}

#[tokio::test]
async fn last_seen_outage_leaves_reads_working() {
    let store = MemoryStore::new();
    let isp = store.insert_resource(new_resource("HW1")).await.unwrap();
    store.set_last_seen_offline(true);
    assert!(store.record_last_seen(isp.id, base_time()).await.is_err());
    assert!(store.find_resource(isp.id).await.unwrap().is_some());
}

#[tokio::test]
async fn duplicate_email_and_hardware_conflict() {
    let store = MemoryStore::new();
    store.insert_identity(new_identity("a@b.com", Role::Isp)).await.unwrap();
    assert!(matches!(
        store.insert_identity(new_identity("a@b.com", Role::Isp)).await,
        Err(StoreError::Conflict(_))
    ));
    store.insert_resource(new_resource("HW1")).await.unwrap();
    assert!(matches!(
        store.insert_resource(new_resource("HW1")).await,
        Err(StoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn identity_activation_toggle() {
    let store = MemoryStore::new();
    let identity = store
        .insert_identity(new_identity("a@b.com", Role::Isp))
        .await
        .unwrap();
    assert!(store.set_identity_active(identity.id, false).await.unwrap());
    let reloaded = store.find_identity(identity.id).await.unwrap().unwrap();
    assert!(!reloaded.is_active);
}

#[tokio::test]
async fn listing_returns_newest_first() {
    let store = MemoryStore::new();
    let hw1 = store.insert_resource(new_resource("HW1")).await.unwrap();
    let hw2 = store.insert_resource(new_resource("HW2")).await.unwrap();
    let mut older = new_license(hw2.id, "K1", 30);
    older.created_at = base_time() - chrono::Duration::hours(3);
    store.insert_license(older).await.unwrap();
    store.insert_license(new_license(hw1.id, "K2", 30)).await.unwrap();
    store.insert_license(new_license(hw2.id, "K3", 30)).await.unwrap();

    let keys: Vec<String> = store
        .list_licenses()
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.license_key)
        .collect();
    assert_eq!(keys, vec!["K3", "K2", "K1"]);
}
