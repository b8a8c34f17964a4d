//! Integration tests for the in-memory geospatial query.

use proxima_protocol::{GeoPoint, LocationRecord, Principal, PrincipalId};
use proxima_store::{GeoStore, MemoryStore, PrincipalStore, SeedData};

// =========================================================================
// Helpers
// =========================================================================

/// Leuven city centre.
fn origin() -> GeoPoint {
    GeoPoint::new(4.70, 50.88)
}

fn record(id: &str, lon: f64, lat: f64) -> LocationRecord {
    LocationRecord::new(id, id, GeoPoint::new(lon, lat))
}

async fn store_with(records: Vec<LocationRecord>) -> MemoryStore {
    let store = MemoryStore::new();
    for r in records {
        store.insert(r).await.expect("insert");
    }
    store
}

fn ids(records: &[LocationRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

// =========================================================================
// find_near
// =========================================================================

#[tokio::test]
async fn test_find_near_sorts_by_distance() {
    let store = store_with(vec![
        record("heverlee", 4.60, 50.80),   // ~11 km
        record("town-hall", 4.7009, 50.8789), // ~100 m
        record("wilsele", 4.75, 50.90),    // ~4 km
    ])
    .await;

    let found = store.find_near(origin(), 20_000.0, 20).await.unwrap();

    assert_eq!(ids(&found), vec!["town-hall", "wilsele", "heverlee"]);
}

#[tokio::test]
async fn test_find_near_excludes_records_beyond_radius() {
    let store = store_with(vec![
        record("town-hall", 4.7009, 50.8789),
        record("brussels", 4.35, 50.85), // ~25 km
    ])
    .await;

    let found = store.find_near(origin(), 20_000.0, 20).await.unwrap();

    assert_eq!(ids(&found), vec!["town-hall"]);
}

#[tokio::test]
async fn test_find_near_caps_result_count() {
    let records = (0..30)
        .map(|i| record(&format!("p{i:02}"), 4.70 + i as f64 * 0.001, 50.88))
        .collect();
    let store = store_with(records).await;

    let found = store.find_near(origin(), 20_000.0, 20).await.unwrap();

    assert_eq!(found.len(), 20);
    // The cap keeps the nearest ones.
    assert_eq!(found[0].id, "p00");
    assert_eq!(found[19].id, "p19");
}

#[tokio::test]
async fn test_find_near_on_empty_store() {
    let store = MemoryStore::new();
    let found = store.find_near(origin(), 20_000.0, 20).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_find_near_uses_spherical_distance() {
    // 0.25° of longitude is ~27.8 km at the equator but only ~17.5 km at
    // 50.88°N; a planar degree-based check would treat them alike.
    let store = store_with(vec![
        record("north", 4.95, 50.88),
        record("equator", 0.25, 0.0),
    ])
    .await;

    let north = store.find_near(origin(), 20_000.0, 20).await.unwrap();
    let equator = store
        .find_near(GeoPoint::new(0.0, 0.0), 20_000.0, 20)
        .await
        .unwrap();

    assert_eq!(ids(&north), vec!["north"]);
    assert!(equator.is_empty());
}

// =========================================================================
// Seeding
// =========================================================================

#[tokio::test]
async fn test_from_seed_loads_principals_and_locations() {
    let seed = SeedData::from_json(
        r#"{
            "principals": [{ "id": "u1", "displayName": "Ada" }],
            "locations": [{
                "id": "town-hall",
                "name": "Town Hall",
                "coordinates": { "type": "Point", "coordinates": [4.7009, 50.8789] }
            }]
        }"#,
    )
    .unwrap();
    let store = MemoryStore::from_seed(seed);

    let principal = store
        .find_principal(&PrincipalId::new("u1"))
        .await
        .unwrap();
    assert_eq!(principal, Some(Principal::new("u1", "Ada")));
    assert_eq!(store.is_online(&PrincipalId::new("u1")).await, Some(false));

    let found = store.find_near(origin(), 20_000.0, 20).await.unwrap();
    assert_eq!(ids(&found), vec!["town-hall"]);
}
