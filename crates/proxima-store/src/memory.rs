//! In-memory store: both store contracts over `RwLock`ed maps.

use std::collections::HashMap;

use proxima_protocol::{GeoPoint, LocationRecord, Principal, PrincipalId};
use tokio::sync::RwLock;

use crate::{GeoStore, PrincipalStore, SeedData, StoreError, haversine_distance};

#[derive(Debug, Clone)]
struct PrincipalEntry {
    principal: Principal,
    online: bool,
}

/// A process-local implementation of [`GeoStore`] and [`PrincipalStore`].
///
/// `find_near` is a linear scan with exact haversine distances, which is
/// fine for the record counts a single guide deployment carries.
#[derive(Debug, Default)]
pub struct MemoryStore {
    locations: RwLock<HashMap<String, LocationRecord>>,
    principals: RwLock<HashMap<PrincipalId, PrincipalEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated from seed data. Later duplicates of an
    /// id replace earlier ones.
    pub fn from_seed(seed: SeedData) -> Self {
        let locations = seed
            .locations
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        let principals = seed
            .principals
            .into_iter()
            .map(|principal| {
                (
                    principal.id.clone(),
                    PrincipalEntry {
                        principal,
                        online: false,
                    },
                )
            })
            .collect();
        Self {
            locations: RwLock::new(locations),
            principals: RwLock::new(principals),
        }
    }

    /// Registers (or replaces) a principal, initially offline.
    pub async fn add_principal(&self, principal: Principal) {
        self.principals.write().await.insert(
            principal.id.clone(),
            PrincipalEntry {
                principal,
                online: false,
            },
        );
    }

    /// Reads back the durable online flag. `None` for unknown principals.
    pub async fn is_online(&self, id: &PrincipalId) -> Option<bool> {
        self.principals.read().await.get(id).map(|e| e.online)
    }

    /// Number of location records held.
    pub async fn location_count(&self) -> usize {
        self.locations.read().await.len()
    }
}

impl GeoStore for MemoryStore {
    async fn find_near(
        &self,
        point: GeoPoint,
        max_distance_meters: f64,
        limit: usize,
    ) -> Result<Vec<LocationRecord>, StoreError> {
        let locations = self.locations.read().await;

        let mut hits: Vec<(f64, &LocationRecord)> = locations
            .values()
            .map(|record| (haversine_distance(point, record.coordinates), record))
            .filter(|(distance, _)| *distance <= max_distance_meters)
            .collect();

        // Ties broken by id so equal-distance results are stable.
        hits.sort_by(|(da, a), (db, b)| da.total_cmp(db).then_with(|| a.id.cmp(&b.id)));

        Ok(hits
            .into_iter()
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn insert(&self, record: LocationRecord) -> Result<(), StoreError> {
        let mut locations = self.locations.write().await;
        if locations.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id));
        }
        tracing::debug!(id = %record.id, "location inserted");
        locations.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<LocationRecord>, StoreError> {
        Ok(self.locations.read().await.get(id).cloned())
    }

    async fn replace(&self, record: LocationRecord) -> Result<(), StoreError> {
        let mut locations = self.locations.write().await;
        match locations.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id)),
        }
    }

    async fn remove(&self, id: &str) -> Result<Option<LocationRecord>, StoreError> {
        Ok(self.locations.write().await.remove(id))
    }
}

impl PrincipalStore for MemoryStore {
    async fn find_principal(
        &self,
        id: &PrincipalId,
    ) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .principals
            .read()
            .await
            .get(id)
            .map(|e| e.principal.clone()))
    }

    async fn set_online(&self, id: &PrincipalId, online: bool) -> Result<(), StoreError> {
        let mut principals = self.principals.write().await;
        let entry = principals
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        entry.online = online;
        Ok(())
    }
}
