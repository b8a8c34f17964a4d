//! Persistent store contracts for Proxima.
//!
//! Two collaborators live behind this crate's traits:
//!
//! - [`GeoStore`]: location-tagged records with a spherical "what is
//!   within R metres of P" query plus plain CRUD by id.
//! - [`PrincipalStore`]: principal lookup for the authenticator and the
//!   durable half of presence.
//!
//! [`MemoryStore`] implements both over in-process maps and is what the
//! server binary and the test suites run against. A database-backed store
//! only has to implement the two traits.

mod error;
mod geo;
mod memory;
mod seed;

pub use error::StoreError;
pub use geo::{EARTH_RADIUS_METERS, haversine_distance};
pub use memory::MemoryStore;
pub use seed::SeedData;

use std::future::Future;
use std::sync::Arc;

use proxima_protocol::{GeoPoint, LocationRecord, Principal, PrincipalId};

/// Geospatially indexed record storage.
pub trait GeoStore: Send + Sync + 'static {
    /// Returns records within `max_distance_meters` of `point`, nearest
    /// first, at most `limit` of them. Distance is great-circle.
    fn find_near(
        &self,
        point: GeoPoint,
        max_distance_meters: f64,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LocationRecord>, StoreError>> + Send;

    /// Inserts a new record.
    ///
    /// # Errors
    /// [`StoreError::Duplicate`] if the id is taken.
    fn insert(
        &self,
        record: LocationRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fetches a record by id.
    fn get(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<LocationRecord>, StoreError>> + Send;

    /// Replaces an existing record (matched by `record.id`).
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if no record has that id.
    fn replace(
        &self,
        record: LocationRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a record, returning it if it existed.
    fn remove(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<LocationRecord>, StoreError>> + Send;
}

/// Principal lookup and durable presence.
pub trait PrincipalStore: Send + Sync + 'static {
    /// Resolves a verified id to a known principal.
    fn find_principal(
        &self,
        id: &PrincipalId,
    ) -> impl Future<Output = Result<Option<Principal>, StoreError>> + Send;

    /// Persists the principal's online flag.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if the principal is unknown.
    fn set_online(
        &self,
        id: &PrincipalId,
        online: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T: GeoStore> GeoStore for Arc<T> {
    fn find_near(
        &self,
        point: GeoPoint,
        max_distance_meters: f64,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LocationRecord>, StoreError>> + Send {
        (**self).find_near(point, max_distance_meters, limit)
    }

    fn insert(
        &self,
        record: LocationRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).insert(record)
    }

    fn get(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<LocationRecord>, StoreError>> + Send {
        (**self).get(id)
    }

    fn replace(
        &self,
        record: LocationRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).replace(record)
    }

    fn remove(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<LocationRecord>, StoreError>> + Send {
        (**self).remove(id)
    }
}

impl<T: PrincipalStore> PrincipalStore for Arc<T> {
    fn find_principal(
        &self,
        id: &PrincipalId,
    ) -> impl Future<Output = Result<Option<Principal>, StoreError>> + Send {
        (**self).find_principal(id)
    }

    fn set_online(
        &self,
        id: &PrincipalId,
        online: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).set_online(id, online)
    }
}
