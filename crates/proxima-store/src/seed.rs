//! JSON seed files for the in-memory store.
//!
//! ```json
//! {
//!   "principals": [{ "id": "u1", "displayName": "Ada" }],
//!   "locations": [{
//!     "id": "town-hall",
//!     "name": "Town Hall",
//!     "coordinates": { "type": "Point", "coordinates": [4.7009, 50.8789] }
//!   }]
//! }
//! ```

use std::path::Path;

use proxima_protocol::{LocationRecord, Principal};
use serde::Deserialize;

use crate::StoreError;

/// Principals and locations to preload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub principals: Vec<Principal>,
    #[serde(default)]
    pub locations: Vec<LocationRecord>,
}

impl SeedData {
    /// Parses seed data from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::Seed(e.to_string()))
    }

    /// Reads and parses a seed file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))?;
        let seed = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            principals = seed.principals.len(),
            locations = seed.locations.len(),
            "seed data loaded"
        );
        Ok(seed)
    }
}
