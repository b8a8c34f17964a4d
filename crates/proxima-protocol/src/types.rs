//! Core data model shared by the wire, the cache, and the store.
//!
//! Everything here is serializable: location records travel to clients
//! inside `nearbyLocations`, are persisted as JSON in cache entries, and
//! are loaded from seed files by the in-memory store.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque identifier of a principal (a verified client identity).
///
/// Newtype over the identity provider's id string so it can't be mixed up
/// with location ids. Serialized as the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A verified identity attached to a connection.
///
/// Owned by the identity collaborator; read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: PrincipalId,
    pub display_name: String,
}

impl Principal {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: PrincipalId::new(id),
            display_name: display_name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A client-reported position: the `updateLocation` payload.
///
/// Longitude first, latitude second, matching the store's point
/// convention. Values are passed through untouched; range checking is the
/// store's concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub longitude: f64,
    pub latitude: f64,
}

impl LocationSample {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// A WGS84 point, serialized as a GeoJSON `Point`:
/// `{"type": "Point", "coordinates": [longitude, latitude]}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoJsonPoint", into = "GeoJsonPoint")]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<LocationSample> for GeoPoint {
    fn from(sample: LocationSample) -> Self {
        Self::new(sample.longitude, sample.latitude)
    }
}

/// Serde shadow of [`GeoPoint`] in GeoJSON form.
#[derive(Serialize, Deserialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    kind: String,
    coordinates: [f64; 2],
}

impl TryFrom<GeoJsonPoint> for GeoPoint {
    type Error = String;

    fn try_from(raw: GeoJsonPoint) -> Result<Self, Self::Error> {
        if raw.kind != "Point" {
            return Err(format!("expected GeoJSON Point, got {}", raw.kind));
        }
        let [longitude, latitude] = raw.coordinates;
        Ok(Self::new(longitude, latitude))
    }
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: [point.longitude, point.latitude],
        }
    }
}

// ---------------------------------------------------------------------------
// Location records
// ---------------------------------------------------------------------------

/// An audio guide attached to a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFile {
    pub title: String,
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A location-tagged record held by the persistent store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub coordinates: GeoPoint,
    #[serde(default)]
    pub audio_files: Vec<AudioFile>,
}

impl LocationRecord {
    /// Creates a record with no description and no audio.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        coordinates: GeoPoint,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            coordinates,
            audio_files: Vec::new(),
        }
    }
}

/// Records near a query point, ascending by distance.
///
/// Produced fresh by the store or rebuilt from a cache entry; never
/// mutated in place. Serialized as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NearbyResult(Vec<LocationRecord>);

impl NearbyResult {
    pub fn new(records: Vec<LocationRecord>) -> Self {
        Self(records)
    }

    /// The result delivered when nothing could be found or fetched.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn records(&self) -> &[LocationRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<LocationRecord> {
        self.0
    }
}

impl FromIterator<LocationRecord> for NearbyResult {
    fn from_iter<I: IntoIterator<Item = LocationRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_id_serializes_as_bare_string() {
        let id = PrincipalId::new("u1");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""u1""#);
        assert_eq!(id.to_string(), "u1");
    }

    #[test]
    fn test_principal_json_uses_camel_case() {
        let p = Principal::new("u1", "Ada");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["displayName"], "Ada");
    }

    #[test]
    fn test_geo_point_is_geojson() {
        let json = serde_json::to_value(GeoPoint::new(4.7, 50.88)).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"], serde_json::json!([4.7, 50.88]));
    }

    #[test]
    fn test_geo_point_rejects_other_geometries() {
        let raw = r#"{"type":"LineString","coordinates":[1.0,2.0]}"#;
        assert!(serde_json::from_str::<GeoPoint>(raw).is_err());
    }

    #[test]
    fn test_location_sample_requires_both_fields() {
        assert!(
            serde_json::from_str::<LocationSample>(r#"{"longitude":4.7}"#)
                .is_err()
        );
        assert!(
            serde_json::from_str::<LocationSample>(
                r#"{"longitude":"4.7","latitude":50.0}"#
            )
            .is_err(),
            "strings are not coordinates"
        );
    }

    #[test]
    fn test_location_record_wire_shape() {
        let mut record =
            LocationRecord::new("loc-1", "Town Hall", GeoPoint::new(4.70, 50.88));
        record.audio_files.push(AudioFile {
            title: "Intro".into(),
            file_url: "https://cdn.example/intro.mp3".into(),
            duration: Some(93.5),
            description: None,
        });
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["name"], "Town Hall");
        assert!(json.get("description").is_none());
        assert_eq!(json["audioFiles"][0]["fileUrl"], "https://cdn.example/intro.mp3");
        assert_eq!(json["coordinates"]["type"], "Point");
    }

    #[test]
    fn test_location_record_audio_files_default_to_empty() {
        let raw = r#"{"id":"a","name":"A","coordinates":{"type":"Point","coordinates":[0.0,0.0]}}"#;
        let record: LocationRecord = serde_json::from_str(raw).unwrap();
        assert!(record.audio_files.is_empty());
    }

    #[test]
    fn test_nearby_result_is_bare_array() {
        let result: NearbyResult = vec![LocationRecord::new(
            "a",
            "A",
            GeoPoint::new(0.0, 0.0),
        )]
        .into_iter()
        .collect();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.is_array());
        assert_eq!(result.len(), 1);
        assert!(NearbyResult::empty().is_empty());
    }
}
