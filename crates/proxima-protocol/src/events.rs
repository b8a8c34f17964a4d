//! Named event frames.
//!
//! Every frame on the wire is `{"event": "<name>", "data": <payload>}`.
//! Each name maps to exactly one payload schema, so a frame that names an
//! unknown event or carries the wrong shape is rejected by the decoder
//! before any handler sees it.

use serde::{Deserialize, Serialize};

use crate::{LocationSample, NearbyResult};

/// Client → server events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// `updateLocation`: the client's current position.
    UpdateLocation(LocationSample),
}

impl ClientEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateLocation(_) => "updateLocation",
        }
    }
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// `nearbyLocations`: the answer to an `updateLocation`, possibly empty.
    NearbyLocations(NearbyResult),

    /// `locationUpdateError`: an update could not be processed at all.
    LocationUpdateError(ErrorPayload),

    /// `connectError`: the connection was refused; sent right before close.
    ConnectError(ErrorPayload),
}

impl ServerEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NearbyLocations(_) => "nearbyLocations",
            Self::LocationUpdateError(_) => "locationUpdateError",
            Self::ConnectError(_) => "connectError",
        }
    }
}

/// Payload of the error events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
