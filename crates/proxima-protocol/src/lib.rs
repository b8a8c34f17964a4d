//! Wire protocol for Proxima.
//!
//! This crate defines what clients and the server say to each other and
//! the records that flow between the service and its collaborators:
//!
//! - **Types** ([`LocationSample`], [`LocationRecord`], [`NearbyResult`],
//!   [`Principal`], …): the data model.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): named frames of the
//!   form `{"event": "<name>", "data": <payload>}`. Each event name has a
//!   fixed payload schema; anything else fails to decode at the boundary.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent / ServerEvent) → Lifecycle
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, ErrorPayload, ServerEvent};
pub use types::{
    AudioFile, GeoPoint, LocationRecord, LocationSample, NearbyResult,
    Principal, PrincipalId,
};
