//! Frame serialization.
//!
//! The connection handler holds a [`Codec`] and never touches serde
//! directly. [`JsonCodec`] is what browser clients speak.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Turns events into frame bytes and back. One instance serves every
/// connection for the life of the server.
pub trait Codec: Send + Sync + 'static {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// # Errors
    /// [`ProtocolError::Decode`] when `data` is not a well-formed `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON frames via `serde_json`.
///
/// ```rust
/// use proxima_protocol::{ClientEvent, Codec, JsonCodec, LocationSample};
///
/// let frame = br#"{"event":"updateLocation","data":{"longitude":4.7,"latitude":50.88}}"#;
/// let event: ClientEvent = JsonCodec.decode(frame).unwrap();
/// assert_eq!(
///     event,
///     ClientEvent::UpdateLocation(LocationSample::new(4.7, 50.88)),
/// );
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
