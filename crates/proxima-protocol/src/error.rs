//! Frame codec errors.

/// A frame that could not be turned into bytes, or bytes that are not a
/// known event.
///
/// The `Display` text of [`Decode`](Self::Decode) is what a client sees
/// after the `Failed to update location: ` prefix, so it names the serde
/// failure as-is.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[cfg(feature = "json")]
    #[error("cannot encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    /// Not JSON, an event name nobody handles, or a payload of the wrong
    /// shape.
    #[cfg(feature = "json")]
    #[error("malformed frame: {0}")]
    Decode(#[source] serde_json::Error),
}
