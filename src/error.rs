//! Error types for GPSD watch sessions
//!
//! This module defines the error types that can occur while talking to
//! GPSD, decoding its JSON reports, or running the background read loop.

/// Main error type for GPSD session operations
///
/// Record-level variants (`SerdeError`, `ProtocolError`) are local to a
/// single line and never stop the read loop. Transport variants
/// (`IoError`, `ConnectionClosed`, `Aborted`) are terminal.
#[derive(Debug)]
pub enum GpsdError {
    /// I/O error occurred during network communication
    ///
    /// This happens when GPSD is unreachable at connect time, when the
    /// subscribe command cannot be written, or when a read fails mid-session.
    IoError(std::io::Error),

    /// JSON deserialization error
    ///
    /// Occurs when GPSD sends malformed JSON or when a recognized report
    /// doesn't match its expected field shapes.
    SerdeError(serde_json::Error),

    /// Protocol-level error
    ///
    /// Indicates a line that is valid JSON but violates the protocol,
    /// such as an object without a `class` field.
    ProtocolError(&'static str),

    /// GPSD closed the connection
    ///
    /// A read returned zero bytes without finding a line delimiter.
    ConnectionClosed,

    /// The read loop was cancelled by its owner before it terminated
    Aborted,
}

impl core::fmt::Display for GpsdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpsdError::IoError(err) => write!(f, "IoError: {}", err),
            GpsdError::SerdeError(err) => write!(f, "SerdeError: {}", err),
            GpsdError::ProtocolError(msg) => write!(f, "ProtocolError: {}", msg),
            GpsdError::ConnectionClosed => write!(f, "ConnectionClosed: GPSD closed the stream"),
            GpsdError::Aborted => write!(f, "Aborted: read loop cancelled"),
        }
    }
}

impl core::error::Error for GpsdError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            GpsdError::IoError(err) => Some(err),
            GpsdError::SerdeError(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_and_source() {
        use core::error::Error;

        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(GpsdError::SerdeError(serde_err).source().is_some());
        assert!(GpsdError::ConnectionClosed.source().is_none());
        assert_eq!(
            GpsdError::ProtocolError("missing class").to_string(),
            "ProtocolError: missing class"
        );
    }
}
