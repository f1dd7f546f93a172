//! Error types.
//!
//! Decode failures are per notification, link failures per session, and
//! discovery failures per scan.  None of them end the process.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::types::DeviceAddress;

/// Which fixed-layout record a payload was decoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Imu,
    Emg,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Imu => f.write_str("IMU"),
            RecordKind::Emg => f.write_str("EMG"),
        }
    }
}

/// A notification payload whose length does not match its record layout.
///
/// Non-fatal: the malformed notification is dropped and streaming continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{record} payload must be {expected} bytes, got {actual}")]
pub struct DecodeError {
    pub record: RecordKind,
    pub expected: usize,
    pub actual: usize,
}

/// One of the subscription writes issued right after connecting failed.
///
/// This is how a peripheral that merely advertises the right name, but is not
/// actually a Myo, is told apart from the real thing.
#[derive(Error, Debug)]
#[error("handshake step '{step}' (handle 0x{handle:02x}) failed: {source}")]
pub struct HandshakeError {
    pub step: &'static str,
    pub handle: u16,
    #[source]
    pub source: Box<LinkError>,
}

/// Failures of a single BLE link.
///
/// Fatal to the link they occur on, never to the process.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("device {0} was not seen in the last scan")]
    UnknownDevice(DeviceAddress),

    #[error("BLE connect failed: {0}")]
    Connect(String),

    #[error("BLE connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("service discovery failed: {0}")]
    ServiceDiscovery(String),

    #[error("characteristic {0} not found")]
    MissingCharacteristic(Uuid),

    #[error("no characteristic mapped to handle 0x{0:02x}")]
    UnknownHandle(u16),

    #[error("write to handle 0x{handle:02x} failed: {reason}")]
    Write { handle: u16, reason: String },

    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    #[error("device disconnected")]
    Disconnected,
}

/// The discovery mechanism itself failed.  Transient; discovery is retried.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("no Bluetooth adapter found")]
    AdapterNotFound,

    #[error("BLE scan failed: {0}")]
    Scan(String),
}

/// An event name outside [`crate::handlers::EventKind`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError {
            record: RecordKind::Imu,
            expected: 20,
            actual: 19,
        };
        assert_eq!(err.to_string(), "IMU payload must be 20 bytes, got 19");
    }

    #[test]
    fn test_handshake_error_display_and_source() {
        let err = LinkError::from(HandshakeError {
            step: "enable IMU notifications",
            handle: 0x1d,
            source: Box::new(LinkError::Write {
                handle: 0x1d,
                reason: "ATT error 0x03".to_string(),
            }),
        });
        assert_eq!(
            err.to_string(),
            "handshake step 'enable IMU notifications' (handle 0x1d) failed: \
             write to handle 0x1d failed: ATT error 0x03"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_link_error_display() {
        assert_eq!(LinkError::Disconnected.to_string(), "device disconnected");
        assert_eq!(
            LinkError::UnknownHandle(0x42).to_string(),
            "no characteristic mapped to handle 0x42"
        );
        assert_eq!(
            LinkError::UnknownDevice("AA:BB".into()).to_string(),
            "device AA:BB was not seen in the last scan"
        );
    }

    #[test]
    fn test_unknown_event_kind_display() {
        let err = UnknownEventKind("wave_up".into());
        assert_eq!(err.to_string(), "unknown event kind: wave_up");
    }
}
