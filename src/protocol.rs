//! GATT table, handshake writes, and command encoders for the Myo armband.
//!
//! The armband exposes its data channels at fixed attribute handles. The core
//! addresses characteristics by handle; the btleplug backend, which only sees
//! UUIDs, translates through [`characteristic_uuid`] and [`value_handle`].
//!
//! All vendor UUIDs live in the Myo namespace
//! `d506XXXX-a904-deb9-4748-2c7f4a124842`.

use uuid::Uuid;

// ── Target device ────────────────────────────────────────────────────────────

/// Local name advertised by every Myo armband.
pub const MYO_DEVICE_NAME: &str = "Myo";

// ── Attribute handles ────────────────────────────────────────────────────────

/// Command characteristic (write).  Accepts mode-select and vibrate commands.
pub const COMMAND_HANDLE: u16 = 0x19;

/// Motion data characteristic (notify): 10 × i16 LE per notification.
pub const IMU_DATA_HANDLE: u16 = 0x1c;
/// Client characteristic configuration descriptor of [`IMU_DATA_HANDLE`].
pub const IMU_CCCD_HANDLE: u16 = 0x1d;

/// Classifier event characteristic (indicate).
pub const CLASSIFIER_EVENT_HANDLE: u16 = 0x23;
/// Client characteristic configuration descriptor of [`CLASSIFIER_EVENT_HANDLE`].
pub const CLASSIFIER_CCCD_HANDLE: u16 = 0x24;

/// EMG telemetry characteristic (notify): 8 × u16 LE + 1 byte per notification.
pub const EMG_DATA_HANDLE: u16 = 0x27;
/// Client characteristic configuration descriptor of [`EMG_DATA_HANDLE`].
pub const EMG_CCCD_HANDLE: u16 = 0x28;

// ── Characteristic UUIDs ──────────────────────────────────────────────────────

pub const COMMAND_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0xd5060401_a904_deb9_4748_2c7f4a124842);

pub const IMU_DATA_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0xd5060402_a904_deb9_4748_2c7f4a124842);

pub const CLASSIFIER_EVENT_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0xd5060103_a904_deb9_4748_2c7f4a124842);

pub const EMG_DATA_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0xd5060104_a904_deb9_4748_2c7f4a124842);

/// Value handle ↔ characteristic UUID.
const GATT_TABLE: [(u16, Uuid); 4] = [
    (COMMAND_HANDLE, COMMAND_CHARACTERISTIC),
    (IMU_DATA_HANDLE, IMU_DATA_CHARACTERISTIC),
    (CLASSIFIER_EVENT_HANDLE, CLASSIFIER_EVENT_CHARACTERISTIC),
    (EMG_DATA_HANDLE, EMG_DATA_CHARACTERISTIC),
];

/// UUID of the characteristic whose value lives at `handle`.
pub fn characteristic_uuid(handle: u16) -> Option<Uuid> {
    GATT_TABLE
        .iter()
        .find(|(h, _)| *h == handle)
        .map(|(_, u)| *u)
}

/// Value handle of the characteristic identified by `uuid`.
pub fn value_handle(uuid: Uuid) -> Option<u16> {
    GATT_TABLE.iter().find(|(_, u)| *u == uuid).map(|(h, _)| *h)
}

/// If `handle` is a client characteristic configuration descriptor, return
/// the value handle it configures.  The descriptor always sits one handle
/// above its characteristic's value.
pub fn cccd_target(handle: u16) -> Option<u16> {
    match handle {
        IMU_CCCD_HANDLE | CLASSIFIER_CCCD_HANDLE | EMG_CCCD_HANDLE => Some(handle - 1),
        _ => None,
    }
}

// ── Record sizes ──────────────────────────────────────────────────────────────

/// Bytes in one motion notification (10 × i16).
pub const IMU_RECORD_LEN: usize = 20;

/// Bytes in one EMG notification (8 × u16 + 1 reserved byte).
pub const EMG_RECORD_LEN: usize = 17;

// ── Handshake ─────────────────────────────────────────────────────────────────

/// CCCD value enabling notifications.
pub const ENABLE_NOTIFICATIONS: [u8; 2] = [0x01, 0x00];
/// CCCD value enabling indications.
pub const ENABLE_INDICATIONS: [u8; 2] = [0x02, 0x00];

/// Set-mode command that has the armband stream everything it can: EMG,
/// motion data and classifier events.
pub const STREAM_ALL_COMMAND: [u8; 5] = [0x01, 0x01, 0x01, 0x03, 0x01];

/// One write of the post-connect handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeStep {
    /// Human-readable description, used in logs and errors.
    pub name: &'static str,
    pub handle: u16,
    pub payload: &'static [u8],
}

/// The writes issued, in order, right after a link is opened.
///
/// Every one must be acknowledged.  Peripherals that are not a Myo fail
/// here, which is what gets them blacklisted.
pub const HANDSHAKE: [HandshakeStep; 4] = [
    HandshakeStep {
        name: "enable classifier indications",
        handle: CLASSIFIER_CCCD_HANDLE,
        payload: &ENABLE_INDICATIONS,
    },
    HandshakeStep {
        name: "enable IMU notifications",
        handle: IMU_CCCD_HANDLE,
        payload: &ENABLE_NOTIFICATIONS,
    },
    HandshakeStep {
        name: "enable EMG notifications",
        handle: EMG_CCCD_HANDLE,
        payload: &ENABLE_NOTIFICATIONS,
    },
    HandshakeStep {
        name: "select full streaming mode",
        handle: COMMAND_HANDLE,
        payload: &STREAM_ALL_COMMAND,
    },
];

// ── Commands ──────────────────────────────────────────────────────────────────

/// Vibrate command opcode.
const COMMAND_VIBRATE: u8 = 0x03;

/// Duration of a haptic pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Vibration {
    None = 0x00,
    Short = 0x01,
    Medium = 0x02,
    Long = 0x03,
}

/// Encode a vibrate command for [`COMMAND_HANDLE`].
///
/// ```text
/// byte 0 : opcode (0x03)
/// byte 1 : payload length (1)
/// byte 2 : vibration length
/// ```
///
/// # Example
///
/// ```
/// # use myo_rs::protocol::{encode_vibrate, Vibration};
/// assert_eq!(encode_vibrate(Vibration::Medium), [0x03, 0x01, 0x02]);
/// ```
pub fn encode_vibrate(length: Vibration) -> [u8; 3] {
    [COMMAND_VIBRATE, 0x01, length as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_order_and_payloads() {
        let handles: Vec<u16> = HANDSHAKE.iter().map(|s| s.handle).collect();
        assert_eq!(handles, vec![0x24, 0x1d, 0x28, 0x19]);
        assert_eq!(HANDSHAKE[0].payload, &[0x02, 0x00]);
        assert_eq!(HANDSHAKE[1].payload, &[0x01, 0x00]);
        assert_eq!(HANDSHAKE[2].payload, &[0x01, 0x00]);
        assert_eq!(HANDSHAKE[3].payload, &[1, 1, 1, 3, 1]);
    }

    #[test]
    fn test_cccd_maps_to_data_handle() {
        assert_eq!(cccd_target(IMU_CCCD_HANDLE), Some(IMU_DATA_HANDLE));
        assert_eq!(cccd_target(EMG_CCCD_HANDLE), Some(EMG_DATA_HANDLE));
        assert_eq!(
            cccd_target(CLASSIFIER_CCCD_HANDLE),
            Some(CLASSIFIER_EVENT_HANDLE)
        );
        assert_eq!(cccd_target(COMMAND_HANDLE), None);
    }

    #[test]
    fn test_gatt_table_lookup() {
        assert_eq!(
            characteristic_uuid(EMG_DATA_HANDLE),
            Some(EMG_DATA_CHARACTERISTIC)
        );
        assert_eq!(value_handle(IMU_DATA_CHARACTERISTIC), Some(IMU_DATA_HANDLE));
        assert_eq!(characteristic_uuid(0x99), None);
        assert_eq!(value_handle(Uuid::nil()), None);
    }

    #[test]
    fn test_vibrate_payload() {
        assert_eq!(encode_vibrate(Vibration::Short), [0x03, 0x01, 0x01]);
        assert_eq!(encode_vibrate(Vibration::Long), [0x03, 0x01, 0x03]);
    }
}
