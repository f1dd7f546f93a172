//! Binary decoders for Myo BLE notification payloads.
//!
//! Both functions are pure and allocation-free, and are safe to call from any
//! async or sync context.
//!
//! | Function | Handle | Format |
//! |---|---|---|
//! | [`decode_imu`] | `0x1c` | 10 × i16 LE: quaternion[4], accel[3], gyro[3] |
//! | [`decode_emg`] | `0x27` | 8 × u16 LE channels + 1 reserved byte |
//!
//! A payload whose length differs from the record size is rejected with a
//! [`DecodeError`]; nothing is truncated or padded.

use crate::error::{DecodeError, RecordKind};
use crate::protocol::{EMG_RECORD_LEN, IMU_RECORD_LEN};
use crate::types::{EmgSample, ImuSample};

fn exact<const N: usize>(data: &[u8], record: RecordKind) -> Result<&[u8; N], DecodeError> {
    data.try_into().map_err(|_| DecodeError {
        record,
        expected: N,
        actual: data.len(),
    })
}

fn read_i16_le(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

// ── IMU ───────────────────────────────────────────────────────────────────────

/// Decode a motion notification into an [`ImuSample`].
///
/// | Bytes | Field |
/// |---|---|
/// | 0–7   | quaternion w, x, y, z |
/// | 8–13  | accelerometer x, y, z |
/// | 14–19 | gyroscope x, y, z |
///
/// # Example
///
/// ```
/// # use myo_rs::parse::decode_imu;
/// let mut data = [0u8; 20];
/// data[6..8].copy_from_slice(&16384i16.to_le_bytes());
/// let s = decode_imu(&data).unwrap();
/// assert_eq!(s.quaternion, [0, 0, 0, 16384]);
/// ```
pub fn decode_imu(data: &[u8]) -> Result<ImuSample, DecodeError> {
    let data = exact::<IMU_RECORD_LEN>(data, RecordKind::Imu)?;
    let v = |i: usize| read_i16_le(data, i * 2);
    Ok(ImuSample {
        quaternion: [v(0), v(1), v(2), v(3)],
        acceleration: [v(4), v(5), v(6)],
        gyroscope: [v(7), v(8), v(9)],
    })
}

// ── EMG ───────────────────────────────────────────────────────────────────────

/// Decode an EMG telemetry notification into an [`EmgSample`].
///
/// Bytes 0–15 hold eight little-endian `u16` channel readings in pod order;
/// byte 16 is kept as [`EmgSample::reserved`].
pub fn decode_emg(data: &[u8]) -> Result<EmgSample, DecodeError> {
    let data = exact::<EMG_RECORD_LEN>(data, RecordKind::Emg)?;
    let mut channels = [0u16; 8];
    for (i, ch) in channels.iter_mut().enumerate() {
        *ch = read_u16_le(data, i * 2);
    }
    Ok(EmgSample {
        channels,
        reserved: data[16],
    })
}
