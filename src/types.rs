use std::fmt;

/// Platform BLE identifier of a peripheral.
///
/// * Linux: a Bluetooth MAC address (`AA:BB:CC:DD:EE:FF`)
/// * macOS / Windows: a UUID string
///
/// Immutable once discovered; used as the key for connecting and for the
/// supervisor's blacklist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceAddress {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DeviceAddress {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One advertisement record seen during a discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub address: DeviceAddress,
    /// Advertised local name (`"Myo"` for the armband).  Peripherals that do
    /// not advertise a name report `None`.
    pub name: Option<String>,
    /// Signal strength in dBm, when the platform reports it.
    pub rssi: Option<i16>,
}

impl Advertisement {
    pub fn new(address: impl Into<DeviceAddress>, name: Option<&str>) -> Self {
        Self {
            address: address.into(),
            name: name.map(str::to_owned),
            rssi: None,
        }
    }
}

/// A decoded motion record from the IMU characteristic.
///
/// Raw sensor units as sent by the armband; no scaling is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImuSample {
    /// Orientation quaternion `(w, x, y, z)`.
    pub quaternion: [i16; 4],
    /// Accelerometer `(x, y, z)`.
    pub acceleration: [i16; 3],
    /// Gyroscope `(x, y, z)`.
    pub gyroscope: [i16; 3],
}

impl ImuSample {
    /// All ten fields in wire order.
    pub fn components(&self) -> [i16; 10] {
        let mut out = [0i16; 10];
        out[..4].copy_from_slice(&self.quaternion);
        out[4..7].copy_from_slice(&self.acceleration);
        out[7..].copy_from_slice(&self.gyroscope);
        out
    }
}

/// A decoded telemetry record from the EMG characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmgSample {
    /// One reading per electrode pod, in pod order.
    pub channels: [u16; 8],
    /// Trailing byte present on the wire.  Its meaning is undocumented, so it
    /// is carried along but never interpreted or forwarded.
    pub reserved: u8,
}

/// A raw GATT notification as delivered by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Value handle of the characteristic that sent the notification.
    pub handle: u16,
    pub value: Vec<u8>,
}

impl Notification {
    pub fn new(handle: u16, value: impl Into<Vec<u8>>) -> Self {
        Self {
            handle,
            value: value.into(),
        }
    }
}

/// Everything a transport can post into a session's event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Notification(Notification),
    /// The BLE link was lost (armband asleep, out of range, etc.).
    ///
    /// The transport closes the channel after this; no further events follow.
    Disconnected,
}

/// A decoded event handed to the callbacks in a
/// [`crate::handlers::HandlerTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MyoEvent {
    /// Motion data, split into its three sub-vectors.
    Imu {
        quaternion: [i16; 4],
        acceleration: [i16; 3],
        gyroscope: [i16; 3],
    },
    /// The eight EMG channel readings.  The reserved trailing byte is not
    /// part of the event.
    Emg { channels: [u16; 8] },
}

impl From<ImuSample> for MyoEvent {
    fn from(s: ImuSample) -> Self {
        MyoEvent::Imu {
            quaternion: s.quaternion,
            acceleration: s.acceleration,
            gyroscope: s.gyroscope,
        }
    }
}

impl From<EmgSample> for MyoEvent {
    fn from(s: EmgSample) -> Self {
        MyoEvent::Emg {
            channels: s.channels,
        }
    }
}

/// Kind of sample handed to a [`crate::sink::SampleSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SampleKind {
    Emg,
}

impl SampleKind {
    pub fn name(self) -> &'static str {
        match self {
            SampleKind::Emg => "emg",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
