//! Caller-supplied event callbacks.
//!
//! [`EventKind`] is a closed enumeration of every event name the armband can
//! produce.  [`HandlerTable`] holds at most one callback per kind; a kind with
//! no callback is simply skipped when dispatched.
//!
//! Only [`EventKind::ImuData`] and [`EventKind::EmgData`] are dispatched
//! today.  The remaining kinds can be bound without error so handler tables
//! written for the classifier and orientation streams keep working.

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::error::UnknownEventKind;
use crate::types::{DeviceAddress, MyoEvent};

/// Event callback: the source device and the decoded event.
pub type Handler = Box<dyn FnMut(&DeviceAddress, &MyoEvent) + Send>;

const KIND_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Rest,
    Fist,
    WaveIn,
    WaveOut,
    WaveLeft,
    WaveRight,
    FingersSpread,
    DoubleTap,
    Unknown,
    ArmSynced,
    ArmUnsynced,
    OrientationData,
    GyroscopeData,
    AccelerometerData,
    ImuData,
    EmgData,
}

impl EventKind {
    pub const ALL: [EventKind; KIND_COUNT] = [
        EventKind::Rest,
        EventKind::Fist,
        EventKind::WaveIn,
        EventKind::WaveOut,
        EventKind::WaveLeft,
        EventKind::WaveRight,
        EventKind::FingersSpread,
        EventKind::DoubleTap,
        EventKind::Unknown,
        EventKind::ArmSynced,
        EventKind::ArmUnsynced,
        EventKind::OrientationData,
        EventKind::GyroscopeData,
        EventKind::AccelerometerData,
        EventKind::ImuData,
        EventKind::EmgData,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventKind::Rest => "rest",
            EventKind::Fist => "fist",
            EventKind::WaveIn => "wave_in",
            EventKind::WaveOut => "wave_out",
            EventKind::WaveLeft => "wave_left",
            EventKind::WaveRight => "wave_right",
            EventKind::FingersSpread => "fingers_spread",
            EventKind::DoubleTap => "double_tap",
            EventKind::Unknown => "unknown",
            EventKind::ArmSynced => "arm_synced",
            EventKind::ArmUnsynced => "arm_unsynced",
            EventKind::OrientationData => "orientation_data",
            EventKind::GyroscopeData => "gyroscope_data",
            EventKind::AccelerometerData => "accelerometer_data",
            EventKind::ImuData => "imu_data",
            EventKind::EmgData => "emg_data",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownEventKind(s.to_owned()))
    }
}

/// One optional callback per [`EventKind`].
pub struct HandlerTable {
    slots: [Option<Handler>; KIND_COUNT],
}

impl HandlerTable {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Bind `handler` to `kind`, replacing any previous binding.
    pub fn bind<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: FnMut(&DeviceAddress, &MyoEvent) + Send + 'static,
    {
        self.slots[kind.index()] = Some(Box::new(handler));
        self
    }

    /// Bind by event name.  Names outside the enumeration are ignored and
    /// `false` is returned.
    pub fn bind_named<F>(&mut self, name: &str, handler: F) -> bool
    where
        F: FnMut(&DeviceAddress, &MyoEvent) + Send + 'static,
    {
        match name.parse::<EventKind>() {
            Ok(kind) => {
                self.bind(kind, handler);
                true
            }
            Err(e) => {
                debug!("handlers: {e}, binding ignored");
                false
            }
        }
    }

    /// Bind an `imu_data` callback receiving quaternion, acceleration and
    /// gyroscope.
    pub fn on_imu<F>(&mut self, mut handler: F) -> &mut Self
    where
        F: FnMut(&DeviceAddress, [i16; 4], [i16; 3], [i16; 3]) + Send + 'static,
    {
        self.bind(EventKind::ImuData, move |source, event| {
            if let MyoEvent::Imu {
                quaternion,
                acceleration,
                gyroscope,
            } = *event
            {
                handler(source, quaternion, acceleration, gyroscope);
            }
        })
    }

    /// Bind an `emg_data` callback receiving the eight channel readings.
    pub fn on_emg<F>(&mut self, mut handler: F) -> &mut Self
    where
        F: FnMut(&DeviceAddress, [u16; 8]) + Send + 'static,
    {
        self.bind(EventKind::EmgData, move |source, event| {
            if let MyoEvent::Emg { channels } = *event {
                handler(source, channels);
            }
        })
    }

    pub fn is_bound(&self, kind: EventKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    pub fn unbind(&mut self, kind: EventKind) {
        self.slots[kind.index()] = None;
    }

    /// Invoke the callback bound to `kind`, if any.  Returns whether one ran.
    pub fn dispatch(&mut self, kind: EventKind, source: &DeviceAddress, event: &MyoEvent) -> bool {
        match &mut self.slots[kind.index()] {
            Some(handler) => {
                handler(source, event);
                true
            }
            None => false,
        }
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound: Vec<&str> = EventKind::ALL
            .into_iter()
            .filter(|k| self.is_bound(*k))
            .map(EventKind::name)
            .collect();
        f.debug_struct("HandlerTable").field("bound", &bound).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_event_kind_names_parse_back() {
        for kind in EventKind::ALL {
            assert_eq!(kind.name().parse::<EventKind>(), Ok(kind));
        }
        assert_eq!("wave_in".parse::<EventKind>(), Ok(EventKind::WaveIn));
        assert_eq!(
            "pinch".parse::<EventKind>(),
            Err(UnknownEventKind("pinch".into()))
        );
    }

    #[test]
    fn test_dispatch_without_binding_is_noop() {
        let mut table = HandlerTable::new();
        let event = MyoEvent::Emg { channels: [0; 8] };
        assert!(!table.dispatch(EventKind::EmgData, &"A".into(), &event));
    }

    #[test]
    fn test_reserved_kinds_bind_without_error() {
        let mut table = HandlerTable::new();
        for name in ["rest", "fist", "double_tap", "arm_synced", "orientation_data"] {
            assert!(table.bind_named(name, |_, _| {}));
        }
        assert!(table.is_bound(EventKind::Fist));
        assert!(!table.is_bound(EventKind::EmgData));
    }

    #[test]
    fn test_unknown_name_is_ignored() {
        let mut table = HandlerTable::new();
        assert!(!table.bind_named("pinch", |_, _| {}));
        assert!(EventKind::ALL.into_iter().all(|k| !table.is_bound(k)));
    }

    #[test]
    fn test_on_imu_splits_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut table = HandlerTable::new();
        table.on_imu(move |source, q, a, g| {
            sink.lock().unwrap().push((source.clone(), q, a, g));
        });

        let event = MyoEvent::Imu {
            quaternion: [1, 2, 3, 4],
            acceleration: [5, 6, 7],
            gyroscope: [8, 9, 10],
        };
        assert!(table.dispatch(EventKind::ImuData, &"A".into(), &event));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(DeviceAddress::from("A"), [1, 2, 3, 4], [5, 6, 7], [8, 9, 10])]
        );
    }

    #[test]
    fn test_unbind() {
        let mut table = HandlerTable::new();
        table.on_emg(|_, _| {});
        assert!(table.is_bound(EventKind::EmgData));
        table.unbind(EventKind::EmgData);
        assert!(!table.is_bound(EventKind::EmgData));
    }
}
