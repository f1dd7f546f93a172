//! Handle-based decoding and fan-out of notifications.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::error::DecodeError;
use crate::handlers::{EventKind, HandlerTable};
use crate::parse::{decode_emg, decode_imu};
use crate::protocol::{EMG_DATA_HANDLE, IMU_DATA_HANDLE};
use crate::sink::SampleSink;
use crate::types::{DeviceAddress, MyoEvent, SampleKind};

// ── Timestamp helper ──────────────────────────────────────────────────────────

/// Seconds since the Unix epoch.
fn capture_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Number of notifications routed per kind since the router was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterCounts {
    pub imu: u64,
    pub emg: u64,
    pub ignored: u64,
    pub malformed: u64,
}

impl RouterCounts {
    fn total(&self) -> u64 {
        self.imu + self.emg + self.ignored + self.malformed
    }
}

/// Decodes notifications by characteristic handle and fans the result out to
/// the handler table and the persistence sink.
///
/// Runs synchronously inside [`crate::session::LinkSession::wait_for_event`];
/// handlers therefore sit on the radio's critical path and must return
/// quickly.
pub struct NotificationRouter {
    handlers: HandlerTable,
    sink: Box<dyn SampleSink + Send>,
    /// Log every routed notification at `debug` level.
    trace: bool,
    counts: RouterCounts,
}

impl NotificationRouter {
    pub fn new(handlers: HandlerTable, sink: impl SampleSink + Send + 'static) -> Self {
        Self {
            handlers,
            sink: Box::new(sink),
            trace: false,
            counts: RouterCounts::default(),
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn counts(&self) -> RouterCounts {
        self.counts
    }

    /// Route one notification.
    ///
    /// * `0x1c` (motion) → [`decode_imu`] → `imu_data` handler if bound.
    /// * `0x27` (EMG) → [`decode_emg`] → `emg_data` handler if bound, and
    ///   always one [`SampleSink::append_sample`] call.
    /// * anything else → ignored, `Ok(None)`.
    ///
    /// Returns the kind of event the payload decoded to.  A payload of the
    /// wrong length yields a [`DecodeError`] and reaches neither handlers nor
    /// sink.
    pub fn on_notification(
        &mut self,
        source: &DeviceAddress,
        handle: u16,
        payload: &[u8],
    ) -> Result<Option<EventKind>, DecodeError> {
        let routed = match handle {
            IMU_DATA_HANDLE => self.route_imu(source, payload).map(Some),
            EMG_DATA_HANDLE => self.route_emg(source, payload).map(Some),
            _ => {
                self.counts.ignored += 1;
                debug!("Unknown notification from handle 0x{handle:02x}");
                Ok(None)
            }
        };
        if routed.is_err() {
            self.counts.malformed += 1;
        }

        let n = self.counts.total();
        if n <= 5 || n % 500 == 0 {
            info!(
                "router: notif #{n} handle=0x{handle:02x} len={} (imu={} emg={} ignored={} malformed={})",
                payload.len(),
                self.counts.imu,
                self.counts.emg,
                self.counts.ignored,
                self.counts.malformed,
            );
        }
        routed
    }

    fn route_imu(&mut self, source: &DeviceAddress, payload: &[u8]) -> Result<EventKind, DecodeError> {
        let sample = decode_imu(payload)?;
        self.counts.imu += 1;
        if self.trace {
            debug!("got imu notification: {sample:?}");
        }
        self.handlers
            .dispatch(EventKind::ImuData, source, &MyoEvent::from(sample));
        Ok(EventKind::ImuData)
    }

    fn route_emg(&mut self, source: &DeviceAddress, payload: &[u8]) -> Result<EventKind, DecodeError> {
        let sample = decode_emg(payload)?;
        self.counts.emg += 1;
        if self.trace {
            debug!("got emg notification: {sample:?}");
        }
        self.handlers
            .dispatch(EventKind::EmgData, source, &MyoEvent::from(sample));
        self.sink
            .append_sample(SampleKind::Emg, &sample.channels, capture_timestamp());
        Ok(EventKind::EmgData)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::sink::LogSink;

    type Rows = Arc<Mutex<Vec<(SampleKind, Vec<u16>)>>>;

    fn recording_router(handlers: HandlerTable) -> (NotificationRouter, Rows) {
        let rows: Rows = Arc::new(Mutex::new(Vec::new()));
        let sink_rows = Arc::clone(&rows);
        let router = NotificationRouter::new(handlers, move |kind: SampleKind, values: &[u16], _ts: f64| {
            sink_rows.lock().unwrap().push((kind, values.to_vec()));
        });
        (router, rows)
    }

    fn emg_payload(channels: [u16; 8], reserved: u8) -> Vec<u8> {
        let mut data: Vec<u8> = channels.iter().flat_map(|c| c.to_le_bytes()).collect();
        data.push(reserved);
        data
    }

    #[test]
    fn test_imu_reaches_bound_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = Arc::clone(&seen);
        let mut handlers = HandlerTable::new();
        handlers.on_imu(move |_, q, a, g| seen_in.lock().unwrap().push((q, a, g)));
        let (mut router, rows) = recording_router(handlers);

        let payload: Vec<u8> = [0i16, 0, 0, 16384, 100, 0, 0, 0, 0, 0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let kind = router
            .on_notification(&"A".into(), IMU_DATA_HANDLE, &payload)
            .unwrap();

        assert_eq!(kind, Some(EventKind::ImuData));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![([0, 0, 0, 16384], [100, 0, 0], [0, 0, 0])]
        );
        // Motion data is not persisted.
        assert!(rows.lock().unwrap().is_empty());
    }

    #[test]
    fn test_emg_persisted_without_handler() {
        let (mut router, rows) = recording_router(HandlerTable::new());
        let payload = emg_payload([1, 2, 3, 4, 5, 6, 7, 8], 0xEE);

        router
            .on_notification(&"A".into(), EMG_DATA_HANDLE, &payload)
            .unwrap();
        router
            .on_notification(&"A".into(), EMG_DATA_HANDLE, &payload)
            .unwrap();

        let rows = rows.lock().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (SampleKind::Emg, vec![1, 2, 3, 4, 5, 6, 7, 8]));
    }

    #[test]
    fn test_emg_handler_and_sink_each_called_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls_in = Arc::clone(&calls);
        let mut handlers = HandlerTable::new();
        handlers.on_emg(move |source, ch| calls_in.lock().unwrap().push((source.clone(), ch)));
        let (mut router, rows) = recording_router(handlers);

        router
            .on_notification(&"B".into(), EMG_DATA_HANDLE, &emg_payload([9; 8], 0))
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![(DeviceAddress::from("B"), [9u16; 8])]);
        assert_eq!(rows.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_payload_dispatches_nothing() {
        let hits = Arc::new(Mutex::new(0));
        let hits_in = Arc::clone(&hits);
        let mut handlers = HandlerTable::new();
        handlers.on_emg(move |_, _| *hits_in.lock().unwrap() += 1);
        let (mut router, rows) = recording_router(handlers);

        let err = router
            .on_notification(&"A".into(), EMG_DATA_HANDLE, &[0u8; 16])
            .unwrap_err();

        assert_eq!(err.actual, 16);
        assert_eq!(*hits.lock().unwrap(), 0);
        assert!(rows.lock().unwrap().is_empty());
        assert_eq!(router.counts().malformed, 1);
    }

    #[test]
    fn test_unknown_handle_ignored() {
        let mut router = NotificationRouter::new(HandlerTable::new(), LogSink);
        let kind = router
            .on_notification(&"A".into(), 0x23, &[0x01, 0x02, 0x03])
            .unwrap();
        assert_eq!(kind, None);
        assert_eq!(
            router.counts(),
            RouterCounts {
                ignored: 1,
                ..Default::default()
            }
        );
    }
}
