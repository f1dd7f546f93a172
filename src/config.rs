use std::time::Duration;

use crate::protocol::{Vibration, MYO_DEVICE_NAME};

/// Configuration for [`crate::supervisor::Supervisor`] and
/// [`crate::myo_client::BtleRadio`].
#[derive(Debug, Clone)]
pub struct MyoConfig {
    /// Connect only to devices advertising exactly this name.  Default: `"Myo"`.
    pub target_name: String,
    /// Length of one BLE discovery pass.  Default: 3 s.
    pub scan_duration: Duration,
    /// How long one `wait_for_event` blocks for a notification.  Default: 3 s.
    ///
    /// Expiry is the normal idle case, not an error.
    pub event_timeout: Duration,
    /// Pause after a candidate fails the handshake, and after a failed scan.
    /// Default: 500 ms.
    pub retry_backoff: Duration,
    /// Hard bound on the BLE connect call.  Default: 10 s.
    pub connect_timeout: Duration,
    /// Pulse the armband once when a session starts, so the wearer knows it
    /// is streaming.  Default: `None`.
    pub vibrate_on_connect: Option<Vibration>,
    /// Log every routed notification at `debug` level.  Default: `false`.
    pub trace_notifications: bool,
}

impl Default for MyoConfig {
    fn default() -> Self {
        Self {
            target_name: MYO_DEVICE_NAME.into(),
            scan_duration: Duration::from_secs(3),
            event_timeout: Duration::from_secs(3),
            retry_backoff: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(10),
            vibrate_on_connect: None,
            trace_notifications: false,
        }
    }
}
