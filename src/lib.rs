//! # myo-rs
//!
//! Async Rust client for the [Thalmic Myo](https://en.wikipedia.org/wiki/Thalmic_Labs)
//! EMG armband over Bluetooth Low Energy.
//!
//! The crate finds a Myo, subscribes to its motion and muscle-activity
//! streams, decodes each notification and hands the samples to
//! application callbacks and a persistence sink.  A supervisor keeps the
//! link alive across disconnects and blacklists peripherals that turn out not
//! to be Myos.
//!
//! ## Streams
//!
//! | Handle | Stream | Record | Delivered to |
//! |---|---|---|---|
//! | `0x1c` | IMU (quaternion, accel, gyro) | 20 bytes, 10 × `i16` LE | `imu_data` handler |
//! | `0x27` | EMG (8 channels) | 17 bytes, 8 × `u16` LE + 1 reserved | `emg_data` handler and [`sink::SampleSink`] |
//! | `0x23` | classifier events | subscribed, not decoded | nothing |
//!
//! ## Quick start
//!
//! ```no_run
//! use myo_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MyoConfig::default();
//!
//!     let mut handlers = HandlerTable::new();
//!     handlers.on_emg(|source, channels| println!("{source}: {channels:?}"));
//!
//!     let router = NotificationRouter::new(handlers, LogSink);
//!     let mut supervisor = Supervisor::new(BtleRadio::new(&config), config, router);
//!     supervisor
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`prelude`] | One-line glob import of the most commonly needed types |
//! | [`supervisor`] | Discover → connect → stream → reconnect state machine |
//! | [`session`] | One subscribed link: handshake, vibrate, wait for events |
//! | [`router`] | Handle-based decode and fan-out to handlers and sink |
//! | [`scanner`] | One discovery pass and name filtering |
//! | [`myo_client`] | btleplug-backed [`transport::Radio`] / [`transport::Link`] |
//! | [`transport`] | The radio traits the core is written against |
//! | [`handlers`] | Event kinds and the callback table |
//! | [`sink`] | Persistence handoff |
//! | [`protocol`] | GATT handles, UUIDs and command encodings |
//! | [`parse`] | Byte-to-sample decoders for IMU and EMG records |
//! | [`types`] | Addresses, samples and events |
//! | [`error`] | Error types |
//! | [`config`] | [`config::MyoConfig`] |

pub mod config;
pub mod error;
pub mod handlers;
pub mod myo_client;
pub mod parse;
pub mod protocol;
pub mod router;
pub mod scanner;
pub mod session;
pub mod sink;
pub mod supervisor;
pub mod transport;
pub mod types;

// ── Prelude ───────────────────────────────────────────────────────────────────

/// Convenience re-exports for downstream crates.
///
/// A single glob import covers what is needed to bind handlers and run the
/// supervisor against a real adapter:
///
/// ```no_run
/// use myo_rs::prelude::*;
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = MyoConfig {
///     vibrate_on_connect: Some(Vibration::Short),
///     ..MyoConfig::default()
/// };
/// let mut handlers = HandlerTable::new();
/// handlers.on_imu(|_, quaternion, _, _| println!("{quaternion:?}"));
///
/// let router = NotificationRouter::new(handlers, LogSink);
/// Supervisor::new(BtleRadio::new(&config), config, router)
///     .run(std::future::pending())
///     .await;
/// # }
/// ```
pub mod prelude {
    // ── Control loop ──────────────────────────────────────────────────────────
    pub use crate::config::MyoConfig;
    pub use crate::myo_client::{BtleLink, BtleRadio};
    pub use crate::session::LinkSession;
    pub use crate::supervisor::{Supervisor, SupervisorState};

    // ── Routing ───────────────────────────────────────────────────────────────
    pub use crate::handlers::{EventKind, HandlerTable};
    pub use crate::router::NotificationRouter;
    pub use crate::sink::{LogSink, SampleSink};

    // ── Data types ────────────────────────────────────────────────────────────
    pub use crate::error::{DecodeError, DiscoveryError, LinkError};
    pub use crate::types::{DeviceAddress, EmgSample, ImuSample, MyoEvent, SampleKind};

    // ── Protocol ──────────────────────────────────────────────────────────────
    pub use crate::protocol::Vibration;
}
