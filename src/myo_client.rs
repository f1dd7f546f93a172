//! btleplug implementation of the [`Radio`] / [`Link`] seam.
//!
//! The core addresses the armband by attribute handle while btleplug only
//! exposes characteristics by UUID, so this module translates in both
//! directions through the table in [`crate::protocol`]:
//!
//! * a write to a CCCD handle becomes `subscribe` on the characteristic it
//!   configures (the platform stack picks notify or indicate from the
//!   characteristic's properties);
//! * a write to the command handle becomes a plain characteristic write;
//! * incoming notifications are tagged with the value handle of their
//!   characteristic before being posted to the session.

use std::collections::HashMap;
use std::time::Duration;

use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::MyoConfig;
use crate::error::{DiscoveryError, LinkError};
use crate::protocol::{cccd_target, characteristic_uuid, value_handle};
use crate::transport::{Link, Radio};
use crate::types::{Advertisement, DeviceAddress, LinkEvent, Notification};

/// Capacity of a link's event channel.  btleplug keeps its own small buffer
/// behind this; a session that falls further behind loses notifications.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Hard bound on GATT service discovery after connecting.
const SERVICE_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(15);

// ── BtleRadio ─────────────────────────────────────────────────────────────────

/// The host's first Bluetooth adapter, driven through btleplug.
///
/// Peripherals seen by the latest [`Radio::scan`] are remembered by address
/// so [`Radio::open`] can reach them without rescanning.
pub struct BtleRadio {
    adapter: Option<Adapter>,
    seen: HashMap<DeviceAddress, Peripheral>,
    connect_timeout: Duration,
}

impl BtleRadio {
    pub fn new(config: &MyoConfig) -> Self {
        Self {
            adapter: None,
            seen: HashMap::new(),
            connect_timeout: config.connect_timeout,
        }
    }

    /// The adapter, initialised on first use.
    async fn adapter(&mut self) -> Result<Adapter, DiscoveryError> {
        if let Some(adapter) = &self.adapter {
            return Ok(adapter.clone());
        }
        let manager = Manager::new()
            .await
            .map_err(|e| DiscoveryError::Scan(e.to_string()))?;
        let adapter = manager
            .adapters()
            .await
            .map_err(|e| DiscoveryError::Scan(e.to_string()))?
            .into_iter()
            .next()
            .ok_or(DiscoveryError::AdapterNotFound)?;
        wait_powered_on(&adapter).await;
        self.adapter = Some(adapter.clone());
        Ok(adapter)
    }
}

/// On macOS, CBCentralManager starts in an "unknown" state and silently
/// ignores scan requests until it reports PoweredOn.
#[cfg(target_os = "macos")]
async fn wait_powered_on(adapter: &Adapter) {
    use btleplug::api::CentralState;

    let powered_on = async {
        loop {
            match adapter.adapter_state().await {
                Ok(CentralState::PoweredOn) => return true,
                Ok(state) => debug!("adapter state {state:?}, waiting for PoweredOn"),
                Err(e) => {
                    warn!("adapter_state: {e}");
                    return false;
                }
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };
    match tokio::time::timeout(Duration::from_secs(3), powered_on).await {
        Ok(true) => info!("adapter is PoweredOn"),
        Ok(false) => {}
        Err(_) => warn!("adapter not PoweredOn after 3 s, scanning anyway"),
    }
    // Scans issued right after the state change are still dropped.
    tokio::time::sleep(Duration::from_millis(300)).await;
}

#[cfg(not(target_os = "macos"))]
async fn wait_powered_on(_adapter: &Adapter) {}

impl Radio for BtleRadio {
    type Link = BtleLink;

    async fn scan(&mut self, duration: Duration) -> Result<Vec<Advertisement>, DiscoveryError> {
        let adapter = self.adapter().await?;
        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| DiscoveryError::Scan(e.to_string()))?;
        tokio::time::sleep(duration).await;
        adapter.stop_scan().await.ok();

        let peripherals = adapter
            .peripherals()
            .await
            .map_err(|e| DiscoveryError::Scan(e.to_string()))?;

        // Random-address peripherals rotate; keep only the latest pass.
        self.seen.clear();
        let mut found = Vec::with_capacity(peripherals.len());
        for p in peripherals {
            let Ok(Some(props)) = p.properties().await else {
                continue;
            };
            let address = DeviceAddress::new(p.id().to_string());
            found.push(Advertisement {
                address: address.clone(),
                name: props.local_name,
                rssi: props.rssi,
            });
            self.seen.insert(address, p);
        }
        Ok(found)
    }

    async fn open(
        &mut self,
        address: &DeviceAddress,
    ) -> Result<(BtleLink, mpsc::Receiver<LinkEvent>), LinkError> {
        let peripheral = self
            .seen
            .get(address)
            .cloned()
            .ok_or_else(|| LinkError::UnknownDevice(address.clone()))?;
        let adapter = self
            .adapter()
            .await
            .map_err(|e| LinkError::Connect(e.to_string()))?;

        // BlueZ's Device1.Connect can block forever when the device is out of
        // range or the stack is wedged.
        tokio::time::timeout(self.connect_timeout, peripheral.connect())
            .await
            .map_err(|_| LinkError::ConnectTimeout(self.connect_timeout))?
            .map_err(|e| LinkError::Connect(e.to_string()))?;

        // From here on the link exists; dropping `link` on an early return
        // disconnects it.
        let mut link = BtleLink {
            peripheral: peripheral.clone(),
            tasks: Vec::new(),
            closed: false,
        };

        // BlueZ signals connection completion before its GATT cache is
        // populated; discovering too early returns an empty service set.
        #[cfg(target_os = "linux")]
        tokio::time::sleep(Duration::from_millis(600)).await;

        tokio::time::timeout(SERVICE_DISCOVERY_TIMEOUT, peripheral.discover_services())
            .await
            .map_err(|_| {
                LinkError::ServiceDiscovery(format!(
                    "timed out after {} s",
                    SERVICE_DISCOVERY_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| LinkError::ServiceDiscovery(e.to_string()))?;
        info!("Connected and services discovered: {address}");

        let (tx, rx) = mpsc::channel::<LinkEvent>(EVENT_CHANNEL_CAPACITY);

        // ── Disconnect watcher ────────────────────────────────────────────────
        // DeviceDisconnected on the adapter usually fires well before the
        // notification stream notices the link is gone.
        let disconnect_tx = tx.clone();
        let peripheral_id = peripheral.id();
        let watched = address.clone();
        link.tasks.push(tokio::spawn(async move {
            let mut events = match adapter.events().await {
                Ok(events) => events,
                Err(e) => {
                    warn!("{watched}: no adapter events, relying on the notification stream: {e}");
                    return;
                }
            };
            while let Some(event) = events.next().await {
                if matches!(&event, CentralEvent::DeviceDisconnected(id) if *id == peripheral_id) {
                    info!("{watched}: adapter reported disconnect");
                    let _ = disconnect_tx.send(LinkEvent::Disconnected).await;
                    return;
                }
            }
        }));

        // ── Notification pump ─────────────────────────────────────────────────
        let source = address.clone();
        link.tasks.push(tokio::spawn(async move {
            let mut notifications = match peripheral.notifications().await {
                Ok(n) => n,
                Err(e) => {
                    warn!("{source}: could not get notifications stream: {e}");
                    let _ = tx.send(LinkEvent::Disconnected).await;
                    return;
                }
            };
            while let Some(notif) = notifications.next().await {
                let Some(handle) = value_handle(notif.uuid) else {
                    debug!("{source}: notification from unmapped characteristic {}", notif.uuid);
                    continue;
                };
                let event = LinkEvent::Notification(Notification::new(handle, notif.value));
                if tx.send(event).await.is_err() {
                    // Session dropped its receiver.
                    return;
                }
            }
            info!("{source}: notification stream ended – device disconnected.");
            let _ = tx.send(LinkEvent::Disconnected).await;
        }));

        Ok((link, rx))
    }
}

// ── BtleLink ──────────────────────────────────────────────────────────────────

/// A connected btleplug peripheral.
///
/// Disconnects when dropped unless [`Link::close`] already did.
pub struct BtleLink {
    peripheral: Peripheral,
    /// Disconnect watcher and notification pump.
    tasks: Vec<JoinHandle<()>>,
    closed: bool,
}

impl BtleLink {
    fn characteristic(&self, handle: u16) -> Result<Characteristic, LinkError> {
        let uuid = characteristic_uuid(handle).ok_or(LinkError::UnknownHandle(handle))?;
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(LinkError::MissingCharacteristic(uuid))
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Link for BtleLink {
    async fn write(&self, handle: u16, value: &[u8], with_response: bool) -> Result<(), LinkError> {
        let write_err = |e: btleplug::Error| LinkError::Write {
            handle,
            reason: e.to_string(),
        };

        if let Some(target) = cccd_target(handle) {
            let characteristic = self.characteristic(target)?;
            return self
                .peripheral
                .subscribe(&characteristic)
                .await
                .map_err(write_err);
        }

        let characteristic = self.characteristic(handle)?;
        let write_type = if with_response {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };
        self.peripheral
            .write(&characteristic, value, write_type)
            .await
            .map_err(write_err)
    }

    async fn close(&mut self) -> Result<(), LinkError> {
        self.abort_tasks();
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.peripheral
            .disconnect()
            .await
            .map_err(|e| LinkError::Connect(e.to_string()))
    }
}

impl Drop for BtleLink {
    fn drop(&mut self) {
        self.abort_tasks();
        if self.closed {
            return;
        }
        // Drop cannot await; hand the disconnect to the runtime if one is
        // still around.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let peripheral = self.peripheral.clone();
            runtime.spawn(async move {
                if let Err(e) = peripheral.disconnect().await {
                    debug!("disconnect on drop: {e}");
                }
            });
        }
    }
}
