//! In-memory radio shared by the integration tests.
//!
//! Scan results are scripted per call; each address can be told to refuse
//! connections, or to fail or stall writes to a given handle.  Every open,
//! write, close and drop is recorded so tests can assert on what the core did
//! to the radio.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use myo_rs::error::{DiscoveryError, LinkError};
use myo_rs::transport::{Link, Radio};
use myo_rs::types::{Advertisement, DeviceAddress, LinkEvent, Notification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub address: DeviceAddress,
    pub handle: u16,
    pub value: Vec<u8>,
    pub with_response: bool,
}

#[derive(Default)]
struct MockState {
    scans: VecDeque<Result<Vec<Advertisement>, DiscoveryError>>,
    scan_calls: usize,
    refuse: HashSet<DeviceAddress>,
    failing_writes: HashSet<(DeviceAddress, u16)>,
    hanging_writes: HashSet<(DeviceAddress, u16)>,
    opened: Vec<DeviceAddress>,
    writes: Vec<WriteRecord>,
    closed: Vec<DeviceAddress>,
    dropped: Vec<DeviceAddress>,
    senders: HashMap<DeviceAddress, mpsc::Sender<LinkEvent>>,
}

#[derive(Clone, Default)]
pub struct MockRadio {
    state: Arc<Mutex<MockState>>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next scan.  Once the queue is empty, scans
    /// return nothing.
    pub fn push_scan(&self, advertisements: Vec<Advertisement>) -> &Self {
        self.state.lock().unwrap().scans.push_back(Ok(advertisements));
        self
    }

    pub fn push_scan_error(&self, error: DiscoveryError) -> &Self {
        self.state.lock().unwrap().scans.push_back(Err(error));
        self
    }

    pub fn refuse_connect(&self, address: &str) -> &Self {
        self.state.lock().unwrap().refuse.insert(address.into());
        self
    }

    pub fn accept_connect(&self, address: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .refuse
            .remove(&DeviceAddress::from(address));
        self
    }

    /// Make every later write from `address` to `handle` fail.
    pub fn fail_write(&self, address: &str, handle: u16) -> &Self {
        self.state
            .lock()
            .unwrap()
            .failing_writes
            .insert((address.into(), handle));
        self
    }

    /// Make every later write from `address` to `handle` wait forever.
    pub fn hang_write(&self, address: &str, handle: u16) -> &Self {
        self.state
            .lock()
            .unwrap()
            .hanging_writes
            .insert((address.into(), handle));
        self
    }

    /// Post a notification on the open link to `address`.
    pub fn notify(&self, address: &str, handle: u16, value: &[u8]) {
        self.post(address, LinkEvent::Notification(Notification::new(handle, value)));
    }

    /// Post a disconnect on the open link to `address`.
    pub fn disconnect(&self, address: &str) {
        self.post(address, LinkEvent::Disconnected);
    }

    /// Drop the transport side of the link without a disconnect event.
    pub fn drop_link(&self, address: &str) {
        self.state
            .lock()
            .unwrap()
            .senders
            .remove(&DeviceAddress::from(address));
    }

    fn post(&self, address: &str, event: LinkEvent) {
        let sender = self
            .state
            .lock()
            .unwrap()
            .senders
            .get(&DeviceAddress::from(address))
            .cloned()
            .expect("no open link to address");
        sender.try_send(event).expect("link event channel full");
    }

    pub fn scan_calls(&self) -> usize {
        self.state.lock().unwrap().scan_calls
    }

    pub fn opened(&self) -> Vec<DeviceAddress> {
        self.state.lock().unwrap().opened.clone()
    }

    pub fn open_count(&self, address: &str) -> usize {
        let address = DeviceAddress::from(address);
        self.state
            .lock()
            .unwrap()
            .opened
            .iter()
            .filter(|a| **a == address)
            .count()
    }

    /// `(handle, value, with_response)` for every write attempted on links to
    /// `address`, in order.
    pub fn writes_to(&self, address: &str) -> Vec<(u16, Vec<u8>, bool)> {
        let address = DeviceAddress::from(address);
        self.state
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|w| w.address == address)
            .map(|w| (w.handle, w.value.clone(), w.with_response))
            .collect()
    }

    pub fn closed(&self) -> Vec<DeviceAddress> {
        self.state.lock().unwrap().closed.clone()
    }

    /// Links released by drop, whether or not they were closed first.
    pub fn dropped(&self) -> Vec<DeviceAddress> {
        self.state.lock().unwrap().dropped.clone()
    }
}

impl Radio for MockRadio {
    type Link = MockLink;

    async fn scan(&mut self, duration: Duration) -> Result<Vec<Advertisement>, DiscoveryError> {
        tokio::time::sleep(duration).await;
        let mut state = self.state.lock().unwrap();
        state.scan_calls += 1;
        state.scans.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn open(
        &mut self,
        address: &DeviceAddress,
    ) -> Result<(MockLink, mpsc::Receiver<LinkEvent>), LinkError> {
        let mut state = self.state.lock().unwrap();
        state.opened.push(address.clone());
        if state.refuse.contains(address) {
            return Err(LinkError::Connect("refused by mock".into()));
        }
        let (tx, rx) = mpsc::channel(64);
        state.senders.insert(address.clone(), tx);
        let link = MockLink {
            address: address.clone(),
            state: Arc::clone(&self.state),
        };
        Ok((link, rx))
    }
}

pub struct MockLink {
    address: DeviceAddress,
    state: Arc<Mutex<MockState>>,
}

impl Link for MockLink {
    async fn write(&self, handle: u16, value: &[u8], with_response: bool) -> Result<(), LinkError> {
        let key = (self.address.clone(), handle);
        let hang = {
            let mut state = self.state.lock().unwrap();
            state.writes.push(WriteRecord {
                address: self.address.clone(),
                handle,
                value: value.to_vec(),
                with_response,
            });
            if state.failing_writes.contains(&key) {
                return Err(LinkError::Write {
                    handle,
                    reason: "rejected by mock".into(),
                });
            }
            state.hanging_writes.contains(&key)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), LinkError> {
        let mut state = self.state.lock().unwrap();
        state.closed.push(self.address.clone());
        state.senders.remove(&self.address);
        Ok(())
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.dropped.push(self.address.clone());
            state.senders.remove(&self.address);
        }
    }
}

/// A 20-byte motion record with the given ten components.
pub fn imu_payload(components: [i16; 10]) -> Vec<u8> {
    components.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// A 17-byte EMG record: eight channels and the trailing reserved byte.
pub fn emg_payload(channels: [u16; 8], reserved: u8) -> Vec<u8> {
    let mut data: Vec<u8> = channels.iter().flat_map(|c| c.to_le_bytes()).collect();
    data.push(reserved);
    data
}
