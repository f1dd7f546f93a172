//! The radio seam the connection core is written against.
//!
//! [`crate::myo_client::BtleRadio`] implements it on top of btleplug; tests
//! substitute an in-memory radio.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{DiscoveryError, LinkError};
use crate::types::{Advertisement, DeviceAddress, LinkEvent};

/// A central-role BLE radio: discovers peripherals and opens links to them.
pub trait Radio {
    type Link: Link;

    /// Run discovery for `duration` and return every advertisement seen.
    fn scan(
        &mut self,
        duration: Duration,
    ) -> impl Future<Output = Result<Vec<Advertisement>, DiscoveryError>>;

    /// Open a BLE link to `address`.
    ///
    /// Returns the link together with the receiving end of its event
    /// channel.  The transport posts every notification into that channel
    /// and finishes with [`LinkEvent::Disconnected`] (or simply closes the
    /// channel) when the link drops.
    fn open(
        &mut self,
        address: &DeviceAddress,
    ) -> impl Future<Output = Result<(Self::Link, mpsc::Receiver<LinkEvent>), LinkError>>;
}

/// One open BLE link.
pub trait Link {
    /// Write `value` to the attribute at `handle`.
    fn write(
        &self,
        handle: u16,
        value: &[u8],
        with_response: bool,
    ) -> impl Future<Output = Result<(), LinkError>>;

    /// Tear the link down.
    fn close(&mut self) -> impl Future<Output = Result<(), LinkError>>;
}
