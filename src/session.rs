//! One open link to a Myo: the subscription handshake, the vibration
//! command and the wait for the next radio event.
//!
//! A session is single-use.  After the transport reports a disconnect every
//! call fails with [`LinkError::Disconnected`] without touching the radio.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::error::{HandshakeError, LinkError};
use crate::protocol::{encode_vibrate, Vibration, COMMAND_HANDLE, HANDSHAKE};
use crate::router::NotificationRouter;
use crate::transport::{Link, Radio};
use crate::types::{DeviceAddress, LinkEvent};

/// One open, subscribed link to a Myo.
///
/// Built by [`LinkSession::connect`] (or [`LinkSession::establish`] from an
/// already opened link).  Once [`LinkSession::wait_for_event`] reports a
/// disconnect the session is dead and refuses further use; drop it and
/// connect again.
pub struct LinkSession<L: Link> {
    address: DeviceAddress,
    link: L,
    events: mpsc::Receiver<LinkEvent>,
    alive: bool,
}

impl<L: Link> LinkSession<L> {
    /// Open a link to `address` and run the subscription handshake.
    ///
    /// Any failure here means the peripheral is not a usable Myo.
    pub async fn connect<R>(radio: &mut R, address: &DeviceAddress) -> Result<Self, LinkError>
    where
        R: Radio<Link = L>,
    {
        info!("Connecting to {address} …");
        let (link, events) = radio.open(address).await?;
        Self::establish(address.clone(), link, events).await
    }

    /// Run the subscription handshake on an opened link.
    ///
    /// Writes, in order and each with response: classifier indications on,
    /// IMU notifications on, EMG notifications on, full streaming mode.  If
    /// any write fails the link is closed and a [`HandshakeError`] returned.
    pub async fn establish(
        address: DeviceAddress,
        mut link: L,
        events: mpsc::Receiver<LinkEvent>,
    ) -> Result<Self, LinkError> {
        for step in &HANDSHAKE {
            debug!("{address}: {} (handle 0x{:02x})", step.name, step.handle);
            if let Err(e) = link.write(step.handle, step.payload, true).await {
                debug!("could not write to {address}, closing link");
                if let Err(close_err) = link.close().await {
                    debug!("{address}: close after failed handshake: {close_err}");
                }
                return Err(HandshakeError {
                    step: step.name,
                    handle: step.handle,
                    source: Box::new(e),
                }
                .into());
            }
        }
        info!("{address}: subscribed to classifier, IMU and EMG data");
        Ok(Self {
            address,
            link,
            events,
            alive: true,
        })
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// `false` once a disconnect has been observed.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Pulse the vibration motor.
    ///
    /// Fire-and-forget: a failure is returned for the caller to report but
    /// does not end the session.
    pub async fn vibrate(&self, length: Vibration) -> Result<(), LinkError> {
        if !self.alive {
            return Err(LinkError::Disconnected);
        }
        self.link
            .write(COMMAND_HANDLE, &encode_vibrate(length), true)
            .await
    }

    /// Wait up to `timeout` for one radio event.
    ///
    /// * notification → routed synchronously through `router`, `Ok(true)`
    /// * nothing within `timeout` → `Ok(false)`; this is the idle case
    /// * link lost → `Err(LinkError::Disconnected)`; the session is dead
    ///
    /// A notification that fails to decode is logged and dropped; it still
    /// counts as an event.
    pub async fn wait_for_event(
        &mut self,
        timeout: Duration,
        router: &mut NotificationRouter,
    ) -> Result<bool, LinkError> {
        if !self.alive {
            return Err(LinkError::Disconnected);
        }
        match tokio::time::timeout(timeout, self.events.recv()).await {
            Err(_elapsed) => Ok(false),
            Ok(Some(LinkEvent::Notification(notif))) => {
                if let Err(e) = router.on_notification(&self.address, notif.handle, &notif.value) {
                    warn!("{}: dropping notification: {e}", self.address);
                }
                Ok(true)
            }
            Ok(Some(LinkEvent::Disconnected)) | Ok(None) => {
                self.alive = false;
                Err(LinkError::Disconnected)
            }
        }
    }

    /// Disconnect and release the link.
    pub async fn close(mut self) -> Result<(), LinkError> {
        self.alive = false;
        self.events.close();
        info!("{}: closing link", self.address);
        self.link.close().await
    }
}
