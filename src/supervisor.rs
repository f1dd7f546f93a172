//! The long-running control loop that finds a Myo, keeps a session open to
//! it, and starts over whenever the link is lost.
//!
//! ```text
//!            ┌───────────────────────────────────────────┐
//!            ▼                                           │
//!      Discovering ──► Connecting ──► Streaming ──► Disconnected
//!        ▲   │  ▲          │  ▲          │  ▲
//!        └───┘  └──────────┘  └──────────┘  └── timeout (idle)
//!     no match    candidate        notification
//!                  rejected
//!
//!      any state ──(shutdown)──► Stopped
//! ```
//!
//! Peripherals that fail the subscription handshake are blacklisted for the
//! rest of the run.  A Myo that merely disconnects, or that cannot be reached
//! on one connect attempt, is not; it is found again on the next scan.

use std::collections::{HashSet, VecDeque};
use std::future::Future;

use log::{debug, info, warn};

use crate::config::MyoConfig;
use crate::error::LinkError;
use crate::router::NotificationRouter;
use crate::scanner;
use crate::session::LinkSession;
use crate::transport::Radio;
use crate::types::DeviceAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Discovering,
    Connecting,
    Streaming,
    Disconnected,
    Stopped,
}

/// Addresses that failed the subscription handshake.
///
/// Grows monotonically for the lifetime of the owning [`Supervisor`];
/// entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    addresses: HashSet<DeviceAddress>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the address was already present.
    pub fn insert(&mut self, address: DeviceAddress) -> bool {
        self.addresses.insert(address)
    }

    pub fn contains(&self, address: &DeviceAddress) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

pub struct Supervisor<R: Radio> {
    radio: R,
    config: MyoConfig,
    router: NotificationRouter,
    blacklist: Blacklist,
    candidates: VecDeque<DeviceAddress>,
    session: Option<LinkSession<R::Link>>,
    state: SupervisorState,
}

impl<R: Radio> Supervisor<R> {
    pub fn new(radio: R, config: MyoConfig, router: NotificationRouter) -> Self {
        let router = router.with_trace(config.trace_notifications);
        Self {
            radio,
            config,
            router,
            blacklist: Blacklist::new(),
            candidates: VecDeque::new(),
            session: None,
            state: SupervisorState::Discovering,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub fn session(&self) -> Option<&LinkSession<R::Link>> {
        self.session.as_ref()
    }

    pub fn router(&self) -> &NotificationRouter {
        &self.router
    }

    /// Drive the state machine until `shutdown` resolves.
    ///
    /// Shutdown is checked before every step and raced against each one, so
    /// it interrupts a scan, a connect, a backoff or a notification wait
    /// alike.  Any open session is closed before returning.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Initializing bluetooth connection.");
        while self.state != SupervisorState::Stopped {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!("Shutdown requested");
                    self.stop().await;
                }
                _ = self.step() => {}
            }
        }
        warn!("Program stopped");
    }

    /// Close any open session and enter [`SupervisorState::Stopped`].
    pub async fn stop(&mut self) {
        self.candidates.clear();
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("close on shutdown: {e}");
            }
        }
        self.state = SupervisorState::Stopped;
    }

    /// Perform one state transition and return the new state.
    pub async fn step(&mut self) -> SupervisorState {
        self.state = match self.state {
            SupervisorState::Discovering => self.discover().await,
            SupervisorState::Connecting => self.connect_next().await,
            SupervisorState::Streaming => self.stream().await,
            SupervisorState::Disconnected => self.discard_session().await,
            SupervisorState::Stopped => SupervisorState::Stopped,
        };
        self.state
    }

    async fn discover(&mut self) -> SupervisorState {
        let result = match scanner::scan(&mut self.radio, self.config.scan_duration).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Discovery failed, retrying: {e}");
                tokio::time::sleep(self.config.retry_backoff).await;
                return SupervisorState::Discovering;
            }
        };

        self.candidates.clear();
        for address in result.named(&self.config.target_name) {
            if self.blacklist.contains(&address) {
                debug!("{address} is blacklisted, skipping");
            } else {
                info!("found {} candidate at {address}", self.config.target_name);
                self.candidates.push_back(address);
            }
        }

        if self.candidates.is_empty() {
            info!("No {} found, scanning again", self.config.target_name);
            SupervisorState::Discovering
        } else {
            SupervisorState::Connecting
        }
    }

    async fn connect_next(&mut self) -> SupervisorState {
        let Some(address) = self.candidates.pop_front() else {
            return SupervisorState::Discovering;
        };
        if self.blacklist.contains(&address) {
            debug!("{address} is blacklisted, skipping");
            return self.after_rejection();
        }

        match LinkSession::connect(&mut self.radio, &address).await {
            Ok(session) => {
                info!("Found {} at: {address}", self.config.target_name);
                if let Some(length) = self.config.vibrate_on_connect {
                    if let Err(e) = session.vibrate(length).await {
                        warn!("{address}: vibrate failed: {e}");
                    }
                }
                self.candidates.clear();
                self.session = Some(session);
                info!("Initialization complete.");
                SupervisorState::Streaming
            }
            Err(LinkError::Handshake(e)) => {
                info!(
                    "Found something that is not a {}, adding to blacklist and trying again.",
                    self.config.target_name
                );
                debug!("{address}: {e}");
                self.blacklist.insert(address);
                tokio::time::sleep(self.config.retry_backoff).await;
                self.after_rejection()
            }
            Err(e) => {
                // Out of range or a wedged stack; the next scan may find it.
                warn!("{address}: connect failed, will retry on a later scan: {e}");
                tokio::time::sleep(self.config.retry_backoff).await;
                self.after_rejection()
            }
        }
    }

    fn after_rejection(&self) -> SupervisorState {
        if self.candidates.is_empty() {
            SupervisorState::Discovering
        } else {
            SupervisorState::Connecting
        }
    }

    async fn stream(&mut self) -> SupervisorState {
        let Some(session) = self.session.as_mut() else {
            return SupervisorState::Discovering;
        };
        match session
            .wait_for_event(self.config.event_timeout, &mut self.router)
            .await
        {
            Ok(_) => SupervisorState::Streaming,
            Err(e) => {
                info!("Disconnected: {e}");
                SupervisorState::Disconnected
            }
        }
    }

    async fn discard_session(&mut self) -> SupervisorState {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                debug!("close after disconnect: {e}");
            }
        }
        SupervisorState::Discovering
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_is_monotonic() {
        let mut blacklist = Blacklist::new();
        assert!(blacklist.is_empty());
        assert!(blacklist.insert("C".into()));
        assert!(!blacklist.insert("C".into()));
        assert!(blacklist.contains(&"C".into()));
        assert_eq!(blacklist.len(), 1);
    }
}
