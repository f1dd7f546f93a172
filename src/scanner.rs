//! One bounded BLE discovery pass.
//!
//! The scanner reports everything it saw; matching on the advertised name and
//! skipping blacklisted addresses is the supervisor's job.

use std::time::Duration;

use log::{debug, info};

use crate::error::DiscoveryError;
use crate::transport::Radio;
use crate::types::{Advertisement, DeviceAddress};

/// Advertisements collected during one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub advertisements: Vec<Advertisement>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.advertisements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.advertisements.len()
    }

    /// Distinct addresses whose advertised name is exactly `name`, in the
    /// order they were first seen.
    pub fn named(&self, name: &str) -> Vec<DeviceAddress> {
        let mut out: Vec<DeviceAddress> = Vec::new();
        for adv in &self.advertisements {
            if adv.name.as_deref() == Some(name) && !out.contains(&adv.address) {
                out.push(adv.address.clone());
            }
        }
        out
    }
}

impl From<Vec<Advertisement>> for ScanResult {
    fn from(advertisements: Vec<Advertisement>) -> Self {
        Self { advertisements }
    }
}

/// Run one bounded discovery pass.
///
/// Returns everything that advertised; filtering by name is left to the
/// caller.  Zero results is an empty [`ScanResult`], not an error.
pub async fn scan<R: Radio>(radio: &mut R, duration: Duration) -> Result<ScanResult, DiscoveryError> {
    info!("scan: scanning for {:.1} s …", duration.as_secs_f64());
    let result = ScanResult::from(radio.scan(duration).await?);
    for adv in &result.advertisements {
        debug!(
            "scan: {}  name={}  rssi={:?}",
            adv.address,
            adv.name.as_deref().unwrap_or("(unknown)"),
            adv.rssi
        );
    }
    info!("scan: {} device(s) found", result.len());
    Ok(result)
}
