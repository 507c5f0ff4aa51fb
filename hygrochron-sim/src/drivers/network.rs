//! Simulated WiFi station
//!
//! The access point is reachable except during a configured outage
//! window. An outage drops the link; reconnecting only succeeds once the
//! window has passed.

use hygrochron_core::config::{Ipv4, StaticIpConfig};
use hygrochron_core::traits::{LinkStatus, NetworkDriver, NetworkError};
use hygrochron_core::Millis;
use log::{debug, info, warn};

use super::Uptime;

/// Address handed out when no static configuration is applied
const DHCP_ADDRESS: Ipv4 = Ipv4::new(10, 0, 0, 23);

/// Window during which the access point is unreachable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outage {
    pub start_ms: Millis,
    /// `None` never ends
    pub duration_ms: Option<u32>,
}

impl Outage {
    /// Build from the simulation knobs (0 start disables, 0 length is forever)
    pub fn from_settings(start_ms: u32, duration_ms: u32) -> Option<Self> {
        (start_ms > 0).then(|| Self {
            start_ms,
            duration_ms: (duration_ms > 0).then_some(duration_ms),
        })
    }

    pub fn covers(&self, now: Millis) -> bool {
        now >= self.start_ms
            && self
                .duration_ms
                .map_or(true, |len| now - self.start_ms < len)
    }
}

pub struct SimNetwork {
    uptime: Uptime,
    outage: Option<Outage>,
    associated: bool,
    address: Ipv4,
}

impl SimNetwork {
    pub fn new(uptime: Uptime, outage: Option<Outage>) -> Self {
        Self {
            uptime,
            outage,
            associated: false,
            address: DHCP_ADDRESS,
        }
    }

    fn ap_reachable(&self) -> bool {
        let now = self.uptime.now_ms();
        !self.outage.map_or(false, |o| o.covers(now))
    }
}

impl NetworkDriver for SimNetwork {
    fn connect(&mut self, ssid: &str, _password: &str) -> Result<(), NetworkError> {
        self.associated = self.ap_reachable();
        if self.associated {
            info!("Associated with {}", ssid);
        } else {
            debug!("Access point {} not in range", ssid);
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.associated = false;
    }

    fn status(&mut self) -> LinkStatus {
        if self.associated && !self.ap_reachable() {
            warn!("Access point went away");
            self.associated = false;
        }
        if self.associated {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        }
    }

    fn apply_static_config(&mut self, config: &StaticIpConfig) -> Result<(), NetworkError> {
        debug!(
            "Static address {} gw {} mask {}",
            config.address, config.gateway, config.subnet
        );
        self.address = config.address;
        Ok(())
    }

    fn local_ip(&self) -> Option<Ipv4> {
        self.associated.then_some(self.address)
    }
}
