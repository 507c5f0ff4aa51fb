//! WiFi station trait

use crate::config::{Ipv4, StaticIpConfig};

/// Link status as reported by the network stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    Connected,
    Disconnected,
}

/// Errors that can occur with the network stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetworkError {
    /// Association request rejected by the stack
    ConnectRejected,
    /// Static configuration refused
    ConfigRejected,
    /// Radio not available
    Unavailable,
}

/// Trait for the WiFi station interface
pub trait NetworkDriver {
    /// Start associating with an access point
    ///
    /// Returns once the request is issued; completion is observed through
    /// [`status`](NetworkDriver::status).
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError>;

    /// Drop the current association
    fn disconnect(&mut self);

    /// Current link status
    fn status(&mut self) -> LinkStatus;

    /// Apply static address, gateway, subnet and DNS servers
    fn apply_static_config(&mut self, config: &StaticIpConfig) -> Result<(), NetworkError>;

    /// Address currently assigned to the station, if any
    fn local_ip(&self) -> Option<Ipv4>;
}
