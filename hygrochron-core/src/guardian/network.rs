//! Network guardian
//!
//! Owns [`NetworkHealth`]. Link status is queried only when the check
//! interval has elapsed. A lost link gets one bounded reconnect per
//! due-check; after `max_failures` consecutive failed reconnects the
//! guardian enters the terminal `Restarting` state and the caller hands
//! control to the platform reset.

use log::{info, warn};

use crate::config::{NetworkPolicy, StaticIpConfig, WifiConfig};
use crate::guardian::DueGate;
use crate::retry::{retry, RetryOutcome, RetryPolicy};
use crate::state::{LinkEvent, LinkState};
use crate::traits::{Clock, LinkStatus, NetworkDriver};
use crate::Millis;

/// Link health record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkHealth {
    pub state: LinkState,
    /// Failed reconnects since the last successful connect
    pub consecutive_failures: u8,
    /// When the link status was last queried
    pub last_check: Millis,
}

/// Result of a network due-check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetworkCheck {
    /// Interval not yet elapsed
    NotDue,
    /// Link is up; failure counter cleared
    Healthy,
    /// Link is down; `attempt` is the 1-based number of the reconnect
    /// about to be made
    Lost { attempt: u8 },
    /// Terminal state; nothing more to do in-process
    Halted,
}

/// Result of a bounded reconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReconnectOutcome {
    Reconnected,
    /// Timed out, below the failure limit
    Failed { failures: u8 },
    /// Timed out and the failure limit is reached; restart now
    Escalate { failures: u8 },
}

/// WiFi health monitor with bounded reconnect and restart escalation
#[derive(Debug, Clone)]
pub struct NetworkGuardian {
    policy: NetworkPolicy,
    gate: DueGate,
    health: NetworkHealth,
}

impl NetworkGuardian {
    /// Create the guardian; the first check happens one interval after `now`
    pub fn new(policy: NetworkPolicy, now: Millis) -> Self {
        Self {
            policy,
            gate: DueGate::new(policy.check_interval_ms, now),
            health: NetworkHealth {
                state: LinkState::Disconnected,
                consecutive_failures: 0,
                last_check: now,
            },
        }
    }

    pub fn health(&self) -> &NetworkHealth {
        &self.health
    }

    pub fn state(&self) -> LinkState {
        self.health.state
    }

    /// Initial association at boot
    ///
    /// `on_attempt` runs before every status poll (watchdog feeding). A
    /// failure here is not counted: the device enters the loop
    /// `Disconnected` and the first due-check takes over.
    pub fn initial_connect<N, C, F>(
        &mut self,
        net: &mut N,
        clock: &mut C,
        wifi: &WifiConfig,
        mut on_attempt: F,
    ) -> RetryOutcome
    where
        N: NetworkDriver + ?Sized,
        C: Clock + ?Sized,
        F: FnMut(),
    {
        info!("Connecting to WiFi: {}", wifi.ssid.as_str());
        if let Err(e) = net.connect(&wifi.ssid, &wifi.password) {
            warn!("Connect request rejected: {:?}", e);
        }

        let outcome = retry(clock, &self.policy.initial_connect, |_| {
            on_attempt();
            net.status() == LinkStatus::Connected
        });

        if outcome.is_success() {
            self.health.state = self.health.state.transition(LinkEvent::LinkUp);
            match net.local_ip() {
                Some(ip) => info!("WiFi connected, IP: {}", ip),
                None => info!("WiFi connected"),
            }
        } else {
            self.health.state = self.health.state.transition(LinkEvent::LinkDown);
            warn!("WiFi connection failed, continuing disconnected");
        }
        outcome
    }

    /// Due-check: query link status if the interval has elapsed
    pub fn check<N: NetworkDriver + ?Sized>(&mut self, now: Millis, net: &mut N) -> NetworkCheck {
        if self.health.state.is_terminal() {
            return NetworkCheck::Halted;
        }
        if !self.gate.poll(now) {
            return NetworkCheck::NotDue;
        }
        self.health.last_check = now;

        match net.status() {
            LinkStatus::Connected => {
                self.health.state = self.health.state.transition(LinkEvent::LinkUp);
                self.health.consecutive_failures = 0;
                NetworkCheck::Healthy
            }
            LinkStatus::Disconnected => {
                self.health.state = self.health.state.transition(LinkEvent::LinkDown);
                warn!("WiFi disconnected, attempting to reconnect");
                NetworkCheck::Lost {
                    attempt: self.health.consecutive_failures.saturating_add(1),
                }
            }
        }
    }

    /// Bounded reconnect: disconnect, re-issue connect, poll status
    ///
    /// On success the failure counter resets and the static configuration
    /// is re-applied, since some stacks drop it across a reconnect.
    pub fn reconnect<N, C>(
        &mut self,
        net: &mut N,
        clock: &mut C,
        wifi: &WifiConfig,
        static_ip: Option<&StaticIpConfig>,
    ) -> ReconnectOutcome
    where
        N: NetworkDriver + ?Sized,
        C: Clock + ?Sized,
    {
        if self.health.state.is_terminal() {
            return ReconnectOutcome::Escalate {
                failures: self.health.consecutive_failures,
            };
        }

        net.disconnect();
        let outcome = match net.connect(&wifi.ssid, &wifi.password) {
            Ok(()) => retry(clock, &self.policy.reconnect, |_| {
                net.status() == LinkStatus::Connected
            }),
            Err(e) => {
                warn!("Reconnect request rejected: {:?}", e);
                RetryOutcome::Exhausted { attempts: 0 }
            }
        };

        if outcome.is_success() {
            self.health.state = self.health.state.transition(LinkEvent::ReconnectSucceeded);
            self.health.consecutive_failures = 0;
            info!("WiFi reconnected");
            if let Some(config) = static_ip {
                apply_static(net, config);
            }
            return ReconnectOutcome::Reconnected;
        }

        let failures = self.health.consecutive_failures.saturating_add(1);
        self.health.consecutive_failures = failures;

        if failures >= self.policy.max_failures {
            self.health.state = self.health.state.transition(LinkEvent::FailureLimitReached);
            warn!(
                "Max reconnect attempts reached ({}), restarting",
                failures
            );
            ReconnectOutcome::Escalate { failures }
        } else {
            self.health.state = self.health.state.transition(LinkEvent::ReconnectFailed);
            warn!("WiFi reconnect failed ({}/{})", failures, self.policy.max_failures);
            ReconnectOutcome::Failed { failures }
        }
    }

    /// Policy used for the reconnect wait
    pub fn reconnect_policy(&self) -> &RetryPolicy {
        &self.policy.reconnect
    }
}

/// Apply static addressing, falling back to DHCP on refusal
///
/// Returns whether the configuration was accepted.
pub fn apply_static<N: NetworkDriver + ?Sized>(net: &mut N, config: &StaticIpConfig) -> bool {
    match net.apply_static_config(config) {
        Ok(()) => {
            info!("Static IP configured: {}", config.address);
            true
        }
        Err(e) => {
            warn!("Static IP configuration failed ({:?}), using DHCP", e);
            false
        }
    }
}
