//! Lifecycle states and the published status snapshot.
//!
//! The supervisor owns a single [`LifecycleState`] value and is the only
//! writer of [`StatusSnapshot`]s. Everyone else (dashboard, logs, tests)
//! observes through a `tokio::sync::watch` channel, so readers always
//! see a complete, internally consistent snapshot and never hold a lock
//! into the state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where the supervised connection currently stands.
///
/// ```text
/// Idle ──start──→ Connecting
/// Connecting ──transport open──→ Connected
/// Connected ──world entered──→ Active
/// Connecting | Connected | Active ──lost / error──→ Disconnected
/// Disconnected ──retry scheduled──→ Connecting    (delay runs there)
/// Disconnected ──budget exhausted──→ CoolingDown
/// CoolingDown ──elapsed──→ Connecting             (counter reset)
/// any ──stop──→ Idle
/// ```
///
/// `Disconnected` is transient: the machine passes through it while
/// the reconnection policy decides, and rests there only for the short
/// settle pause between a verified probe session and the real dial.
/// `CoolingDown` is the long pause after the attempt budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Not running. The only state from which `start` does anything.
    Idle,
    /// A session attempt is in flight, or the fixed delay before the
    /// next one is running.
    Connecting,
    /// Transport and handshake are up, but the world hasn't confirmed
    /// our presence yet.
    Connected,
    /// Fully in-game. Keep-alive runs only here.
    Active,
    /// The last session ended; the reconnection policy is about to
    /// decide.
    Disconnected,
    /// Attempt budget exhausted; waiting out the long pause before the
    /// counter resets.
    CoolingDown,
}

impl LifecycleState {
    /// True when the transport layer is up (handshake completed).
    pub fn is_connected(&self) -> bool {
        matches!(self, LifecycleState::Connected | LifecycleState::Active)
    }

    /// True when presence in the world is confirmed.
    pub fn is_in_game(&self) -> bool {
        matches!(self, LifecycleState::Active)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Connecting => "connecting",
            LifecycleState::Connected => "connected",
            LifecycleState::Active => "active",
            LifecycleState::Disconnected => "disconnected",
            LifecycleState::CoolingDown => "cooling-down",
        };
        f.write_str(name)
    }
}

/// Coarse health reading derived from the current state.
///
/// This is what the dashboard paints: green when in-game, yellow when
/// the transport is up but the world hasn't confirmed us yet, red
/// otherwise (including while a dial is still in flight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Online,
    Connecting,
    Offline,
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Health::Online => "online",
            Health::Connecting => "connecting",
            Health::Offline => "offline",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of the supervised connection.
///
/// Only the supervisor writes these; `last_update` is stamped at every
/// publish, so a stale timestamp means the supervisor itself is stuck.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Transport up and handshake completed.
    pub connected: bool,
    /// Presence in the world confirmed.
    pub in_game: bool,
    /// The target the machine is currently pointed at, as `host:port`.
    /// Follows the probe cursor while probing.
    pub current_target: String,
    /// Consecutive failed attempts since the last reset.
    pub attempts: u32,
    /// Cool-downs entered over the life of the process.
    pub total_cool_downs: u64,
    /// When this snapshot was produced.
    pub last_update: DateTime<Utc>,
}

impl StatusSnapshot {
    /// The snapshot published before the first `start`.
    pub fn initial(current_target: String) -> Self {
        Self {
            connected: false,
            in_game: false,
            current_target,
            attempts: 0,
            total_cool_downs: 0,
            last_update: Utc::now(),
        }
    }

    /// Collapses the snapshot into the dashboard's three-way health.
    ///
    /// In-game beats everything; a live transport (or one being dialed)
    /// reads as [`Health::Connecting`] until the world confirms.
    pub fn health(&self) -> Health {
        if self.in_game {
            Health::Online
        } else if self.connected {
            Health::Connecting
        } else {
            Health::Offline
        }
    }
}
