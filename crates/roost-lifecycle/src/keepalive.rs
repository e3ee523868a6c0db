//! The keep-alive driver: periodic synthetic traffic while in-game.
//!
//! Every period it queues a sneak-begin, waits a short gap, and queues
//! the matching sneak-end. The content is meaningless to us — the pair
//! exists so the gateway sees a present participant and never evicts us
//! for idling.
//!
//! Two rules shape everything here:
//!
//! 1. A keep-alive send is never an error. A dead session surfaces as a
//!    `transport-lost` event on the normal path; the driver just drops
//!    the action and keeps ticking until it is stopped.
//! 2. (Re)start is idempotent. Starting while running tears down the
//!    old beat task before installing the new one, so there is never a
//!    moment with two beat loops and the pair never double-fires.

use std::time::Duration;

use roost_protocol::ActionMessage;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::StatusSnapshot;

/// Cadence of the synthetic sneak pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlivePolicy {
    /// Time between pairs.
    pub period: Duration,
    /// Delay between the begin and end halves of one pair.
    pub action_gap: Duration,
}

impl Default for KeepAlivePolicy {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(50),
            action_gap: Duration::from_millis(300),
        }
    }
}

/// Owns the beat task for the current in-game period.
///
/// The supervisor holds exactly one of these for its whole life and
/// calls [`KeepAliveDriver::start`] on entering `Active` and
/// [`KeepAliveDriver::stop`] on leaving it.
#[derive(Debug, Default)]
pub struct KeepAliveDriver {
    task: Option<JoinHandle<()>>,
}

impl KeepAliveDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the beat loop, replacing any loop already running.
    ///
    /// `actions` is where pairs are queued; `status` is re-checked at
    /// every fire so a half-scheduled pair is dropped the moment the
    /// machine leaves the in-game state.
    pub fn start(
        &mut self,
        policy: KeepAlivePolicy,
        actions: mpsc::UnboundedSender<ActionMessage>,
        status: watch::Receiver<StatusSnapshot>,
    ) {
        self.stop();
        tracing::debug!(period = ?policy.period, "keep-alive started");
        self.task = Some(tokio::spawn(beat_loop(policy, actions, status)));
    }

    /// Tears down the beat loop if one is running.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("keep-alive stopped");
        }
    }

    /// True while a beat loop is installed.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for KeepAliveDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn beat_loop(
    policy: KeepAlivePolicy,
    actions: mpsc::UnboundedSender<ActionMessage>,
    status: watch::Receiver<StatusSnapshot>,
) {
    loop {
        sleep(policy.period).await;
        // checked at fire time, not schedule time
        if !status.borrow().in_game {
            continue;
        }
        send_quietly(&actions, ActionMessage::sneak_begin());

        sleep(policy.action_gap).await;
        if !status.borrow().in_game {
            continue;
        }
        send_quietly(&actions, ActionMessage::sneak_end());
    }
}

/// Queues one action, discarding the failure if the session is gone.
fn send_quietly(actions: &mpsc::UnboundedSender<ActionMessage>, action: ActionMessage) {
    if actions.send(action).is_err() {
        tracing::debug!("keep-alive send dropped; session is gone");
    }
}
