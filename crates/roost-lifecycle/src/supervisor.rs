//! The lifecycle supervisor: one actor owning the whole connection
//! lifecycle.
//!
//! All state lives inside the actor task — the current
//! [`LifecycleState`], the live session (if any), the retry schedule,
//! the probe plan, the keep-alive driver, and the single armed timer.
//! Events, commands, and timer fires are handled strictly one at a
//! time, so every transition sees a consistent world and no handler
//! ever races another.
//!
//! The single-session invariant is structural rather than checked:
//! the actor holds at most one [`LiveSession`], a replacement can only
//! be installed after `close_quietly` has confirmed the old task dead,
//! and discarding a session drops its event receiver, making stale
//! events unreachable instead of merely ignored.

use std::pin::Pin;
use std::time::Duration;

use chrono::Utc;
use roost_client::{Connector, Session, SessionEvent, SessionEvents, Target};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Sleep, sleep};

use crate::{
    KeepAliveDriver, LifecycleConfig, LifecycleError, LifecycleState, ProbePlan, RetryDecision,
    RetrySchedule, StatusSnapshot,
};

/// Control messages accepted by the supervisor actor.
enum Command {
    /// Begin connecting. A no-op unless the machine is `Idle`.
    Start,
    /// Tear everything down and exit the actor. Replies once the
    /// machine has reached `Idle`.
    Stop { reply: oneshot::Sender<()> },
}

/// Cheap-to-clone handle to a running supervisor.
///
/// Dropping every handle stops the actor the same way [`stop`] does,
/// minus the acknowledgement.
///
/// [`stop`]: SupervisorHandle::stop
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<Command>,
    status: watch::Receiver<StatusSnapshot>,
}

impl SupervisorHandle {
    /// Asks the machine to start connecting. Idempotent: while not
    /// `Idle` this is a logged no-op.
    ///
    /// # Errors
    /// Returns [`LifecycleError::Unavailable`] if the actor has exited.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        self.sender
            .send(Command::Start)
            .await
            .map_err(|_| LifecycleError::Unavailable)
    }

    /// Stops the machine and waits for the full teardown: keep-alive
    /// cancelled, timers cancelled, session closed, state `Idle`.
    ///
    /// # Errors
    /// Returns [`LifecycleError::Unavailable`] if the actor has
    /// already exited (e.g. `stop` called twice).
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        let (reply, done) = oneshot::channel();
        self.sender
            .send(Command::Stop { reply })
            .await
            .map_err(|_| LifecycleError::Unavailable)?;
        done.await.map_err(|_| LifecycleError::Unavailable)
    }

    /// The latest published snapshot.
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    /// A receiver that tracks every future snapshot. This is what the
    /// dashboard holds.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.clone()
    }
}

/// Spawns the supervisor actor and returns a handle to it.
///
/// The machine starts `Idle`; call [`SupervisorHandle::start`] to set
/// it in motion.
///
/// # Errors
/// Returns [`LifecycleError::Config`] if the config fails validation.
/// This is the only fatal error path — after a successful spawn, every
/// failure is handled by reconnecting, never by returning.
pub fn spawn_supervisor<C: Connector>(
    connector: C,
    config: LifecycleConfig,
) -> Result<SupervisorHandle, LifecycleError> {
    config.validate()?;
    let probe = match config.probe.clone() {
        Some(probe_config) => Some(ProbePlan::new(probe_config, config.target.clone())?),
        None => None,
    };

    let first_target = probe
        .as_ref()
        .map(|plan| plan.current_target().clone())
        .unwrap_or_else(|| config.target.clone());
    let (status_tx, status_rx) = watch::channel(StatusSnapshot::initial(first_target.to_string()));
    let (sender, commands) = mpsc::channel(32);

    let actor = Supervisor {
        connector,
        retry: RetrySchedule::new(config.retry),
        config,
        state: LifecycleState::Idle,
        live: None,
        probe,
        keep_alive: KeepAliveDriver::new(),
        timer: None,
        status: status_tx,
        total_cool_downs: 0,
    };
    tokio::spawn(actor.run(commands));

    Ok(SupervisorHandle {
        sender,
        status: status_rx,
    })
}

/// Which timer is armed. The states make the four mutually exclusive,
/// so one slot is enough and `stop()` has exactly one thing to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    /// Fixed delay before the next attempt.
    Retry,
    /// Long pause after the attempt budget is spent.
    CoolDown,
    /// Hold on a successful probe session before tearing it down.
    ProbeGrace,
    /// Pause between probe teardown and dialing the real target.
    ProbeSettle,
}

struct ArmedTimer {
    kind: TimerKind,
    sleep: Pin<Box<Sleep>>,
}

/// The one live session plus its private event stream.
struct LiveSession {
    session: Session,
    events: SessionEvents,
}

struct Supervisor<C: Connector> {
    connector: C,
    config: LifecycleConfig,
    state: LifecycleState,
    live: Option<LiveSession>,
    retry: RetrySchedule,
    probe: Option<ProbePlan>,
    keep_alive: KeepAliveDriver,
    timer: Option<ArmedTimer>,
    status: watch::Sender<StatusSnapshot>,
    total_cool_downs: u64,
}

impl<C: Connector> Supervisor<C> {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        tracing::info!(target = %self.config.target, "lifecycle supervisor started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Start) => self.handle_start(),
                    Some(Command::Stop { reply }) => {
                        self.shutdown().await;
                        let _ = reply.send(());
                        break;
                    }
                    // every handle dropped; nobody is left to observe us
                    None => {
                        self.shutdown().await;
                        break;
                    }
                },
                event = next_event(&mut self.live) => match event {
                    Some(event) => self.handle_session_event(event).await,
                    None => {
                        // the session task died without a terminal event
                        self.handle_terminated("session ended without a terminal event".into())
                            .await;
                    }
                },
                kind = fire_timer(&mut self.timer) => self.handle_timer(kind).await,
            }
        }
        tracing::info!("lifecycle supervisor stopped");
    }

    // -- commands ----------------------------------------------------------

    fn handle_start(&mut self) {
        if self.state != LifecycleState::Idle {
            tracing::debug!(state = %self.state, "start ignored; machine already running");
            return;
        }
        self.connect();
    }

    /// Teardown in the fixed order: keep-alive first, then timers,
    /// then the session, then `Idle`.
    async fn shutdown(&mut self) {
        tracing::info!(state = %self.state, "stopping");
        self.keep_alive.stop();
        self.clear_timer();
        self.discard_session().await;
        self.set_state(LifecycleState::Idle);
    }

    // -- session events ----------------------------------------------------

    async fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TransportOpen { entity } => {
                if self.state != LifecycleState::Connecting {
                    tracing::debug!(state = %self.state, "transport-open out of order; ignored");
                    return;
                }
                tracing::info!(%entity, target = %self.current_target(), "transport open");
                self.retry.reset();
                self.set_state(LifecycleState::Connected);
            }
            SessionEvent::WorldEntered { world } => self.handle_world_entered(&world),
            SessionEvent::TransportLost { reason } => self.handle_terminated(reason).await,
            // errors terminate the attempt exactly like a lost transport
            SessionEvent::Errored { message } => self.handle_terminated(message).await,
        }
    }

    fn handle_world_entered(&mut self, world: &str) {
        if self.state == LifecycleState::Active {
            tracing::debug!(%world, "duplicate world confirmation ignored");
            return;
        }
        if self.state != LifecycleState::Connected {
            tracing::debug!(state = %self.state, "world-entered out of order; ignored");
            return;
        }

        self.retry.reset();
        if let Some(plan) = &self.probe {
            if plan.is_probing() {
                let grace = plan.grace();
                tracing::info!(
                    %world,
                    probe_target = %plan.current_target(),
                    ?grace,
                    "probe target verified; holding before switching to the real target"
                );
                // keep-alive stays off: this session is about to be discarded
                self.set_state(LifecycleState::Active);
                self.arm_timer(TimerKind::ProbeGrace, grace);
                return;
            }
        }

        tracing::info!(%world, "presence active in world");
        self.set_state(LifecycleState::Active);
        self.start_keep_alive();
    }

    /// The single terminating path for disconnects, closes, and errors.
    async fn handle_terminated(&mut self, reason: String) {
        self.keep_alive.stop();
        self.clear_timer();
        self.discard_session().await;
        tracing::warn!(%reason, attempts = self.retry.attempts(), "session terminated");
        self.set_state(LifecycleState::Disconnected);
        self.evaluate_retry();
    }

    /// Applies the reconnection policy after a terminating event.
    fn evaluate_retry(&mut self) {
        if let Some(plan) = &mut self.probe {
            plan.on_attempt_failed();
        }
        match self.retry.next() {
            RetryDecision::RetryAfter(delay) => {
                tracing::info!(
                    attempts = self.retry.attempts(),
                    max = self.config.retry.max_attempts,
                    ?delay,
                    next_target = %self.current_target(),
                    "retry scheduled"
                );
                self.arm_timer(TimerKind::Retry, delay);
                self.set_state(LifecycleState::Connecting);
            }
            RetryDecision::CoolDownAfter(duration) => {
                self.total_cool_downs += 1;
                tracing::warn!(
                    ?duration,
                    total_cool_downs = self.total_cool_downs,
                    "attempt budget exhausted; cooling down"
                );
                self.arm_timer(TimerKind::CoolDown, duration);
                self.set_state(LifecycleState::CoolingDown);
            }
        }
    }

    // -- timers ------------------------------------------------------------

    async fn handle_timer(&mut self, kind: TimerKind) {
        self.timer = None;
        match kind {
            TimerKind::Retry => {
                tracing::debug!("retry delay elapsed");
                self.connect();
            }
            TimerKind::CoolDown => {
                self.retry.reset();
                if let Some(plan) = &mut self.probe {
                    plan.rewind();
                }
                tracing::info!("cool-down complete; resuming attempts");
                self.connect();
            }
            TimerKind::ProbeGrace => self.finish_probe_grace().await,
            TimerKind::ProbeSettle => self.finish_probe_settle(),
        }
    }

    /// Grace window over: the probe session has served its purpose.
    async fn finish_probe_grace(&mut self) {
        self.discard_session().await;
        self.set_state(LifecycleState::Disconnected);
        if let Some(plan) = &self.probe {
            let settle = plan.settle();
            tracing::info!(?settle, "probe session closed; settling before the real target");
            self.arm_timer(TimerKind::ProbeSettle, settle);
        }
    }

    /// Settle window over: commit and dial the real target.
    fn finish_probe_settle(&mut self) {
        if let Some(plan) = &mut self.probe {
            plan.commit();
            tracing::info!(target = %self.config.target, "probe verified; committed to real target");
        }
        self.connect();
    }

    // -- plumbing ----------------------------------------------------------

    /// Opens a session against the current target. A synchronous open
    /// failure counts as an immediate transport error and feeds the
    /// normal retry path.
    fn connect(&mut self) {
        let target = self.current_target();
        let session_config = self.config.session_config(target.clone());
        match self.connector.open(session_config) {
            Ok((session, events)) => {
                tracing::info!(
                    id = %session.id(),
                    %target,
                    attempts = self.retry.attempts(),
                    "session attempt started"
                );
                self.live = Some(LiveSession { session, events });
                self.set_state(LifecycleState::Connecting);
            }
            Err(err) => {
                tracing::warn!(%target, error = %err, "session open failed");
                self.set_state(LifecycleState::Connecting);
                self.set_state(LifecycleState::Disconnected);
                self.evaluate_retry();
            }
        }
    }

    /// Closes and forgets the live session, if any. Returns only after
    /// the session task is confirmed gone.
    async fn discard_session(&mut self) {
        if let Some(live) = self.live.take() {
            live.session.close_quietly().await;
        }
    }

    fn start_keep_alive(&mut self) {
        if let Some(live) = &self.live {
            self.keep_alive.start(
                self.config.keep_alive,
                live.session.action_sender(),
                self.status.subscribe(),
            );
        }
    }

    fn current_target(&self) -> Target {
        match &self.probe {
            Some(plan) => plan.current_target().clone(),
            None => self.config.target.clone(),
        }
    }

    fn arm_timer(&mut self, kind: TimerKind, duration: Duration) {
        tracing::debug!(?kind, ?duration, "timer armed");
        self.timer = Some(ArmedTimer {
            kind,
            sleep: Box::pin(sleep(duration)),
        });
    }

    fn clear_timer(&mut self) {
        if let Some(armed) = self.timer.take() {
            tracing::debug!(kind = ?armed.kind, "timer cancelled");
        }
    }

    fn set_state(&mut self, next: LifecycleState) {
        if self.state != next {
            tracing::info!(from = %self.state, to = %next, "state transition");
            self.state = next;
        }
        self.publish();
    }

    /// Publishes a fresh snapshot. The supervisor is the only writer.
    fn publish(&self) {
        let snapshot = StatusSnapshot {
            connected: self.state.is_connected(),
            in_game: self.state.is_in_game(),
            current_target: self.current_target().to_string(),
            attempts: self.retry.attempts(),
            total_cool_downs: self.total_cool_downs,
            last_update: Utc::now(),
        };
        self.status.send_replace(snapshot);
    }
}

/// Waits for the next event from the live session, or forever when
/// there is none. Returning `None` means the session task is gone.
async fn next_event(live: &mut Option<LiveSession>) -> Option<SessionEvent> {
    match live {
        Some(live) => live.events.recv().await,
        None => std::future::pending().await,
    }
}

/// Waits for the armed timer, or forever when none is armed. The
/// elapsed timer stays in the slot; the handler clears or rearms it.
async fn fire_timer(timer: &mut Option<ArmedTimer>) -> TimerKind {
    match timer {
        Some(armed) => {
            armed.sleep.as_mut().await;
            armed.kind
        }
        None => std::future::pending().await,
    }
}
