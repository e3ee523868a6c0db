//! The session handle: one connection attempt, owned until discarded.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use roost_protocol::ActionMessage;

use crate::{ClientError, SessionEvent, SessionId, Target};

/// Receiver side of a session's event stream.
pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

/// How long a polite close may take before the task is torn down.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Handle to a running session task.
///
/// The handle is the *only* way to reach the session: dropping it (or
/// calling [`Session::close_quietly`]) ends the task, so holding at
/// most one `Session` guarantees at most one live connection.
pub struct Session {
    id: SessionId,
    target: Target,
    outbound: mpsc::UnboundedSender<ActionMessage>,
    close_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Session {
    /// Assembles a handle from its parts. Used by connector
    /// implementations (including test doubles).
    pub fn new(
        id: SessionId,
        target: Target,
        outbound: mpsc::UnboundedSender<ActionMessage>,
        close_tx: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            target,
            outbound,
            close_tx: Some(close_tx),
            task,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Queues an action for the gateway. Fire-and-forget: delivery is
    /// not confirmed.
    ///
    /// # Errors
    /// Returns [`ClientError::Stale`] if the session task has already
    /// exited. Keep-alive callers swallow this by policy; anyone else
    /// should treat it as "reconnect is already underway".
    pub fn send(&self, action: ActionMessage) -> Result<(), ClientError> {
        self.outbound.send(action).map_err(|_| ClientError::Stale)
    }

    /// Returns an owned sender for queueing actions from another task,
    /// e.g. a periodic emitter that outlives any one borrow of the
    /// handle. Sends on a dead session fail like [`Session::send`].
    pub fn action_sender(&self) -> mpsc::UnboundedSender<ActionMessage> {
        self.outbound.clone()
    }

    /// True once the session task has exited (terminal event emitted or
    /// torn down).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Closes the session, discarding the handle.
    ///
    /// Best-effort by policy: the task gets [`CLOSE_GRACE`] to flush a
    /// close frame, then is aborted. Every error on this path is
    /// ignored — a session being discarded has nothing useful left to
    /// report. Returns only after the task is confirmed gone, so a
    /// caller can open a replacement without ever holding two live
    /// connections.
    pub async fn close_quietly(mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
        if tokio::time::timeout(CLOSE_GRACE, &mut self.task)
            .await
            .is_err()
        {
            self.task.abort();
            let _ = (&mut self.task).await;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // A handle dropped without close_quietly still must not leak a
        // connection.
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_protocol::ActionMessage;

    fn parts() -> (
        mpsc::UnboundedSender<ActionMessage>,
        mpsc::UnboundedReceiver<ActionMessage>,
        oneshot::Sender<()>,
        oneshot::Receiver<()>,
    ) {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = oneshot::channel();
        (action_tx, action_rx, close_tx, close_rx)
    }

    #[tokio::test]
    async fn test_send_reaches_the_task_side() {
        let (action_tx, mut action_rx, close_tx, close_rx) = parts();
        let task = tokio::spawn(async move {
            let _ = close_rx.await;
        });
        let session = Session::new(
            SessionId::next(),
            Target::new("gw.local", 1),
            action_tx,
            close_tx,
            task,
        );

        session.send(ActionMessage::sneak_begin()).unwrap();
        let got = action_rx.recv().await.unwrap();
        assert_eq!(got, ActionMessage::sneak_begin());

        session.close_quietly().await;
    }

    #[tokio::test]
    async fn test_send_after_task_exit_is_stale() {
        let (action_tx, action_rx, close_tx, _close_rx) = parts();
        // Receiver dropped: the task side is gone.
        drop(action_rx);
        let task = tokio::spawn(async {});
        let session = Session::new(
            SessionId::next(),
            Target::new("gw.local", 1),
            action_tx,
            close_tx,
            task,
        );

        let result = session.send(ActionMessage::sneak_begin());
        assert!(matches!(result, Err(ClientError::Stale)));
    }

    #[tokio::test]
    async fn test_close_quietly_waits_for_cooperative_task() {
        let (action_tx, _action_rx, close_tx, close_rx) = parts();
        let task = tokio::spawn(async move {
            // Cooperative: exit as soon as close is requested.
            let _ = close_rx.await;
        });
        let session = Session::new(
            SessionId::next(),
            Target::new("gw.local", 1),
            action_tx,
            close_tx,
            task,
        );

        session.close_quietly().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_quietly_aborts_a_stuck_task() {
        let (action_tx, _action_rx, close_tx, _close_rx) = parts();
        // Stubborn: ignores the close signal entirely.
        let task = tokio::spawn(std::future::pending::<()>());
        let session = Session::new(
            SessionId::next(),
            Target::new("gw.local", 1),
            action_tx,
            close_tx,
            task,
        );

        // Must return (via the abort path) rather than hang.
        session.close_quietly().await;
    }
}
