//! Starting a session and controlling it while it runs.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::callbacks::GenerationCallbacks;
use super::runner::{RunContext, run};
use super::state::{SessionReport, SessionState};
use crate::client::GenerationClient;
use crate::error::GenerationError;
use crate::relay::EventRelay;
use crate::types::{OperationKind, OperationRequest};
use crate::utils::cancel::CancelHandle;

/// One generation operation, started at most once.
///
/// Obtained from [`GenerationClient::session`]. A request that fails
/// validation leaves the session idle, so it can be started again with a
/// corrected request; once a connection has been opened, further starts fail
/// with [`GenerationError::InvalidState`].
#[derive(Debug)]
pub struct GenerationSession {
    client: GenerationClient,
    id: Uuid,
    state: Option<watch::Receiver<SessionState>>,
}

impl GenerationSession {
    pub(crate) fn new(client: GenerationClient) -> Self {
        Self {
            client,
            id: Uuid::new_v4(),
            state: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(SessionState::Idle)
    }

    /// Open the streaming request and start delivering callbacks.
    ///
    /// Must be called within a Tokio runtime. Callbacks run on the session's
    /// own task, in server order, and never after `on_close`.
    pub fn start<C>(
        &mut self,
        request: impl Into<OperationRequest>,
        callbacks: C,
    ) -> Result<SessionHandle, GenerationError>
    where
        C: GenerationCallbacks,
    {
        if self.state.is_some() {
            return Err(GenerationError::InvalidState(format!(
                "session {} was already started",
                self.id
            )));
        }

        let request = request.into();
        request.validate()?;
        let kind = request.kind();
        let stream_request = self.client.stream_request(&request)?;

        let cancel = CancelHandle::new();
        let finished = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let span = tracing::info_span!("generation_session", session_id = %self.id, %kind);

        let relay = {
            let _entered = span.enter();
            tracing::info!(url = %stream_request.url, "starting session");
            EventRelay::open(self.client.source(), stream_request, cancel.token())
        };

        let ctx = RunContext {
            id: self.id,
            kind,
            cancel: cancel.token().clone(),
            finished: finished.clone(),
            state: state_tx,
            correlation_id: request.initial_correlation_id(),
        };
        let task = tokio::spawn(run(ctx, relay, callbacks).instrument(span));

        if let Some(timeout) = self.client.config().session_timeout {
            cancel.cancel_after_unless(timeout, finished.clone());
        }

        self.state = Some(state_rx.clone());
        Ok(SessionHandle {
            id: self.id,
            kind,
            cancel,
            finished,
            state: state_rx,
            task,
        })
    }
}

/// Control surface of a running session.
///
/// Dropping the handle detaches the session: it runs to completion and
/// callbacks keep firing. Call [`SessionHandle::cancel`] to stop it.
#[derive(Debug)]
pub struct SessionHandle {
    id: Uuid,
    kind: OperationKind,
    cancel: CancelHandle,
    finished: CancellationToken,
    state: watch::Receiver<SessionState>,
    task: JoinHandle<SessionReport>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Stop the session. Ends in `Cancelled` with `on_close` but no
    /// `on_error`; a no-op once the session is terminal.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clonable handle for cancelling from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Cancel the session once `after` has elapsed. The timer is dropped
    /// when the session ends first.
    pub fn cancel_after(&self, after: Duration) {
        self.cancel.cancel_after_unless(after, self.finished.clone());
    }

    /// True once the session task has returned its report.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for a state this handle has not yet observed and return it.
    ///
    /// Returns the current state immediately if the session is terminal.
    pub async fn wait_for_state_change(&mut self) -> SessionState {
        if self.state.has_changed().unwrap_or(false) {
            return *self.state.borrow_and_update();
        }
        let current = *self.state.borrow();
        if current.is_terminal() {
            return current;
        }
        let _ = self.state.changed().await;
        *self.state.borrow_and_update()
    }

    /// Wait for the session to end and collect its report.
    pub async fn finish(self) -> Result<SessionReport, GenerationError> {
        self.task
            .await
            .map_err(|e| GenerationError::InternalError(format!("session task failed: {e}")))
    }
}
