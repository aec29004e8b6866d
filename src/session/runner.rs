//! The session task: drains one relay, drives the callbacks, reports.

use chrono::Utc;
use futures::FutureExt;
use futures_util::StreamExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::callbacks::{GenerationCallbacks, Lifecycle};
use super::interpreter::{Action, interpret};
use super::state::{SectionText, SessionOutcome, SessionReport, SessionState, transition};
use crate::relay::{ConnectionState, RelayStream};
use crate::types::{EventEnvelope, OperationKind};
use crate::utils::panic::panic_message;

pub(crate) struct RunContext {
    pub id: Uuid,
    pub kind: OperationKind,
    pub cancel: CancellationToken,
    /// Cancelled once the session is terminal; stops its timeout timers.
    pub finished: CancellationToken,
    pub state: watch::Sender<SessionState>,
    pub correlation_id: Option<String>,
}

struct Accumulator {
    kind: OperationKind,
    text: String,
    correlation_id: Option<String>,
    sections: Vec<SectionText>,
}

impl Accumulator {
    fn new(kind: OperationKind, correlation_id: Option<String>) -> Self {
        Self {
            kind,
            text: String::new(),
            correlation_id,
            sections: Vec::new(),
        }
    }

    fn text(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        if let Some(section) = self.sections.last_mut() {
            section.text.push_str(fragment);
        }
    }

    fn metadata(&mut self, id: &str) {
        self.correlation_id = Some(id.to_string());
        if self.kind == OperationKind::FullGeneration {
            self.sections.push(SectionText {
                section_id: id.to_string(),
                text: String::new(),
            });
        }
    }
}

pub(crate) async fn run<C: GenerationCallbacks>(
    ctx: RunContext,
    mut relay: RelayStream,
    callbacks: C,
) -> SessionReport {
    let started_at = Utc::now();
    let mut lifecycle = Lifecycle::new(callbacks);
    let mut acc = Accumulator::new(ctx.kind, ctx.correlation_id.clone());

    let driving = drive(&ctx, &mut relay, &mut lifecycle, &mut acc);
    let outcome = match AssertUnwindSafe(driving).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let description = format!("session callback panicked: {}", panic_message(payload.as_ref()));
            tracing::error!(%description);
            SessionOutcome::Failed { description }
        }
    };

    relay.cancel();
    drop(relay);

    // on_close runs before the terminal state is observable.
    if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(|| lifecycle.close())) {
        tracing::error!(panic = %panic_message(payload.as_ref()), "on_close panicked");
    }
    transition(&ctx.state, outcome.state());
    ctx.finished.cancel();

    match &outcome {
        SessionOutcome::Completed => {
            tracing::info!(chars = acc.text.len(), "session completed")
        }
        SessionOutcome::Failed { description } => {
            tracing::warn!(error = %description, "session failed")
        }
        SessionOutcome::Cancelled => tracing::info!("session cancelled"),
    }

    SessionReport {
        session_id: ctx.id,
        kind: ctx.kind,
        outcome,
        text: acc.text,
        correlation_id: acc.correlation_id,
        sections: acc.sections,
        started_at,
        finished_at: Utc::now(),
    }
}

async fn drive<C: GenerationCallbacks>(
    ctx: &RunContext,
    relay: &mut RelayStream,
    lifecycle: &mut Lifecycle<C>,
    acc: &mut Accumulator,
) -> SessionOutcome {
    let connection = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return SessionOutcome::Cancelled,
        connection = relay.ready() => connection,
    };
    tracing::debug!(?connection, "relay ready");
    // A relay that closed without opening goes straight to its terminal state.
    if connection == ConnectionState::Open {
        transition(&ctx.state, SessionState::Streaming);
    }

    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return SessionOutcome::Cancelled,
            next = relay.next() => next,
        };

        let Some(envelope) = next else {
            return SessionOutcome::Completed;
        };

        match envelope {
            EventEnvelope::TerminalError { description } => {
                if ctx.cancel.is_cancelled() {
                    return SessionOutcome::Cancelled;
                }
                lifecycle.error(&description);
                return SessionOutcome::Failed { description };
            }
            EventEnvelope::Message { topic, payload } => match interpret(ctx.kind, &topic, &payload) {
                Action::Text => {
                    acc.text(&payload);
                    lifecycle.text(&payload);
                }
                Action::Metadata(id) => {
                    acc.metadata(&id);
                    lifecycle.metadata(&id);
                }
                Action::Fail(description) => {
                    relay.cancel();
                    lifecycle.error(&description);
                    return SessionOutcome::Failed { description };
                }
                Action::Skip => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::channel;
    use crate::session::Callbacks;
    use std::sync::{Arc, Mutex};

    fn context(kind: OperationKind) -> (RunContext, watch::Receiver<SessionState>) {
        let (state, rx) = watch::channel(SessionState::Idle);
        let ctx = RunContext {
            id: Uuid::new_v4(),
            kind,
            cancel: CancellationToken::new(),
            finished: CancellationToken::new(),
            state,
            correlation_id: None,
        };
        (ctx, rx)
    }

    fn recording() -> (Callbacks, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (t, m, e, c) = (log.clone(), log.clone(), log.clone(), log.clone());
        let callbacks = Callbacks::new()
            .with_text(move |s| t.lock().unwrap().push(format!("text:{s}")))
            .with_metadata(move |s| m.lock().unwrap().push(format!("meta:{s}")))
            .with_error(move |s| e.lock().unwrap().push(format!("error:{s}")))
            .with_close(move || c.lock().unwrap().push("close".into()));
        (callbacks, log)
    }

    #[tokio::test]
    async fn full_generation_tracks_sections() {
        let (ctx, state) = context(OperationKind::FullGeneration);
        let (sink, relay) = channel();
        sink.message("info", r#"{"section_id":"s1"}"#).unwrap();
        sink.message("content", "Hel").unwrap();
        sink.message("content", "lo").unwrap();
        sink.message("info", r#"{"section_id":"s2"}"#).unwrap();
        sink.message("content", "!").unwrap();
        sink.close();

        let (callbacks, log) = recording();
        let report = run(ctx, relay, callbacks).await;

        assert_eq!(
            *log.lock().unwrap(),
            ["meta:s1", "text:Hel", "text:lo", "meta:s2", "text:!", "close"]
        );
        assert_eq!(report.outcome, SessionOutcome::Completed);
        assert_eq!(report.text, "Hello!");
        assert_eq!(report.correlation_id.as_deref(), Some("s2"));
        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.sections[0].text, "Hello");
        assert_eq!(*state.borrow(), SessionState::Completed);
    }

    #[tokio::test]
    async fn error_topic_fails_once_and_drops_the_rest() {
        let (ctx, state) = context(OperationKind::ChatTurn);
        let (sink, relay) = channel();
        sink.message("thread_id", "t-9").unwrap();
        sink.message("content", "Hi").unwrap();
        sink.message("error", "rate limited").unwrap();
        let _ = sink.message("content", "ignored");

        let (callbacks, log) = recording();
        let report = run(ctx, relay, callbacks).await;

        assert_eq!(
            *log.lock().unwrap(),
            ["meta:t-9", "text:Hi", "error:rate limited", "close"]
        );
        assert_eq!(report.outcome.error(), Some("rate limited"));
        assert_eq!(*state.borrow(), SessionState::Failed);
    }

    #[tokio::test]
    async fn transport_failure_reports_error_then_close() {
        let (ctx, _state) = context(OperationKind::PromptDraft);
        let (sink, relay) = channel();
        sink.fail("connection reset");

        let (callbacks, log) = recording();
        let report = run(ctx, relay, callbacks).await;
        assert_eq!(*log.lock().unwrap(), ["error:connection reset", "close"]);
        assert!(!report.is_success());
    }

    fn state_at_error(state: &watch::Receiver<SessionState>) -> (Callbacks, Arc<Mutex<Vec<SessionState>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (rx, log) = (state.clone(), seen.clone());
        let callbacks = Callbacks::new().with_error(move |_| log.lock().unwrap().push(*rx.borrow()));
        (callbacks, seen)
    }

    #[tokio::test]
    async fn failure_before_open_skips_streaming() {
        let (ctx, state) = context(OperationKind::ChatTurn);
        let (sink, relay) = channel();
        sink.fail("Authentication error: token expired");

        let (callbacks, seen) = state_at_error(&state);
        let report = run(ctx, relay, callbacks).await;
        assert_eq!(*seen.lock().unwrap(), [SessionState::Idle]);
        assert_eq!(report.outcome.state(), SessionState::Failed);
        assert_eq!(*state.borrow(), SessionState::Failed);
    }

    #[tokio::test]
    async fn failure_after_open_passes_through_streaming() {
        let (ctx, state) = context(OperationKind::ChatTurn);
        let (sink, relay) = channel();
        sink.opened();
        sink.fail("connection reset");

        let (callbacks, seen) = state_at_error(&state);
        run(ctx, relay, callbacks).await;
        assert_eq!(*seen.lock().unwrap(), [SessionState::Streaming]);
        assert_eq!(*state.borrow(), SessionState::Failed);
    }

    #[tokio::test]
    async fn finished_token_is_cancelled_at_the_end() {
        let (ctx, _state) = context(OperationKind::PromptDraft);
        let finished = ctx.finished.clone();
        let (sink, relay) = channel();
        sink.close();

        assert!(!finished.is_cancelled());
        let report = run(ctx, relay, Callbacks::new()).await;
        assert!(report.is_success());
        assert!(finished.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_before_open_goes_straight_to_cancelled() {
        let (ctx, state) = context(OperationKind::SectionRepair);
        let (_sink, relay) = channel();
        ctx.cancel.cancel();

        let (callbacks, log) = recording();
        let report = run(ctx, relay, callbacks).await;
        assert_eq!(*log.lock().unwrap(), ["close"]);
        assert!(report.outcome.is_cancelled());
        assert_eq!(*state.borrow(), SessionState::Cancelled);
    }

    #[tokio::test]
    async fn panicking_callback_still_closes() {
        let (ctx, state) = context(OperationKind::ChatTurn);
        let (sink, relay) = channel();
        sink.message("content", "boom").unwrap();
        sink.close();

        let closes = Arc::new(Mutex::new(0));
        let counter = closes.clone();
        let callbacks = Callbacks::new()
            .with_text(|_| panic!("ui exploded"))
            .with_close(move || *counter.lock().unwrap() += 1);
        let report = run(ctx, relay, callbacks).await;

        assert_eq!(*closes.lock().unwrap(), 1);
        assert!(report.outcome.error().is_some_and(|d| d.contains("ui exploded")));
        assert_eq!(*state.borrow(), SessionState::Failed);
    }
}
