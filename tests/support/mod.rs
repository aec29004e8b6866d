#![allow(dead_code)]

use async_trait::async_trait;
use docgen_relay::prelude::CancelHandle;
use docgen_relay::{EventSink, EventSource, GenerationCallbacks, StreamRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Text(String),
    Metadata(String),
    Error(String),
    Close,
}

/// Callbacks that record every call in order.
///
/// Closes are also counted in an atomic so the count survives a panicking
/// callback poisoning the mutex.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    closes: Arc<AtomicUsize>,
    panic_on_text: bool,
    cancel_on_text: Option<Arc<OnceLock<CancelHandle>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panicking_on_text() -> Self {
        Self {
            panic_on_text: true,
            ..Self::default()
        }
    }

    /// Cancels through `slot` as soon as the first fragment has been recorded.
    pub fn cancelling_on_text(slot: Arc<OnceLock<CancelHandle>>) -> Self {
        Self {
            cancel_on_text: Some(slot),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Error(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    pub fn text(&self) -> String {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl GenerationCallbacks for Recorder {
    fn on_text(&mut self, fragment: &str) {
        if self.panic_on_text {
            panic!("renderer crashed on {fragment:?}");
        }
        self.push(Call::Text(fragment.to_string()));
        if let Some(handle) = self.cancel_on_text.as_ref().and_then(|slot| slot.get()) {
            handle.cancel();
        }
    }

    fn on_metadata(&mut self, id: &str) {
        self.push(Call::Metadata(id.to_string()));
    }

    fn on_error(&mut self, description: &str) {
        self.push(Call::Error(description.to_string()));
    }

    fn on_close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.push(Call::Close);
    }
}

#[derive(Debug, Clone)]
pub enum Step {
    Open,
    Message(String, String),
    Pause(Duration),
    Fail(String),
    Close,
    HangUntilCancel,
}

pub fn msg(topic: &str, payload: &str) -> Step {
    Step::Message(topic.to_string(), payload.to_string())
}

/// Event source replaying a fixed script, recording the requests it got.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    steps: Vec<Step>,
    requests: Arc<Mutex<Vec<StreamRequest>>>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn connect(&self, request: StreamRequest, sink: EventSink, cancel: CancellationToken) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        for step in self.steps.clone() {
            match step {
                Step::Open => sink.opened(),
                Step::Message(topic, payload) => {
                    if sink.message(topic, payload).is_err() {
                        return;
                    }
                }
                Step::Pause(duration) => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            sink.fail("request cancelled");
                            return;
                        }
                        _ = tokio::time::sleep(duration) => {}
                    }
                }
                Step::Fail(description) => {
                    sink.fail(description);
                    return;
                }
                Step::Close => {
                    sink.close();
                    return;
                }
                Step::HangUntilCancel => {
                    sink.opened();
                    cancel.cancelled().await;
                    sink.fail("request cancelled");
                    return;
                }
            }
        }
        sink.close();
    }
}
