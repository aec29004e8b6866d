//! Caller callbacks and the exactly-once lifecycle around them.

/// Lifecycle callbacks of a generation session.
///
/// Every method has a no-op default, so an operation implements only the
/// subset it cares about. Within one session, calls arrive in server order;
/// `on_error` fires at most once, `on_close` exactly once and last.
pub trait GenerationCallbacks: Send + 'static {
    /// A text fragment to append.
    fn on_text(&mut self, _fragment: &str) {}

    /// A correlation id: the section producing the following text (full
    /// generation) or the chat thread id (chat turn).
    fn on_metadata(&mut self, _id: &str) {}

    /// The session failed. Never called for caller cancellation.
    fn on_error(&mut self, _description: &str) {}

    /// The session is over; release loading state here.
    fn on_close(&mut self) {}
}

impl<C: GenerationCallbacks + ?Sized> GenerationCallbacks for Box<C> {
    fn on_text(&mut self, fragment: &str) {
        (**self).on_text(fragment)
    }

    fn on_metadata(&mut self, id: &str) {
        (**self).on_metadata(id)
    }

    fn on_error(&mut self, description: &str) {
        (**self).on_error(description)
    }

    fn on_close(&mut self) {
        (**self).on_close()
    }
}

type StrFn = Box<dyn FnMut(&str) + Send>;
type CloseFn = Box<dyn FnMut() + Send>;

/// Closure-based callbacks.
///
/// ```rust,ignore
/// let callbacks = Callbacks::new()
///     .with_text(|fragment| buffer.push_str(fragment))
///     .with_close(|| spinner.stop());
/// ```
#[derive(Default)]
pub struct Callbacks {
    text: Option<StrFn>,
    metadata: Option<StrFn>,
    error: Option<StrFn>,
    close: Option<CloseFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.text = Some(Box::new(f));
        self
    }

    pub fn with_metadata(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.metadata = Some(Box::new(f));
        self
    }

    pub fn with_error(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    pub fn with_close(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.close = Some(Box::new(f));
        self
    }
}

impl GenerationCallbacks for Callbacks {
    fn on_text(&mut self, fragment: &str) {
        if let Some(f) = self.text.as_mut() {
            f(fragment);
        }
    }

    fn on_metadata(&mut self, id: &str) {
        if let Some(f) = self.metadata.as_mut() {
            f(id);
        }
    }

    fn on_error(&mut self, description: &str) {
        if let Some(f) = self.error.as_mut() {
            f(description);
        }
    }

    fn on_close(&mut self) {
        if let Some(f) = self.close.as_mut() {
            f();
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_text", &self.text.is_some())
            .field("on_metadata", &self.metadata.is_some())
            .field("on_error", &self.error.is_some())
            .field("on_close", &self.close.is_some())
            .finish()
    }
}

/// Enforces callback ordering: nothing after an error but the close, and
/// nothing at all after the close.
pub(crate) struct Lifecycle<C> {
    callbacks: C,
    errored: bool,
    closed: bool,
}

impl<C: GenerationCallbacks> Lifecycle<C> {
    pub(crate) fn new(callbacks: C) -> Self {
        Self {
            callbacks,
            errored: false,
            closed: false,
        }
    }

    fn accepting(&self) -> bool {
        !self.errored && !self.closed
    }

    pub(crate) fn text(&mut self, fragment: &str) {
        if self.accepting() {
            self.callbacks.on_text(fragment);
        }
    }

    pub(crate) fn metadata(&mut self, id: &str) {
        if self.accepting() {
            self.callbacks.on_metadata(id);
        }
    }

    pub(crate) fn error(&mut self, description: &str) {
        if self.accepting() {
            self.errored = true;
            self.callbacks.on_error(description);
        }
    }

    pub(crate) fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.callbacks.on_close();
        }
    }
}
