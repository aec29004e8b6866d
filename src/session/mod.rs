//! Generation Session
//!
//! Interprets a relay's envelopes for one operation kind and turns them into
//! `on_text` / `on_metadata` / `on_error` / `on_close` callbacks.
//!
//! Guarantees per session: callbacks follow server order, `on_error` fires at
//! most once, `on_close` fires exactly once and last, and caller cancellation
//! never produces `on_error`.

mod callbacks;
mod handle;
pub mod interpreter;
mod runner;
mod state;

pub use callbacks::{Callbacks, GenerationCallbacks};
pub use handle::{GenerationSession, SessionHandle};
pub use state::{SectionText, SessionOutcome, SessionReport, SessionState};
