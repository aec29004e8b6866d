//! Utility modules

pub mod cancel;
pub(crate) mod panic;

pub use cancel::{CancelHandle, new_cancel_handle};
