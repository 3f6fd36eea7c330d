//! Database models for persistent storage.

mod event;
mod source;

pub use event::*;
pub use source::*;
