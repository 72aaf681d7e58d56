//! Shared Types

mod message;

pub use message::*;
