//! WhatsApp Mirror Common Library
//!
//! Message model and real-time protocol shared by the server and browser clients.

pub mod error;
pub mod protocol;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
