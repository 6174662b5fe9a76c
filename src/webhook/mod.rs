//! Inbound webhook handling
//!
//! - `signature`: authenticates the raw delivery body
//! - `event`: parses the feed-item payload and classifies its source
//! - `error`: signature and payload error types

pub mod error;
pub mod event;
pub mod signature;

pub use error::{ParseError, SignatureError};
pub use event::{Direction, EventSource, NotificationEvent, classify};
pub use signature::{SIGNATURE_HEADER, SignatureVerifier};
