//! FCM Provider
//!
//! Firebase Cloud Messaging delivery over the HTTP API with server-key
//! authentication. One call carries every device of a request.

mod client;
mod message;

pub use client::*;
pub use message::*;
