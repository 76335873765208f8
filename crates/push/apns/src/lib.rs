//! APNs Provider
//!
//! Certificate-authenticated delivery to Apple Push Notification service
//! using the a2 crate, one HTTP/2 request per device.

mod client;
mod error;
mod message;

pub use client::*;
pub use error::*;
pub use message::*;
