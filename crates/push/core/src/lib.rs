//! Push Core Types
//!
//! Requests, per-device outcomes and aggregated results shared by the
//! dispatch engine and the provider crates.

mod error;
mod outcome;
mod request;

pub use error::*;
pub use outcome::*;
pub use request::*;
