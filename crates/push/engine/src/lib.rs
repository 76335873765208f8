//! Push Dispatch Engine
//!
//! Bounded admission, a fixed sender pool, batch fan-out and per-request
//! result aggregation, shared by every provider.

pub mod channel;

mod aggregate;
mod config;
mod dispatch;
mod pool;
mod service;
mod split;
mod traits;

pub use aggregate::*;
pub use config::*;
pub use dispatch::*;
pub use pool::*;
pub use service::*;
pub use split::*;
pub use traits::*;
