//! Push Gateway Server
//!
//! Configuration and result reporting for the `push-gateway` binary.

pub mod config;
pub mod report;
