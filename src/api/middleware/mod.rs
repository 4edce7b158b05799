//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Rate limiter: reject early, save resources
//! 2. Request log: method, path, status and latency per request

pub mod access_log;
pub mod rate;
