//! Core functionality for the Gateway
//!
//! This module contains the rate limiting engine: policy resolution, the
//! decision function, the shared key namespace and overload detection.

pub mod rate_limiter;
