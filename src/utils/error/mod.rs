//! Error handling for the rate-limiting gateway
//!
//! This module defines the error types used throughout the gateway and their
//! mapping onto HTTP responses.

#![allow(missing_docs)]

mod helpers;
mod response;
mod types;

pub use response::{ErrorDetail, ErrorResponse};
pub use types::{GatewayError, Result};
