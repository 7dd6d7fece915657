//! Integration tests for ratelimit-gateway
//!
//! These tests drive whole gates against an in-memory counter store with a
//! manual clock, without mocking any component.

pub mod degradation_tests;
pub mod enforcer_tests;
pub mod http_gate_tests;
pub mod websocket_gate_tests;
