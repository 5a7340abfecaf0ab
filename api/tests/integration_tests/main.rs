//! Integration tests for the Popstream API.
//!
//! These tests drive the full router with scripted providers: refresh
//! cycles are run by hand, then REST and WebSocket clients observe the
//! results.

mod common;
mod demographics_tests;
mod health_tests;
mod realtime_tests;
