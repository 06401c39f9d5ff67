//! Integration test utilities for the relay
//!
//! This crate provides helpers for running end-to-end tests against
//! a relay bound to a loopback port.

pub mod helpers;

pub use helpers::*;
