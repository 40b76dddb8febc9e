//! Test utilities for Tessera services.
//!
//! Import from test code only, never from production code.

pub mod auth;
