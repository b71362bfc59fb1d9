//! Zone visits library
//!
//! Reverse geofence search over recorded fleet history. Exposes modules for
//! integration testing and binary reuse.

pub mod domain;
pub mod error;
pub mod infra;
pub mod io;
pub mod services;
