//! Common test utilities for sumo-shipper integration tests

#[allow(dead_code)]
pub mod assertions;

#[allow(unused_imports)]
pub use assertions::*;
