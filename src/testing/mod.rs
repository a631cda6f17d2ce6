//! Shared fixtures and fake samplers for unit, integration and bench code.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
