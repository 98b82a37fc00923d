//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Why a manual mock instead of mockall?
//! - The repository contract includes soft-delete visibility rules that a
//!   stateful fake expresses more directly than per-call expectations
//! - The same fake backs both service tests and HTTP tests through the
//!   generic `AppState`

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
