//! Test utilities and mock implementations
//!
//! Compiled into the library so integration tests under `tests/` can share
//! the same mocks as the unit tests.

pub mod mocks;
