//! Process-wide tracing setup shared by the binaries and integration tests.

pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
