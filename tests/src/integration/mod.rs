//! Cross-module integration tests.

pub mod scenarios;
pub mod session_flows;
