//! # SalaryTalk Test Suite
//!
//! Unified test crate for scenarios that cross module boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs      # Offer lifecycle end to end
//!     └── session_flows.rs  # Wallet session transitions and telemetry wiring
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p st-tests
//! cargo test -p st-tests integration::scenarios
//! ```

pub mod integration;
