//! # Algorithms Module
//!
//! Pure, order-preserving derivations over an offer snapshot.

pub mod display;
pub mod filter;
pub mod stats;

pub use display::{
    build_dashboard, employer_offer_display, history_outcome, short_identity, DashboardView,
    ENCRYPTED_PLACEHOLDER,
};
pub use filter::{filter_offers, offer_matches, FilterState};
pub use stats::{compute_history, compute_stats};
