//! # Application Module
//!
//! The negotiation engine and the state it owns.

pub mod id_gen;
pub mod repository;
pub mod service;
pub mod session;
pub mod tracker;

pub use id_gen::OfferIdGenerator;
pub use repository::OfferRepository;
pub use service::*;
pub use session::{SessionContext, SessionState};
pub use tracker::TransactionTracker;
