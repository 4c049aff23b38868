//! # Adapters Module
//!
//! In-process implementations of the outbound ports.

pub mod fhe_gateway;
pub mod in_memory_ledger;

pub use fhe_gateway::{
    decryption_proof, handle_for, input_proof, DecryptionFault, SimulatedFheGateway,
};
pub use in_memory_ledger::{InMemoryLedger, MatchRule, WriteFault, IN_MEMORY_CONTRACT};
