//! HTTP surface for the PDF question-answering service.
//!
//! The binary wires configuration, startup loading and the router; all of
//! it lives here so the router can be driven from integration tests.

pub mod api;
pub mod cli;
pub mod router;
pub mod startup;
pub mod state;

pub use router::build_router;
pub use state::{AppState, ChunkStore, LoadedDocument};
