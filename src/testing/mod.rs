//! Testing Utilities Module
//!
//! Helpers for exercising the orchestrator without a node.
//!
//! ## Submodules
//!
//! - `mock_chain` - In-memory [`crate::chain::RollupChain`] with failure injection

pub mod mock_chain;

// Re-export commonly used items
pub use mock_chain::*;
