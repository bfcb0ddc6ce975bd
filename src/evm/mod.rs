//! EVM Chain Support Module
//!
//! ## Submodules
//!
//! - `client` - alloy-backed [`crate::chain::RollupChain`] implementation
//! - `contracts` - portal, input box, relay and token bindings using alloy sol! macro
//! - `events` - Approval event parsing

pub mod client;
pub mod contracts;
pub mod events;

// Re-export commonly used items
pub use client::{EvmRollupChain, ReceiptPolling};
pub use contracts::{
    DAppAddressRelay, ERC20Portal, ERC721Portal, EtherPortal, InputBox, ERC20, ERC721,
};
pub use events::{approval_topic, parse_approval_log};
