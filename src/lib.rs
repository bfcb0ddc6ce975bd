//! Rollup-Portal: Deposit and Input Orchestration for Rollup Portals
//!
//! This crate moves assets and requests from a base chain into a rollup
//! through its portal contracts:
//!
//! - **Codec** - Withdrawal JSON, raw transaction byte packing, deposit notes
//! - **Authorization** - ERC20 allowance / ERC721 approval resolution before deposits
//! - **Confirmation** - Approval confirmation from emitted events, not receipts alone
//! - **Portal** - Deposit, withdrawal and raw transaction dispatch
//! - **Relay** - One-shot rollup address relay gate
//! - **EVM Module** - alloy-backed chain client and contract bindings
//! - **Testing Module** - In-memory chain for orchestration tests
//!
//! ## Feature Flags
//!
//! - `evm` - Enable the alloy-backed chain client (default)
//! - `testing` - Enable the in-memory chain outside of unit tests
//! - `full` - Enable all features

// Core modules (always available)
pub mod authorization;
pub mod chain;
pub mod codec;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod portal;
pub mod relay;
pub mod types;

// Chain-specific modules (feature-gated)
#[cfg(feature = "evm")]
pub mod evm;

// Testing utilities (feature-gated)
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used items at the crate root
pub use authorization::{ensure_authorized, read_authorization, AuthorizationOutcome};
pub use chain::RollupChain;
pub use codec::{
    decode_withdrawal, encode_note, encode_raw_transaction, encode_withdrawal,
    erc20_deposit_note, erc721_deposit_note, split_raw_transaction, WithdrawalRequest,
};
pub use config::Config;
pub use confirmation::confirm_approval;
pub use error::{PortalError, Result};
pub use portal::{PortalAddresses, PortalClient};
pub use relay::{RelayGate, RelayOutcome};
pub use types::{
    format_amount, parse_amount, ApprovalEvent, Asset, AuthorizationState,
    CurrentAuthorization, Direction, DispatchOutcome, Submission, SubmitMode, TransferIntent,
    TxReceipt, DEFAULT_DECIMALS,
};
