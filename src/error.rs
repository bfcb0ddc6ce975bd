//! Error types for portal orchestration
//!
//! Every operation surfaces exactly one of these kinds at its boundary.
//! Nothing is retried internally; callers re-invoke the idempotent operations.

use alloy::primitives::{Address, B256};
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, PortalError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    // ========================================================================
    // Precondition Errors
    // ========================================================================
    /// No signer is attached to the chain capability.
    ///
    /// Dispatcher operations turn this into a skipped outcome instead of
    /// failing; lower-level helpers return it as-is.
    #[error("Precondition not met: {0}")]
    Precondition(String),

    // ========================================================================
    // Codec Errors
    // ========================================================================
    #[error("Encoding error: {0}")]
    Encoding(String),

    // ========================================================================
    // Chain Errors
    // ========================================================================
    /// Submission, RPC or on-chain revert failure
    #[error("Transaction error during {action}: {reason}")]
    Transaction {
        action: &'static str,
        reason: String,
    },

    /// Approval transaction was mined but no matching Approval event exists
    /// in its block
    #[error(
        "Approval not confirmed: token {token} spender {spender} (tx: {tx_hash}, block: {block_hash})"
    )]
    ApprovalNotConfirmed {
        token: Address,
        spender: Address,
        tx_hash: B256,
        block_hash: B256,
    },
}

impl PortalError {
    pub fn encoding(reason: impl Into<String>) -> Self {
        PortalError::Encoding(reason.into())
    }

    pub fn transaction(action: &'static str, reason: impl ToString) -> Self {
        PortalError::Transaction {
            action,
            reason: reason.to_string(),
        }
    }

    /// True for the no-signer case, which callers treat as a no-op
    pub fn is_precondition(&self) -> bool {
        matches!(self, PortalError::Precondition(_))
    }

    /// Short machine-friendly name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            PortalError::Precondition(_) => "precondition",
            PortalError::Encoding(_) => "encoding",
            PortalError::Transaction { .. } => "transaction",
            PortalError::ApprovalNotConfirmed { .. } => "approval_not_confirmed",
        }
    }
}

impl From<hex::FromHexError> for PortalError {
    fn from(err: hex::FromHexError) -> Self {
        PortalError::Encoding(format!("invalid hex: {}", err))
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        PortalError::Encoding(format!("invalid payload json: {}", err))
    }
}
