//! Shared types for portal operations
//!
//! Assets, transfer intents, authorization snapshots, receipts and the
//! outcomes returned by dispatcher operations.

use std::fmt;

use alloy::primitives::{
    utils::{format_units, parse_units},
    Address, B256, U256,
};
use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};

/// Decimals used when the caller does not specify any (native coin and
/// standard tokens)
pub const DEFAULT_DECIMALS: u8 = 18;

// ============================================================================
// Assets
// ============================================================================

/// What is being moved into or out of the rollup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Asset {
    /// Native coin of the base chain
    Native,
    /// ERC20 token
    Fungible { token: Address },
    /// A single ERC721 token
    NonFungible { token: Address, token_id: U256 },
}

impl Asset {
    pub fn fungible(token: Address) -> Self {
        Asset::Fungible { token }
    }

    pub fn non_fungible(token: Address, token_id: U256) -> Self {
        Asset::NonFungible { token, token_id }
    }

    /// Token contract address (None for the native coin)
    pub fn contract_address(&self) -> Option<Address> {
        match self {
            Asset::Native => None,
            Asset::Fungible { token } | Asset::NonFungible { token, .. } => Some(*token),
        }
    }

    /// Token id, only present for non-fungible assets
    pub fn token_id(&self) -> Option<U256> {
        match self {
            Asset::NonFungible { token_id, .. } => Some(*token_id),
            _ => None,
        }
    }

    /// Whether a spender must be authorized before the portal can pull it
    pub fn requires_authorization(&self) -> bool {
        !matches!(self, Asset::Native)
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            Asset::Native => "native",
            Asset::Fungible { .. } => "erc20",
            Asset::NonFungible { .. } => "erc721",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Fungible { token } => write!(f, "erc20:{}", token),
            Asset::NonFungible { token, token_id } => write!(f, "erc721:{}#{}", token, token_id),
        }
    }
}

// ============================================================================
// Intents
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Deposit,
    Withdraw,
}

/// A user request to move an asset across the portal boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    pub asset: Asset,
    /// Human-readable decimal amount; required for native and fungible
    /// assets, ignored for non-fungible ones
    pub amount: Option<String>,
    /// Recipient carried as execution-layer data on native deposits
    pub destination: Option<Address>,
    pub direction: Direction,
}

impl TransferIntent {
    pub fn deposit(asset: Asset, amount: Option<&str>, destination: Option<Address>) -> Self {
        Self {
            asset,
            amount: amount.map(str::to_string),
            destination,
            direction: Direction::Deposit,
        }
    }

    pub fn withdraw(asset: Asset, amount: Option<&str>) -> Self {
        Self {
            asset,
            amount: amount.map(str::to_string),
            destination: None,
            direction: Direction::Withdraw,
        }
    }

    /// The amount, or an encoding error when the asset needs one
    pub fn required_amount(&self) -> Result<&str> {
        self.amount.as_deref().ok_or_else(|| {
            PortalError::encoding(format!(
                "amount required for {} transfer",
                self.asset.kind_str()
            ))
        })
    }
}

// ============================================================================
// Amounts
// ============================================================================

/// Parse a human decimal amount ("1.5") into base units
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(PortalError::encoding("amount is empty"));
    }
    if trimmed.starts_with('-') {
        return Err(PortalError::encoding(format!(
            "amount must not be negative: {}",
            trimmed
        )));
    }

    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.len() > decimals as usize {
            return Err(PortalError::encoding(format!(
                "amount {} has more than {} fractional digits",
                trimmed, decimals
            )));
        }
    }

    let parsed = parse_units(trimmed, decimals)
        .map_err(|e| PortalError::encoding(format!("invalid amount {:?}: {}", trimmed, e)))?;
    Ok(parsed.get_absolute())
}

/// Render base units back as a decimal string
pub fn format_amount(raw: U256, decimals: u8) -> String {
    format_units(raw, decimals).unwrap_or_else(|_| raw.to_string())
}

// ============================================================================
// Authorization
// ============================================================================

/// Current on-chain authorization of a spender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentAuthorization {
    /// ERC20 allowance
    Allowance(U256),
    /// ERC721 per-token approved operator
    ApprovedOperator(Address),
}

/// Snapshot of what a spender may currently move on behalf of an owner.
/// Always read fresh before a deposit, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationState {
    pub owner: Address,
    pub spender: Address,
    pub asset: Asset,
    pub current: CurrentAuthorization,
}

impl AuthorizationState {
    /// Whether the snapshot already covers `required` base units (fungible)
    /// or the spender is the approved operator (non-fungible)
    pub fn covers(&self, required: U256) -> bool {
        match self.current {
            CurrentAuthorization::Allowance(allowance) => required <= allowance,
            CurrentAuthorization::ApprovedOperator(operator) => operator == self.spender,
        }
    }
}

/// Decoded `Approval` event emitted by a token contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    /// Allowance for ERC20, token id for ERC721
    pub value: U256,
    pub block_hash: B256,
    pub tx_hash: B256,
    pub log_index: u64,
}

// ============================================================================
// Submissions
// ============================================================================

/// Mined transaction summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_hash: B256,
    pub block_number: u64,
    pub success: bool,
}

/// How long a dispatcher operation waits after sending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// Return as soon as the node accepted the transaction
    #[default]
    FireAndForget,
    /// Wait for one confirmation and fail on revert
    Confirmed,
}

impl std::str::FromStr for SubmitMode {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submit" | "fire_and_forget" | "fire-and-forget" => Ok(SubmitMode::FireAndForget),
            "confirm" | "confirmed" => Ok(SubmitMode::Confirmed),
            other => Err(PortalError::encoding(format!("unknown submit mode: {}", other))),
        }
    }
}

/// A base-chain transaction accepted by the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub tx_hash: B256,
    /// Present only in [`SubmitMode::Confirmed`]
    pub receipt: Option<TxReceipt>,
}

/// Result of a dispatcher operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No signer was available; nothing was sent
    Skipped { reason: String },
    Submitted(Submission),
}

impl DispatchOutcome {
    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            DispatchOutcome::Skipped { .. } => None,
            DispatchOutcome::Submitted(s) => Some(s.tx_hash),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, DispatchOutcome::Skipped { .. })
    }
}
