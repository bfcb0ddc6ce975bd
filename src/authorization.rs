//! Allowance/Approval Resolver
//!
//! Makes sure a portal may pull an asset before the deposit is sent:
//!
//! 1. Read the current allowance (ERC20) or approved operator (ERC721)
//! 2. If it already covers the deposit, do nothing
//! 3. Otherwise approve exactly what is needed and wait for one confirmation
//! 4. Confirm the approval through its `Approval` event in the mined block
//!
//! ERC20 approvals are raised to the deposit amount, never to an unlimited
//! value. The call is idempotent: once an approval has landed, repeating it
//! is a no-op.

use alloy::primitives::{Address, U256};
use tracing::{debug, info, warn};

use crate::chain::RollupChain;
use crate::confirmation::confirm_approval;
use crate::error::{PortalError, Result};
use crate::types::{ApprovalEvent, Asset, AuthorizationState, CurrentAuthorization, TxReceipt};

/// Confirmations awaited on an approval before checking its event
pub const APPROVAL_CONFIRMATIONS: u64 = 1;

/// What [`ensure_authorized`] had to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// No signer was available; nothing was read or sent
    Skipped { reason: String },
    /// The asset moves without a spender authorization (native coin)
    NotRequired,
    /// Existing on-chain authorization already covers the deposit
    AlreadyAuthorized(AuthorizationState),
    /// An approval was mined and confirmed by its event
    Approved {
        receipt: TxReceipt,
        event: ApprovalEvent,
    },
}

impl AuthorizationOutcome {
    /// Whether an approval transaction was sent
    pub fn submitted_approval(&self) -> bool {
        matches!(self, AuthorizationOutcome::Approved { .. })
    }
}

/// Read what `spender` may currently move for `owner`
///
/// Returns `Ok(None)` for the native coin.
pub async fn read_authorization<C: RollupChain + ?Sized>(
    chain: &C,
    asset: &Asset,
    owner: Address,
    spender: Address,
) -> Result<Option<AuthorizationState>> {
    let current = match *asset {
        Asset::Native => return Ok(None),
        Asset::Fungible { token } => {
            CurrentAuthorization::Allowance(chain.erc20_allowance(token, owner, spender).await?)
        }
        Asset::NonFungible { token, token_id } => {
            CurrentAuthorization::ApprovedOperator(chain.erc721_approved(token, token_id).await?)
        }
    };

    Ok(Some(AuthorizationState {
        owner,
        spender,
        asset: *asset,
        current,
    }))
}

/// Ensure `spender` may pull `amount` base units of `asset` from `owner`
///
/// `amount` is ignored for non-fungible assets. An approval that is mined
/// without a matching event fails with [`PortalError::ApprovalNotConfirmed`]
/// and the caller must not deposit.
pub async fn ensure_authorized<C: RollupChain + ?Sized>(
    chain: &C,
    asset: &Asset,
    owner: Address,
    spender: Address,
    amount: U256,
) -> Result<AuthorizationOutcome> {
    let Some(state) = read_authorization(chain, asset, owner, spender).await? else {
        return Ok(AuthorizationOutcome::NotRequired);
    };

    if state.covers(amount) {
        debug!(
            asset = %asset,
            spender = %spender,
            current = ?state.current,
            "Spender already authorized"
        );
        return Ok(AuthorizationOutcome::AlreadyAuthorized(state));
    }

    let (token, tx_hash) = match *asset {
        Asset::Fungible { token } => {
            info!(
                token = %token,
                spender = %spender,
                amount = %amount,
                current = ?state.current,
                "Submitting ERC20 approval"
            );
            (token, chain.erc20_approve(token, spender, amount).await?)
        }
        Asset::NonFungible { token, token_id } => {
            info!(
                token = %token,
                spender = %spender,
                token_id = %token_id,
                "Submitting ERC721 approval"
            );
            (token, chain.erc721_approve(token, spender, token_id).await?)
        }
        Asset::Native => return Ok(AuthorizationOutcome::NotRequired),
    };

    let receipt = chain
        .wait_for_receipt(tx_hash, APPROVAL_CONFIRMATIONS)
        .await?;
    if !receipt.success {
        return Err(PortalError::transaction(
            "approve",
            format!("approval transaction {} reverted", tx_hash),
        ));
    }

    let Some(event) = confirm_approval(chain, asset, owner, spender, receipt.block_hash).await?
    else {
        warn!(
            token = %token,
            spender = %spender,
            tx_hash = %tx_hash,
            "Approval mined but not observable, refusing to deposit"
        );
        return Err(PortalError::ApprovalNotConfirmed {
            token,
            spender,
            tx_hash,
            block_hash: receipt.block_hash,
        });
    };

    info!(
        token = %token,
        spender = %spender,
        tx_hash = %tx_hash,
        block = receipt.block_number,
        "Approval confirmed"
    );

    Ok(AuthorizationOutcome::Approved { receipt, event })
}
