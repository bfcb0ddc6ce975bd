//! Confirmation Watcher
//!
//! A mined receipt only proves the approval did not revert. The typed proof
//! that the spender is authorized is the `Approval` event in the mined
//! block, so that is what the resolver trusts before letting a deposit go
//! out.

use alloy::primitives::{Address, B256};
use tracing::{debug, warn};

use crate::chain::RollupChain;
use crate::error::Result;
use crate::types::{ApprovalEvent, Asset};

/// Look up the approval `owner` granted `spender` for `asset` in the block
/// with `block_hash`
///
/// Non-fungible approvals must also carry the asset's token id. When several
/// events match, the one with the highest log index wins. `Ok(None)` means
/// no matching event exists in that block; the caller decides whether that
/// is fatal.
pub async fn confirm_approval<C: RollupChain + ?Sized>(
    chain: &C,
    asset: &Asset,
    owner: Address,
    spender: Address,
    block_hash: B256,
) -> Result<Option<ApprovalEvent>> {
    let Some(token) = asset.contract_address() else {
        return Ok(None);
    };

    let events = chain.approval_events(token, block_hash).await?;
    let found = events
        .into_iter()
        .filter(|e| e.token == token && e.owner == owner && e.spender == spender)
        .filter(|e| asset.token_id().map_or(true, |id| e.value == id))
        .max_by_key(|e| e.log_index);

    match &found {
        Some(event) => debug!(
            token = %token,
            spender = %spender,
            value = %event.value,
            tx_hash = %event.tx_hash,
            "Approval confirmed by event"
        ),
        None => warn!(
            token = %token,
            owner = %owner,
            spender = %spender,
            block_hash = %block_hash,
            "No approval event found in block"
        ),
    }

    Ok(found)
}
