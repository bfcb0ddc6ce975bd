//! Chain capability consumed by the orchestrator
//!
//! Everything the orchestration logic needs from the base chain: the active
//! signer, token state reads, approval event queries and the portal, input
//! box and relay calls. Contract addresses are resolved by the caller and
//! passed in; implementations stay stateless with respect to them.
//!
//! [`crate::evm::EvmRollupChain`] is the alloy-backed implementation.

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ApprovalEvent, TxReceipt};

#[async_trait]
pub trait RollupChain: Send + Sync {
    /// Address of the signing account, `None` when the capability is read-only
    fn signer_address(&self) -> Option<Address>;

    // =========================================================================
    // Token State
    // =========================================================================

    /// ERC20 `allowance(owner, spender)`
    async fn erc20_allowance(&self, token: Address, owner: Address, spender: Address)
        -> Result<U256>;

    /// ERC721 `getApproved(tokenId)`
    async fn erc721_approved(&self, token: Address, token_id: U256) -> Result<Address>;

    /// Decoded `Approval` logs emitted by `token` in the block with `block_hash`,
    /// in log order
    async fn approval_events(&self, token: Address, block_hash: B256)
        -> Result<Vec<ApprovalEvent>>;

    // =========================================================================
    // Transactions
    // =========================================================================

    /// ERC20 `approve(spender, amount)`
    async fn erc20_approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256>;

    /// ERC721 `approve(spender, tokenId)`
    async fn erc721_approve(&self, token: Address, spender: Address, token_id: U256)
        -> Result<B256>;

    /// Ether portal `depositEther(dapp, execLayerData)` carrying `value`
    async fn deposit_ether(
        &self,
        portal: Address,
        dapp: Address,
        value: U256,
        exec_layer_data: Bytes,
    ) -> Result<B256>;

    /// ERC20 portal `depositERC20Tokens(token, dapp, amount, execLayerData)`
    async fn deposit_erc20(
        &self,
        portal: Address,
        token: Address,
        dapp: Address,
        amount: U256,
        exec_layer_data: Bytes,
    ) -> Result<B256>;

    /// ERC721 portal `depositERC721Token(token, dapp, tokenId, baseLayerData, execLayerData)`
    #[allow(clippy::too_many_arguments)]
    async fn deposit_erc721(
        &self,
        portal: Address,
        token: Address,
        dapp: Address,
        token_id: U256,
        base_layer_data: Bytes,
        exec_layer_data: Bytes,
    ) -> Result<B256>;

    /// Input box `addInput(dapp, input)`
    async fn add_input(&self, input_box: Address, dapp: Address, input: Bytes) -> Result<B256>;

    /// Relay `relayDAppAddress(dapp)`
    async fn relay_dapp_address(&self, relay: Address, dapp: Address) -> Result<B256>;

    /// Wait until the transaction has `confirmations` confirmations
    async fn wait_for_receipt(&self, tx_hash: B256, confirmations: u64) -> Result<TxReceipt>;
}
