//! In-memory Rollup Chain
//!
//! A [`RollupChain`] that records every submitted transaction, applies
//! approvals to its own token state, and emits Approval events into the
//! block of the mined approval. Failures can be injected per action name
//! (the same names the EVM client uses in its transaction errors).

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::chain::RollupChain;
use crate::error::{PortalError, Result};
use crate::types::{ApprovalEvent, TxReceipt};

/// A transaction the mock accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentTx {
    Erc20Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    Erc721Approve {
        token: Address,
        spender: Address,
        token_id: U256,
    },
    DepositEther {
        portal: Address,
        dapp: Address,
        value: U256,
        exec_layer_data: Bytes,
    },
    DepositErc20 {
        portal: Address,
        token: Address,
        dapp: Address,
        amount: U256,
        exec_layer_data: Bytes,
    },
    DepositErc721 {
        portal: Address,
        token: Address,
        dapp: Address,
        token_id: U256,
        base_layer_data: Bytes,
        exec_layer_data: Bytes,
    },
    AddInput {
        input_box: Address,
        dapp: Address,
        input: Bytes,
    },
    RelayDAppAddress {
        relay: Address,
        dapp: Address,
    },
}

impl SentTx {
    pub fn is_approval(&self) -> bool {
        matches!(self, SentTx::Erc20Approve { .. } | SentTx::Erc721Approve { .. })
    }
}

#[derive(Default)]
struct MockState {
    /// (token, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    /// (token, token_id) -> approved operator
    approved: HashMap<(Address, U256), Address>,
    /// block hash -> approval events in log order
    logs: HashMap<B256, Vec<ApprovalEvent>>,
    receipts: HashMap<B256, TxReceipt>,
    sent: Vec<SentTx>,
    failing: HashSet<&'static str>,
    suppress_approval_events: bool,
    revert_all: bool,
    next_block: u64,
}

/// In-memory chain for orchestration tests
pub struct MockRollupChain {
    signer: Option<Address>,
    state: Mutex<MockState>,
}

impl MockRollupChain {
    /// Mock with `signer` as the active account
    pub fn new(signer: Address) -> Self {
        Self {
            signer: Some(signer),
            state: Mutex::new(MockState {
                next_block: 1,
                ..Default::default()
            }),
        }
    }

    /// Mock without a signer (read-only wallet)
    pub fn read_only() -> Self {
        Self {
            signer: None,
            state: Mutex::new(MockState {
                next_block: 1,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // Setup
    // =========================================================================

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state()
            .allowances
            .insert((token, owner, spender), amount);
    }

    pub fn set_approved(&self, token: Address, token_id: U256, operator: Address) {
        self.state().approved.insert((token, token_id), operator);
    }

    /// Mined approvals stop emitting Approval events (reorg-like behavior)
    pub fn suppress_approval_events(&self) {
        self.state().suppress_approval_events = true;
    }

    /// Every following transaction is mined with a failed status
    pub fn revert_all(&self) {
        self.state().revert_all = true;
    }

    /// Make `action` fail with a transaction error until cleared
    pub fn fail_action(&self, action: &'static str) {
        self.state().failing.insert(action);
    }

    pub fn clear_failure(&self, action: &'static str) {
        self.state().failing.remove(action);
    }

    /// Add an arbitrary event to a block
    pub fn push_approval_event(&self, event: ApprovalEvent) {
        self.state()
            .logs
            .entry(event.block_hash)
            .or_default()
            .push(event);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn sent(&self) -> Vec<SentTx> {
        self.state().sent.clone()
    }

    pub fn approvals_sent(&self) -> usize {
        self.state().sent.iter().filter(|tx| tx.is_approval()).count()
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check(&self, action: &'static str) -> Result<()> {
        if self.state().failing.contains(action) {
            return Err(PortalError::transaction(action, "injected failure"));
        }
        Ok(())
    }

    fn require_signer(&self) -> Result<Address> {
        self.signer
            .ok_or_else(|| PortalError::Precondition("no signer configured".to_string()))
    }

    /// Mine `tx` in its own block and return its hash and receipt
    fn mine(&self, tx: SentTx) -> (B256, TxReceipt) {
        let mut state = self.state();
        let block_number = state.next_block;
        state.next_block += 1;

        let tx_hash = B256::from(U256::from(block_number).to_be_bytes::<32>());
        let block_hash = B256::from(U256::from(1_000_000 + block_number).to_be_bytes::<32>());
        let receipt = TxReceipt {
            tx_hash,
            block_hash,
            block_number,
            success: !state.revert_all,
        };

        state.sent.push(tx);
        state.receipts.insert(tx_hash, receipt);
        (tx_hash, receipt)
    }

    fn record_approval(&self, event: ApprovalEvent) {
        let mut state = self.state();
        if state.suppress_approval_events {
            return;
        }
        state.logs.entry(event.block_hash).or_default().push(event);
    }
}

#[async_trait]
impl RollupChain for MockRollupChain {
    fn signer_address(&self) -> Option<Address> {
        self.signer
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        self.check("allowance")?;
        Ok(self.allowance(token, owner, spender))
    }

    async fn erc721_approved(&self, token: Address, token_id: U256) -> Result<Address> {
        self.check("getApproved")?;
        Ok(self
            .state()
            .approved
            .get(&(token, token_id))
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn approval_events(
        &self,
        token: Address,
        block_hash: B256,
    ) -> Result<Vec<ApprovalEvent>> {
        self.check("getLogs")?;
        Ok(self
            .state()
            .logs
            .get(&block_hash)
            .map(|events| events.iter().filter(|e| e.token == token).copied().collect())
            .unwrap_or_default())
    }

    async fn erc20_approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256> {
        let owner = self.require_signer()?;
        self.check("approve")?;

        let (tx_hash, receipt) = self.mine(SentTx::Erc20Approve {
            token,
            spender,
            amount,
        });
        if receipt.success {
            self.set_allowance(token, owner, spender, amount);
            self.record_approval(ApprovalEvent {
                token,
                owner,
                spender,
                value: amount,
                block_hash: receipt.block_hash,
                tx_hash,
                log_index: 0,
            });
        }
        Ok(tx_hash)
    }

    async fn erc721_approve(
        &self,
        token: Address,
        spender: Address,
        token_id: U256,
    ) -> Result<B256> {
        let owner = self.require_signer()?;
        self.check("approve")?;

        let (tx_hash, receipt) = self.mine(SentTx::Erc721Approve {
            token,
            spender,
            token_id,
        });
        if receipt.success {
            self.set_approved(token, token_id, spender);
            self.record_approval(ApprovalEvent {
                token,
                owner,
                spender,
                value: token_id,
                block_hash: receipt.block_hash,
                tx_hash,
                log_index: 0,
            });
        }
        Ok(tx_hash)
    }

    async fn deposit_ether(
        &self,
        portal: Address,
        dapp: Address,
        value: U256,
        exec_layer_data: Bytes,
    ) -> Result<B256> {
        self.require_signer()?;
        self.check("depositEther")?;
        Ok(self
            .mine(SentTx::DepositEther {
                portal,
                dapp,
                value,
                exec_layer_data,
            })
            .0)
    }

    async fn deposit_erc20(
        &self,
        portal: Address,
        token: Address,
        dapp: Address,
        amount: U256,
        exec_layer_data: Bytes,
    ) -> Result<B256> {
        self.require_signer()?;
        self.check("depositERC20Tokens")?;
        Ok(self
            .mine(SentTx::DepositErc20 {
                portal,
                token,
                dapp,
                amount,
                exec_layer_data,
            })
            .0)
    }

    async fn deposit_erc721(
        &self,
        portal: Address,
        token: Address,
        dapp: Address,
        token_id: U256,
        base_layer_data: Bytes,
        exec_layer_data: Bytes,
    ) -> Result<B256> {
        self.require_signer()?;
        self.check("depositERC721Token")?;
        Ok(self
            .mine(SentTx::DepositErc721 {
                portal,
                token,
                dapp,
                token_id,
                base_layer_data,
                exec_layer_data,
            })
            .0)
    }

    async fn add_input(&self, input_box: Address, dapp: Address, input: Bytes) -> Result<B256> {
        self.require_signer()?;
        self.check("addInput")?;
        Ok(self
            .mine(SentTx::AddInput {
                input_box,
                dapp,
                input,
            })
            .0)
    }

    async fn relay_dapp_address(&self, relay: Address, dapp: Address) -> Result<B256> {
        self.require_signer()?;
        self.check("relayDAppAddress")?;
        Ok(self.mine(SentTx::RelayDAppAddress { relay, dapp }).0)
    }

    async fn wait_for_receipt(&self, tx_hash: B256, _confirmations: u64) -> Result<TxReceipt> {
        self.check("wait_for_receipt")?;
        self.state()
            .receipts
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| PortalError::transaction("wait_for_receipt", "unknown transaction"))
    }
}
