//! Alloy-backed [`RollupChain`]
//!
//! Providers are built per call from the stored RPC URL and signer, the same
//! way the bridge canceler builds its write provider.
//!
//! # Transaction Building
//!
//! Write calls use `ProviderBuilder::with_recommended_fillers()` so nonce,
//! gas limit and fees are populated before the wallet signs. Without it the
//! wallet filler fails with missing-property errors.

use std::time::{Duration, Instant};

use alloy::{
    network::EthereumWallet,
    primitives::{Address, Bytes, B256, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::Filter,
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use eyre::{eyre, WrapErr};
use tracing::{debug, info};

use crate::chain::RollupChain;
use crate::error::{PortalError, Result};
use crate::evm::contracts::{
    DAppAddressRelay, ERC20Portal, ERC721Portal, EtherPortal, InputBox, ERC20, ERC721,
};
use crate::evm::events::{approval_topic, parse_approval_log};
use crate::types::{ApprovalEvent, TxReceipt};

/// Receipt polling configuration
#[derive(Debug, Clone)]
pub struct ReceiptPolling {
    /// Delay between receipt queries
    pub poll_interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(120),
        }
    }
}

/// EVM chain capability with an optional signer
pub struct EvmRollupChain {
    rpc_url: String,
    chain_id: u64,
    signer: Option<PrivateKeySigner>,
    polling: ReceiptPolling,
}

impl EvmRollupChain {
    /// Create a new chain capability; without a private key every write
    /// operation reports a precondition failure
    pub fn new(rpc_url: &str, chain_id: u64, private_key: Option<&str>) -> eyre::Result<Self> {
        // Fail early on a malformed URL rather than on the first call
        let _: alloy::transports::http::reqwest::Url =
            rpc_url.parse().wrap_err("Invalid RPC URL")?;

        let signer = match private_key {
            Some(key) => Some(
                key.parse::<PrivateKeySigner>()
                    .map_err(|e| eyre!("Invalid private key: {}", e))?,
            ),
            None => None,
        };

        match &signer {
            Some(s) => info!(
                rpc_url = %rpc_url,
                chain_id = chain_id,
                address = %s.address(),
                "Created EVM rollup chain with signer"
            ),
            None => info!(
                rpc_url = %rpc_url,
                chain_id = chain_id,
                "Created read-only EVM rollup chain"
            ),
        }

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            chain_id,
            signer,
            polling: ReceiptPolling::default(),
        })
    }

    /// Override receipt polling
    pub fn with_polling(mut self, polling: ReceiptPolling) -> Self {
        self.polling = polling;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Check that the RPC endpoint serves the configured chain
    pub async fn verify_chain_id(&self) -> eyre::Result<()> {
        let provider = self.read_provider()?;
        let remote = provider
            .get_chain_id()
            .await
            .wrap_err("Failed to query chain id")?;

        if remote != self.chain_id {
            return Err(eyre!(
                "Chain id mismatch: configured {}, RPC reports {}",
                self.chain_id,
                remote
            ));
        }
        Ok(())
    }

    fn parse_url(&self) -> Result<alloy::transports::http::reqwest::Url> {
        self.rpc_url
            .parse()
            .map_err(|e| PortalError::transaction("connect", format!("invalid RPC URL: {}", e)))
    }

    fn read_provider(&self) -> Result<RootProvider<Http<Client>>> {
        Ok(ProviderBuilder::new().on_http(self.parse_url()?))
    }

    fn write_provider(&self) -> Result<impl Provider<Http<Client>>> {
        let signer = self
            .signer
            .clone()
            .ok_or_else(|| PortalError::Precondition("no signer configured".to_string()))?;
        let wallet = EthereumWallet::from(signer);

        Ok(ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(self.parse_url()?))
    }
}

#[async_trait]
impl RollupChain for EvmRollupChain {
    fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        let provider = self.read_provider()?;
        let contract = ERC20::new(token, &provider);
        let result = contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| PortalError::transaction("allowance", e))?;

        Ok(result._0)
    }

    async fn erc721_approved(&self, token: Address, token_id: U256) -> Result<Address> {
        let provider = self.read_provider()?;
        let contract = ERC721::new(token, &provider);
        let result = contract
            .getApproved(token_id)
            .call()
            .await
            .map_err(|e| PortalError::transaction("getApproved", e))?;

        Ok(result._0)
    }

    async fn approval_events(
        &self,
        token: Address,
        block_hash: B256,
    ) -> Result<Vec<ApprovalEvent>> {
        let provider = self.read_provider()?;
        let filter = Filter::new()
            .address(token)
            .event_signature(approval_topic())
            .at_block_hash(block_hash);

        let logs = provider
            .get_logs(&filter)
            .await
            .map_err(|e| PortalError::transaction("getLogs", e))?;

        let events: Vec<ApprovalEvent> = logs.iter().filter_map(parse_approval_log).collect();

        debug!(
            token = %token,
            block_hash = %block_hash,
            logs = logs.len(),
            approvals = events.len(),
            "Queried approval events"
        );

        Ok(events)
    }

    async fn erc20_approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256> {
        let provider = self.write_provider()?;
        let contract = ERC20::new(token, &provider);
        let pending = contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| PortalError::transaction("approve", e))?;

        Ok(*pending.tx_hash())
    }

    async fn erc721_approve(
        &self,
        token: Address,
        spender: Address,
        token_id: U256,
    ) -> Result<B256> {
        let provider = self.write_provider()?;
        let contract = ERC721::new(token, &provider);
        let pending = contract
            .approve(spender, token_id)
            .send()
            .await
            .map_err(|e| PortalError::transaction("approve", e))?;

        Ok(*pending.tx_hash())
    }

    async fn deposit_ether(
        &self,
        portal: Address,
        dapp: Address,
        value: U256,
        exec_layer_data: Bytes,
    ) -> Result<B256> {
        let provider = self.write_provider()?;
        let contract = EtherPortal::new(portal, &provider);
        let pending = contract
            .depositEther(dapp, exec_layer_data)
            .value(value)
            .send()
            .await
            .map_err(|e| PortalError::transaction("depositEther", e))?;

        Ok(*pending.tx_hash())
    }

    async fn deposit_erc20(
        &self,
        portal: Address,
        token: Address,
        dapp: Address,
        amount: U256,
        exec_layer_data: Bytes,
    ) -> Result<B256> {
        let provider = self.write_provider()?;
        let contract = ERC20Portal::new(portal, &provider);
        let pending = contract
            .depositERC20Tokens(token, dapp, amount, exec_layer_data)
            .send()
            .await
            .map_err(|e| PortalError::transaction("depositERC20Tokens", e))?;

        Ok(*pending.tx_hash())
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
        let provider = self.write_provider()?;
        let contract = ERC721Portal::new(portal, &provider);
        let pending = contract
            .depositERC721Token(token, dapp, token_id, base_layer_data, exec_layer_data)
            .send()
            .await
            .map_err(|e| PortalError::transaction("depositERC721Token", e))?;

        Ok(*pending.tx_hash())
    }

    async fn add_input(&self, input_box: Address, dapp: Address, input: Bytes) -> Result<B256> {
        let provider = self.write_provider()?;
        let contract = InputBox::new(input_box, &provider);
        let pending = contract
            .addInput(dapp, input)
            .send()
            .await
            .map_err(|e| PortalError::transaction("addInput", e))?;

        Ok(*pending.tx_hash())
    }

    async fn relay_dapp_address(&self, relay: Address, dapp: Address) -> Result<B256> {
        let provider = self.write_provider()?;
        let contract = DAppAddressRelay::new(relay, &provider);
        let pending = contract
            .relayDAppAddress(dapp)
            .send()
            .await
            .map_err(|e| PortalError::transaction("relayDAppAddress", e))?;

        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: B256, confirmations: u64) -> Result<TxReceipt> {
        let provider = self.read_provider()?;
        let start = Instant::now();
        let confirmations = confirmations.max(1);

        while start.elapsed() < self.polling.timeout {
            let receipt = provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| PortalError::transaction("getTransactionReceipt", e))?;

            if let Some(receipt) = receipt {
                let block_number = receipt.block_number.unwrap_or_default();
                let head = provider
                    .get_block_number()
                    .await
                    .map_err(|e| PortalError::transaction("getBlockNumber", e))?;

                if head.saturating_sub(block_number) + 1 >= confirmations {
                    return Ok(TxReceipt {
                        tx_hash: receipt.transaction_hash,
                        block_hash: receipt.block_hash.unwrap_or_default(),
                        block_number,
                        success: receipt.status(),
                    });
                }
            }

            tokio::time::sleep(self.polling.poll_interval).await;
        }

        Err(PortalError::transaction(
            "wait_for_receipt",
            format!(
                "transaction {} not confirmed after {:?}",
                tx_hash, self.polling.timeout
            ),
        ))
    }
}
