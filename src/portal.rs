//! Portal Dispatcher
//!
//! One operation per asset/direction pair. Deposits go to the asset's portal
//! after the authorization step; every withdrawal and raw transaction goes
//! through the single generic input channel.
//!
//! A successful return means the base chain accepted the transaction, not
//! that the rollup processed it. With [`SubmitMode::Confirmed`] the dispatcher
//! additionally waits for one confirmation and fails on revert.
//!
//! Without a signer every operation is a no-op that returns
//! [`DispatchOutcome::Skipped`].

use alloy::primitives::{address, Address, Bytes, B256, U256};
use tracing::{debug, info};

use crate::authorization::{ensure_authorized, AuthorizationOutcome};
use crate::chain::RollupChain;
use crate::codec::{
    encode_note, encode_raw_transaction, encode_withdrawal, erc20_deposit_note,
    erc721_deposit_note, WithdrawalRequest,
};
use crate::error::{PortalError, Result};
use crate::relay::{RelayGate, RelayOutcome};
use crate::types::{
    parse_amount, Asset, DispatchOutcome, Direction, Submission, SubmitMode, TransferIntent,
    DEFAULT_DECIMALS,
};

/// Confirmations awaited in [`SubmitMode::Confirmed`]
pub const SUBMIT_CONFIRMATIONS: u64 = 1;

// ============================================================================
// Contract Endpoints
// ============================================================================

/// Base-chain endpoints of the rollup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalAddresses {
    pub ether_portal: Address,
    pub erc20_portal: Address,
    pub erc721_portal: Address,
    pub input_box: Address,
    pub dapp_address_relay: Address,
}

impl Default for PortalAddresses {
    /// Deterministic deployment of the rollups 1.x contracts
    fn default() -> Self {
        Self {
            ether_portal: address!("ffdbe43d4c855bf7e0f105c400a50857f53ab044"),
            erc20_portal: address!("9c21aeb2093c32ddbc53eef24b873bdcd1ada1db"),
            erc721_portal: address!("237f8dd094c0e47f4236f12b4fa01d6dae89fb87"),
            input_box: address!("59b22d57d4f067708ab0c00552767405926dc768"),
            dapp_address_relay: address!("f5de34d6bbc0446e2a45719e718efebaae179dae"),
        }
    }
}

/// Apply `mode` to a transaction the node just accepted
pub async fn settle<C: RollupChain + ?Sized>(
    chain: &C,
    action: &'static str,
    tx_hash: B256,
    mode: SubmitMode,
) -> Result<Submission> {
    match mode {
        SubmitMode::FireAndForget => Ok(Submission {
            tx_hash,
            receipt: None,
        }),
        SubmitMode::Confirmed => {
            let receipt = chain.wait_for_receipt(tx_hash, SUBMIT_CONFIRMATIONS).await?;
            if !receipt.success {
                return Err(PortalError::transaction(
                    action,
                    format!("transaction {} reverted", tx_hash),
                ));
            }
            debug!(
                action,
                tx_hash = %tx_hash,
                block = receipt.block_number,
                "Transaction confirmed"
            );
            Ok(Submission {
                tx_hash,
                receipt: Some(receipt),
            })
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Dispatcher bound to one rollup application and one chain capability
pub struct PortalClient<C> {
    chain: C,
    dapp: Address,
    addresses: PortalAddresses,
    mode: SubmitMode,
    /// Decimals of fungible tokens handled by this client
    token_decimals: u8,
}

impl<C: RollupChain> PortalClient<C> {
    pub fn new(chain: C, dapp: Address) -> Self {
        Self {
            chain,
            dapp,
            addresses: PortalAddresses::default(),
            mode: SubmitMode::default(),
            token_decimals: DEFAULT_DECIMALS,
        }
    }

    pub fn with_addresses(mut self, addresses: PortalAddresses) -> Self {
        self.addresses = addresses;
        self
    }

    pub fn with_mode(mut self, mode: SubmitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_token_decimals(mut self, decimals: u8) -> Self {
        self.token_decimals = decimals;
        self
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn dapp(&self) -> Address {
        self.dapp
    }

    pub fn addresses(&self) -> &PortalAddresses {
        &self.addresses
    }

    pub fn mode(&self) -> SubmitMode {
        self.mode
    }

    fn skipped(operation: &str) -> DispatchOutcome {
        debug!(operation, "No signer available, skipping");
        DispatchOutcome::Skipped {
            reason: format!("{}: no signer available", operation),
        }
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    /// Make sure the portal for `asset` may pull `amount` from the signer
    ///
    /// `amount` is a decimal string in the token's units and is ignored for
    /// non-fungible assets.
    pub async fn ensure_authorized(
        &self,
        asset: &Asset,
        amount: Option<&str>,
    ) -> Result<AuthorizationOutcome> {
        let Some(owner) = self.chain.signer_address() else {
            debug!(operation = "ensure_authorized", "No signer available, skipping");
            return Ok(AuthorizationOutcome::Skipped {
                reason: "ensure_authorized: no signer available".to_string(),
            });
        };
        if !asset.requires_authorization() {
            return Ok(AuthorizationOutcome::NotRequired);
        }

        let (spender, raw) = match asset {
            Asset::Native => return Ok(AuthorizationOutcome::NotRequired),
            Asset::Fungible { .. } => {
                let amount = amount.ok_or_else(|| {
                    PortalError::encoding("amount required for erc20 authorization")
                })?;
                (
                    self.addresses.erc20_portal,
                    parse_amount(amount, self.token_decimals)?,
                )
            }
            Asset::NonFungible { .. } => (self.addresses.erc721_portal, U256::ZERO),
        };

        ensure_authorized(&self.chain, asset, owner, spender, raw).await
    }

    // =========================================================================
    // Deposits
    // =========================================================================

    /// Send `amount` of the native coin to the rollup
    ///
    /// `destination` travels as execution-layer data; the value itself always
    /// moves to the portal contract.
    pub async fn deposit_native(
        &self,
        amount: &str,
        destination: Address,
    ) -> Result<DispatchOutcome> {
        if self.chain.signer_address().is_none() {
            return Ok(Self::skipped("deposit_native"));
        }

        let value = parse_amount(amount, DEFAULT_DECIMALS)?;
        let data = Bytes::copy_from_slice(destination.as_slice());

        info!(
            dapp = %self.dapp,
            value = %value,
            destination = %destination,
            "Depositing native coin"
        );

        let tx_hash = self
            .chain
            .deposit_ether(self.addresses.ether_portal, self.dapp, value, data)
            .await?;
        let submission = settle(&self.chain, "depositEther", tx_hash, self.mode).await?;
        Ok(DispatchOutcome::Submitted(submission))
    }

    /// Deposit `amount` of an ERC20 token, approving the portal first when
    /// the current allowance is short
    ///
    /// Without a `note` the standard deposit note is attached.
    pub async fn deposit_fungible(
        &self,
        token: Address,
        amount: &str,
        note: Option<&str>,
    ) -> Result<DispatchOutcome> {
        let Some(owner) = self.chain.signer_address() else {
            return Ok(Self::skipped("deposit_fungible"));
        };

        let raw = parse_amount(amount, self.token_decimals)?;
        let asset = Asset::fungible(token);
        let portal = self.addresses.erc20_portal;

        ensure_authorized(&self.chain, &asset, owner, portal, raw).await?;

        let note = note
            .map(str::to_string)
            .unwrap_or_else(|| erc20_deposit_note(amount, token));

        info!(
            dapp = %self.dapp,
            token = %token,
            amount = %raw,
            "Depositing ERC20 tokens"
        );

        let tx_hash = self
            .chain
            .deposit_erc20(portal, token, self.dapp, raw, encode_note(&note))
            .await?;
        let submission = settle(&self.chain, "depositERC20Tokens", tx_hash, self.mode).await?;
        Ok(DispatchOutcome::Submitted(submission))
    }

    /// Deposit a single ERC721 token, approving the portal for it first
    pub async fn deposit_non_fungible(
        &self,
        token: Address,
        token_id: U256,
        note: Option<&str>,
    ) -> Result<DispatchOutcome> {
        let Some(owner) = self.chain.signer_address() else {
            return Ok(Self::skipped("deposit_non_fungible"));
        };

        let asset = Asset::non_fungible(token, token_id);
        let portal = self.addresses.erc721_portal;

        ensure_authorized(&self.chain, &asset, owner, portal, U256::ZERO).await?;

        let note = note
            .map(str::to_string)
            .unwrap_or_else(|| erc721_deposit_note(token_id, token));

        info!(
            dapp = %self.dapp,
            token = %token,
            token_id = %token_id,
            "Depositing ERC721 token"
        );

        let tx_hash = self
            .chain
            .deposit_erc721(
                portal,
                token,
                self.dapp,
                token_id,
                Bytes::new(),
                encode_note(&note),
            )
            .await?;
        let submission = settle(&self.chain, "depositERC721Token", tx_hash, self.mode).await?;
        Ok(DispatchOutcome::Submitted(submission))
    }

    // =========================================================================
    // Generic Inputs
    // =========================================================================

    /// Send a withdrawal request through the input box
    pub async fn submit_withdrawal(&self, request: &WithdrawalRequest) -> Result<DispatchOutcome> {
        if self.chain.signer_address().is_none() {
            return Ok(Self::skipped("submit_withdrawal"));
        }

        let input = encode_withdrawal(request)?;
        info!(
            dapp = %self.dapp,
            method = request.method(),
            bytes = input.len(),
            "Submitting withdrawal request"
        );
        self.add_input(input).await
    }

    /// Send `prefix_address ++ hex_body` through the input box
    pub async fn submit_raw_transaction(
        &self,
        prefix_address: Address,
        hex_body: &str,
    ) -> Result<DispatchOutcome> {
        if self.chain.signer_address().is_none() {
            return Ok(Self::skipped("submit_raw_transaction"));
        }

        let input = encode_raw_transaction(prefix_address, hex_body)?;
        info!(
            dapp = %self.dapp,
            prefix = %prefix_address,
            bytes = input.len(),
            "Submitting raw transaction"
        );
        self.add_input(input).await
    }

    async fn add_input(&self, input: Bytes) -> Result<DispatchOutcome> {
        let tx_hash = self
            .chain
            .add_input(self.addresses.input_box, self.dapp, input)
            .await?;
        let submission = settle(&self.chain, "addInput", tx_hash, self.mode).await?;
        Ok(DispatchOutcome::Submitted(submission))
    }

    // =========================================================================
    // Relay
    // =========================================================================

    /// Relay this client's rollup address through `gate`
    pub async fn relay_address(&self, gate: &mut RelayGate) -> Result<RelayOutcome> {
        gate.relay_address(&self.chain, self.addresses.dapp_address_relay, self.mode)
            .await
    }

    // =========================================================================
    // Intents
    // =========================================================================

    /// Route an intent to the matching dispatcher operation
    ///
    /// Native deposits without a destination credit the signer's own address.
    pub async fn execute(&self, intent: &TransferIntent) -> Result<DispatchOutcome> {
        let Some(signer) = self.chain.signer_address() else {
            return Ok(Self::skipped("execute"));
        };

        match (intent.direction, intent.asset) {
            (Direction::Deposit, Asset::Native) => {
                let destination = intent.destination.unwrap_or(signer);
                self.deposit_native(intent.required_amount()?, destination)
                    .await
            }
            (Direction::Deposit, Asset::Fungible { token }) => {
                self.deposit_fungible(token, intent.required_amount()?, None)
                    .await
            }
            (Direction::Deposit, Asset::NonFungible { token, token_id }) => {
                self.deposit_non_fungible(token, token_id, None).await
            }
            (Direction::Withdraw, asset) => {
                let decimals = match asset {
                    Asset::Native => DEFAULT_DECIMALS,
                    _ => self.token_decimals,
                };
                let request = WithdrawalRequest::from_intent(intent, decimals)?;
                self.submit_withdrawal(&request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_withdrawal, split_raw_transaction};
    use crate::testing::{MockRollupChain, SentTx};

    const OWNER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    const DAPP: Address = address!("70ac08179605af2d9e75782b8decdd3c22aa4d0c");
    const TOKEN: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");
    const NFT: Address = address!("e7f1725e7734ce288f8367e1bb143e90bb3f0512");
    const DEST: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");

    const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

    fn client() -> PortalClient<MockRollupChain> {
        PortalClient::new(MockRollupChain::new(OWNER), DAPP)
    }

    #[test]
    fn test_default_addresses() {
        let addrs = PortalAddresses::default();
        assert_eq!(
            addrs.input_box,
            "0x59b22D57D4f067708AB0c00552767405926dc768"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(
            addrs.erc20_portal,
            "0x9C21AEb2093C32DDbC53eEF24B873BDCd1aDa1DB"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_deposit_native_carries_destination() {
        let client = client();
        let outcome = client.deposit_native("1", DEST).await.unwrap();

        assert!(!outcome.is_skipped());
        assert_eq!(
            client.chain().sent(),
            vec![SentTx::DepositEther {
                portal: PortalAddresses::default().ether_portal,
                dapp: DAPP,
                value: U256::from(ONE_ETHER),
                exec_layer_data: Bytes::copy_from_slice(DEST.as_slice()),
            }]
        );
    }

    #[tokio::test]
    async fn test_deposit_fungible_approves_then_deposits() {
        let client = client();
        client.deposit_fungible(TOKEN, "2", None).await.unwrap();

        let sent = client.chain().sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].is_approval());
        match &sent[1] {
            SentTx::DepositErc20 {
                token,
                dapp,
                amount,
                exec_layer_data,
                ..
            } => {
                assert_eq!(*token, TOKEN);
                assert_eq!(*dapp, DAPP);
                assert_eq!(*amount, U256::from(2 * ONE_ETHER));
                assert_eq!(
                    &exec_layer_data[..],
                    erc20_deposit_note("2", TOKEN).as_bytes()
                );
            }
            other => panic!("expected ERC20 deposit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deposit_fungible_with_allowance_skips_approval() {
        let client = client();
        let portal = client.addresses().erc20_portal;
        client
            .chain()
            .set_allowance(TOKEN, OWNER, portal, U256::from(10 * ONE_ETHER));

        client
            .deposit_fungible(TOKEN, "10", Some("top up"))
            .await
            .unwrap();

        let sent = client.chain().sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(
            &sent[0],
            SentTx::DepositErc20 { exec_layer_data, .. } if &exec_layer_data[..] == b"top up"
        ));
    }

    #[tokio::test]
    async fn test_unconfirmed_approval_blocks_deposit() {
        let client = client();
        client.chain().suppress_approval_events();

        let err = client.deposit_fungible(TOKEN, "1", None).await.unwrap_err();
        assert_eq!(err.kind(), "approval_not_confirmed");

        let sent = client.chain().sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_approval());
    }

    #[tokio::test]
    async fn test_unconfirmed_nft_approval_blocks_deposit() {
        let client = client();
        client.chain().suppress_approval_events();

        let err = client
            .deposit_non_fungible(NFT, U256::from(42), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "approval_not_confirmed");

        assert_eq!(
            client.chain().sent(),
            vec![SentTx::Erc721Approve {
                token: NFT,
                spender: PortalAddresses::default().erc721_portal,
                token_id: U256::from(42),
            }]
        );
    }

    #[tokio::test]
    async fn test_excess_precision_sends_nothing() {
        let client = client();
        let err = client
            .deposit_native("0.0000000000000000001", DEST)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "encoding");

        let client = client.with_token_decimals(6);
        let err = client
            .deposit_fungible(TOKEN, "1.0000009", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "encoding");

        assert!(client.chain().sent().is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_unconfirmed_approval_deposits_without_reapproving() {
        let client = client();
        client.chain().suppress_approval_events();
        assert!(client.deposit_fungible(TOKEN, "1", None).await.is_err());

        client.deposit_fungible(TOKEN, "1", None).await.unwrap();
        assert_eq!(client.chain().approvals_sent(), 1);
        assert!(matches!(
            client.chain().sent().last(),
            Some(SentTx::DepositErc20 { .. })
        ));
    }

    #[tokio::test]
    async fn test_deposit_non_fungible() {
        let client = client();
        client
            .deposit_non_fungible(NFT, U256::from(42), None)
            .await
            .unwrap();

        let sent = client.chain().sent();
        assert_eq!(sent.len(), 2);
        match &sent[1] {
            SentTx::DepositErc721 {
                token_id,
                base_layer_data,
                exec_layer_data,
                ..
            } => {
                assert_eq!(*token_id, U256::from(42));
                assert!(base_layer_data.is_empty());
                assert_eq!(
                    &exec_layer_data[..],
                    erc721_deposit_note(U256::from(42), NFT).as_bytes()
                );
            }
            other => panic!("expected ERC721 deposit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_withdrawal_goes_through_input_box() {
        let client = client();
        let request = WithdrawalRequest::ether(U256::from(ONE_ETHER));
        client.submit_withdrawal(&request).await.unwrap();

        match client.chain().sent().as_slice() {
            [SentTx::AddInput {
                input_box,
                dapp,
                input,
            }] => {
                assert_eq!(*input_box, PortalAddresses::default().input_box);
                assert_eq!(*dapp, DAPP);
                assert_eq!(decode_withdrawal(input).unwrap(), request);
            }
            other => panic!("unexpected transactions {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_raw_transaction_layout() {
        let client = client();
        let prefix = address!("1111111111111111111111111111111111111111");
        client.submit_raw_transaction(prefix, "abcd").await.unwrap();

        match client.chain().sent().as_slice() {
            [SentTx::AddInput { input, .. }] => {
                let (addr, body) = split_raw_transaction(input).unwrap();
                assert_eq!(addr, prefix);
                assert_eq!(body, &[0xab, 0xcd]);
            }
            other => panic!("unexpected transactions {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_hex_sends_nothing() {
        let client = client();
        let err = client
            .submit_raw_transaction(Address::ZERO, "xyz")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "encoding");
        assert!(client.chain().sent().is_empty());
    }

    #[tokio::test]
    async fn test_no_signer_is_skipped() {
        let client = PortalClient::new(MockRollupChain::read_only(), DAPP);

        assert!(client.deposit_native("1", DEST).await.unwrap().is_skipped());
        assert!(client
            .deposit_fungible(TOKEN, "1", None)
            .await
            .unwrap()
            .is_skipped());
        assert!(client
            .submit_withdrawal(&WithdrawalRequest::ether(U256::from(1)))
            .await
            .unwrap()
            .is_skipped());
        assert!(client.chain().sent().is_empty());

        let outcome = client
            .ensure_authorized(&Asset::fungible(TOKEN), Some("1"))
            .await
            .unwrap();
        assert!(matches!(outcome, AuthorizationOutcome::Skipped { .. }));
        assert!(client.chain().sent().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_mode_reports_revert() {
        let client = client().with_mode(SubmitMode::Confirmed);
        client.chain().revert_all();

        let err = client.deposit_native("1", DEST).await.unwrap_err();
        assert!(matches!(
            err,
            PortalError::Transaction {
                action: "depositEther",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_confirmed_mode_attaches_receipt() {
        let client = client().with_mode(SubmitMode::Confirmed);
        let outcome = client.deposit_native("0.5", DEST).await.unwrap();

        match outcome {
            DispatchOutcome::Submitted(submission) => {
                let receipt = submission.receipt.unwrap();
                assert!(receipt.success);
                assert_eq!(receipt.tx_hash, submission.tx_hash);
            }
            other => panic!("expected submission, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fire_and_forget_ignores_revert() {
        let client = client();
        client.chain().revert_all();

        let outcome = client.deposit_native("1", DEST).await.unwrap();
        match outcome {
            DispatchOutcome::Submitted(submission) => assert!(submission.receipt.is_none()),
            other => panic!("expected submission, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_routes_intents() {
        let client = client().with_token_decimals(6);

        client
            .execute(&TransferIntent::deposit(Asset::Native, Some("1"), None))
            .await
            .unwrap();
        client
            .execute(&TransferIntent::withdraw(Asset::fungible(TOKEN), Some("3")))
            .await
            .unwrap();

        let sent = client.chain().sent();
        assert!(matches!(
            &sent[0],
            SentTx::DepositEther { exec_layer_data, .. }
                if &exec_layer_data[..] == OWNER.as_slice()
        ));
        match &sent[1] {
            SentTx::AddInput { input, .. } => assert_eq!(
                decode_withdrawal(input).unwrap(),
                WithdrawalRequest::erc20(TOKEN, U256::from(3_000_000u64))
            ),
            other => panic!("expected input, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_requires_amount() {
        let client = client();
        let err = client
            .execute(&TransferIntent::deposit(Asset::fungible(TOKEN), None, None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "encoding");
        assert!(client.chain().sent().is_empty());
    }

    #[tokio::test]
    async fn test_deposit_rpc_failure_propagates() {
        let client = client();
        client.chain().fail_action("depositEther");

        let err = client.deposit_native("1", DEST).await.unwrap_err();
        assert!(matches!(
            err,
            PortalError::Transaction {
                action: "depositEther",
                ..
            }
        ));
    }
}
