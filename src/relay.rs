//! Address Relay Gate
//!
//! Tells the rollup its own deployment address through the relay contract.
//! The gate state lives in [`RelayGate`], owned by the caller's session; it
//! is not persisted and the relay contract exposes no view to re-derive it.
//!
//! `NotRelayed -> Relayed` only on success. A failed attempt leaves the gate
//! untouched so it can be retried.

use alloy::primitives::Address;
use tracing::{debug, info, warn};

use crate::chain::RollupChain;
use crate::error::Result;
use crate::portal::settle;
use crate::types::{Submission, SubmitMode};

/// What [`RelayGate::relay_address`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The relay transaction was accepted (and confirmed, in confirmed mode)
    Relayed(Submission),
    /// Already relayed in this session; nothing was sent
    AlreadyRelayed,
    /// No signer available; nothing was sent
    Skipped,
}

/// Per-session relay state for one rollup application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayGate {
    dapp_address: Address,
    relayed: bool,
}

impl RelayGate {
    pub fn new(dapp_address: Address) -> Self {
        Self {
            dapp_address,
            relayed: false,
        }
    }

    pub fn dapp_address(&self) -> Address {
        self.dapp_address
    }

    /// Whether withdrawal execution may be offered to the user
    pub fn is_relayed(&self) -> bool {
        self.relayed
    }

    /// Submit the rollup address to `relay_contract`
    pub async fn relay_address<C: RollupChain + ?Sized>(
        &mut self,
        chain: &C,
        relay_contract: Address,
        mode: SubmitMode,
    ) -> Result<RelayOutcome> {
        if self.relayed {
            debug!(dapp = %self.dapp_address, "Address already relayed");
            return Ok(RelayOutcome::AlreadyRelayed);
        }
        if chain.signer_address().is_none() {
            debug!(dapp = %self.dapp_address, "No signer available, skipping relay");
            return Ok(RelayOutcome::Skipped);
        }

        let dapp = self.dapp_address;
        let submission = async {
            let tx_hash = chain.relay_dapp_address(relay_contract, dapp).await?;
            settle(chain, "relayDAppAddress", tx_hash, mode).await
        }
        .await;

        match submission {
            Ok(submission) => {
                self.relayed = true;
                info!(
                    dapp = %self.dapp_address,
                    relay = %relay_contract,
                    tx_hash = %submission.tx_hash,
                    "Rollup address relayed"
                );
                Ok(RelayOutcome::Relayed(submission))
            }
            Err(e) => {
                warn!(dapp = %self.dapp_address, error = %e, "Address relay failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockRollupChain, SentTx};
    use alloy::primitives::address;

    const OWNER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
    const DAPP: Address = address!("70ac08179605af2d9e75782b8decdd3c22aa4d0c");
    const RELAY: Address = address!("f5de34d6bbc0446e2a45719e718efebaae179dae");

    #[tokio::test]
    async fn test_success_transitions_once() {
        let chain = MockRollupChain::new(OWNER);
        let mut gate = RelayGate::new(DAPP);
        assert!(!gate.is_relayed());

        let first = gate
            .relay_address(&chain, RELAY, SubmitMode::FireAndForget)
            .await
            .unwrap();
        assert!(matches!(first, RelayOutcome::Relayed(_)));
        assert!(gate.is_relayed());

        let second = gate
            .relay_address(&chain, RELAY, SubmitMode::FireAndForget)
            .await
            .unwrap();
        assert_eq!(second, RelayOutcome::AlreadyRelayed);
        assert!(gate.is_relayed());

        assert_eq!(
            chain.sent(),
            vec![SentTx::RelayDAppAddress {
                relay: RELAY,
                dapp: DAPP,
            }]
        );
    }

    #[tokio::test]
    async fn test_failure_leaves_gate_closed_and_retryable() {
        let chain = MockRollupChain::new(OWNER);
        chain.fail_action("relayDAppAddress");
        let mut gate = RelayGate::new(DAPP);

        let result = gate
            .relay_address(&chain, RELAY, SubmitMode::FireAndForget)
            .await;
        assert!(result.is_err());
        assert!(!gate.is_relayed());

        chain.clear_failure("relayDAppAddress");
        gate.relay_address(&chain, RELAY, SubmitMode::FireAndForget)
            .await
            .unwrap();
        assert!(gate.is_relayed());
    }

    #[tokio::test]
    async fn test_confirmed_revert_leaves_gate_closed() {
        let chain = MockRollupChain::new(OWNER);
        chain.revert_all();
        let mut gate = RelayGate::new(DAPP);

        let err = gate
            .relay_address(&chain, RELAY, SubmitMode::Confirmed)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transaction");
        assert!(!gate.is_relayed());
    }

    #[tokio::test]
    async fn test_no_signer_is_skipped() {
        let chain = MockRollupChain::read_only();
        let mut gate = RelayGate::new(DAPP);

        let outcome = gate
            .relay_address(&chain, RELAY, SubmitMode::FireAndForget)
            .await
            .unwrap();
        assert_eq!(outcome, RelayOutcome::Skipped);
        assert!(!gate.is_relayed());
        assert!(chain.sent().is_empty());
    }
}
