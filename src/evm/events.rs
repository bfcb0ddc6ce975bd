//! EVM Approval Event Parsing
//!
//! ERC20 and ERC721 share the `Approval(address,address,uint256)` signature;
//! they differ only in whether the last argument is indexed. ERC20 carries
//! the allowance in the data section (3 topics), ERC721 carries the token id
//! as a fourth topic.

use alloy::primitives::{keccak256, Address, B256, U256};
use tracing::warn;

use crate::types::ApprovalEvent;

/// `keccak256("Approval(address,address,uint256)")`
pub fn approval_topic() -> B256 {
    keccak256(b"Approval(address,address,uint256)")
}

/// Extract an address from a left-padded 32-byte topic
fn topic_to_address(topic: &B256) -> Address {
    Address::from_slice(&topic[12..])
}

/// Parse an ERC20 or ERC721 `Approval` log
///
/// Returns `None` for logs with another signature, pending logs without a
/// block hash, or malformed payloads.
pub fn parse_approval_log(log: &alloy::rpc::types::Log) -> Option<ApprovalEvent> {
    let topics = log.topics();
    if topics.first() != Some(&approval_topic()) {
        return None;
    }

    let block_hash = log.block_hash?;
    let tx_hash = log.transaction_hash.unwrap_or_default();
    let log_index = log.log_index.unwrap_or_default();

    let value = match topics.len() {
        // ERC721: tokenId indexed
        4 => U256::from_be_bytes(topics[3].0),
        // ERC20: value in data
        3 => {
            let data = log.data().data.as_ref();
            if data.len() < 32 {
                warn!(
                    tx = ?log.transaction_hash,
                    data_len = data.len(),
                    "Approval log with short data"
                );
                return None;
            }
            U256::from_be_slice(&data[..32])
        }
        _ => return None,
    };

    Some(ApprovalEvent {
        token: log.address(),
        owner: topic_to_address(&topics[1]),
        spender: topic_to_address(&topics[2]),
        value,
        block_hash,
        tx_hash,
        log_index,
    })
}
