//! Payload Codec
//!
//! Byte encodings for everything sent through the generic input channel or
//! attached to deposits:
//!
//! - **Withdrawal requests** - UTF-8 JSON `{"method": ..., "args": {...}}`
//! - **Raw transactions** - 20-byte address prefix followed by an opaque body,
//!   no framing
//! - **Notes** - plain UTF-8 annotations carried as deposit metadata
//!
//! The two input encodings are distinct; the rollup tells them
//! apart by content, not by a shared envelope.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};
use crate::types::{parse_amount, Asset, Direction, TransferIntent};

/// Length of the address prefix on raw transaction inputs
pub const RAW_TX_ADDRESS_LEN: usize = 20;

// ============================================================================
// Withdrawal Requests
// ============================================================================

/// Withdrawal intent interpreted inside the rollup
///
/// Serialized adjacently tagged so the wire form is exactly
/// `{"method":"<name>","args":{...}}` with fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "args")]
pub enum WithdrawalRequest {
    #[serde(rename = "ether_withdraw")]
    EtherWithdraw {
        #[serde(with = "u256_decimal")]
        amount: U256,
    },
    #[serde(rename = "erc20_withdraw")]
    Erc20Withdraw {
        #[serde(with = "address_hex")]
        erc20: Address,
        #[serde(with = "u256_decimal")]
        amount: U256,
    },
    #[serde(rename = "erc721_withdrawal")]
    Erc721Withdrawal {
        #[serde(with = "address_hex")]
        erc721: Address,
        token_id: u64,
    },
}

impl WithdrawalRequest {
    /// Withdraw `amount` wei of the native coin
    pub fn ether(amount: U256) -> Self {
        WithdrawalRequest::EtherWithdraw { amount }
    }

    /// Withdraw `amount` base units of an ERC20 token
    pub fn erc20(token: Address, amount: U256) -> Self {
        WithdrawalRequest::Erc20Withdraw {
            erc20: token,
            amount,
        }
    }

    /// Withdraw a single ERC721 token; the id must fit the JSON integer
    /// the rollup expects
    pub fn erc721(token: Address, token_id: U256) -> Result<Self> {
        let token_id: u64 = token_id.try_into().map_err(|_| {
            PortalError::encoding(format!("token id {} does not fit in u64", token_id))
        })?;
        Ok(WithdrawalRequest::Erc721Withdrawal {
            erc721: token,
            token_id,
        })
    }

    /// Build the request for a withdraw-direction intent
    pub fn from_intent(intent: &TransferIntent, decimals: u8) -> Result<Self> {
        if intent.direction != Direction::Withdraw {
            return Err(PortalError::encoding(
                "only withdraw intents map to withdrawal requests",
            ));
        }

        match intent.asset {
            Asset::Native => Ok(Self::ether(parse_amount(intent.required_amount()?, decimals)?)),
            Asset::Fungible { token } => Ok(Self::erc20(
                token,
                parse_amount(intent.required_amount()?, decimals)?,
            )),
            Asset::NonFungible { token, token_id } => Self::erc721(token, token_id),
        }
    }

    /// Method name as interpreted by the rollup
    pub fn method(&self) -> &'static str {
        match self {
            WithdrawalRequest::EtherWithdraw { .. } => "ether_withdraw",
            WithdrawalRequest::Erc20Withdraw { .. } => "erc20_withdraw",
            WithdrawalRequest::Erc721Withdrawal { .. } => "erc721_withdrawal",
        }
    }
}

/// Encode a withdrawal request as UTF-8 JSON bytes
pub fn encode_withdrawal(request: &WithdrawalRequest) -> Result<Bytes> {
    let json = serde_json::to_vec(request)?;
    Ok(Bytes::from(json))
}

/// Inverse of [`encode_withdrawal`]
pub fn decode_withdrawal(payload: &[u8]) -> Result<WithdrawalRequest> {
    Ok(serde_json::from_slice(payload)?)
}

// ============================================================================
// Raw Transactions
// ============================================================================

/// Concatenate the 20 address bytes with the decoded hex body
///
/// The body may carry an optional `0x` prefix. An empty body yields just the
/// address bytes.
pub fn encode_raw_transaction(prefix_address: Address, hex_body: &str) -> Result<Bytes> {
    let body = hex_body.trim();
    let body = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .unwrap_or(body);
    let body_bytes = hex::decode(body)?;

    let mut out = Vec::with_capacity(RAW_TX_ADDRESS_LEN + body_bytes.len());
    out.extend_from_slice(prefix_address.as_slice());
    out.extend_from_slice(&body_bytes);
    Ok(Bytes::from(out))
}

/// Split a raw transaction input back into its address prefix and body
pub fn split_raw_transaction(payload: &[u8]) -> Result<(Address, &[u8])> {
    if payload.len() < RAW_TX_ADDRESS_LEN {
        return Err(PortalError::encoding(format!(
            "raw transaction must be at least {} bytes, got {}",
            RAW_TX_ADDRESS_LEN,
            payload.len()
        )));
    }
    let (prefix, body) = payload.split_at(RAW_TX_ADDRESS_LEN);
    Ok((Address::from_slice(prefix), body))
}

// ============================================================================
// Notes
// ============================================================================

/// Plain UTF-8 bytes of an annotation
pub fn encode_note(text: &str) -> Bytes {
    Bytes::copy_from_slice(text.as_bytes())
}

/// Default note attached to ERC20 deposits
pub fn erc20_deposit_note(amount: &str, token: Address) -> String {
    format!("Deposited ({}) of ERC20 ({}).", amount, token)
}

/// Default note attached to ERC721 deposits
pub fn erc721_deposit_note(token_id: U256, token: Address) -> String {
    format!("Deposited ({}) of ERC721 ({}).", token_id, token)
}

// ============================================================================
// Serde helpers
// ============================================================================

/// U256 as a base-10 string
mod u256_decimal {
    use alloy::primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(D::Error::custom)
    }
}

/// Address as lowercase `0x`-prefixed hex
mod address_hex {
    use alloy::primitives::Address;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(value.as_slice())))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<Address>().map_err(D::Error::custom)
    }
}
