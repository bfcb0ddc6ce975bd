//! Portal configuration
//!
//! Read from the environment (optionally seeded from a `.env` file). Contract
//! endpoints default to the rollups 1.x deterministic deployment and can be
//! overridden one by one.

use std::env;
use std::fmt;

use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};

use crate::portal::PortalAddresses;
use crate::types::{SubmitMode, DEFAULT_DECIMALS};

/// Orchestrator configuration
#[derive(Clone)]
pub struct Config {
    /// EVM RPC URL
    pub rpc_url: String,
    /// EVM native chain ID (e.g. 31337 for Anvil)
    pub chain_id: u64,
    /// Signer key; without it every operation is skipped
    pub private_key: Option<String>,
    /// Rollup application address
    pub dapp_address: Address,
    pub addresses: PortalAddresses,
    /// Decimals of the ERC20 tokens handled
    pub token_decimals: u8,
    pub submit_mode: SubmitMode,
}

/// Custom Debug that redacts private_key to prevent accidental log leakage.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.chain_id)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("dapp_address", &self.dapp_address)
            .field("addresses", &self.addresses)
            .field("token_decimals", &self.token_decimals)
            .field("submit_mode", &self.submit_mode)
            .finish()
    }
}

impl Config {
    /// Load configuration from `.env` and the environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }
        Self::from_env()
    }

    /// Load configuration from the process environment only
    pub fn from_env() -> Result<Self> {
        let defaults = PortalAddresses::default();

        let config = Self {
            rpc_url: env::var("RPC_URL").map_err(|_| eyre!("RPC_URL required"))?,
            chain_id: env::var("CHAIN_ID")
                .map_err(|_| eyre!("CHAIN_ID required"))?
                .parse()
                .map_err(|_| eyre!("Invalid CHAIN_ID"))?,
            private_key: env::var("PRIVATE_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            dapp_address: parse_address(
                "DAPP_ADDRESS",
                &env::var("DAPP_ADDRESS").map_err(|_| eyre!("DAPP_ADDRESS required"))?,
            )?,
            addresses: PortalAddresses {
                ether_portal: address_or("ETHER_PORTAL_ADDRESS", defaults.ether_portal)?,
                erc20_portal: address_or("ERC20_PORTAL_ADDRESS", defaults.erc20_portal)?,
                erc721_portal: address_or("ERC721_PORTAL_ADDRESS", defaults.erc721_portal)?,
                input_box: address_or("INPUT_BOX_ADDRESS", defaults.input_box)?,
                dapp_address_relay: address_or(
                    "DAPP_ADDRESS_RELAY_ADDRESS",
                    defaults.dapp_address_relay,
                )?,
            },
            token_decimals: match env::var("TOKEN_DECIMALS") {
                Ok(v) => v
                    .parse::<u8>()
                    .map_err(|_| eyre!("Invalid TOKEN_DECIMALS: {}", v))?,
                Err(_) => DEFAULT_DECIMALS,
            },
            submit_mode: match env::var("SUBMIT_MODE") {
                Ok(v) => v.parse::<SubmitMode>().wrap_err("Invalid SUBMIT_MODE")?,
                Err(_) => SubmitMode::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(eyre!("RPC_URL cannot be empty"));
        }

        if let Some(key) = &self.private_key {
            if key.len() != 66 || !key.starts_with("0x") {
                return Err(eyre!("PRIVATE_KEY must be 66 chars (0x + 64 hex chars)"));
            }
        }

        if self.token_decimals > 77 {
            return Err(eyre!("TOKEN_DECIMALS must be at most 77"));
        }

        Ok(())
    }

    pub fn has_signer(&self) -> bool {
        self.private_key.is_some()
    }
}

fn parse_address(name: &str, value: &str) -> Result<Address> {
    value
        .trim()
        .parse()
        .map_err(|e| eyre!("Invalid {}: {} ({})", name, value, e))
}

fn address_or(name: &str, default: Address) -> Result<Address> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => parse_address(name, &v),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "RPC_URL",
        "CHAIN_ID",
        "PRIVATE_KEY",
        "DAPP_ADDRESS",
        "TOKEN_DECIMALS",
        "SUBMIT_MODE",
        "ETHER_PORTAL_ADDRESS",
        "ERC20_PORTAL_ADDRESS",
        "ERC721_PORTAL_ADDRESS",
        "INPUT_BOX_ADDRESS",
        "DAPP_ADDRESS_RELAY_ADDRESS",
    ];

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn reset_env() {
        for var in VARS {
            env::remove_var(var);
        }
        env::set_var("RPC_URL", "http://localhost:8545");
        env::set_var("CHAIN_ID", "31337");
        env::set_var("DAPP_ADDRESS", "0x70ac08179605af2d9e75782b8decdd3c22aa4d0c");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        reset_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.chain_id, 31337);
        assert!(!config.has_signer());
        assert_eq!(config.addresses, PortalAddresses::default());
        assert_eq!(config.token_decimals, DEFAULT_DECIMALS);
        assert_eq!(config.submit_mode, SubmitMode::FireAndForget);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        reset_env();
        env::set_var("PRIVATE_KEY", ANVIL_KEY);
        env::set_var("TOKEN_DECIMALS", "6");
        env::set_var("SUBMIT_MODE", "confirm");
        env::set_var(
            "INPUT_BOX_ADDRESS",
            "0x1111111111111111111111111111111111111111",
        );

        let config = Config::from_env().unwrap();
        assert!(config.has_signer());
        assert_eq!(config.token_decimals, 6);
        assert_eq!(config.submit_mode, SubmitMode::Confirmed);
        assert_eq!(
            config.addresses.input_box,
            "0x1111111111111111111111111111111111111111"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(
            config.addresses.ether_portal,
            PortalAddresses::default().ether_portal
        );
        reset_env();
    }

    #[test]
    #[serial]
    fn test_missing_required() {
        reset_env();
        env::remove_var("DAPP_ADDRESS");
        assert!(Config::from_env().is_err());

        reset_env();
        env::set_var("CHAIN_ID", "anvil");
        assert!(Config::from_env().is_err());
        reset_env();
    }

    #[test]
    #[serial]
    fn test_rejects_malformed_values() {
        reset_env();
        env::set_var("PRIVATE_KEY", "0x123");
        assert!(Config::from_env().is_err());

        reset_env();
        env::set_var("SUBMIT_MODE", "eventually");
        assert!(Config::from_env().is_err());

        reset_env();
        env::set_var("ERC20_PORTAL_ADDRESS", "not-an-address");
        assert!(Config::from_env().is_err());
        reset_env();
    }

    #[test]
    #[serial]
    fn test_debug_redacts_private_key() {
        reset_env();
        env::set_var("PRIVATE_KEY", ANVIL_KEY);
        let config = Config::from_env().unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains(ANVIL_KEY));
        assert!(debug.contains("<redacted>"));
        reset_env();
    }
}
