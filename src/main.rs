//! Rollup Portal CLI
//!
//! Deposits assets into a rollup, submits withdrawal requests and raw
//! transactions through the input box, and relays the rollup address.
//!
//! Without `PRIVATE_KEY` every chain command is skipped. `encode` never
//! touches the chain.

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use tracing::{info, warn};

use rollup_portal::evm::EvmRollupChain;
use rollup_portal::{
    encode_note, encode_raw_transaction, encode_withdrawal, parse_amount, Config,
    DispatchOutcome, PortalClient, RelayGate, RelayOutcome, RollupChain, SubmitMode,
    WithdrawalRequest, DEFAULT_DECIMALS,
};

#[derive(Parser)]
#[command(name = "rollup-portal")]
#[command(about = "Move assets and requests into a rollup through its portals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Wait for one confirmation and fail on revert
    #[arg(long, global = true)]
    confirm: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deposit native coin
    DepositEther {
        /// Decimal amount (e.g. 1.5)
        #[arg(long)]
        amount: String,

        /// Rollup-side recipient (defaults to the signer)
        #[arg(long)]
        destination: Option<Address>,
    },

    /// Deposit ERC20 tokens, approving the portal when needed
    DepositErc20 {
        #[arg(long)]
        token: Address,

        /// Decimal amount in token units
        #[arg(long)]
        amount: String,

        /// Note attached to the deposit
        #[arg(long)]
        note: Option<String>,
    },

    /// Deposit one ERC721 token, approving the portal when needed
    DepositErc721 {
        #[arg(long)]
        token: Address,

        #[arg(long)]
        token_id: U256,

        /// Note attached to the deposit
        #[arg(long)]
        note: Option<String>,
    },

    /// Request a native coin withdrawal
    WithdrawEther {
        #[arg(long)]
        amount: String,
    },

    /// Request an ERC20 withdrawal
    WithdrawErc20 {
        #[arg(long)]
        token: Address,

        #[arg(long)]
        amount: String,
    },

    /// Request an ERC721 withdrawal
    WithdrawErc721 {
        #[arg(long)]
        token: Address,

        #[arg(long)]
        token_id: U256,
    },

    /// Submit an address-prefixed raw transaction
    Transact {
        /// 20-byte address prefix
        #[arg(long)]
        address: Address,

        /// Hex body, with or without 0x
        #[arg(long)]
        payload: String,
    },

    /// Relay the rollup address
    Relay,

    /// Print an encoded payload as hex without sending it
    Encode {
        #[command(subcommand)]
        payload: EncodeCommand,
    },
}

#[derive(Subcommand)]
enum EncodeCommand {
    /// Withdrawal request for native coin (amount in base units)
    WithdrawEther {
        #[arg(long)]
        amount: U256,
    },

    /// Withdrawal request for ERC20 tokens (amount in base units)
    WithdrawErc20 {
        #[arg(long)]
        token: Address,

        #[arg(long)]
        amount: U256,
    },

    /// Withdrawal request for one ERC721 token
    WithdrawErc721 {
        #[arg(long)]
        token: Address,

        #[arg(long)]
        token_id: U256,
    },

    /// Raw transaction input
    Transact {
        #[arg(long)]
        address: Address,

        #[arg(long)]
        payload: String,
    },

    /// Deposit note
    Note { text: String },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    if let Commands::Encode { payload } = &cli.command {
        return print_encoded(payload);
    }

    let mut config = Config::load()?;
    if cli.confirm {
        config.submit_mode = SubmitMode::Confirmed;
    }
    info!(
        rpc_url = %config.rpc_url,
        chain_id = config.chain_id,
        dapp = %config.dapp_address,
        mode = ?config.submit_mode,
        "Configuration loaded"
    );
    if !config.has_signer() {
        warn!("PRIVATE_KEY not set, chain commands will be skipped");
    }

    let chain = EvmRollupChain::new(
        &config.rpc_url,
        config.chain_id,
        config.private_key.as_deref(),
    )?;
    chain.verify_chain_id().await?;

    let client = PortalClient::new(chain, config.dapp_address)
        .with_addresses(config.addresses)
        .with_mode(config.submit_mode)
        .with_token_decimals(config.token_decimals);

    let outcome = match cli.command {
        Commands::DepositEther {
            amount,
            destination,
        } => {
            let destination = match destination.or_else(|| client.chain().signer_address()) {
                Some(destination) => destination,
                None => {
                    warn!("No signer available, nothing sent");
                    return Ok(());
                }
            };
            client.deposit_native(&amount, destination).await?
        }
        Commands::DepositErc20 {
            token,
            amount,
            note,
        } => {
            client
                .deposit_fungible(token, &amount, note.as_deref())
                .await?
        }
        Commands::DepositErc721 {
            token,
            token_id,
            note,
        } => {
            client
                .deposit_non_fungible(token, token_id, note.as_deref())
                .await?
        }
        Commands::WithdrawEther { amount } => {
            let request = WithdrawalRequest::ether(parse_amount(&amount, DEFAULT_DECIMALS)?);
            client.submit_withdrawal(&request).await?
        }
        Commands::WithdrawErc20 { token, amount } => {
            let request =
                WithdrawalRequest::erc20(token, parse_amount(&amount, config.token_decimals)?);
            client.submit_withdrawal(&request).await?
        }
        Commands::WithdrawErc721 { token, token_id } => {
            let request = WithdrawalRequest::erc721(token, token_id)?;
            client.submit_withdrawal(&request).await?
        }
        Commands::Transact { address, payload } => {
            client.submit_raw_transaction(address, &payload).await?
        }
        Commands::Relay => {
            let mut gate = RelayGate::new(config.dapp_address);
            match client.relay_address(&mut gate).await? {
                RelayOutcome::Relayed(submission) => DispatchOutcome::Submitted(submission),
                RelayOutcome::AlreadyRelayed | RelayOutcome::Skipped => DispatchOutcome::Skipped {
                    reason: "relay: nothing sent".to_string(),
                },
            }
        }
        Commands::Encode { payload } => return print_encoded(&payload),
    };

    report(&outcome);
    Ok(())
}

fn print_encoded(payload: &EncodeCommand) -> Result<()> {
    let bytes = match payload {
        EncodeCommand::WithdrawEther { amount } => {
            encode_withdrawal(&WithdrawalRequest::ether(*amount))?
        }
        EncodeCommand::WithdrawErc20 { token, amount } => {
            encode_withdrawal(&WithdrawalRequest::erc20(*token, *amount))?
        }
        EncodeCommand::WithdrawErc721 { token, token_id } => {
            encode_withdrawal(&WithdrawalRequest::erc721(*token, *token_id)?)?
        }
        EncodeCommand::Transact { address, payload } => {
            encode_raw_transaction(*address, payload).wrap_err("Invalid transaction payload")?
        }
        EncodeCommand::Note { text } => encode_note(text),
    };

    println!("{}", bytes);
    Ok(())
}

fn report(outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Skipped { reason } => warn!(reason = %reason, "Nothing sent"),
        DispatchOutcome::Submitted(submission) => {
            match &submission.receipt {
                Some(receipt) => info!(
                    tx_hash = %submission.tx_hash,
                    block = receipt.block_number,
                    "Transaction confirmed"
                ),
                None => info!(tx_hash = %submission.tx_hash, "Transaction submitted"),
            }
            println!("{}", submission.tx_hash);
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose {
        "debug"
    } else {
        "info,rollup_portal=debug"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
