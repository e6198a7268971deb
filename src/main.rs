use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use eyre::{eyre, Result};
use std::str::FromStr;
use std::time::Duration;

use bridge_orchestrator::claims::format_time_remaining;
use bridge_orchestrator::{
    format_amount, BridgeConfig, BridgeSession, ChainSide, Direction, TransferState,
};

#[derive(Parser)]
#[command(name = "bridge-orchestrator", about = "Drive the L1/L2 token bridge")]
struct Cli {
    /// Path to the environment file.
    #[arg(long, default_value = ".env")]
    env_file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List bridgeable tokens per chain.
    Tokens {
        /// Restrict to one side (l1 or l2).
        #[arg(long)]
        chain: Option<String>,
    },
    /// Resolve a custom ERC-20 by contract address.
    Resolve {
        /// Which side the contract lives on (l1 or l2).
        chain: String,
        /// Token contract address.
        address: String,
    },
    /// Deposit from L1 to L2.
    Deposit {
        /// Source token symbol on L1.
        token: String,
        /// Decimal amount, e.g. "1.5".
        amount: String,
    },
    /// Withdraw from L2 to L1.
    Withdraw {
        /// Source token symbol on L2.
        token: String,
        /// Decimal amount, e.g. "1.5".
        amount: String,
    },
    /// List pending L2→L1 withdrawals for the session wallet.
    Pending,
    /// Keep refreshing claim eligibility until interrupted.
    Watch,
    /// Claim a withdrawal on L1 after its challenge period.
    Claim {
        /// Withdrawal id from the pending list.
        withdrawal_id: u64,
        /// Origin-chain (L2) transaction hash of the withdrawal.
        origin_tx: String,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = BridgeConfig::load_from_file(&cli.env_file)?;
    tracing::info!(
        l1_chain_id = config.l1.chain_id,
        l2_chain_id = config.l2.chain_id,
        "Configuration loaded"
    );

    let session = BridgeSession::connect(config).await?;

    match cli.command {
        Command::Tokens { chain } => run_tokens(&session, chain.as_deref())?,
        Command::Resolve { chain, address } => run_resolve(&session, &chain, &address).await?,
        Command::Deposit { token, amount } => {
            run_transfer(&session, Direction::Deposit, &token, &amount).await?
        }
        Command::Withdraw { token, amount } => {
            run_transfer(&session, Direction::Withdraw, &token, &amount).await?
        }
        Command::Pending => run_pending(&session).await,
        Command::Watch => run_watch(&session).await,
        Command::Claim {
            withdrawal_id,
            origin_tx,
        } => run_claim(&session, withdrawal_id, &origin_tx).await?,
    }

    Ok(())
}

fn parse_side(input: &str) -> Result<ChainSide> {
    match input.to_ascii_lowercase().as_str() {
        "l1" => Ok(ChainSide::L1),
        "l2" => Ok(ChainSide::L2),
        other => Err(eyre!("unknown chain {other:?}, expected l1 or l2")),
    }
}

fn run_tokens(session: &BridgeSession, side: Option<&str>) -> Result<()> {
    let sides = match side {
        Some(s) => vec![parse_side(s)?],
        None => vec![ChainSide::L1, ChainSide::L2],
    };

    for side in sides {
        let chain = session.directory().chain(side);
        println!("{} ({}, chain id {}):", chain.name, side, chain.id);
        for token in session.available_tokens(chain.id) {
            let location = match token.address_on(chain.id) {
                Some(address) => format!("{address}"),
                None => "native".to_string(),
            };
            println!(
                "  {:8} {:24} decimals={:2}  {}",
                token.symbol, token.name, token.decimals, location
            );
        }
    }
    Ok(())
}

async fn run_resolve(session: &BridgeSession, side: &str, address: &str) -> Result<()> {
    let side = parse_side(side)?;
    let chain = session.directory().chain(side);
    let address = Address::from_str(address).map_err(|e| eyre!("invalid address: {e}"))?;

    let token = session.resolve_custom_token(chain.id, address).await?;
    println!(
        "{} ({}) decimals={} at {} on {}",
        token.symbol, token.name, token.decimals, address, chain.name
    );
    Ok(())
}

async fn run_transfer(
    session: &BridgeSession,
    direction: Direction,
    token: &str,
    amount: &str,
) -> Result<()> {
    let (selected, counterpart) = session.select_token(direction, token)?;
    println!(
        "{}: {} {} -> {}",
        direction, amount, selected.symbol, counterpart.symbol
    );

    if let Ok(units) = bridge_orchestrator::parse_amount(amount, selected.decimals) {
        let fee = session.estimate_fee(units);
        println!(
            "estimated bridge fee: {} ({} bps + base)",
            format_amount(fee, 18),
            session.fee_schedule().fee_bps()
        );
    }

    let source_side = match direction {
        Direction::Deposit => ChainSide::L1,
        _ => ChainSide::L2,
    };

    let result = session.transfer(direction, token, amount).await;
    let status = match direction {
        Direction::Deposit => session.deposit_status(),
        _ => session.withdraw_status(),
    };

    match result {
        Ok(Some(tx)) => {
            println!("confirmed: {}", session.tx_url(source_side, &tx));
        }
        Ok(None) => println!("already in flight, nothing submitted"),
        Err(e) => {
            if status.state == TransferState::Failed {
                println!(
                    "{} failed: {}",
                    direction,
                    status.error_message.as_deref().unwrap_or("Unknown error")
                );
            }
            return Err(e.into());
        }
    }
    Ok(())
}

async fn run_pending(session: &BridgeSession) {
    session.refresh_withdrawals().await;
    let withdrawals = session.pending_withdrawals();

    if withdrawals.is_empty() {
        println!("no pending withdrawals for {}", session.wallet_address());
        return;
    }

    for w in withdrawals {
        let state = if w.processed {
            "claimed".to_string()
        } else if w.claimable {
            "ready".to_string()
        } else {
            format_time_remaining(w.time_remaining)
        };
        let asset = if w.is_native() {
            session.config().l1.coin_symbol.clone()
        } else {
            format!("{}", w.token)
        };
        println!(
            "#{:<6} {:>26} {}  {}",
            w.withdrawal_id,
            format_amount(w.amount, 18),
            asset,
            state
        );
    }
}

async fn run_watch(session: &BridgeSession) {
    session.refresh_withdrawals().await;
    let poller = session.spawn_claim_polling();
    println!(
        "watching withdrawals for {} (Ctrl+C to stop)",
        session.wallet_address()
    );

    let interval = Duration::from_millis(session.config().polling.claim_interval_ms);
    let mut timer = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = timer.tick() => {
                let ready = session
                    .pending_withdrawals()
                    .iter()
                    .filter(|w| w.claimable)
                    .count();
                let pending = session
                    .pending_withdrawals()
                    .iter()
                    .filter(|w| !w.processed)
                    .count();
                tracing::info!(pending, ready, "claim eligibility refreshed");
            }
            _ = wait_for_shutdown_signal() => {
                println!("stopping watch");
                break;
            }
        }
    }
    poller.cancel();
}

/// Wait for shutdown signals (SIGINT/SIGTERM)
async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn run_claim(session: &BridgeSession, withdrawal_id: u64, origin_tx: &str) -> Result<()> {
    session.refresh_withdrawals().await;

    match session.claim(withdrawal_id, origin_tx).await {
        Ok(Some(tx)) => {
            println!("claimed: {}", session.tx_url(ChainSide::L1, &tx));
            Ok(())
        }
        Ok(None) => {
            println!("claim already in flight, nothing submitted");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Initialize tracing/logging with structured output
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bridge_orchestrator=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
