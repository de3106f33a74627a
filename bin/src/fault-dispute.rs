use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use ethers::types::Address;
use fault_dispute_driver::{
    cancel_pair, Agent, DisputeGameFactory, Driver, DriverConfig, GameCreator, GameDriver,
    LocalL1,
};
use fault_dispute_solvers::fault::{
    AlphabetTraceProvider, AlphabetVm, Claim, FaultSolver, GameType,
};
use std::{path::PathBuf, sync::Arc};
use tracing::Level;

/// The honest alphabet trace.
const CORRECT_ALPHABET: &str = "abcdefghijklmnop";

/// Arguments for the `fault-dispute` binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Verbosity level (0-4)
    #[arg(long, short, help = "Verbosity level (0-4)", action = ArgAction::Count, env = "VERBOSITY")]
    v: u8,

    /// The alphabet the defender claims. Its last letter becomes the root claim.
    #[arg(
        long,
        short,
        help = "The alphabet the defender claims.",
        default_value = CORRECT_ALPHABET,
        env = "FAULT_DISPUTE_CLAIMED_ALPHABET"
    )]
    claimed_alphabet: String,

    /// The alphabet the challenger believes is correct.
    #[arg(
        long,
        help = "The alphabet the challenger believes is correct.",
        default_value = CORRECT_ALPHABET,
        env = "FAULT_DISPUTE_HONEST_ALPHABET"
    )]
    honest_alphabet: String,

    /// Optional JSON file with the driver configuration.
    #[arg(
        long,
        help = "Optional JSON file with the driver configuration.",
        env = "FAULT_DISPUTE_CONFIG"
    )]
    config: Option<PathBuf>,

    /// Print every claim of the finished game as JSON.
    #[arg(long, help = "Print every claim of the finished game as JSON.")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse the command arguments
    let Args {
        v,
        claimed_alphabet,
        honest_alphabet,
        config,
        json,
    } = Args::parse();

    // Initialize the tracing subscriber
    init_tracing_subscriber(v)?;

    // Load the driver config.
    let config = Arc::new(match config {
        Some(path) => DriverConfig::from_file(path)?,
        None => DriverConfig::default(),
    });
    tracing::info!(target: "fault-dispute-cli", "Driver config loaded successfully.");

    // Stand up a local L1 with the two output proposals a game needs.
    let l1 = Arc::new(LocalL1::new(0));
    l1.propose_output(Claim::repeat_byte(0x01)).await;
    l1.propose_output(Claim::repeat_byte(0x02)).await;

    let factory = Arc::new(DisputeGameFactory::new());
    factory
        .set_implementation(GameType::Alphabet, config.alphabet_depth, Arc::new(AlphabetVm))
        .await;

    let (defender, challenger) = (Address::from_low_u64_be(1), Address::from_low_u64_be(2));
    let (cancel_handle, cancel) = cancel_pair();
    let creator = GameCreator::new(
        Arc::clone(&config),
        Arc::clone(&factory),
        l1,
        defender,
        cancel.clone(),
    );

    tracing::debug!(target: "fault-dispute-cli", "Creating alphabet game for claimed alphabet {}", claimed_alphabet);
    let game = creator.start_alphabet_game(&claimed_alphabet).await?;
    tracing::info!(target: "fault-dispute-cli", "Game {} created successfully.", game.id());

    let solver = |alphabet: &str, agree_with_root: bool| {
        FaultSolver::new(
            Arc::new(AlphabetTraceProvider::new(alphabet, config.alphabet_depth)),
            agree_with_root,
        )
    };
    let agents = vec![
        Agent::new(solver(&claimed_alphabet, true), defender),
        Agent::new(solver(&honest_alphabet, false), challenger),
    ];

    // Stop the driver on ctrl-c.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_handle.cancel();
        }
    });

    // Start the driver loop.
    GameDriver::new(game.clone(), agents, cancel).start_loop().await?;

    let snapshot = game.snapshot().await;
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.claims())?);
    }
    println!("{}", game.status().await);

    Ok(())
}

/// Initializes the tracing subscriber
///
/// # Arguments
/// * `verbosity_level` - The verbosity level (0-4)
///
/// # Returns
/// * `Result<()>` - Ok if successful, Err otherwise.
fn init_tracing_subscriber(verbosity_level: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(match verbosity_level {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))
}
