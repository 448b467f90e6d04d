//! factory-sim: run the factory telemetry generator from the command line
//!
//! Values are reported through `tracing`; set `RUST_LOG` or `[logging]` in
//! the configuration to control verbosity.

use clap::Parser;
use factory_sim::config::{ConfigLoader, SimulatorConfig};
use factory_sim::publish::TracingPublisher;
use factory_sim::simulation::CyclePacing;
use factory_sim::simulator::{shutdown_channel, FactorySimulator};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "factory-sim", version, about = "Generate live telemetry for a virtual factory")]
struct Args {
    /// Configuration file; repeat to layer several, later files win
    #[arg(short, long = "config", value_name = "FILE")]
    configs: Vec<PathBuf>,

    /// Stop after this many cycles instead of running until Ctrl-C
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Seed the random source for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Wait a random one to three seconds between cycles
    #[arg(long)]
    random_pacing: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Print the last committed snapshot as JSON on exit
    #[arg(long)]
    dump_snapshot: bool,
}

fn load_config(args: &Args) -> Result<SimulatorConfig, Box<dyn std::error::Error>> {
    let mut loader = if args.configs.is_empty() {
        ConfigLoader::new()
    } else {
        ConfigLoader::with_paths(args.configs.clone())
    };

    let mut config = loader.load()?;
    if args.seed.is_some() {
        config.engine.seed = args.seed;
    }
    if args.random_pacing {
        config.pacing = CyclePacing::random();
    }
    Ok(config)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config.logging.level);

    if args.print_config {
        let mut explicit = config.clone();
        explicit.topology = Some(config.build_factory()?.to_spec());
        println!("{}", toml::to_string_pretty(&explicit)?);
        return Ok(());
    }

    let publisher = TracingPublisher::new(config.logging.log_writes);
    let mut simulator = match FactorySimulator::new(&config, publisher).await {
        Ok(simulator) => simulator,
        Err(e) => {
            error!(error = %e, "Failed to start factory simulator");
            return Err(e.into());
        }
    };

    info!(
        endpoint = %config.server.endpoint,
        server = %config.server.server_name,
        "Factory simulator running"
    );

    let (shutdown, signal) = shutdown_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => warn!(error = %e, "Unable to listen for Ctrl-C"),
        }
        let _ = shutdown.send(true);
    });

    let summary = simulator.run_until(args.ticks, signal).await;
    info!(
        cycles = summary.cycles,
        published = summary.published,
        failed = summary.failed,
        refreshes = summary.refreshes,
        "Factory simulator stopped"
    );

    if args.dump_snapshot {
        println!("{}", serde_json::to_string_pretty(&*simulator.snapshot())?);
    }

    Ok(())
}
