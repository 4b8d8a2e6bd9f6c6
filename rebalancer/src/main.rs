//! CLI entry point for the driftbook rebalancer.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::info;

use driftbook_rebalancer::broker::connect_bitkub;
use driftbook_rebalancer::config::Config;
use driftbook_rebalancer::control::{self, LoopOptions, StopSignal};
use driftbook_rebalancer::error::Error;

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Keep a Bitkub portfolio at its target weights")]
#[command(version)]
struct Cli {
    /// Path to the JSON configuration file
    config: PathBuf,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Plan and log orders without placing them
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        match &e {
            Error::TooManyFailures { .. } => {
                eprintln!("Giving up: {e}");
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let config = Config::load(&cli.config)?;
    let settings = config.cycle_settings(cli.dry_run)?;
    let exchange = connect_bitkub(&config)?;

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        info!("Stop requested; exiting after the current cycle");
        handler_stop.stop();
    })
    .map_err(|e| Error::Signal(e.to_string()))?;

    let options = LoopOptions {
        interval: config.interval()?,
        max_consecutive_failures: config.max_consecutive_failures,
        max_cycles: cli.once.then_some(1),
    };

    info!(
        "Rebalancing {} assets against {} every {:?} (trigger {})",
        settings.targets.len(),
        settings.base_fiat,
        options.interval,
        settings.trigger_threshold,
    );

    let summary = control::run_loop(exchange.as_ref(), &settings, &options, &stop)?;
    info!(
        "{} orders placed, {} failed",
        summary.orders_placed, summary.orders_failed
    );
    Ok(())
}
