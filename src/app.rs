//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - initializes logging
//! - loads configuration
//! - runs the pipeline once or hands it to the scheduler

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, RunMode};
use crate::config::EtlConfig;
use crate::data::BcbClient;
use crate::error::AppError;

pub mod pipeline;
pub mod scheduler;

use pipeline::Pipeline;
use scheduler::{Scheduler, StopSignal, SystemClock};

/// Entry point for the `bcb-etl` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging();

    let config = EtlConfig::from_env()?;
    let pipeline = Pipeline::new(&config, BcbClient::new(&config.api_base_url));

    match cli.mode() {
        RunMode::Immediate => {
            pipeline.run();
        }
        RunMode::Recurring => {
            let stop = StopSignal::new();
            let handler_stop = stop.clone();
            ctrlc::set_handler(move || handler_stop.trigger())?;

            Scheduler::new(SystemClock::new(), config.schedule, stop).run(|| {
                pipeline.run();
            });
        }
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bcb_etl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
