//! Command-line parsing.
//!
//! The surface is deliberately tiny: no arguments runs the pipeline once,
//! `--agendar` keeps it running on a schedule.

use clap::Parser;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bcb-etl", version, about = "BCB economic indicators ETL (SGS API -> SQLite)")]
pub struct Cli {
    /// Run now, then every configured interval until interrupted (Ctrl+C).
    #[arg(long)]
    pub agendar: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Single run, then exit.
    Immediate,
    /// Run now and on a recurring schedule.
    Recurring,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.agendar {
            RunMode::Recurring
        } else {
            RunMode::Immediate
        }
    }
}
