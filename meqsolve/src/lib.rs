use clap::Parser;
use meq_solver::EquilibriumError;
use std::path::PathBuf;

mod io;
pub use io::*;

mod commands;
pub use commands::*;

mod config;
pub use config::ConfigArgs;

// The top-level arguments: how to configure the solver, and which subcommand to execute
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct BaseArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

impl BaseArgs {
    pub fn evaluate(self) -> anyhow::Result<()> {
        let config = self.config.load()?;

        match self.command {
            Commands::Solve { io } => {
                let market = io.read_market()?;
                let report = commands::solve::report(&market, &config)?;
                io.write_report(&report)?;
            }
            Commands::Sample { io, points } => {
                let market = io.read_market()?;
                let samples = commands::sample::samples(&market, &config, points)?;
                io.write_report(&samples)?;
            }
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Config file {} does not exist", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Unable to solve the market: {0}")]
    Equilibrium(#[from] EquilibriumError),

    #[error("Cannot sample fewer than 2 points, got {0}")]
    TooFewPoints(usize),
}
