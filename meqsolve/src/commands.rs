use super::IOArgs;
use clap::Subcommand;

pub(crate) mod sample;
pub(crate) mod solve;

#[derive(Subcommand)]
pub enum Commands {
    /// Solve the market and report the equilibrium and its surpluses
    Solve {
        #[command(flatten)]
        io: IOArgs,
    },

    /// Sample both curves from zero to twice the equilibrium price, for plotting
    Sample {
        #[command(flatten)]
        io: IOArgs,

        /// The number of prices to sample
        #[arg(short = 'n', long, default_value_t = 50)]
        points: usize,
    },
}
