use crate::CliError;
use meq_solver::{
    MarketConfig,
    io::{Market, SampleReport},
};

pub fn samples(market: &Market, config: &MarketConfig, points: usize) -> Result<SampleReport, CliError> {
    if points < 2 {
        return Err(CliError::TooFewPoints(points));
    }
    Ok(market.sample(config, points)?)
}
