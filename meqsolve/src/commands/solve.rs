use crate::CliError;
use meq_solver::{
    MarketConfig,
    io::{EquilibriumReport, Market},
};
use tracing::{Level, event};

pub fn report(market: &Market, config: &MarketConfig) -> Result<EquilibriumReport, CliError> {
    let report = market.solve(config)?;
    if report.numeric.is_none() {
        event!(
            Level::INFO,
            parameters = ?report.parameters,
            "some parameters have no value, reporting symbolic results only"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meq_core::{CurveConfig, CurveKind, CurveSpec};
    use meq_solver::EquilibriumError;

    #[test]
    fn test_unsolvable_market() {
        let market = Market {
            demand: CurveSpec::new(CurveKind::Exponential),
            supply: CurveSpec::new(CurveKind::Linear),
            values: Default::default(),
        };
        assert!(matches!(
            report(&market, &MarketConfig::default()),
            Err(CliError::Equilibrium(EquilibriumError::Unsolvable(_)))
        ));
    }

    #[test]
    fn test_numeric_market_without_closed_form() {
        let market = Market {
            demand: CurveSpec::new(CurveKind::Exponential),
            supply: CurveSpec::new(CurveKind::Linear),
            values: Default::default(),
        };
        let mut config = MarketConfig {
            curves: CurveConfig::numeric(),
            ..Default::default()
        };
        let numeric = report(&market, &config).unwrap().numeric.unwrap();
        assert!(numeric.is_valid());

        config.solver.numeric_fallback = false;
        assert!(matches!(
            report(&market, &config),
            Err(CliError::Equilibrium(EquilibriumError::Unsolvable(_)))
        ));
    }
}
