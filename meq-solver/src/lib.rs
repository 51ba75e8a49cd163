#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

use meq_core::{Curve, CurveSpec, Side};
use tracing::{Level, event};

/**
 * Solver and market settings.
 */
mod config;
pub use config::*;

/**
 * The solution of a market and its welfare measures.
 */
mod equilibrium;
pub use equilibrium::{Equilibrium, NumericEquilibrium, Surplus};

mod error;
pub use error::EquilibriumError;

mod integrate;
mod roots;

/// Market documents and reports, for use by command line tooling
#[cfg(feature = "io")]
pub mod io;

/// A solver produces the equilibrium of a demand and a supply curve
pub trait Solver {
    /// The configuration type for this solver
    type Settings;

    /// Create a new instance with the provided settings
    fn new(settings: Self::Settings) -> Self;

    /// Solve `demand(p) = supply(p)` and compute the resulting surpluses
    ///
    /// # Errors
    /// * `InvalidParameter` - a curve is on the wrong side of the market
    /// * `Ambiguous` - zero or several roots have non-negative price and quantity
    /// * `Unsolvable` - no closed form applies and the numeric fallback cannot be
    ///   used, or a surplus cannot be integrated
    fn solve(&self, demand: &Curve, supply: &Curve) -> Result<Equilibrium, EquilibriumError>;
}

/// The closed-form solver, with an optional numeric fallback for fully numeric markets
#[derive(Clone, Debug, Default)]
pub struct SymbolicSolver(SolverConfig);

impl SymbolicSolver {
    /// The settings in use
    pub fn settings(&self) -> &SolverConfig {
        &self.0
    }
}

impl Solver for SymbolicSolver {
    type Settings = SolverConfig;

    fn new(settings: Self::Settings) -> Self {
        Self(settings)
    }

    fn solve(&self, demand: &Curve, supply: &Curve) -> Result<Equilibrium, EquilibriumError> {
        let demand = demand.expect_side(Side::Demand)?;
        let supply = supply.expect_side(Side::Supply)?;
        event!(
            Level::DEBUG,
            demand = %demand.family(),
            supply = %supply.family(),
            "solving for equilibrium"
        );

        let candidates = roots::candidate_prices(demand, supply, &self.0)?;
        event!(Level::DEBUG, count = candidates.len(), "candidate prices");

        let (price, quantity) = equilibrium::select(candidates, demand, self.0.tolerance)?;
        Equilibrium::from_price(price, quantity, demand, supply)
    }
}

/// Solve a market with the default solver settings
pub fn solve_equilibrium(demand: &Curve, supply: &Curve) -> Result<Equilibrium, EquilibriumError> {
    SymbolicSolver::default().solve(demand, supply)
}

/// Build both curves from their specifications and solve the market
pub fn market_equilibrium(
    demand: &CurveSpec,
    supply: &CurveSpec,
    config: &MarketConfig,
) -> Result<Equilibrium, EquilibriumError> {
    let demand = demand.build(Side::Demand, &config.curves)?;
    let supply = supply.build(Side::Supply, &config.curves)?;
    SymbolicSolver::new(config.solver.clone()).solve(&demand, &supply)
}
