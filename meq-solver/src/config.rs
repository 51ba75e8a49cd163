use meq_core::CurveConfig;

/// Settings for [`SymbolicSolver`](crate::SymbolicSolver)
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SolverConfig {
    /// Fall back to a bracketing search on the price axis when no closed form
    /// applies. Only used when every curve coefficient is numeric, and on by
    /// default.
    pub numeric_fallback: bool,
    /// The upper end of the price range searched by the numeric fallback
    pub max_price: f64,
    /// The number of grid points used to bracket roots in the numeric fallback
    pub grid_points: usize,
    /// Absolute tolerance for deciding that a number is non-negative, for merging
    /// duplicate roots, and for terminating bisection
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            numeric_fallback: true,
            max_price: 1e6,
            grid_points: 4096,
            tolerance: 1e-9,
        }
    }
}

/// Everything needed to go from curve specifications to an equilibrium
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MarketConfig {
    /// How curves are built from their specifications
    pub curves: CurveConfig,
    /// How the equilibrium is solved
    pub solver: SolverConfig,
}
