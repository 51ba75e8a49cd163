use meq_core::{CurveError, Expr};

/// Errors that can occur while solving for an equilibrium
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EquilibriumError {
    /// A curve or a substituted value was invalid
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] CurveError),
    /// Zero, or more than one, root has non-negative price and quantity
    #[error("expected exactly one admissible equilibrium, found {}", candidates.len())]
    Ambiguous {
        /// The admissible candidate prices
        candidates: Vec<Expr>,
    },
    /// No closed-form solution is available for this combination of curves
    #[error("no closed-form solution: {0}")]
    Unsolvable(String),
}
