use crate::{EquilibriumError, MarketConfig, NumericEquilibrium, Surplus, market_equilibrium};
use meq_core::{CurveSpec, Expr, Map, Point, Symbol};
use serde::{Deserialize, Serialize};

/// a market as read from an input document
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Market {
    /// the demand curve
    pub demand: CurveSpec,
    /// the supply curve
    pub supply: CurveSpec,
    /// numbers for (some of) the free parameters
    #[serde(default)]
    pub values: Map<Symbol, f64>,
}

/// an expression rendered for humans and for typesetting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rendered {
    /// plain text
    pub text: String,
    /// LaTeX
    pub latex: String,
}

impl From<&Expr> for Rendered {
    fn from(expr: &Expr) -> Self {
        Self {
            text: expr.to_string(),
            latex: expr.latex(),
        }
    }
}

impl From<&Surplus> for Rendered {
    fn from(surplus: &Surplus) -> Self {
        match surplus {
            Surplus::Finite(expr) => expr.into(),
            Surplus::Conditional { expr, converges_if } => {
                let conditions = converges_if
                    .iter()
                    .map(|condition| format!("{} > 0", condition.latex()))
                    .collect::<Vec<_>>();
                Self {
                    text: surplus.to_string(),
                    latex: format!(
                        r"{} \quad \text{{if }} {}",
                        expr.latex(),
                        conditions.join(r" \text{ and } ")
                    ),
                }
            }
            Surplus::Unbounded => Self {
                text: "unbounded".to_owned(),
                latex: r"\infty".to_owned(),
            },
        }
    }
}

/// a representation of the solution of a market
#[derive(Debug, Serialize, Deserialize)]
pub struct EquilibriumReport {
    /// the demand curve `q(p)`
    pub demand: Rendered,
    /// the supply curve `q(p)`
    pub supply: Rendered,
    /// the inverse demand curve `p(q)`
    pub inverse_demand: Rendered,
    /// the clearing price
    pub price: Rendered,
    /// the traded quantity
    pub quantity: Rendered,
    /// the consumer surplus
    pub consumer_surplus: Rendered,
    /// the producer surplus
    pub producer_surplus: Rendered,
    /// the total surplus
    pub total_surplus: Rendered,
    /// the free parameters of the market
    pub parameters: Vec<Symbol>,
    /// the numeric solution, when every parameter has a value
    pub numeric: Option<NumericEquilibrium>,
}

/// plot-ready samples of both curves around the equilibrium
#[derive(Debug, Serialize, Deserialize)]
pub struct SampleReport {
    /// the equilibrium point
    pub equilibrium: Point,
    /// points on the demand curve
    pub demand: Vec<Point>,
    /// points on the supply curve
    pub supply: Vec<Point>,
}

impl Market {
    /// solve the market
    pub fn solve(&self, config: &MarketConfig) -> Result<EquilibriumReport, EquilibriumError> {
        let equilibrium = market_equilibrium(&self.demand, &self.supply, config)?;
        let parameters = equilibrium.parameters().cloned().collect::<Vec<_>>();

        let numeric = if parameters.iter().all(|symbol| self.values.contains_key(symbol)) {
            Some(equilibrium.evaluate(&self.values)?)
        } else {
            None
        };

        Ok(EquilibriumReport {
            demand: equilibrium.demand().quantity_expr().into(),
            supply: equilibrium.supply().quantity_expr().into(),
            inverse_demand: equilibrium.inverse_demand().into(),
            price: equilibrium.price().into(),
            quantity: equilibrium.quantity().into(),
            consumer_surplus: equilibrium.consumer_surplus().into(),
            producer_surplus: equilibrium.producer_surplus().into(),
            total_surplus: equilibrium.total_surplus().into(),
            parameters,
            numeric,
        })
    }

    /// sample both curves at `points` prices evenly spaced from zero to twice the
    /// equilibrium price
    pub fn sample(&self, config: &MarketConfig, points: usize) -> Result<SampleReport, EquilibriumError> {
        let equilibrium = market_equilibrium(&self.demand, &self.supply, config)?;
        let NumericEquilibrium {
            price, quantity, ..
        } = equilibrium.evaluate(&self.values)?;

        let n = points.max(2);
        let prices = (0..n).map(|i| 2.0 * price * i as f64 / (n - 1) as f64);
        let demand = equilibrium.demand().substitute(&self.values)?;
        let supply = equilibrium.supply().substitute(&self.values)?;

        Ok(SampleReport {
            equilibrium: Point { quantity, price },
            demand: demand.sample(prices.clone())?,
            supply: supply.sample(prices)?,
        })
    }
}
