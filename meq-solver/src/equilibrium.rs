use crate::{EquilibriumError, integrate};
use meq_core::{Curve, CurveError, Expr, Map, Sign, Symbol};
use std::fmt;
use tracing::{Level, event};

/// A welfare measure, which may diverge.
///
/// Consumer surplus under a power-law demand curve with elasticity of at most one
/// in absolute value is the classic example of an unbounded surplus. When that
/// elasticity is a free parameter, convergence depends on its value, and the
/// surplus is [`Surplus::Conditional`].
#[derive(Clone, Debug, PartialEq)]
pub enum Surplus {
    /// A finite surplus
    Finite(Expr),
    /// A surplus that is finite only when every expression in `converges_if` is
    /// positive, and unbounded otherwise
    Conditional {
        /// The surplus where it converges
        expr: Expr,
        /// Expressions in the free parameters that must all be positive
        converges_if: Vec<Expr>,
    },
    /// The defining integral diverges
    Unbounded,
}

impl Surplus {
    pub(crate) fn new(expr: Expr, converges_if: Vec<Expr>) -> Self {
        if converges_if.is_empty() {
            Surplus::Finite(expr)
        } else {
            Surplus::Conditional { expr, converges_if }
        }
    }

    /// The expression, unless the surplus is known to diverge
    pub fn expr(&self) -> Option<&Expr> {
        match self {
            Surplus::Finite(expr) | Surplus::Conditional { expr, .. } => Some(expr),
            Surplus::Unbounded => None,
        }
    }

    /// Whether the surplus diverges for every value of the parameters
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Surplus::Unbounded)
    }

    fn map(self, f: impl FnOnce(Expr) -> Expr) -> Self {
        match self {
            Surplus::Finite(expr) => Surplus::Finite(f(expr)),
            Surplus::Conditional { expr, converges_if } => Surplus::Conditional {
                expr: f(expr),
                converges_if,
            },
            Surplus::Unbounded => Surplus::Unbounded,
        }
    }

    fn conditions(&self) -> &[Expr] {
        match self {
            Surplus::Conditional { converges_if, .. } => converges_if,
            _ => &[],
        }
    }

    fn plus(&self, other: &Surplus) -> Surplus {
        let (Some(x), Some(y)) = (self.expr(), other.expr()) else {
            return Surplus::Unbounded;
        };
        let mut converges_if = self.conditions().to_vec();
        for condition in other.conditions() {
            if !converges_if.contains(condition) {
                converges_if.push(condition.clone());
            }
        }
        Surplus::new((x + y).together(), converges_if)
    }

    /// The numeric value under `values`, or `None` if the surplus diverges there
    pub fn eval(&self, values: &Map<Symbol, f64>) -> Result<Option<f64>, CurveError> {
        match self {
            Surplus::Finite(expr) => Ok(Some(expr.eval(values)?)),
            Surplus::Conditional { expr, converges_if } => {
                for condition in converges_if {
                    if condition.eval(values)? <= 0.0 {
                        return Ok(None);
                    }
                }
                Ok(Some(expr.eval(values)?))
            }
            Surplus::Unbounded => Ok(None),
        }
    }
}

impl fmt::Display for Surplus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surplus::Finite(expr) => expr.fmt(f),
            Surplus::Conditional { expr, converges_if } => {
                write!(f, "{expr} if ")?;
                for (i, condition) in converges_if.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" and ")?;
                    }
                    write!(f, "{condition} > 0")?;
                }
                Ok(())
            }
            Surplus::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// The solution of a market: where demand meets supply, and the resulting welfare.
///
/// Everything is kept as an exact expression in the free parameters of the two
/// curves, or as numbers when the curves are fully numeric.
#[derive(Clone, Debug, PartialEq)]
pub struct Equilibrium {
    price: Expr,
    quantity: Expr,
    consumer_surplus: Surplus,
    producer_surplus: Surplus,
    total_surplus: Surplus,
    inverse_demand: Expr,
    demand: Curve,
    supply: Curve,
}

/// An equilibrium with every parameter replaced by a number
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumericEquilibrium {
    /// The clearing price
    pub price: f64,
    /// The traded quantity
    pub quantity: f64,
    /// Consumer surplus, `None` if unbounded
    pub consumer_surplus: Option<f64>,
    /// Producer surplus, `None` if unbounded
    pub producer_surplus: Option<f64>,
    /// Total surplus, `None` if unbounded
    pub total_surplus: Option<f64>,
}

impl NumericEquilibrium {
    /// Whether price and quantity are non-negative and every surplus is finite
    pub fn is_valid(&self) -> bool {
        self.price >= 0.0
            && self.quantity >= 0.0
            && self.consumer_surplus.is_some()
            && self.producer_surplus.is_some()
    }
}

impl Equilibrium {
    /// Derive quantity and surpluses from an equilibrium price
    pub(crate) fn from_price(
        price: Expr,
        quantity: Expr,
        demand: &Curve,
        supply: &Curve,
    ) -> Result<Self, EquilibriumError> {
        let q = Symbol::quantity();
        let revenue = &price * &quantity;

        // CS = ∫_0^Q D⁻¹(q) dq - P Q
        let consumer_surplus =
            integrate::definite(demand.inverse_expr(), &q, &Expr::ZERO, &quantity)?
                .map(|area| (area - &revenue).together());

        // PS = P Q - ∫_floor^Q S⁻¹(q) dq, with marginal cost zero below the floor
        let producer_surplus =
            integrate::definite(supply.inverse_expr(), &q, &supply.inverse_floor(), &quantity)?
                .map(|area| (&revenue - area).together());

        let total_surplus = consumer_surplus.plus(&producer_surplus);

        Ok(Self {
            price,
            quantity,
            consumer_surplus,
            producer_surplus,
            total_surplus,
            inverse_demand: demand.inverse_expr().clone(),
            demand: demand.clone(),
            supply: supply.clone(),
        })
    }

    /// The clearing price
    pub fn price(&self) -> &Expr {
        &self.price
    }

    /// The traded quantity
    pub fn quantity(&self) -> &Expr {
        &self.quantity
    }

    /// The area between inverse demand and the price
    pub fn consumer_surplus(&self) -> &Surplus {
        &self.consumer_surplus
    }

    /// The area between the price and inverse supply
    pub fn producer_surplus(&self) -> &Surplus {
        &self.producer_surplus
    }

    /// Consumer plus producer surplus
    pub fn total_surplus(&self) -> &Surplus {
        &self.total_surplus
    }

    /// The inverse demand curve `p(q)`
    pub fn inverse_demand(&self) -> &Expr {
        &self.inverse_demand
    }

    /// The demand curve this equilibrium was solved from
    pub fn demand(&self) -> &Curve {
        &self.demand
    }

    /// The supply curve this equilibrium was solved from
    pub fn supply(&self) -> &Curve {
        &self.supply
    }

    /// The free parameters of both curves
    pub fn parameters(&self) -> impl Iterator<Item = &Symbol> {
        self.demand.parameters().union(self.supply.parameters())
    }

    /// Substitute numbers for the free parameters.
    ///
    /// The values are first checked against the domain constraints of both curves,
    /// so e.g. a zero slope is reported as an invalid parameter rather than
    /// producing a division by zero. The surpluses are then integrated again over
    /// the numeric curves, so that exponents and the quadratic supply floor take
    /// their actual values instead of the positive-parameter assumption.
    pub fn evaluate(&self, values: &Map<Symbol, f64>) -> Result<NumericEquilibrium, EquilibriumError> {
        let demand = self.demand.substitute(values)?;
        let supply = self.supply.substitute(values)?;

        let eval = |expr: &Expr| expr.eval(values).map_err(CurveError::from);
        let price = eval(&self.price)?;
        let quantity = eval(&self.quantity)?;

        let numeric = Self::from_price(Expr::num(price), Expr::num(quantity), &demand, &supply)?;
        Ok(NumericEquilibrium {
            price,
            quantity,
            consumer_surplus: numeric.consumer_surplus.eval(values)?,
            producer_surplus: numeric.producer_surplus.eval(values)?,
            total_surplus: numeric.total_surplus.eval(values)?,
        })
    }

    /// Whether the equilibrium is economically meaningful: price and quantity are
    /// not provably negative, and neither surplus is known to diverge
    pub fn validate(&self) -> bool {
        is_admissible(&self.price, 0.0)
            && is_admissible(&self.quantity, 0.0)
            && !self.consumer_surplus.is_unbounded()
            && !self.producer_surplus.is_unbounded()
    }
}

/// Reduce candidate prices to the unique admissible `(price, quantity)` pair
pub(crate) fn select(
    candidates: Vec<Expr>,
    demand: &Curve,
    tolerance: f64,
) -> Result<(Expr, Expr), EquilibriumError> {
    let p = Symbol::price();
    let mut admissible: Vec<Expr> = Vec::new();

    for price in candidates {
        let quantity = demand.quantity_expr().subs_one(&p, &price);
        if !is_admissible(&price, tolerance) || !is_admissible(&quantity, tolerance) {
            event!(Level::DEBUG, %price, %quantity, "rejecting candidate");
            continue;
        }
        let duplicate = admissible.iter().any(|other| same_root(&price, other, tolerance));
        if !duplicate {
            admissible.push(price);
        }
    }

    event!(Level::DEBUG, count = admissible.len(), "admissible equilibria");
    if admissible.len() != 1 {
        return Err(EquilibriumError::Ambiguous {
            candidates: admissible,
        });
    }

    let Some(price) = admissible.pop() else {
        return Err(EquilibriumError::Ambiguous {
            candidates: Vec::new(),
        });
    };
    let price = price.together();
    let quantity = demand.quantity_expr().subs_one(&p, &price).together();
    Ok((price, quantity))
}

/// Whether a price or quantity may be non-negative.
///
/// Constants must evaluate to a real number no less than `-tolerance`. Other
/// expressions are rejected only when provably negative.
fn is_admissible(value: &Expr, tolerance: f64) -> bool {
    if value.is_constant() {
        value
            .eval(&Map::default())
            .is_ok_and(|x| x >= -tolerance)
    } else {
        value.sign() != Some(Sign::Negative)
    }
}

fn same_root(x: &Expr, y: &Expr, tolerance: f64) -> bool {
    let empty = Map::default();
    match (x.eval(&empty), y.eval(&empty)) {
        (Ok(x), Ok(y)) => (x - y).abs() <= tolerance * x.abs().max(y.abs()).max(1.0),
        _ => x == y,
    }
}
