use crate::{Expr, Symbol};
use std::fmt;

/// Which side of the market a curve describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Side {
    /// Quantity demanded, decreasing in price
    Demand,
    /// Quantity supplied, increasing in price
    Supply,
}

/// The functional form of a curve
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum CurveKind {
    /// `q = a - b p` (demand), `q = c + d p` (supply)
    Linear,
    /// `q = a p^b` (demand), `q = c p^d` (supply)
    Power,
    /// `q = exp(-a p + b)` (demand), `q = exp(c p + d)` (supply)
    Exponential,
    /// `q = a - b p^2` (demand), `q = c + d p^2` (supply)
    Quadratic,
}

impl CurveKind {
    /// Every curve kind
    pub const ALL: [CurveKind; 4] = [
        CurveKind::Linear,
        CurveKind::Power,
        CurveKind::Exponential,
        CurveKind::Quadratic,
    ];
}

/// A named curve family: a side of the market together with a functional form.
///
/// Every family has exactly two coefficients. Demand families call them `a` and
/// `b`, supply families `c` and `d`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveFamily {
    /// The side of the market
    pub side: Side,
    /// The functional form
    pub kind: CurveKind,
}

/// A sign requirement on a numeric coefficient
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constraint {
    /// Strictly positive
    Positive,
    /// Strictly negative
    Negative,
}

impl Constraint {
    /// Whether `value` satisfies the constraint
    pub fn admits(self, value: f64) -> bool {
        match self {
            Constraint::Positive => value > 0.0,
            Constraint::Negative => value < 0.0,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Positive => f.write_str("> 0"),
            Constraint::Negative => f.write_str("< 0"),
        }
    }
}

impl CurveFamily {
    /// A demand family
    pub const fn demand(kind: CurveKind) -> Self {
        Self {
            side: Side::Demand,
            kind,
        }
    }

    /// A supply family
    pub const fn supply(kind: CurveKind) -> Self {
        Self {
            side: Side::Supply,
            kind,
        }
    }

    /// All eight families, demand first
    pub fn all() -> impl Iterator<Item = CurveFamily> {
        [Side::Demand, Side::Supply]
            .into_iter()
            .flat_map(|side| CurveKind::ALL.map(|kind| CurveFamily { side, kind }))
    }

    /// The names of the two coefficients, in order
    pub fn parameter_names(&self) -> [&'static str; 2] {
        match self.side {
            Side::Demand => ["a", "b"],
            Side::Supply => ["c", "d"],
        }
    }

    /// The domain constraints on the two coefficients, when they are numeric
    pub fn constraints(&self) -> [Option<Constraint>; 2] {
        use Constraint::*;
        match (self.side, self.kind) {
            (Side::Demand, CurveKind::Linear) => [None, Some(Positive)],
            (Side::Demand, CurveKind::Power) => [Some(Positive), Some(Negative)],
            (Side::Demand, CurveKind::Exponential) => [Some(Positive), None],
            (Side::Demand, CurveKind::Quadratic) => [Some(Positive), Some(Positive)],
            (Side::Supply, CurveKind::Linear) => [None, Some(Positive)],
            (Side::Supply, CurveKind::Power) => [Some(Positive), Some(Positive)],
            (Side::Supply, CurveKind::Exponential) => [Some(Positive), None],
            (Side::Supply, CurveKind::Quadratic) => [None, Some(Positive)],
        }
    }

    /// The quantity `q(p)` as a function of price
    pub(crate) fn quantity_expr(&self, first: &Expr, second: &Expr) -> Expr {
        let p = Expr::sym(Symbol::price());
        let squared = Expr::pow(p.clone(), Expr::num(2.0));
        match (self.side, self.kind) {
            (Side::Demand, CurveKind::Linear) => first - second * p,
            (Side::Demand, CurveKind::Power) => first * Expr::pow(p, second.clone()),
            (Side::Demand, CurveKind::Exponential) => Expr::exp(second - first * p),
            (Side::Demand, CurveKind::Quadratic) => first - second * squared,
            (Side::Supply, CurveKind::Linear) => first + second * p,
            (Side::Supply, CurveKind::Power) => first * Expr::pow(p, second.clone()),
            (Side::Supply, CurveKind::Exponential) => Expr::exp(first * p + second),
            (Side::Supply, CurveKind::Quadratic) => first + second * squared,
        }
    }

    /// The price `p(q)` as a function of quantity
    pub(crate) fn inverse_expr(&self, first: &Expr, second: &Expr) -> Expr {
        let q = Expr::sym(Symbol::quantity());
        let power = |k: &Expr, e: &Expr| {
            Expr::pow(k.clone(), -e.clone().recip()) * Expr::pow(q.clone(), e.clone().recip())
        };
        match (self.side, self.kind) {
            (Side::Demand, CurveKind::Linear) => (first - &q) / second,
            (Side::Demand, CurveKind::Power) => power(first, second),
            (Side::Demand, CurveKind::Exponential) => (second - Expr::ln(q.clone())) / first,
            (Side::Demand, CurveKind::Quadratic) => {
                Expr::pow(second.clone(), Expr::num(-0.5)) * Expr::sqrt(first - &q)
            }
            (Side::Supply, CurveKind::Linear) => (&q - first) / second,
            (Side::Supply, CurveKind::Power) => power(first, second),
            (Side::Supply, CurveKind::Exponential) => (Expr::ln(q.clone()) - second) / first,
            (Side::Supply, CurveKind::Quadratic) => {
                Expr::pow(second.clone(), Expr::num(-0.5)) * Expr::sqrt(&q - first)
            }
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Demand => f.write_str("demand"),
            Side::Supply => f.write_str("supply"),
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveKind::Linear => f.write_str("linear"),
            CurveKind::Power => f.write_str("power"),
            CurveKind::Exponential => f.write_str("exponential"),
            CurveKind::Quadratic => f.write_str("quadratic"),
        }
    }
}

impl fmt::Display for CurveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.side)
    }
}
