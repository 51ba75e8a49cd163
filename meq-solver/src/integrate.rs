//! Definite integrals of inverse curves over quantity.
//!
//! The integrand is expanded into a sum of terms, and every term must be a
//! coefficient (free of the integration variable) times one of a handful of
//! primitives with a known antiderivative.

use crate::{EquilibriumError, Surplus};
use meq_core::{Expr, Symbol};
use tracing::{Level, event};

/// The part of a term that depends on the integration variable `x`
#[derive(Debug, PartialEq)]
enum Primitive {
    /// `1`
    Constant,
    /// `x^k`, for `k != -1`
    Power(Expr),
    /// `1/x`
    Reciprocal,
    /// `ln x`
    Log,
    /// `(α + βx)^k`
    Shifted {
        base: Expr,
        slope: Expr,
        exponent: Expr,
    },
    /// `exp(α + βx)`
    Exponential { arg: Expr, slope: Expr },
}

/// `∫ integrand d(var)` from `lower` to `upper`
pub(crate) fn definite(
    integrand: &Expr,
    var: &Symbol,
    lower: &Expr,
    upper: &Expr,
) -> Result<Surplus, EquilibriumError> {
    if lower == upper {
        return Ok(Surplus::Finite(Expr::ZERO));
    }

    let mut total = Vec::new();
    let mut converges_if = Vec::new();
    for term in integrand.expand().terms() {
        let (coefficient, primitive) = classify(term, var)?;
        let start = match at_lower(&primitive, var, lower) {
            Lower::Value(start) => start,
            Lower::Diverges => {
                event!(Level::DEBUG, %term, "integral diverges at the lower limit");
                return Ok(Surplus::Unbounded);
            }
            Lower::ConvergesIf(condition) => {
                event!(Level::DEBUG, %term, %condition, "integral converges only if positive");
                if !converges_if.contains(&condition) {
                    converges_if.push(condition);
                }
                Expr::ZERO
            }
        };
        let end = antiderivative(&primitive, var, upper);
        total.push(coefficient * (end - start));
    }
    Ok(Surplus::new(Expr::add(total), converges_if))
}

fn classify(term: &Expr, var: &Symbol) -> Result<(Expr, Primitive), EquilibriumError> {
    let (dependent, independent): (Vec<&Expr>, Vec<&Expr>) =
        term.factors().iter().partition(|factor| factor.contains(var));
    let coefficient = Expr::mul(independent.into_iter().cloned());

    let primitive = match dependent.as_slice() {
        [] => Some(Primitive::Constant),
        [factor] => primitive(factor, var),
        _ => None,
    };

    primitive
        .map(|primitive| (coefficient, primitive))
        .ok_or_else(|| EquilibriumError::Unsolvable(format!("cannot integrate {term} in {var}")))
}

fn primitive(factor: &Expr, var: &Symbol) -> Option<Primitive> {
    match factor {
        Expr::Sym(_) => Some(Primitive::Power(Expr::ONE)),
        Expr::Ln(arg) if arg.as_sym() == Some(var) => Some(Primitive::Log),
        Expr::Pow(base, exponent) if !exponent.contains(var) => {
            let reciprocal = exponent.as_num() == Some(-1.0);
            if base.as_sym() == Some(var) {
                return Some(if reciprocal {
                    Primitive::Reciprocal
                } else {
                    Primitive::Power((**exponent).clone())
                });
            }
            let [_, slope] = linear(base, var)?;
            Some(Primitive::Shifted {
                base: (**base).clone(),
                slope,
                exponent: (**exponent).clone(),
            })
        }
        Expr::Exp(arg) => {
            let [_, slope] = linear(arg, var)?;
            Some(Primitive::Exponential {
                arg: (**arg).clone(),
                slope,
            })
        }
        _ => None,
    }
}

/// The coefficients `[α, β]` of `α + βx`, if the expression has this form with `β != 0`
fn linear(expr: &Expr, var: &Symbol) -> Option<[Expr; 2]> {
    match expr.coefficients(var)?.as_slice() {
        [alpha, beta] => Some([alpha.clone(), beta.clone()]),
        _ => None,
    }
}

fn antiderivative(primitive: &Primitive, var: &Symbol, at: &Expr) -> Expr {
    match primitive {
        Primitive::Constant => at.clone(),
        Primitive::Power(k) => {
            let k1 = k + 1.0;
            Expr::pow(at.clone(), k1.clone()) / k1
        }
        Primitive::Reciprocal => Expr::ln(at.clone()),
        Primitive::Log => at * Expr::ln(at.clone()) - at,
        Primitive::Shifted {
            base,
            slope,
            exponent,
        } => {
            let base = base.subs_one(var, at);
            if exponent.as_num() == Some(-1.0) {
                Expr::ln(base) / slope
            } else {
                let k1 = exponent + 1.0;
                Expr::pow(base, k1.clone()) / (slope * k1)
            }
        }
        Primitive::Exponential { arg, slope } => Expr::exp(arg.subs_one(var, at)) / slope,
    }
}

/// The antiderivative at the lower limit of an integral
#[derive(Debug, PartialEq)]
enum Lower {
    Value(Expr),
    /// The base of a power vanishes here, and the integral only exists if this
    /// expression (the exponent plus one) is positive
    ConvergesIf(Expr),
    Diverges,
}

/// Divergence can only happen where the base of a power vanishes
fn at_lower(primitive: &Primitive, var: &Symbol, lower: &Expr) -> Lower {
    let vanishing_exponent = match primitive {
        Primitive::Power(k) if lower.is_zero() => Some(k),
        Primitive::Reciprocal if lower.is_zero() => return Lower::Diverges,
        Primitive::Log if lower.is_zero() => return Lower::Value(Expr::ZERO),
        Primitive::Constant if lower.is_zero() => return Lower::Value(Expr::ZERO),
        Primitive::Shifted { base, exponent, .. } if base.subs_one(var, lower).is_zero() => {
            Some(exponent)
        }
        _ => None,
    };

    let Some(k) = vanishing_exponent else {
        return Lower::Value(antiderivative(primitive, var, lower));
    };
    let k1 = k + 1.0;
    match k1.as_num() {
        Some(k1) if k1 > 0.0 => Lower::Value(Expr::ZERO),
        Some(_) => Lower::Diverges,
        None => Lower::ConvergesIf(k1),
    }
}
