//! Root finding for `demand(p) = supply(p)`.
//!
//! Three closed forms are tried in order: a polynomial of degree at most two in
//! `p`, a pair of monomials `k p^e`, and a pair of exponentials whose arguments
//! are polynomial in `p`. Fully numeric markets may additionally fall back to a
//! bracketing search.

use crate::{EquilibriumError, SolverConfig};
use meq_core::{Curve, Expr, Map, Sign, Symbol};
use tracing::{Level, event};

// Bisection stops after this many halvings even if the tolerance is not reached
const MAX_BISECTIONS: usize = 200;

/// The candidate equilibrium prices, before any admissibility filtering
pub(crate) fn candidate_prices(
    demand: &Curve,
    supply: &Curve,
    config: &SolverConfig,
) -> Result<Vec<Expr>, EquilibriumError> {
    let p = Symbol::price();
    let (d, s) = (demand.quantity_expr(), supply.quantity_expr());
    let excess = d - s;

    if let Some(coefficients) = excess.coefficients(&p) {
        event!(
            Level::DEBUG,
            degree = coefficients.len() - 1,
            "excess demand is polynomial in price"
        );
        return polynomial_roots(coefficients);
    }

    if let (Some((kd, ed)), Some((ks, es))) = (monomial(d, &p), monomial(s, &p)) {
        let difference = &ed - &es;
        if !difference.is_zero() {
            event!(Level::DEBUG, "solving a pair of monomials");
            return Ok(vec![Expr::pow(ks / kd, difference.recip())]);
        }
    }

    if let (Expr::Exp(gd), Expr::Exp(gs)) = (d, s) {
        if let Some(coefficients) = (&**gd - &**gs).coefficients(&p) {
            event!(Level::DEBUG, "solving a pair of exponentials");
            return polynomial_roots(coefficients);
        }
    }

    let numeric = excess.free_symbols().iter().all(|symbol| *symbol == p);
    if config.numeric_fallback && numeric {
        event!(Level::DEBUG, "no closed form, bracketing roots numerically");
        return Ok(bracketed_roots(&excess, &p, config)
            .into_iter()
            .map(Expr::num)
            .collect());
    }

    Err(EquilibriumError::Unsolvable(format!(
        "{} against {}",
        demand.family(),
        supply.family()
    )))
}

/// The roots of `c0 + c1 p + c2 p^2`, real or not
fn polynomial_roots(mut coefficients: Vec<Expr>) -> Result<Vec<Expr>, EquilibriumError> {
    // f and -f have the same roots; a positive leading coefficient reads better
    if coefficients.last().and_then(Expr::sign) == Some(Sign::Negative) {
        coefficients = coefficients.into_iter().map(|c| -c).collect();
    }

    match coefficients.as_slice() {
        // Either no root at all or every price is a root
        [_] => {
            event!(Level::DEBUG, "excess demand does not depend on price");
            Ok(Vec::new())
        }
        [c0, c1] => Ok(vec![quotient(-c0, c1.clone())]),
        [c0, c1, c2] => {
            let discriminant = c1 * c1 - 4.0 * (c0 * c2);
            if discriminant.as_num().is_some_and(|x| x < 0.0) {
                event!(Level::DEBUG, "discarding complex roots");
                return Ok(Vec::new());
            }
            let root = Expr::sqrt(discriminant);
            let denominator = 2.0 * c2.clone();
            Ok(vec![
                quotient(-c1 + &root, denominator.clone()),
                quotient(-c1 - root, denominator),
            ])
        }
        _ => Err(EquilibriumError::Unsolvable(format!(
            "excess demand is a polynomial of degree {} in price",
            coefficients.len() - 1
        ))),
    }
}

/// `numerator / denominator`, with the sign moved out of the denominator when known
fn quotient(numerator: Expr, denominator: Expr) -> Expr {
    if denominator.sign() == Some(Sign::Negative) {
        -numerator / -denominator
    } else {
        numerator / denominator
    }
}

/// Decompose `k * var^e` into `(k, e)`, with `k` and `e` free of `var`
fn monomial(expr: &Expr, var: &Symbol) -> Option<(Expr, Expr)> {
    let mut coefficient = Vec::new();
    let mut exponent = None;
    for factor in expr.factors() {
        match factor {
            Expr::Sym(s) if s == var && exponent.is_none() => exponent = Some(Expr::ONE),
            Expr::Pow(base, e)
                if base.as_sym() == Some(var) && !e.contains(var) && exponent.is_none() =>
            {
                exponent = Some((**e).clone())
            }
            other if other.contains(var) => return None,
            other => coefficient.push(other.clone()),
        }
    }
    exponent.map(|e| (Expr::mul(coefficient), e))
}

/// Scan a geometric price grid for sign changes of `f`, and refine each by bisection
fn bracketed_roots(f: &Expr, var: &Symbol, config: &SolverConfig) -> Vec<f64> {
    let eval = |x: f64| {
        let mut values = Map::default();
        values.insert(var.clone(), x);
        f.eval(&values).ok()
    };

    let mut roots = Vec::new();
    let mut previous = None;
    for x in price_grid(config) {
        let Some(y) = eval(x) else {
            previous = None;
            continue;
        };
        if y == 0.0 {
            roots.push(x);
        } else if let Some((x0, y0)) = previous {
            if y0 != 0.0 && (y0 < 0.0) != (y < 0.0) {
                roots.push(bisect(&eval, (x0, y0), x, config.tolerance));
            }
        }
        previous = Some((x, y));
    }

    event!(Level::DEBUG, count = roots.len(), "bracketed numeric roots");
    roots
}

fn price_grid(config: &SolverConfig) -> impl Iterator<Item = f64> {
    let n = config.grid_points.max(2);
    let hi = config.max_price;
    let lo = hi * 1e-12;
    std::iter::once(0.0)
        .chain((0..n).map(move |i| lo * (hi / lo).powf(i as f64 / (n - 1) as f64)))
}

fn bisect(eval: &impl Fn(f64) -> Option<f64>, lower: (f64, f64), upper: f64, tolerance: f64) -> f64 {
    let (mut a, mut fa) = lower;
    let mut b = upper;
    for _ in 0..MAX_BISECTIONS {
        let mid = 0.5 * (a + b);
        if (b - a) <= tolerance * mid.abs().max(1.0) {
            return mid;
        }
        let Some(fm) = eval(mid) else {
            return mid;
        };
        if fm == 0.0 {
            return mid;
        }
        if (fm < 0.0) == (fa < 0.0) {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }
    0.5 * (a + b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn s(name: &str) -> Expr {
        Expr::sym(Symbol::new(name).unwrap())
    }

    #[test]
    fn test_linear_root_is_normalized() {
        let (a, b, c, d) = (s("a"), s("b"), s("c"), s("d"));
        // a - c - (b + d) p
        let roots = polynomial_roots(vec![&a - &c, -(&b + &d)]).unwrap();
        assert_eq!(roots, vec![(&a - &c) / (&b + &d)]);
    }

    #[test]
    fn test_quadratic_roots() {
        // p^2 - 5p + 6 = (p - 2)(p - 3)
        let roots = polynomial_roots(vec![Expr::num(6.0), Expr::num(-5.0), Expr::num(1.0)]).unwrap();
        assert_eq!(roots, vec![Expr::num(3.0), Expr::num(2.0)]);
    }

    #[test]
    fn test_complex_roots_are_discarded() {
        let roots = polynomial_roots(vec![Expr::num(1.0), Expr::ZERO, Expr::num(1.0)]).unwrap();
        assert!(roots.is_empty());
    }

    #[test]
    fn test_constant_has_no_roots() {
        assert!(polynomial_roots(vec![Expr::num(3.0)]).unwrap().is_empty());
    }

    #[test]
    fn test_monomial() {
        let p = Symbol::price();
        let (a, b) = (s("a"), s("b"));
        let power = &a * Expr::pow(Expr::sym(p.clone()), b.clone());
        assert_eq!(monomial(&power, &p), Some((a.clone(), b.clone())));
        assert_eq!(monomial(&Expr::sym(p.clone()), &p), Some((Expr::ONE, Expr::ONE)));
        assert_eq!(monomial(&(&a + Expr::sym(p.clone())), &p), None);
        assert_eq!(monomial(&a, &p), None);
    }

    #[test]
    fn test_bisection() {
        let p = Symbol::price();
        // p^2 - 2 has a single positive root
        let f = Expr::pow(Expr::sym(p.clone()), Expr::num(2.0)) - 2.0;
        let roots = bracketed_roots(&f, &p, &SolverConfig::default());
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0], 2.0_f64.sqrt(), max_relative = 1e-8);
    }
}
