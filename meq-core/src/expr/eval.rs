use super::{Expr, ExprError, Symbol};
use crate::Map;
use std::collections::BTreeSet;

// Probe values used by `is_equivalent`. They are positive, distinct and avoid
// small integers so that accidental cancellations are unlikely.
const PROBES: [f64; 7] = [1.37, 2.61, 0.73, 3.29, 1.91, 4.13, 0.57];

impl Expr {
    /// Replace symbols by expressions, re-canonicalizing the result
    pub fn subs(&self, replacements: &Map<Symbol, Expr>) -> Expr {
        if replacements.is_empty() {
            return self.clone();
        }
        match self {
            Expr::Num(_) => self.clone(),
            Expr::Sym(s) => replacements.get(s).cloned().unwrap_or_else(|| self.clone()),
            Expr::Add(terms) => Expr::add(terms.iter().map(|t| t.subs(replacements))),
            Expr::Mul(factors) => Expr::mul(factors.iter().map(|f| f.subs(replacements))),
            Expr::Pow(base, exponent) => {
                Expr::pow(base.subs(replacements), exponent.subs(replacements))
            }
            Expr::Exp(arg) => Expr::exp(arg.subs(replacements)),
            Expr::Ln(arg) => Expr::ln(arg.subs(replacements)),
        }
    }

    /// Replace a single symbol
    pub fn subs_one(&self, symbol: &Symbol, value: &Expr) -> Expr {
        let mut replacements = Map::default();
        replacements.insert(symbol.clone(), value.clone());
        self.subs(&replacements)
    }

    /// Substitute numeric values for symbols (unbound symbols are left in place)
    pub fn subs_values(&self, values: &Map<Symbol, f64>) -> Expr {
        let replacements = values
            .iter()
            .map(|(symbol, value)| (symbol.clone(), Expr::num(*value)))
            .collect::<Map<_, _>>();
        self.subs(&replacements)
    }

    /// Evaluate the expression numerically
    ///
    /// # Errors
    ///
    /// Fails if a free symbol has no value, or if the result (or any intermediate
    /// such as a fractional power of a negative number) is not a finite real.
    pub fn eval(&self, values: &Map<Symbol, f64>) -> Result<f64, ExprError> {
        let value = self.eval_raw(values)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ExprError::NonFinite)
        }
    }

    fn eval_raw(&self, values: &Map<Symbol, f64>) -> Result<f64, ExprError> {
        Ok(match self {
            Expr::Num(x) => *x,
            Expr::Sym(s) => *values.get(s).ok_or_else(|| ExprError::Unbound(s.clone()))?,
            Expr::Add(terms) => terms
                .iter()
                .map(|t| t.eval_raw(values))
                .sum::<Result<f64, _>>()?,
            Expr::Mul(factors) => factors
                .iter()
                .map(|f| f.eval_raw(values))
                .product::<Result<f64, _>>()?,
            Expr::Pow(base, exponent) => base.eval_raw(values)?.powf(exponent.eval_raw(values)?),
            Expr::Exp(arg) => arg.eval_raw(values)?.exp(),
            Expr::Ln(arg) => arg.eval_raw(values)?.ln(),
        })
    }

    /// The set of free symbols, in sorted order
    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, symbols: &mut BTreeSet<Symbol>) {
        match self {
            Expr::Num(_) => {}
            Expr::Sym(s) => {
                symbols.insert(s.clone());
            }
            Expr::Add(children) | Expr::Mul(children) => {
                children.iter().for_each(|c| c.collect_symbols(symbols))
            }
            Expr::Pow(base, exponent) => {
                base.collect_symbols(symbols);
                exponent.collect_symbols(symbols);
            }
            Expr::Exp(arg) | Expr::Ln(arg) => arg.collect_symbols(symbols),
        }
    }

    /// Whether `symbol` occurs in the expression
    pub fn contains(&self, symbol: &Symbol) -> bool {
        match self {
            Expr::Num(_) => false,
            Expr::Sym(s) => s == symbol,
            Expr::Add(children) | Expr::Mul(children) => children.iter().any(|c| c.contains(symbol)),
            Expr::Pow(base, exponent) => base.contains(symbol) || exponent.contains(symbol),
            Expr::Exp(arg) | Expr::Ln(arg) => arg.contains(symbol),
        }
    }

    /// Whether the expression has no free symbols
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Num(_) => true,
            Expr::Sym(_) => false,
            Expr::Add(children) | Expr::Mul(children) => children.iter().all(Expr::is_constant),
            Expr::Pow(base, exponent) => base.is_constant() && exponent.is_constant(),
            Expr::Exp(arg) | Expr::Ln(arg) => arg.is_constant(),
        }
    }

    /// Test whether two expressions agree numerically at a fixed set of probe points.
    ///
    /// Canonical forms are not unique for rational expressions (`(a d + b c)/(b + d)`
    /// versus `a - b (a - c)/(b + d)`), so this is the practical test for symbolic
    /// equality. Probe points where both sides fail to evaluate are skipped; if
    /// every probe is skipped the expressions are not considered equivalent.
    pub fn is_equivalent(&self, other: &Expr, tolerance: f64) -> bool {
        if self == other {
            return true;
        }

        let mut symbols = self.free_symbols();
        symbols.extend(other.free_symbols());

        let mut compared = 0;
        for probe in 0..PROBES.len() {
            let values = symbols
                .iter()
                .enumerate()
                .map(|(i, s)| (s.clone(), PROBES[(probe + 3 * i) % PROBES.len()]))
                .collect::<Map<_, _>>();

            match (self.eval(&values), other.eval(&values)) {
                (Ok(x), Ok(y)) => {
                    let scale = 1.0_f64.max(x.abs()).max(y.abs());
                    if (x - y).abs() > tolerance * scale {
                        return false;
                    }
                    compared += 1;
                }
                (Err(_), Err(_)) => continue,
                _ => return false,
            }
        }
        compared > 0
    }
}

#[cfg(test)]
mod tests {
    use crate::{Expr, ExprError, Map, Symbol};
    use approx::assert_relative_eq;

    fn sym(name: &str) -> Symbol {
        Symbol::new(name).unwrap()
    }

    #[test]
    fn test_eval() {
        let (a, b) = (sym("a"), sym("b"));
        let expr = Expr::sym(a.clone()) * Expr::exp(Expr::sym(b.clone())) + 1.0;

        let mut values = Map::default();
        values.insert(a.clone(), 2.0);
        values.insert(b.clone(), 0.0);
        assert_relative_eq!(expr.eval(&values).unwrap(), 3.0);

        values.shift_remove(&b);
        assert_eq!(expr.eval(&values).unwrap_err(), ExprError::Unbound(b));
    }

    #[test]
    fn test_eval_non_finite() {
        let x = sym("x");
        let expr = Expr::sqrt(Expr::sym(x.clone()));
        let mut values = Map::default();
        values.insert(x, -1.0);
        assert_eq!(expr.eval(&values).unwrap_err(), ExprError::NonFinite);
    }

    #[test]
    fn test_subs_folds_constants() {
        let (a, b) = (sym("a"), sym("b"));
        let expr = (Expr::sym(a.clone()) - Expr::sym(b.clone())) / Expr::sym(b.clone());

        let mut values = Map::default();
        values.insert(a, 10.0);
        values.insert(b, 4.0);
        assert_eq!(expr.subs_values(&values), Expr::num(1.5));
    }

    #[test]
    fn test_partial_subs() {
        let (a, b) = (sym("a"), sym("b"));
        let expr = Expr::sym(a.clone()) * Expr::sym(b.clone());
        let partial = expr.subs_one(&a, &Expr::num(3.0));
        assert_eq!(partial, 3.0 * Expr::sym(b.clone()));
        assert_eq!(partial.free_symbols().into_iter().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn test_contains() {
        let (a, p) = (sym("a"), Symbol::price());
        let expr = Expr::exp(Expr::sym(a.clone()) * Expr::sym(p.clone()));
        assert!(expr.contains(&p));
        assert!(!expr.contains(&Symbol::quantity()));
        assert!(!expr.is_constant());
        assert!(Expr::ln(Expr::num(-1.0)).is_constant());
    }

    #[test]
    fn test_is_equivalent() {
        let (a, b, c, d) = (
            Expr::sym(sym("a")),
            Expr::sym(sym("b")),
            Expr::sym(sym("c")),
            Expr::sym(sym("d")),
        );
        let unsimplified = &a - &b * (&a - &c) / (&b + &d);
        let simplified = (&a * &d + &b * &c) / (&b + &d);
        assert!(unsimplified.is_equivalent(&simplified, 1e-12));
        assert!(!unsimplified.is_equivalent(&(&a * &d / (&b + &d)), 1e-12));
    }
}
