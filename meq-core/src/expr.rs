mod calculus;
mod eval;
mod ops;
mod render;
mod symbol;

pub use symbol::{Symbol, SymbolError};

use std::{cmp::Ordering, collections::BTreeMap};

/// A symbolic expression over real numbers.
///
/// Values should be built with the associated constructors ([`Expr::add`],
/// [`Expr::mul`], [`Expr::pow`], ...) or the arithmetic operators, all of which
/// return canonical forms:
/// - `Add` and `Mul` are flat (never directly nested), hold at least two operands
///   and collect like terms (resp. like bases);
/// - numeric constants are folded: a sum has at most one numeric term (stored last),
///   a product has at most one numeric coefficient (stored first, never 1);
/// - a numeric coefficient never multiplies a lone sum, it is distributed instead.
///
/// Two canonical expressions that are structurally equal are mathematically equal.
/// The converse does not hold in general; see [`Expr::is_equivalent`].
#[derive(Clone, Debug)]
pub enum Expr {
    /// A numeric constant
    Num(f64),
    /// A free symbol
    Sym(Symbol),
    /// A sum of at least two terms
    Add(Vec<Expr>),
    /// A product of at least two factors
    Mul(Vec<Expr>),
    /// A base raised to an exponent
    Pow(Box<Expr>, Box<Expr>),
    /// The natural exponential
    Exp(Box<Expr>),
    /// The natural logarithm
    Ln(Box<Expr>),
}

/// The sign of an expression, when it can be determined.
///
/// Sign analysis assumes that every free symbol stands for a positive real
/// number, which is the natural reading of price, quantity and curve
/// coefficients.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    /// Strictly negative
    Negative,
    /// Exactly zero
    Zero,
    /// Strictly positive
    Positive,
}

/// Errors raised while evaluating an expression numerically
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    /// A symbol had no numeric value bound to it
    #[error("symbol `{0}` has no value")]
    Unbound(Symbol),
    /// The expression evaluated to NaN or an infinity
    #[error("expression does not evaluate to a finite real number")]
    NonFinite,
}

impl Expr {
    /// The constant zero
    pub const ZERO: Expr = Expr::Num(0.0);
    /// The constant one
    pub const ONE: Expr = Expr::Num(1.0);

    /// A numeric constant (negative zero is normalized to zero)
    pub fn num(value: f64) -> Self {
        Self::Num(value + 0.0)
    }

    /// A symbolic unknown
    pub fn sym(symbol: Symbol) -> Self {
        Self::Sym(symbol)
    }

    /// The canonical sum of the given terms
    pub fn add<I: IntoIterator<Item = Expr>>(terms: I) -> Self {
        let mut constant = 0.0;
        // Keyed on the term stripped of its numeric coefficient
        let mut collected = BTreeMap::<Expr, f64>::new();
        let mut pending = terms.into_iter().collect::<Vec<_>>();

        while let Some(term) = pending.pop() {
            match term {
                Expr::Num(x) => constant += x,
                Expr::Add(inner) => pending.extend(inner),
                other => {
                    let (coefficient, rest) = other.split_coefficient();
                    *collected.entry(rest).or_insert(0.0) += coefficient;
                }
            }
        }

        let mut terms = collected
            .into_iter()
            .filter(|(_, coefficient)| *coefficient != 0.0)
            .map(|(rest, coefficient)| Expr::mul([Expr::num(coefficient), rest]))
            .collect::<Vec<_>>();

        if constant != 0.0 {
            terms.push(Expr::num(constant));
        }

        match terms.len() {
            0 => Expr::ZERO,
            1 => terms.remove(0),
            _ => Expr::Add(terms),
        }
    }

    /// The canonical product of the given factors
    pub fn mul<I: IntoIterator<Item = Expr>>(factors: I) -> Self {
        let mut coefficient = 1.0;
        // Exponents are collected per base: x * x^2 => x^3
        let mut powers = BTreeMap::<Expr, Vec<Expr>>::new();
        let mut exponentials = Vec::new();
        let mut pending = factors.into_iter().collect::<Vec<_>>();

        while let Some(factor) = pending.pop() {
            match factor {
                Expr::Num(x) => coefficient *= x,
                Expr::Mul(inner) => pending.extend(inner),
                Expr::Pow(base, exponent) => powers.entry(*base).or_default().push(*exponent),
                Expr::Exp(arg) => exponentials.push(*arg),
                other => powers.entry(other).or_default().push(Expr::ONE),
            }
        }

        if coefficient == 0.0 {
            return Expr::ZERO;
        }

        let mut factors = Vec::new();
        // Raising a product to an integer power distributes over its factors, which
        // may expose new like bases. Those are recombined with a second pass.
        let mut deferred = Vec::new();

        let exponential = (!exponentials.is_empty()).then(|| Expr::exp(Expr::add(exponentials)));
        let combined = powers
            .into_iter()
            .map(|(base, exponents)| Expr::pow(base, Expr::add(exponents)))
            .chain(exponential);

        for factor in combined {
            match factor {
                Expr::Num(x) => coefficient *= x,
                Expr::Mul(inner) => deferred.extend(inner),
                other => factors.push(other),
            }
        }

        if !deferred.is_empty() {
            deferred.extend(factors);
            deferred.push(Expr::num(coefficient));
            return Expr::mul(deferred);
        }

        if coefficient == 0.0 {
            return Expr::ZERO;
        }

        // A numeric multiple of a lone sum is distributed: 2*(x + y) => 2*x + 2*y
        if coefficient != 1.0 && factors.len() == 1 {
            if let Expr::Add(terms) = &factors[0] {
                return Expr::add(
                    terms
                        .iter()
                        .map(|term| Expr::mul([Expr::num(coefficient), term.clone()])),
                );
            }
        }

        if coefficient != 1.0 {
            factors.insert(0, Expr::num(coefficient));
        }

        match factors.len() {
            0 => Expr::ONE,
            1 => factors.remove(0),
            _ => Expr::Mul(factors),
        }
    }

    /// The canonical power `base^exponent`
    pub fn pow(base: Expr, exponent: Expr) -> Self {
        match (base.as_num(), exponent.as_num()) {
            (_, Some(e)) if e == 0.0 => return Expr::ONE,
            (_, Some(e)) if e == 1.0 => return base,
            (Some(b), _) if b == 1.0 => return Expr::ONE,
            (Some(b), Some(e)) => {
                let value = b.powf(e);
                if value.is_finite() {
                    return Expr::num(value);
                }
            }
            _ => {}
        }

        let integral = exponent.is_integer();
        match base {
            // (x^a)^b => x^(a*b) holds for integer b, or for positive x
            Expr::Pow(inner, inner_exponent) if integral || inner.sign() == Some(Sign::Positive) => {
                Expr::pow(*inner, Expr::mul([*inner_exponent, exponent]))
            }
            Expr::Mul(factors)
                if integral || factors.iter().all(|f| f.sign() == Some(Sign::Positive)) =>
            {
                Expr::mul(
                    factors
                        .into_iter()
                        .map(|factor| Expr::pow(factor, exponent.clone())),
                )
            }
            Expr::Exp(arg) => Expr::exp(Expr::mul([*arg, exponent])),
            base => Expr::Pow(Box::new(base), Box::new(exponent)),
        }
    }

    /// The canonical natural exponential `exp(arg)`
    pub fn exp(arg: Expr) -> Self {
        match arg {
            Expr::Num(x) if x.exp().is_finite() => Expr::num(x.exp()),
            Expr::Ln(inner) => *inner,
            arg => Expr::Exp(Box::new(arg)),
        }
    }

    /// The canonical natural logarithm `ln(arg)`
    pub fn ln(arg: Expr) -> Self {
        match arg {
            Expr::Num(x) if x > 0.0 => Expr::num(x.ln()),
            Expr::Exp(inner) => *inner,
            Expr::Pow(base, exponent) if base.sign() == Some(Sign::Positive) => {
                Expr::mul([*exponent, Expr::ln(*base)])
            }
            arg => Expr::Ln(Box::new(arg)),
        }
    }

    /// The principal square root
    pub fn sqrt(arg: Expr) -> Self {
        Expr::pow(arg, Expr::num(0.5))
    }

    /// The multiplicative inverse `1/self`
    pub fn recip(self) -> Self {
        Expr::pow(self, Expr::num(-1.0))
    }

    /// The numeric value, if this is a constant
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Expr::Num(x) => Some(*x),
            _ => None,
        }
    }

    /// The symbol, if this is a lone symbol
    pub fn as_sym(&self) -> Option<&Symbol> {
        match self {
            Expr::Sym(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this is the constant zero
    pub fn is_zero(&self) -> bool {
        self.as_num() == Some(0.0)
    }

    /// Whether this is a constant integer
    pub fn is_integer(&self) -> bool {
        self.as_num().is_some_and(|x| x.fract() == 0.0)
    }

    /// The additive terms of the expression (the expression itself unless it is a sum)
    pub fn terms(&self) -> &[Expr] {
        match self {
            Expr::Add(terms) => terms,
            other => std::slice::from_ref(other),
        }
    }

    /// The multiplicative factors of the expression (the expression itself unless it is a product)
    pub fn factors(&self) -> &[Expr] {
        match self {
            Expr::Mul(factors) => factors,
            other => std::slice::from_ref(other),
        }
    }

    /// Split a (non-numeric) term into its numeric coefficient and the remainder
    pub(crate) fn split_coefficient(self) -> (f64, Expr) {
        match self {
            Expr::Mul(mut factors) => match factors.first() {
                Some(Expr::Num(c)) => {
                    let c = *c;
                    factors.remove(0);
                    let rest = if factors.len() == 1 {
                        factors.remove(0)
                    } else {
                        Expr::Mul(factors)
                    };
                    (c, rest)
                }
                _ => (1.0, Expr::Mul(factors)),
            },
            Expr::Num(x) => (x, Expr::ONE),
            other => (1.0, other),
        }
    }

    /// Determine the sign of the expression, assuming all free symbols are positive.
    ///
    /// Returns `None` when the sign cannot be decided from the structure alone.
    pub fn sign(&self) -> Option<Sign> {
        match self {
            Expr::Num(x) if x.is_nan() => None,
            Expr::Num(x) if *x > 0.0 => Some(Sign::Positive),
            Expr::Num(x) if *x < 0.0 => Some(Sign::Negative),
            Expr::Num(_) => Some(Sign::Zero),
            Expr::Sym(_) => Some(Sign::Positive),
            Expr::Exp(_) => Some(Sign::Positive),
            Expr::Ln(_) => None,
            Expr::Add(terms) => {
                let mut signs = terms.iter().map(Expr::sign);
                let first = signs.next()??;
                signs.try_fold(first, |acc, sign| match (acc, sign?) {
                    (acc, Sign::Zero) => Some(acc),
                    (Sign::Zero, sign) => Some(sign),
                    (acc, sign) if acc == sign => Some(acc),
                    _ => None,
                })
            }
            Expr::Mul(factors) => factors.iter().try_fold(Sign::Positive, |acc, factor| {
                Some(match (acc, factor.sign()?) {
                    (Sign::Zero, _) | (_, Sign::Zero) => Sign::Zero,
                    (a, b) if a == b => Sign::Positive,
                    _ => Sign::Negative,
                })
            }),
            Expr::Pow(base, exponent) => match (base.sign(), exponent.as_num()) {
                (Some(Sign::Positive), _) => Some(Sign::Positive),
                (Some(Sign::Zero), Some(e)) if e > 0.0 => Some(Sign::Zero),
                (Some(Sign::Negative), Some(e)) if e.fract() == 0.0 => {
                    if e % 2.0 == 0.0 {
                        Some(Sign::Positive)
                    } else {
                        Some(Sign::Negative)
                    }
                }
                // A real value of a fractional power is the principal root, hence positive
                (_, Some(e)) if e.fract() != 0.0 => Some(Sign::Positive),
                _ => None,
            },
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Expr::Num(_) => 0,
            Expr::Sym(_) => 1,
            Expr::Pow(_, _) => 2,
            Expr::Mul(_) => 3,
            Expr::Add(_) => 4,
            Expr::Exp(_) => 5,
            Expr::Ln(_) => 6,
        }
    }
}

// The total order below defines the canonical ordering of operands. Numbers are
// compared with `total_cmp`, so it is a genuine total order even with NaN around.
impl Ord for Expr {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Expr::Num(a), Expr::Num(b)) => a.total_cmp(b),
            (Expr::Sym(a), Expr::Sym(b)) => a.cmp(b),
            (Expr::Add(a), Expr::Add(b)) | (Expr::Mul(a), Expr::Mul(b)) => a.cmp(b),
            (Expr::Pow(a, x), Expr::Pow(b, y)) => a.cmp(b).then_with(|| x.cmp(y)),
            (Expr::Exp(a), Expr::Exp(b)) | (Expr::Ln(a), Expr::Ln(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Expr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Expr {}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::num(value)
    }
}

impl From<Symbol> for Expr {
    fn from(value: Symbol) -> Self {
        Expr::Sym(value)
    }
}

impl From<&Symbol> for Expr {
    fn from(value: &Symbol) -> Self {
        Expr::Sym(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str) -> Expr {
        Expr::sym(Symbol::new(name).unwrap())
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(Expr::add([Expr::num(2.0), Expr::num(3.0)]), Expr::num(5.0));
        assert_eq!(Expr::mul([Expr::num(2.0), Expr::num(3.0)]), Expr::num(6.0));
        assert_eq!(Expr::pow(Expr::num(2.0), Expr::num(3.0)), Expr::num(8.0));
        assert_eq!(Expr::exp(Expr::ZERO), Expr::ONE);
        assert_eq!(Expr::ln(Expr::ONE), Expr::ZERO);
    }

    #[test]
    fn test_like_terms() {
        let x = s("x");
        let sum = Expr::add([x.clone(), x.clone(), Expr::mul([Expr::num(3.0), x.clone()])]);
        assert_eq!(sum, Expr::mul([Expr::num(5.0), x.clone()]));

        let cancelled = Expr::add([x.clone(), Expr::mul([Expr::num(-1.0), x.clone()])]);
        assert_eq!(cancelled, Expr::ZERO);
    }

    #[test]
    fn test_like_bases() {
        let x = s("x");
        let product = Expr::mul([x.clone(), x.clone(), Expr::pow(x.clone(), Expr::num(2.0))]);
        assert_eq!(product, Expr::pow(x.clone(), Expr::num(4.0)));

        let cancelled = Expr::mul([x.clone(), x.clone().recip()]);
        assert_eq!(cancelled, Expr::ONE);
    }

    #[test]
    fn test_order_independence() {
        let (a, b, c) = (s("a"), s("b"), s("c"));
        let left = Expr::add([a.clone(), Expr::mul([b.clone(), c.clone()]), Expr::num(1.0)]);
        let right = Expr::add([Expr::num(1.0), Expr::mul([c, b]), a]);
        assert_eq!(left, right);
    }

    #[test]
    fn test_flattening() {
        let (a, b, c) = (s("a"), s("b"), s("c"));
        let nested = Expr::add([a.clone(), Expr::add([b.clone(), c.clone()])]);
        assert_eq!(nested.terms().len(), 3);

        let nested = Expr::mul([a.clone(), Expr::mul([b, c])]);
        assert_eq!(nested.factors().len(), 3);
    }

    #[test]
    fn test_coefficient_distributes_over_sum() {
        let (a, b) = (s("a"), s("b"));
        let scaled = Expr::mul([
            Expr::num(-1.0),
            Expr::add([Expr::mul([Expr::num(-1.0), a.clone()]), b.clone()]),
        ]);
        assert_eq!(
            scaled,
            Expr::add([a, Expr::mul([Expr::num(-1.0), b])])
        );
    }

    #[test]
    fn test_power_rules() {
        let x = s("x");
        // (x^2)^3 => x^6
        let nested = Expr::pow(Expr::pow(x.clone(), Expr::num(2.0)), Expr::num(3.0));
        assert_eq!(nested, Expr::pow(x.clone(), Expr::num(6.0)));
        // (2x)^2 => 4 x^2
        let product = Expr::pow(Expr::mul([Expr::num(2.0), x.clone()]), Expr::num(2.0));
        assert_eq!(
            product,
            Expr::mul([Expr::num(4.0), Expr::pow(x.clone(), Expr::num(2.0))])
        );
        // exp(x)^2 => exp(2x)
        let exponential = Expr::pow(Expr::exp(x.clone()), Expr::num(2.0));
        assert_eq!(exponential, Expr::exp(Expr::mul([Expr::num(2.0), x])));
    }

    #[test]
    fn test_negative_base_fractional_power_is_kept() {
        let root = Expr::sqrt(Expr::num(-4.0));
        assert!(matches!(root, Expr::Pow(_, _)));
    }

    #[test]
    fn test_exp_ln_inverse() {
        let x = s("x");
        assert_eq!(Expr::ln(Expr::exp(x.clone())), x);
        assert_eq!(Expr::exp(Expr::ln(x.clone())), x);
        assert_eq!(
            Expr::ln(Expr::pow(x.clone(), Expr::num(3.0))),
            Expr::mul([Expr::num(3.0), Expr::ln(x)])
        );
    }

    #[test]
    fn test_exponentials_combine() {
        let (a, b) = (s("a"), s("b"));
        let product = Expr::mul([Expr::exp(a.clone()), Expr::exp(b.clone())]);
        assert_eq!(product, Expr::exp(Expr::add([a, b])));
    }

    #[test]
    fn test_sign() {
        let (a, b) = (s("a"), s("b"));
        assert_eq!(a.sign(), Some(Sign::Positive));
        assert_eq!(Expr::add([a.clone(), b.clone()]).sign(), Some(Sign::Positive));
        assert_eq!((-a.clone()).sign(), Some(Sign::Negative));
        assert_eq!((a.clone() - b.clone()).sign(), None);
        assert_eq!(Expr::pow(-a.clone(), Expr::num(2.0)).sign(), Some(Sign::Positive));
        assert_eq!((-a.clone()).recip().sign(), Some(Sign::Negative));
        assert_eq!(Expr::sqrt(a.clone() - b.clone()).sign(), Some(Sign::Positive));
        assert_eq!(Expr::exp(-a).sign(), Some(Sign::Positive));
        assert_eq!(Expr::ZERO.sign(), Some(Sign::Zero));
    }

    #[test]
    fn test_negative_zero_normalized() {
        assert_eq!(Expr::num(-0.0), Expr::ZERO);
        assert!(Expr::mul([Expr::num(-1.0), Expr::ZERO]).is_zero());
    }
}
