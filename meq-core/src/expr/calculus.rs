use super::{Expr, Symbol};
use std::collections::BTreeMap;

// Integer powers of sums above this are left unexpanded.
const MAX_EXPANDED_POWER: f64 = 12.0;

impl Expr {
    /// Distribute products over sums and expand small positive integer powers of sums.
    pub fn expand(&self) -> Expr {
        match self {
            Expr::Add(terms) => Expr::add(terms.iter().map(Expr::expand)),
            Expr::Mul(factors) => factors
                .iter()
                .map(Expr::expand)
                .fold(Expr::ONE, |acc, factor| distribute(&acc, &factor)),
            Expr::Pow(base, exponent) => {
                let base = base.expand();
                let exponent = exponent.expand();
                match (&base, exponent.as_num()) {
                    (Expr::Add(_), Some(n))
                        if n.fract() == 0.0 && (2.0..=MAX_EXPANDED_POWER).contains(&n) =>
                    {
                        (1..n as usize).fold(base.clone(), |acc, _| distribute(&acc, &base))
                    }
                    _ => Expr::pow(base, exponent),
                }
            }
            Expr::Exp(arg) => Expr::exp(arg.expand()),
            Expr::Ln(arg) => Expr::ln(arg.expand()),
            Expr::Num(_) | Expr::Sym(_) => self.clone(),
        }
    }

    /// The coefficients `[c0, c1, ..., cn]` of the expression viewed as a polynomial in `var`.
    ///
    /// Returns `None` if the expression is not a polynomial in `var` (e.g. it contains
    /// `var` under a logarithm or raised to a non-integer power). The leading
    /// coefficient is never structurally zero.
    pub fn coefficients(&self, var: &Symbol) -> Option<Vec<Expr>> {
        let mut buckets = Vec::<Vec<Expr>>::new();
        for term in self.expand().terms() {
            let (degree, rest) = term.split_power(var)?;
            if buckets.len() <= degree {
                buckets.resize(degree + 1, Vec::new());
            }
            buckets[degree].push(rest);
        }

        let mut coefficients = buckets.into_iter().map(Expr::add).collect::<Vec<_>>();
        while coefficients.len() > 1 && coefficients.last().is_some_and(Expr::is_zero) {
            coefficients.pop();
        }
        if coefficients.is_empty() {
            coefficients.push(Expr::ZERO);
        }
        Some(coefficients)
    }

    /// Split a single (expanded) term into `var^n * rest`, with `rest` free of `var`.
    fn split_power(&self, var: &Symbol) -> Option<(usize, Expr)> {
        match self {
            Expr::Sym(s) if s == var => Some((1, Expr::ONE)),
            Expr::Pow(base, exponent) if base.as_sym() == Some(var) => {
                let n = exponent.as_num()?;
                (n >= 0.0 && n.fract() == 0.0).then(|| (n as usize, Expr::ONE))
            }
            Expr::Mul(factors) => {
                let mut degree = 0;
                let mut rest = Vec::with_capacity(factors.len());
                for factor in factors {
                    let (n, r) = factor.split_power(var)?;
                    degree += n;
                    rest.push(r);
                }
                Some((degree, Expr::mul(rest)))
            }
            other if other.contains(var) => None,
            other => Some((0, other.clone())),
        }
    }

    /// The derivative with respect to `var`
    pub fn diff(&self, var: &Symbol) -> Expr {
        match self {
            Expr::Num(_) => Expr::ZERO,
            Expr::Sym(s) if s == var => Expr::ONE,
            Expr::Sym(_) => Expr::ZERO,
            Expr::Add(terms) => Expr::add(terms.iter().map(|t| t.diff(var))),
            Expr::Mul(factors) => Expr::add((0..factors.len()).map(|i| {
                Expr::mul(factors.iter().enumerate().map(|(j, f)| {
                    if i == j { f.diff(var) } else { f.clone() }
                }))
            })),
            Expr::Pow(base, exponent) if !exponent.contains(var) => Expr::mul([
                (**exponent).clone(),
                Expr::pow((**base).clone(), Expr::add([(**exponent).clone(), Expr::num(-1.0)])),
                base.diff(var),
            ]),
            // d(b^e) = b^e * (e' ln b + e b'/b)
            Expr::Pow(base, exponent) => Expr::mul([
                self.clone(),
                Expr::add([
                    Expr::mul([exponent.diff(var), Expr::ln((**base).clone())]),
                    Expr::mul([
                        (**exponent).clone(),
                        base.diff(var),
                        (**base).clone().recip(),
                    ]),
                ]),
            ]),
            Expr::Exp(arg) => Expr::mul([self.clone(), arg.diff(var)]),
            Expr::Ln(arg) => Expr::mul([arg.diff(var), (**arg).clone().recip()]),
        }
    }

    /// Combine the terms of a sum over a common denominator and expand the numerator.
    ///
    /// Only factors with a negative numeric exponent count as denominators; symbolic
    /// exponents are left where they are.
    pub fn together(&self) -> Expr {
        match self {
            Expr::Add(terms) => {
                let fractions = terms
                    .iter()
                    .map(|term| term.together().as_fraction())
                    .collect::<Vec<_>>();

                // The least common denominator, as base => largest exponent
                let mut common = BTreeMap::<Expr, f64>::new();
                for (_, denominator) in &fractions {
                    for factor in denominator.factors() {
                        let (base, exponent) = match factor {
                            Expr::Pow(base, exponent) => {
                                ((**base).clone(), exponent.as_num().unwrap_or(1.0))
                            }
                            Expr::Num(_) => continue,
                            other => (other.clone(), 1.0),
                        };
                        let entry = common.entry(base).or_insert(exponent);
                        *entry = entry.max(exponent);
                    }
                }

                if common.is_empty() {
                    return Expr::add(fractions.into_iter().map(|(n, d)| n / d));
                }

                let denominator = Expr::mul(
                    common
                        .into_iter()
                        .map(|(base, exponent)| Expr::pow(base, Expr::num(exponent))),
                );
                let numerator = Expr::add(fractions.into_iter().map(|(n, d)| {
                    Expr::mul([n, denominator.clone(), d.recip()]).expand()
                }));
                Expr::mul([numerator, denominator.recip()])
            }
            Expr::Mul(factors) => Expr::mul(factors.iter().map(Expr::together)),
            Expr::Pow(base, exponent) => Expr::pow(base.together(), (**exponent).clone()),
            Expr::Exp(arg) => Expr::exp(arg.together()),
            Expr::Ln(arg) => Expr::ln(arg.together()),
            Expr::Num(_) | Expr::Sym(_) => self.clone(),
        }
    }

    /// Split into `(numerator, denominator)`, moving factors with a negative numeric
    /// exponent into the denominator.
    pub fn as_fraction(&self) -> (Expr, Expr) {
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        for factor in self.factors() {
            match factor {
                Expr::Pow(base, exponent) if exponent.as_num().is_some_and(|e| e < 0.0) => {
                    denominator.push(Expr::pow((**base).clone(), -(**exponent).clone()))
                }
                other => numerator.push(other.clone()),
            }
        }
        (Expr::mul(numerator), Expr::mul(denominator))
    }
}

fn distribute(lhs: &Expr, rhs: &Expr) -> Expr {
    Expr::add(lhs.terms().iter().flat_map(|l| {
        rhs.terms()
            .iter()
            .map(move |r| Expr::mul([l.clone(), r.clone()]))
    }))
}
