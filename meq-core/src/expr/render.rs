use super::Expr;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Style {
    Text,
    Latex,
}

// Binding strength of the outermost operator of a rendered expression
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Sum,
    Product,
    Power,
    Atom,
}

struct Rendered {
    text: String,
    prec: Prec,
}

impl Rendered {
    fn new(text: String, prec: Prec) -> Self {
        Self { text, prec }
    }

    /// The text, parenthesized if it binds more loosely than `min`
    fn at_least(self, min: Prec, style: Style) -> String {
        if self.prec >= min {
            self.text
        } else {
            match style {
                Style::Text => format!("({})", self.text),
                Style::Latex => format!("\\left({}\\right)", self.text),
            }
        }
    }
}

const GREEK: [&str; 24] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "omicron", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi",
    "psi", "omega",
];

fn render(expr: &Expr, style: Style) -> Rendered {
    match expr {
        Expr::Num(x) => {
            let prec = if *x < 0.0 { Prec::Product } else { Prec::Atom };
            Rendered::new(format!("{x}"), prec)
        }
        Expr::Sym(s) => {
            let name = s.name();
            let text = match style {
                Style::Latex if GREEK.contains(&name) => format!("\\{name}"),
                Style::Latex if name.chars().count() > 1 => format!("\\mathrm{{{name}}}"),
                _ => name.to_owned(),
            };
            Rendered::new(text, Prec::Atom)
        }
        Expr::Add(terms) => {
            let mut text = String::new();
            for (i, term) in terms.iter().enumerate() {
                let (coefficient, _) = term.clone().split_coefficient();
                if coefficient < 0.0 {
                    text.push_str(if i == 0 { "-" } else { " - " });
                    text.push_str(&render(&-term, style).at_least(Prec::Product, style));
                } else {
                    if i > 0 {
                        text.push_str(" + ");
                    }
                    text.push_str(&render(term, style).at_least(Prec::Product, style));
                }
            }
            Rendered::new(text, Prec::Sum)
        }
        Expr::Mul(factors) => match factors.split_first() {
            Some((Expr::Num(c), rest)) => render_product(*c, rest, style),
            _ => render_product(1.0, factors, style),
        },
        Expr::Pow(_, exponent) if exponent.as_num().is_some_and(|e| e < 0.0) => {
            render_product(1.0, std::slice::from_ref(expr), style)
        }
        Expr::Pow(base, exponent) if exponent.as_num() == Some(0.5) => {
            let inner = render(base, style).text;
            let text = match style {
                Style::Text => format!("sqrt({inner})"),
                Style::Latex => format!("\\sqrt{{{inner}}}"),
            };
            Rendered::new(text, Prec::Atom)
        }
        Expr::Pow(base, exponent) => {
            let base = render(base, style).at_least(Prec::Atom, style);
            let text = match style {
                Style::Text => {
                    format!("{base}^{}", render(exponent, style).at_least(Prec::Atom, style))
                }
                Style::Latex => format!("{base}^{{{}}}", render(exponent, style).text),
            };
            Rendered::new(text, Prec::Power)
        }
        Expr::Exp(arg) => {
            let inner = render(arg, style).text;
            match style {
                Style::Text => Rendered::new(format!("exp({inner})"), Prec::Atom),
                Style::Latex => Rendered::new(format!("e^{{{inner}}}"), Prec::Power),
            }
        }
        Expr::Ln(arg) => {
            let inner = render(arg, style).text;
            let text = match style {
                Style::Text => format!("ln({inner})"),
                Style::Latex => format!("\\ln\\left({inner}\\right)"),
            };
            Rendered::new(text, Prec::Atom)
        }
    }
}

fn render_product(coefficient: f64, factors: &[Expr], style: Style) -> Rendered {
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();

    let magnitude = coefficient.abs();
    if magnitude != 1.0 {
        numerator.push(Rendered::new(format!("{magnitude}"), Prec::Atom));
    }

    for factor in factors {
        match factor {
            Expr::Pow(base, exponent) if exponent.as_num().is_some_and(|e| e < 0.0) => {
                denominator.push(render(
                    &Expr::pow((**base).clone(), -(**exponent).clone()),
                    style,
                ))
            }
            other => numerator.push(render(other, style)),
        }
    }

    // Inside \frac{..}{..} a lone factor needs no parentheses
    let fraction = !denominator.is_empty();
    let numerator = match numerator.len() {
        0 => "1".to_owned(),
        1 if fraction && style == Style::Latex => numerator.remove(0).text,
        _ => join_factors(numerator, style),
    };

    let body = match (style, denominator.len()) {
        (_, 0) => numerator,
        (Style::Text, 1) => format!(
            "{numerator}/{}",
            denominator.remove(0).at_least(Prec::Power, style)
        ),
        (Style::Text, _) => format!("{numerator}/({})", join_factors(denominator, style)),
        (Style::Latex, 1) => format!("\\frac{{{numerator}}}{{{}}}", denominator.remove(0).text),
        (Style::Latex, _) => format!(
            "\\frac{{{numerator}}}{{{}}}",
            join_factors(denominator, style)
        ),
    };

    let text = if coefficient < 0.0 {
        format!("-{body}")
    } else {
        body
    };
    Rendered::new(text, Prec::Product)
}

fn join_factors(parts: Vec<Rendered>, style: Style) -> String {
    let separator = match style {
        Style::Text => "*",
        Style::Latex => " ",
    };
    parts
        .into_iter()
        .map(|r| r.at_least(Prec::Product, style))
        .collect::<Vec<_>>()
        .join(separator)
}

impl Expr {
    /// Render the expression as LaTeX math (without surrounding `$` delimiters)
    pub fn latex(&self) -> String {
        render(self, Style::Latex).text
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self, Style::Text).text)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Expr, Symbol};

    fn s(name: &str) -> Expr {
        Expr::sym(Symbol::new(name).unwrap())
    }

    #[test]
    fn test_numbers() {
        assert_eq!(Expr::num(16.0).to_string(), "16");
        assert_eq!(Expr::num(2.5).to_string(), "2.5");
        assert_eq!(Expr::num(-3.0).to_string(), "-3");
    }

    #[test]
    fn test_sums_and_products() {
        let (a, b, p) = (s("a"), s("b"), s("p"));
        assert_eq!((&a - &b * &p).to_string(), "a - b*p");
        assert_eq!((-2.0 * a.clone()).to_string(), "-2*a");
        assert_eq!((&a + 1.0).to_string(), "a + 1");
        assert_eq!((&a * (&b + &p)).to_string(), "a*(b + p)");
    }

    #[test]
    fn test_fractions() {
        let (a, b, c, d) = (s("a"), s("b"), s("c"), s("d"));
        let price = (&a - &c) / (&b + &d);
        assert_eq!(price.to_string(), "(a - c)/(b + d)");
        assert_eq!(price.latex(), "\\frac{a - c}{b + d}");
        assert_eq!(b.clone().recip().to_string(), "1/b");
        assert_eq!((-(&a / (&b * &d))).to_string(), "-a/(b*d)");
    }

    #[test]
    fn test_powers() {
        let (a, b, q) = (s("a"), s("b"), s("q"));
        let inverse = Expr::pow(a.clone(), -(b.clone().recip()))
            * Expr::pow(q.clone(), b.clone().recip());
        assert_eq!(inverse.to_string(), "a^(-1/b)*q^(1/b)");
        assert_eq!(Expr::sqrt(q.clone()).to_string(), "sqrt(q)");
        assert_eq!(Expr::sqrt(q.clone()).latex(), "\\sqrt{q}");
        assert_eq!(Expr::pow(q, Expr::num(2.0)).latex(), "q^{2}");
    }

    #[test]
    fn test_transcendental() {
        let (a, b, p) = (s("a"), s("b"), s("p"));
        let exponential = Expr::exp(&b - &a * &p);
        assert_eq!(exponential.to_string(), "exp(b - a*p)");
        assert_eq!(exponential.latex(), "e^{b - a p}");
        assert_eq!(Expr::ln(s("q")).latex(), "\\ln\\left(q\\right)");
        assert_eq!(s("alpha").latex(), "\\alpha");
    }
}
