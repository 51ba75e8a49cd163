use super::{
    CurveConfig, CurveFamily, CurveKind, CurveParams, ParamValue, ParameterError, ParameterMode,
    Point, Side,
};
use crate::{Expr, ExprError, Map, Sign, Symbol};
use std::{collections::BTreeSet, fmt};

/// A supply or demand curve `q = f(p)` from one of the named families.
///
/// Curves are immutable. The coefficients are either numbers that satisfy the
/// domain constraints of the family, or free symbols. The quantity expression
/// and its inverse are derived once, at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    family: CurveFamily,
    coefficients: [Expr; 2],
    quantity: Expr,
    inverse: Expr,
    parameters: BTreeSet<Symbol>,
}

/// A curve request as it appears in input documents: the side is implied by context
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveSpec {
    /// The functional form
    pub kind: CurveKind,
    /// Coefficient overrides
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: CurveParams,
}

impl CurveSpec {
    /// A spec with no overrides
    pub fn new(kind: CurveKind) -> Self {
        Self {
            kind,
            params: CurveParams::default(),
        }
    }

    /// Build the curve for the given side of the market
    pub fn build(&self, side: Side, config: &CurveConfig) -> Result<Curve, CurveError> {
        build_curve(CurveFamily { side, kind: self.kind }, &self.params, config)
    }
}

/// Construct a curve of the given family.
///
/// Each coefficient is taken from `params` when present. Otherwise it is left as
/// its conventional symbol (`a`, `b`, `c` or `d`) in [`ParameterMode::Symbolic`],
/// or set to the configured default in [`ParameterMode::Numeric`].
pub fn build_curve(
    family: CurveFamily,
    params: &CurveParams,
    config: &CurveConfig,
) -> Result<Curve, CurveError> {
    let invalid = |source| CurveError::InvalidParameter { family, source };
    let names = family.parameter_names();

    if let Some(unknown) = params
        .keys()
        .find(|key| !names.iter().any(|name| *name == key.as_str()))
    {
        return Err(invalid(ParameterError::Unknown(unknown.clone())));
    }

    let defaults = config.defaults.get(family);
    let mut coefficients = [Expr::ZERO, Expr::ZERO];
    for (i, name) in names.into_iter().enumerate() {
        coefficients[i] = match (params.get(name), config.mode) {
            (Some(ParamValue::Number(x)), _) => Expr::num(*x),
            (Some(ParamValue::Symbol(_)), ParameterMode::Numeric) => {
                return Err(invalid(ParameterError::NonNumeric(name.to_owned())));
            }
            (Some(ParamValue::Symbol(s)), ParameterMode::Symbolic) => {
                if s.is_reserved() {
                    return Err(invalid(ParameterError::Reserved(name.to_owned())));
                }
                Expr::sym(s.clone())
            }
            (None, ParameterMode::Symbolic) => Expr::sym(Symbol::builtin(name)),
            (None, ParameterMode::Numeric) => Expr::num(defaults[i]),
        };
    }

    Curve::new(family, coefficients)
}

impl Curve {
    /// Creates a curve from explicit coefficients, validating numeric ones
    pub fn new(family: CurveFamily, coefficients: [Expr; 2]) -> Result<Self, CurveError> {
        let names = family.parameter_names();
        let constraints = family.constraints();

        for i in 0..2 {
            let name = names[i];
            let invalid = |source| CurveError::InvalidParameter { family, source };
            let coefficient = &coefficients[i];

            if coefficient.free_symbols().iter().any(Symbol::is_reserved) {
                return Err(invalid(ParameterError::Reserved(name.to_owned())));
            }
            let Some(value) = coefficient.as_num() else {
                continue;
            };
            if !value.is_finite() {
                return Err(invalid(ParameterError::NonFinite(name.to_owned())));
            }
            if let Some(constraint) = constraints[i] {
                if !constraint.admits(value) {
                    return Err(invalid(ParameterError::Domain {
                        name: name.to_owned(),
                        constraint,
                        value,
                    }));
                }
            }
        }

        let [first, second] = &coefficients;
        let quantity = family.quantity_expr(first, second);
        let inverse = family.inverse_expr(first, second);
        let parameters = coefficients
            .iter()
            .flat_map(Expr::free_symbols)
            .collect::<BTreeSet<_>>();

        Ok(Self {
            family,
            coefficients,
            quantity,
            inverse,
            parameters,
        })
    }

    /// The family of the curve
    pub fn family(&self) -> CurveFamily {
        self.family
    }

    /// The side of the market
    pub fn side(&self) -> Side {
        self.family.side
    }

    /// The resolved coefficients, in the order given by [`CurveFamily::parameter_names`]
    pub fn coefficients(&self) -> &[Expr; 2] {
        &self.coefficients
    }

    /// The quantity `q(p)`
    pub fn quantity_expr(&self) -> &Expr {
        &self.quantity
    }

    /// The inverse curve `p(q)`
    pub fn inverse_expr(&self) -> &Expr {
        &self.inverse
    }

    /// The free parameter symbols (never `p` or `q`)
    pub fn parameters(&self) -> &BTreeSet<Symbol> {
        &self.parameters
    }

    /// Whether every coefficient is numeric
    pub fn is_numeric(&self) -> bool {
        self.parameters.is_empty()
    }

    /// The curve as an equation `(lhs, rhs)`, i.e. `q = f(p)`
    pub fn equation(&self) -> (Expr, Expr) {
        (Expr::sym(Symbol::quantity()), self.quantity.clone())
    }

    /// Check that the curve is on the expected side of the market
    pub fn expect_side(&self, expected: Side) -> Result<&Self, CurveError> {
        if self.family.side == expected {
            Ok(self)
        } else {
            Err(CurveError::WrongSide {
                expected,
                family: self.family,
            })
        }
    }

    /// The smallest quantity at which the inverse curve is real.
    ///
    /// This is zero except for quadratic supply with a positive intercept, whose
    /// inverse `sqrt((q - c)/d)` only exists from `q = c` onwards. A symbolic
    /// intercept is taken to be positive.
    pub fn inverse_floor(&self) -> Expr {
        match (self.family.side, self.family.kind) {
            (Side::Supply, CurveKind::Quadratic) => {
                let intercept = &self.coefficients[0];
                match intercept.sign() {
                    Some(Sign::Negative) | Some(Sign::Zero) => Expr::ZERO,
                    _ => intercept.clone(),
                }
            }
            _ => Expr::ZERO,
        }
    }

    /// The quantity at a given price.
    ///
    /// Fails for negative prices, for prices at which the curve gives a negative
    /// quantity, and for curves with free parameters.
    pub fn quantity_at(&self, price: f64) -> Result<f64, CurveError> {
        if price < 0.0 {
            return Err(CurveError::NegativePrice(price));
        }
        let quantity = self.quantity.eval(&price_binding(price))?;
        if quantity < 0.0 {
            return Err(CurveError::NegativeQuantity { price, quantity });
        }
        Ok(quantity)
    }

    /// The slope `dq/dp` at a given price
    pub fn slope_at(&self, price: f64) -> Result<f64, CurveError> {
        let derivative = self.quantity.diff(&Symbol::price());
        Ok(derivative.eval(&price_binding(price))?)
    }

    /// Substitute numbers for (some of) the free parameters, producing a new curve.
    ///
    /// The substituted coefficients are validated like any other.
    pub fn substitute(&self, values: &Map<Symbol, f64>) -> Result<Curve, CurveError> {
        let [first, second] = &self.coefficients;
        Curve::new(
            self.family,
            [first.subs_values(values), second.subs_values(values)],
        )
    }

    /// Sample the curve at the given prices, for plotting.
    ///
    /// Prices at which the curve leaves the positive quadrant, or is undefined, are
    /// skipped.
    pub fn sample<I: IntoIterator<Item = f64>>(&self, prices: I) -> Result<Vec<Point>, CurveError> {
        let mut points = Vec::new();
        for price in prices {
            match self.quantity_at(price) {
                Ok(quantity) => points.push(Point { quantity, price }),
                Err(
                    CurveError::NegativePrice(_)
                    | CurveError::NegativeQuantity { .. }
                    | CurveError::Expr(ExprError::NonFinite),
                ) => {}
                Err(error) => return Err(error),
            }
        }
        Ok(points)
    }
}

fn price_binding(price: f64) -> Map<Symbol, f64> {
    let mut values = Map::default();
    values.insert(Symbol::price(), price);
    values
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q = {}", self.quantity)
    }
}

/// Errors that can occur when constructing or evaluating curves
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    /// A coefficient was missing a number, out of domain, or otherwise unusable
    #[error("invalid parameter for {family}: {source}")]
    InvalidParameter {
        /// The family being built
        family: CurveFamily,
        /// The underlying problem
        source: ParameterError,
    },
    /// A curve was used on the wrong side of the market
    #[error("expected a {expected} curve, got {family}")]
    WrongSide {
        /// The side that was required
        expected: Side,
        /// The family that was given
        family: CurveFamily,
    },
    /// A negative price was requested
    #[error("price cannot be negative, got {0}")]
    NegativePrice(f64),
    /// The curve gives a negative quantity at this price
    #[error("quantity at price {price} is negative ({quantity})")]
    NegativeQuantity {
        /// The requested price
        price: f64,
        /// The computed quantity
        quantity: f64,
    },
    /// Numeric evaluation failed
    #[error(transparent)]
    Expr(#[from] ExprError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Constraint;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn s(name: &str) -> Expr {
        Expr::sym(Symbol::new(name).unwrap())
    }

    fn values(pairs: &[(&str, f64)]) -> Map<Symbol, f64> {
        pairs
            .iter()
            .map(|(name, value)| (Symbol::new(name).unwrap(), *value))
            .collect()
    }

    #[test]
    fn test_symbolic_linear_demand() {
        let curve = build_curve(
            CurveFamily::demand(CurveKind::Linear),
            &CurveParams::default(),
            &CurveConfig::default(),
        )
        .unwrap();

        let p = Expr::sym(Symbol::price());
        let q = Expr::sym(Symbol::quantity());
        assert_eq!(curve.quantity_expr(), &(s("a") - s("b") * p));
        assert_eq!(curve.inverse_expr(), &((s("a") - q) / s("b")));
        assert_eq!(
            curve.parameters().iter().map(Symbol::name).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(curve.to_string(), "q = a - b*p");
        assert!(!curve.is_numeric());
    }

    #[test]
    fn test_numeric_defaults() {
        let curve = build_curve(
            CurveFamily::supply(CurveKind::Linear),
            &CurveParams::default(),
            &CurveConfig::numeric(),
        )
        .unwrap();
        assert!(curve.is_numeric());
        assert_eq!(curve.coefficients(), &[Expr::num(20.0), Expr::num(3.0)]);
        assert_relative_eq!(curve.quantity_at(10.0).unwrap(), 50.0);
        assert_relative_eq!(curve.slope_at(10.0).unwrap(), 3.0);
    }

    #[test]
    fn test_mixed_overrides() {
        let params = CurveParams::default().with("a", 100.0);
        let curve = build_curve(
            CurveFamily::demand(CurveKind::Power),
            &params,
            &CurveConfig::default(),
        )
        .unwrap();
        assert_eq!(curve.coefficients()[0], Expr::num(100.0));
        assert_eq!(curve.coefficients()[1], s("b"));
    }

    #[rstest]
    #[case::linear_demand_slope(CurveFamily::demand(CurveKind::Linear), "b", -2.0, Constraint::Positive)]
    #[case::linear_demand_flat(CurveFamily::demand(CurveKind::Linear), "b", 0.0, Constraint::Positive)]
    #[case::power_demand_scale(CurveFamily::demand(CurveKind::Power), "a", -1.0, Constraint::Positive)]
    #[case::power_demand_elasticity(CurveFamily::demand(CurveKind::Power), "b", 0.5, Constraint::Negative)]
    #[case::exponential_demand(CurveFamily::demand(CurveKind::Exponential), "a", 0.0, Constraint::Positive)]
    #[case::quadratic_demand(CurveFamily::demand(CurveKind::Quadratic), "b", -0.1, Constraint::Positive)]
    #[case::linear_supply(CurveFamily::supply(CurveKind::Linear), "d", -3.0, Constraint::Positive)]
    #[case::power_supply(CurveFamily::supply(CurveKind::Power), "d", 0.0, Constraint::Positive)]
    #[case::exponential_supply(CurveFamily::supply(CurveKind::Exponential), "c", -0.05, Constraint::Positive)]
    #[case::quadratic_supply(CurveFamily::supply(CurveKind::Quadratic), "d", -1.0, Constraint::Positive)]
    fn test_domain_violations(
        #[case] family: CurveFamily,
        #[case] name: &str,
        #[case] value: f64,
        #[case] constraint: Constraint,
    ) {
        let params = CurveParams::default().with(name, value);
        let error = build_curve(family, &params, &CurveConfig::default()).unwrap_err();
        assert_eq!(
            error,
            CurveError::InvalidParameter {
                family,
                source: ParameterError::Domain {
                    name: name.to_owned(),
                    constraint,
                    value,
                },
            }
        );
    }

    #[test]
    fn test_unconstrained_coefficients() {
        // intercepts and shifts may take any sign
        let params = CurveParams::default().with("c", -5.0).with("d", 1.0);
        assert!(
            build_curve(
                CurveFamily::supply(CurveKind::Linear),
                &params,
                &CurveConfig::default()
            )
            .is_ok()
        );
        let params = CurveParams::default().with("b", -1.0);
        assert!(
            build_curve(
                CurveFamily::demand(CurveKind::Exponential),
                &params,
                &CurveConfig::default()
            )
            .is_ok()
        );
    }

    #[test]
    fn test_rejected_parameters() {
        let family = CurveFamily::demand(CurveKind::Linear);
        let source = |params: CurveParams, config: &CurveConfig| {
            match build_curve(family, &params, config).unwrap_err() {
                CurveError::InvalidParameter { source, .. } => source,
                other => panic!("unexpected error {other}"),
            }
        };

        assert_eq!(
            source(CurveParams::default().with("c", 1.0), &CurveConfig::default()),
            ParameterError::Unknown("c".to_owned())
        );
        assert_eq!(
            source(
                CurveParams::default().with("a", Symbol::price()),
                &CurveConfig::default()
            ),
            ParameterError::Reserved("a".to_owned())
        );
        assert_eq!(
            source(
                CurveParams::default().with("a", Symbol::new("alpha").unwrap()),
                &CurveConfig::numeric()
            ),
            ParameterError::NonNumeric("a".to_owned())
        );
        assert_eq!(
            source(
                CurveParams::default().with("a", f64::INFINITY),
                &CurveConfig::default()
            ),
            ParameterError::NonFinite("a".to_owned())
        );
        assert_eq!(
            source(
                CurveParams::default().with("b", f64::NAN),
                &CurveConfig::default()
            ),
            ParameterError::NonFinite("b".to_owned())
        );
    }

    #[test]
    fn test_quantity_at_rejects_negatives() {
        let curve = build_curve(
            CurveFamily::demand(CurveKind::Linear),
            &CurveParams::default().with("a", 10.0).with("b", 1.0),
            &CurveConfig::default(),
        )
        .unwrap();
        assert_eq!(
            curve.quantity_at(-1.0).unwrap_err(),
            CurveError::NegativePrice(-1.0)
        );
        assert_eq!(
            curve.quantity_at(12.0).unwrap_err(),
            CurveError::NegativeQuantity {
                price: 12.0,
                quantity: -2.0
            }
        );
        assert_relative_eq!(curve.slope_at(3.0).unwrap(), -1.0);
    }

    #[test]
    fn test_symbolic_curve_cannot_be_evaluated() {
        let curve = build_curve(
            CurveFamily::demand(CurveKind::Linear),
            &CurveParams::default(),
            &CurveConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            curve.quantity_at(1.0),
            Err(CurveError::Expr(ExprError::Unbound(_)))
        ));
    }

    #[test]
    fn test_substitute_revalidates() {
        let curve = build_curve(
            CurveFamily::demand(CurveKind::Linear),
            &CurveParams::default(),
            &CurveConfig::default(),
        )
        .unwrap();

        let numeric = curve.substitute(&values(&[("a", 10.0), ("b", 1.0)])).unwrap();
        assert!(numeric.is_numeric());
        assert_relative_eq!(numeric.quantity_at(4.0).unwrap(), 6.0);

        let partial = curve.substitute(&values(&[("a", 10.0)])).unwrap();
        assert_eq!(partial.parameters().len(), 1);

        assert!(matches!(
            curve.substitute(&values(&[("b", 0.0)])),
            Err(CurveError::InvalidParameter {
                source: ParameterError::Domain { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_sample_clips_to_quadrant() {
        let curve = build_curve(
            CurveFamily::demand(CurveKind::Linear),
            &CurveParams::default().with("a", 10.0).with("b", 1.0),
            &CurveConfig::default(),
        )
        .unwrap();
        let points = curve.sample([0.0, 5.0, 10.0, 15.0]).unwrap();
        assert_eq!(
            points,
            vec![
                Point {
                    quantity: 10.0,
                    price: 0.0
                },
                Point {
                    quantity: 5.0,
                    price: 5.0
                },
                Point {
                    quantity: 0.0,
                    price: 10.0
                },
            ]
        );
    }

    #[rstest]
    fn test_inverse_undoes_quantity(
        #[values(
            CurveFamily::demand(CurveKind::Linear),
            CurveFamily::demand(CurveKind::Power),
            CurveFamily::demand(CurveKind::Exponential),
            CurveFamily::demand(CurveKind::Quadratic),
            CurveFamily::supply(CurveKind::Linear),
            CurveFamily::supply(CurveKind::Power),
            CurveFamily::supply(CurveKind::Exponential),
            CurveFamily::supply(CurveKind::Quadratic)
        )]
        family: CurveFamily,
        #[values(1.0, 4.0, 10.0)] price: f64,
    ) {
        let curve = build_curve(family, &CurveParams::default(), &CurveConfig::numeric()).unwrap();
        let quantity = curve.quantity_at(price).unwrap();
        let recovered = curve
            .inverse_expr()
            .eval(&[(Symbol::quantity(), quantity)].into_iter().collect())
            .unwrap();
        assert_relative_eq!(recovered, price, max_relative = 1e-9);
    }

    #[test]
    fn test_inverse_floor() {
        let quadratic = |c: f64| {
            build_curve(
                CurveFamily::supply(CurveKind::Quadratic),
                &CurveParams::default().with("c", c).with("d", 1.0),
                &CurveConfig::default(),
            )
            .unwrap()
        };
        assert_eq!(quadratic(4.0).inverse_floor(), Expr::num(4.0));
        assert_eq!(quadratic(-4.0).inverse_floor(), Expr::ZERO);

        let symbolic = build_curve(
            CurveFamily::supply(CurveKind::Quadratic),
            &CurveParams::default(),
            &CurveConfig::default(),
        )
        .unwrap();
        assert_eq!(symbolic.inverse_floor(), s("c"));
    }

    #[test]
    fn test_equation() {
        let curve = build_curve(
            CurveFamily::supply(CurveKind::Exponential),
            &CurveParams::default().with("d", 0.0),
            &CurveConfig::default(),
        )
        .unwrap();
        let (lhs, rhs) = curve.equation();
        assert_eq!(lhs, Expr::sym(Symbol::quantity()));
        assert_eq!(&rhs, curve.quantity_expr());
        assert_eq!(
            rhs,
            Expr::exp(s("c") * Expr::sym(Symbol::price()))
        );
    }

    #[test]
    fn test_expect_side() {
        let supply = build_curve(
            CurveFamily::supply(CurveKind::Power),
            &CurveParams::default(),
            &CurveConfig::default(),
        )
        .unwrap();
        assert!(supply.expect_side(Side::Supply).is_ok());
        assert_eq!(
            supply.expect_side(Side::Demand).unwrap_err(),
            CurveError::WrongSide {
                expected: Side::Demand,
                family: CurveFamily::supply(CurveKind::Power),
            }
        );
    }

    #[test]
    fn test_deserialize_spec() {
        let raw = r#"{ "kind": "linear", "params": { "a": 10, "b": "beta" } }"#;
        let spec = serde_json::from_str::<CurveSpec>(raw).unwrap();
        let curve = spec.build(Side::Demand, &CurveConfig::default()).unwrap();
        assert_eq!(curve.coefficients()[1], s("beta"));

        let raw = r#"{ "kind": "quadratic" }"#;
        let spec = serde_json::from_str::<CurveSpec>(raw).unwrap();
        assert_eq!(spec, CurveSpec::new(CurveKind::Quadratic));
    }
}
