use super::{CurveFamily, CurveKind, Side};

/// How missing coefficients are filled in by the curve factory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ParameterMode {
    /// Missing coefficients stay free symbols (`a`, `b`, `c`, `d`)
    #[default]
    Symbolic,
    /// Missing coefficients take the configured defaults, and symbolic overrides are rejected
    Numeric,
}

/// Numeric default coefficients, one `[first, second]` pair per family
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CurveDefaults {
    /// `q = a - b p`
    pub linear_demand: [f64; 2],
    /// `q = a p^b`
    pub power_demand: [f64; 2],
    /// `q = exp(-a p + b)`
    pub exponential_demand: [f64; 2],
    /// `q = a - b p^2`
    pub quadratic_demand: [f64; 2],
    /// `q = c + d p`
    pub linear_supply: [f64; 2],
    /// `q = c p^d`
    pub power_supply: [f64; 2],
    /// `q = exp(c p + d)`
    pub exponential_supply: [f64; 2],
    /// `q = c + d p^2`
    pub quadratic_supply: [f64; 2],
}

impl Default for CurveDefaults {
    fn default() -> Self {
        Self {
            linear_demand: [100.0, 2.0],
            power_demand: [100.0, -0.5],
            exponential_demand: [0.05, 4.6],
            quadratic_demand: [100.0, 0.04],
            linear_supply: [20.0, 3.0],
            power_supply: [1.0, 1.5],
            exponential_supply: [0.05, 0.0],
            quadratic_supply: [0.0, 0.04],
        }
    }
}

impl CurveDefaults {
    /// The default coefficients of `family`
    pub fn get(&self, family: CurveFamily) -> [f64; 2] {
        match (family.side, family.kind) {
            (Side::Demand, CurveKind::Linear) => self.linear_demand,
            (Side::Demand, CurveKind::Power) => self.power_demand,
            (Side::Demand, CurveKind::Exponential) => self.exponential_demand,
            (Side::Demand, CurveKind::Quadratic) => self.quadratic_demand,
            (Side::Supply, CurveKind::Linear) => self.linear_supply,
            (Side::Supply, CurveKind::Power) => self.power_supply,
            (Side::Supply, CurveKind::Exponential) => self.exponential_supply,
            (Side::Supply, CurveKind::Quadratic) => self.quadratic_supply,
        }
    }
}

/// Configuration for the curve factory.
///
/// This is passed explicitly to [`build_curve`](super::build_curve); there is no
/// global default state.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CurveConfig {
    /// Whether missing coefficients stay symbolic
    pub mode: ParameterMode,
    /// The numeric defaults used in [`ParameterMode::Numeric`]
    pub defaults: CurveDefaults,
}

impl CurveConfig {
    /// A numeric configuration with the stock defaults
    pub fn numeric() -> Self {
        Self {
            mode: ParameterMode::Numeric,
            defaults: CurveDefaults::default(),
        }
    }
}
