use crate::{Map, Symbol};

/// The value of a single curve coefficient: a number, or a symbol to keep free.
///
/// In JSON this is either a number (`2.5`) or an identifier string (`"alpha"`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum ParamValue {
    /// A numeric value
    Number(f64),
    /// A free symbol
    Symbol(Symbol),
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ParamValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde_untagged::UntaggedEnumVisitor::new()
            .f64(|value| Ok(ParamValue::Number(value)))
            .i64(|value| Ok(ParamValue::Number(value as f64)))
            .u64(|value| Ok(ParamValue::Number(value as f64)))
            .string(|name| {
                Symbol::new(name)
                    .map(ParamValue::Symbol)
                    .map_err(serde::de::Error::custom)
            })
            .deserialize(deserializer)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Symbol> for ParamValue {
    fn from(value: Symbol) -> Self {
        Self::Symbol(value)
    }
}

/// Optional coefficient overrides for a curve, keyed by coefficient name
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct CurveParams(pub Map<String, ParamValue>);

impl CurveParams {
    /// Builder-style override of a single coefficient
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.to_owned(), value.into());
        self
    }
}

impl std::ops::Deref for CurveParams {
    type Target = Map<String, ParamValue>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<(String, ParamValue)> for CurveParams {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(Map::from_iter(iter))
    }
}

/// Errors raised by a single coefficient
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    /// The family has no coefficient of this name
    #[error("unknown parameter `{0}`")]
    Unknown(String),
    /// A coefficient was named after the price or quantity symbol
    #[error("parameter `{0}` cannot use the reserved symbols `p` or `q`")]
    Reserved(String),
    /// A symbolic value was given where a number is required
    #[error("parameter `{0}` must be numeric")]
    NonNumeric(String),
    /// A NaN or infinite value
    #[error("parameter `{0}` must be finite")]
    NonFinite(String),
    /// A number outside the domain of the family
    #[error("parameter `{name}` must be {constraint}, got {value}")]
    Domain {
        /// The coefficient name
        name: String,
        /// The violated constraint, e.g. `> 0`
        constraint: super::Constraint,
        /// The offending value
        value: f64,
    },
}
