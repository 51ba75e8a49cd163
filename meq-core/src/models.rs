mod config;
mod curve;
mod family;
mod params;
mod point;

pub use config::{CurveConfig, CurveDefaults, ParameterMode};
pub use curve::{Curve, CurveError, CurveSpec, build_curve};
pub use family::{Constraint, CurveFamily, CurveKind, Side};
pub use params::{CurveParams, ParamValue, ParameterError};
pub use point::Point;
