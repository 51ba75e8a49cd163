#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

/// A minimal computer-algebra layer for curve equations.
///
/// Expressions are immutable trees built through canonicalizing constructors.
/// Sums and products are flattened, numeric constants are folded and like terms
/// are collected, so that equality of two expressions can be decided structurally.
pub mod expr;

/// Supply and demand curve families.
///
/// This module contains the named curve families, their parameterization and
/// the factory that turns a family plus (optional) parameter overrides into an
/// immutable [`Curve`](models::Curve).
pub mod models;

pub use expr::{Expr, ExprError, Sign, Symbol, SymbolError};
pub use models::{
    Constraint, Curve, CurveConfig, CurveDefaults, CurveError, CurveFamily, CurveKind, CurveParams,
    CurveSpec, ParamValue, ParameterError, ParameterMode, Point, Side, build_curve,
};

/// A hashmap with deterministic (insertion) ordering
pub type Map<K, V> = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;
