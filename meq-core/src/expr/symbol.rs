use std::{fmt, str::FromStr, sync::Arc};

/// A named scalar unknown.
///
/// Symbols are cheap to clone and compare by name. The names `p` and `q` are
/// reserved for price and quantity; the curve factory refuses to use them as
/// parameter names.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Creates a symbol, validating that the name is an identifier
    pub fn new(name: &str) -> Result<Self, SymbolError> {
        let mut chars = name.chars();
        match chars.next() {
            None => return Err(SymbolError::Empty),
            Some(first) if !(first.is_alphabetic() || first == '_') => {
                return Err(SymbolError::Invalid(name.to_owned()));
            }
            _ => {}
        }
        if chars.all(|c| c.is_alphanumeric() || c == '_') {
            Ok(Self(Arc::from(name)))
        } else {
            Err(SymbolError::Invalid(name.to_owned()))
        }
    }

    // Only for names known to be identifiers at compile time.
    pub(crate) fn builtin(name: &'static str) -> Self {
        Self(Arc::from(name))
    }

    /// The price symbol `p`
    pub fn price() -> Self {
        Self::builtin("p")
    }

    /// The quantity symbol `q`
    pub fn quantity() -> Self {
        Self::builtin("q")
    }

    /// Whether this is one of the reserved symbols `p` or `q`
    pub fn is_reserved(&self) -> bool {
        matches!(&*self.0, "p" | "q")
    }

    /// The name of the symbol
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0.to_string()
    }
}

/// Errors that can occur when naming a symbol
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SymbolError {
    /// The name was empty
    #[error("symbol names cannot be empty")]
    Empty,
    /// The name was not an identifier
    #[error("`{0}` is not a valid symbol name")]
    Invalid(String),
}
