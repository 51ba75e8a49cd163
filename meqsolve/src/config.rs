//! Layered configuration for the solver.
//!
//! The effective [`MarketConfig`] is assembled from, in increasing order of
//! precedence, the built-in defaults, an optional TOML file, `MEQ_`-prefixed
//! environment variables, and finally the command-line switches.

use crate::CliError;
use clap::Args;
use meq_core::ParameterMode;
use meq_solver::MarketConfig;
use std::path::PathBuf;
use tracing::{Level, event};

/// Command-line arguments that shape the market configuration
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "MEQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fill in missing curve parameters with their numeric defaults
    #[arg(long, global = true)]
    pub numeric: bool,

    /// Only accept closed-form roots, never search numerically
    #[arg(long, global = true)]
    pub closed_form_only: bool,
}

impl ConfigArgs {
    /// Load the configuration.
    ///
    /// Environment variables are mapped using the pattern
    /// `MEQ_<SECTION>__<KEY>` to `<section>.<key>`, for example:
    ///
    /// ```bash
    /// export MEQ_CURVES__MODE=numeric
    /// export MEQ_SOLVER__NUMERIC_FALLBACK=false
    /// export MEQ_SOLVER__MAX_PRICE=1000
    /// ```
    pub fn load(&self) -> anyhow::Result<MarketConfig> {
        let mut config = config::Config::builder();

        // Start with default values
        config = config.add_source(config::Config::try_from(&MarketConfig::default())?);

        // Layer on the config file if it is specified and exists
        if let Some(path) = &self.config {
            if !path.exists() {
                return Err(CliError::ConfigNotFound(path.clone()))?;
            }
            config = config.add_source(config::File::from(path.as_path()));
        }

        // Override with environment variables
        config = config.add_source(
            config::Environment::with_prefix("MEQ")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut market: MarketConfig = config.build()?.try_deserialize()?;

        // Explicit switches win over everything else
        if self.numeric {
            market.curves.mode = ParameterMode::Numeric;
        }
        if self.closed_form_only {
            market.solver.numeric_fallback = false;
        }

        event!(Level::DEBUG, ?market, "loaded configuration");
        Ok(market)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("meqsolve-{}-{name}.toml", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = ConfigArgs::default().load().unwrap();
        assert_eq!(config.curves.mode, ParameterMode::Symbolic);
        assert!(config.solver.numeric_fallback);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = write_config(
            "file",
            r#"
            [curves]
            mode = "numeric"

            [curves.defaults]
            linear_demand = [50.0, 1.0]

            [solver]
            max_price = 500.0
            "#,
        );
        let args = ConfigArgs {
            config: Some(path.clone()),
            ..Default::default()
        };
        let config = args.load().unwrap();
        fs::remove_file(path).unwrap();

        assert_eq!(config.curves.mode, ParameterMode::Numeric);
        assert_eq!(config.curves.defaults.linear_demand, [50.0, 1.0]);
        assert_eq!(config.curves.defaults.linear_supply, [20.0, 3.0]);
        assert_eq!(config.solver.max_price, 500.0);
        assert_eq!(config.solver.grid_points, 4096);
    }

    #[test]
    fn test_switches_override_file() {
        let path = write_config("switches", "[solver]\nnumeric_fallback = true\n");
        let args = ConfigArgs {
            config: Some(path.clone()),
            numeric: true,
            closed_form_only: true,
        };
        let config = args.load().unwrap();
        fs::remove_file(path).unwrap();

        assert_eq!(config.curves.mode, ParameterMode::Numeric);
        assert!(!config.solver.numeric_fallback);
    }

    #[test]
    fn test_missing_file() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/meqsolve.toml")),
            ..Default::default()
        };
        let error = args.load().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<CliError>(),
            Some(CliError::ConfigNotFound(_))
        ));
    }
}
