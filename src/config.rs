//! Solver configuration.
//!
//! Defaults cover every field; a TOML file may override any of them:
//!
//! ```toml
//! [logging]
//! loglevel = "info"        # off | none | error | warn | info | debug | trace
//! log_to_file = false
//!
//! [solver]
//! default_variable = "x"
//! ambiguity_policy = "first_in_registry_order"   # or "reject"
//! warn_on_shadowing = true
//! max_expand_power = 12
//! display_precision = 10
//! ```
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::info;
use strum_macros::{Display, EnumString};
use toml::{Table, Value};

use crate::error::MathError;
use crate::symbolic::symbolic_factor::DEFAULT_EXPAND_POWER;

/// how `diff(...)` picks its variable when the expression has several free symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// take the first symbol in canonical registry order and attach a warning
    FirstInRegistryOrder,
    /// refuse with `NoTargetVariable`
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub loglevel: Option<String>,
    pub log_to_file: bool,
    /// variable used by directives whose expression has no free symbols
    pub default_variable: String,
    pub ambiguity_policy: AmbiguityPolicy,
    pub warn_on_shadowing: bool,
    pub max_expand_power: u32,
    /// significant digits when printing numeric results
    pub display_precision: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            loglevel: Some("info".to_string()),
            log_to_file: false,
            default_variable: "x".to_string(),
            ambiguity_policy: AmbiguityPolicy::FirstInRegistryOrder,
            warn_on_shadowing: true,
            max_expand_power: DEFAULT_EXPAND_POWER,
            display_precision: 10,
        }
    }
}

fn expect_str<'a>(section: &str, key: &str, value: &'a Value) -> Result<&'a str, MathError> {
    value
        .as_str()
        .ok_or_else(|| MathError::Config(format!("[{}] {} must be a string", section, key)))
}

fn expect_bool(section: &str, key: &str, value: &Value) -> Result<bool, MathError> {
    value
        .as_bool()
        .ok_or_else(|| MathError::Config(format!("[{}] {} must be true or false", section, key)))
}

fn expect_count(section: &str, key: &str, value: &Value) -> Result<u32, MathError> {
    value
        .as_integer()
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| MathError::Config(format!("[{}] {} must be a positive integer", section, key)))
}

impl SolverConfig {
    /// Reads the `[logging]` and `[solver]` tables; absent keys keep their defaults,
    /// unknown keys are rejected.
    pub fn from_toml_str(text: &str) -> Result<SolverConfig, MathError> {
        let document = text
            .parse::<Table>()
            .map_err(|e| MathError::Config(e.to_string()))?;
        let mut config = SolverConfig::default();
        for (section_name, section) in &document {
            let section = section
                .as_table()
                .ok_or_else(|| MathError::Config(format!("`{}` must be a table", section_name)))?;
            match section_name.as_str() {
                "logging" => config.apply_logging(section)?,
                "solver" => config.apply_solver(section)?,
                other => return Err(MathError::Config(format!("unknown section [{}]", other))),
            }
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<SolverConfig, MathError> {
        let text = fs::read_to_string(path)
            .map_err(|e| MathError::Config(format!("{}: {}", path.display(), e)))?;
        let config = SolverConfig::from_toml_str(&text)?;
        info!("configuration loaded from {}", path.display());
        Ok(config)
    }

    fn apply_logging(&mut self, section: &Table) -> Result<(), MathError> {
        for (key, value) in section {
            match key.as_str() {
                "loglevel" => {
                    let level = expect_str("logging", key, value)?;
                    self.loglevel = match level {
                        "off" | "none" => None,
                        "error" | "warn" | "info" | "debug" | "trace" => Some(level.to_string()),
                        other => {
                            return Err(MathError::Config(format!("unknown loglevel `{}`", other)));
                        }
                    };
                }
                "log_to_file" => self.log_to_file = expect_bool("logging", key, value)?,
                other => return Err(MathError::Config(format!("unknown key [logging] {}", other))),
            }
        }
        Ok(())
    }

    fn apply_solver(&mut self, section: &Table) -> Result<(), MathError> {
        for (key, value) in section {
            match key.as_str() {
                "default_variable" => {
                    let name = expect_str("solver", key, value)?;
                    if !crate::input::registry::is_identifier(name) {
                        return Err(MathError::Config(format!(
                            "default_variable `{}` is not an identifier",
                            name
                        )));
                    }
                    self.default_variable = name.to_string();
                }
                "ambiguity_policy" => {
                    let policy = expect_str("solver", key, value)?;
                    self.ambiguity_policy = AmbiguityPolicy::from_str(policy).map_err(|_| {
                        MathError::Config(format!("unknown ambiguity_policy `{}`", policy))
                    })?;
                }
                "warn_on_shadowing" => self.warn_on_shadowing = expect_bool("solver", key, value)?,
                "max_expand_power" => self.max_expand_power = expect_count("solver", key, value)?,
                "display_precision" => {
                    self.display_precision = expect_count("solver", key, value)? as usize
                }
                other => return Err(MathError::Config(format!("unknown key [solver] {}", other))),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.default_variable, "x");
        assert_eq!(config.ambiguity_policy, AmbiguityPolicy::FirstInRegistryOrder);
        assert_eq!(config.max_expand_power, DEFAULT_EXPAND_POWER);
        assert!(config.warn_on_shadowing);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = SolverConfig::from_toml_str(
            r#"
            [solver]
            ambiguity_policy = "reject"
            max_expand_power = 6
            "#,
        )
        .unwrap();
        assert_eq!(config.ambiguity_policy, AmbiguityPolicy::Reject);
        assert_eq!(config.max_expand_power, 6);
        assert_eq!(config.loglevel.as_deref(), Some("info"));
    }

    #[test]
    fn test_logging_off() {
        let config = SolverConfig::from_toml_str("[logging]\nloglevel = \"off\"\nlog_to_file = true\n").unwrap();
        assert_eq!(config.loglevel, None);
        assert!(config.log_to_file);
    }

    #[test]
    fn test_invalid_values() {
        for text in [
            "[solver]\nambiguity_policy = \"random\"\n",
            "[solver]\nmax_expand_power = -1\n",
            "[solver]\ndefault_variable = \"2x\"\n",
            "[solver]\ncolour = \"red\"\n",
            "[plots]\nwidth = 3\n",
            "[logging]\nloglevel = \"loud\"\n",
            "not toml at all = = =",
        ] {
            assert!(
                matches!(SolverConfig::from_toml_str(text), Err(MathError::Config(_))),
                "{:?} was accepted",
                text
            );
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[solver]\ndefault_variable = \"t\"\nwarn_on_shadowing = false").unwrap();
        let config = SolverConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_variable, "t");
        assert!(!config.warn_on_shadowing);
        assert!(SolverConfig::from_file(Path::new("/nonexistent/solver.toml")).is_err());
    }
}
