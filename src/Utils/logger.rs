//! Terminal (and optionally file) logging set up from a `loglevel` string.
use std::fs::File;

use chrono::Local;
use log::{LevelFilter, info};
use simplelog::{ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger};

use crate::error::MathError;

/// maps a textual level onto a filter; `off` and `none` silence everything
pub fn level_filter(level: &str) -> Result<LevelFilter, MathError> {
    match level {
        "off" | "none" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        other => Err(MathError::Config(format!(
            "loglevel must be off, error, warn, info, debug or trace, got `{}`",
            other
        ))),
    }
}

/// Installs the global logger.
/// # Arguments
/// * `loglevel` - `None` disables logging
/// * `log_to_file` - also write `log_<date>_<time>.txt` in the working directory
/// # Returns
/// `true` when a logger was installed, `false` when logging is off or a logger already exists
pub fn init_logging(loglevel: Option<&str>, log_to_file: bool) -> Result<bool, MathError> {
    let log_option = match loglevel {
        Some(level) => level_filter(level)?,
        None => LevelFilter::Off,
    };
    if log_option == LevelFilter::Off {
        return Ok(false);
    }
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_option,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if log_to_file {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let name = format!("log_{}.txt", date_and_time);
        let file = File::create(&name).map_err(|e| MathError::Config(format!("{}: {}", name, e)))?;
        loggers.push(WriteLogger::new(log_option, Config::default(), file));
    }
    match CombinedLogger::init(loggers) {
        Ok(()) => {
            info!("logging at level {}", log_option);
            Ok(true)
        }
        // another logger is already installed (tests, embedding applications)
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(level_filter("none").unwrap(), LevelFilter::Off);
        assert!(matches!(level_filter("verbose"), Err(MathError::Config(_))));
    }

    #[test]
    fn test_disabled_logging_installs_nothing() {
        assert_eq!(init_logging(None, false), Ok(false));
        assert_eq!(init_logging(Some("off"), true), Ok(false));
        assert!(init_logging(Some("loud"), false).is_err());
    }
}
