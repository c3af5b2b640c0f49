//! Runtime configuration, read from the environment (and `.env` via dotenv).

use std::env;

/// AWS CLI binary used when `IPAM_AWS_CLI` is not set.
pub const DEFAULT_AWS_CLI: &str = "aws";

/// Largest CLI stdout accepted before the response is treated as an error.
pub const DEFAULT_MAX_OUTPUT: usize = 500_000;

/// log4rs configuration file read at startup unless `IPAM_LOG_CONFIG` overrides it.
pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub aws_cli: String,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub max_output: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            aws_cli: DEFAULT_AWS_CLI.to_string(),
            profile: None,
            region: None,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }
}

impl Config {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Config {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let max_output = match non_empty("IPAM_CLI_MAX_OUTPUT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid IPAM_CLI_MAX_OUTPUT={raw}");
                defaults.max_output
            }),
            None => defaults.max_output,
        };

        Config {
            aws_cli: non_empty("IPAM_AWS_CLI").unwrap_or(defaults.aws_cli),
            profile: non_empty("AWS_PROFILE"),
            region: non_empty("AWS_REGION"),
            max_output,
        }
    }
}

/// Path of the log4rs configuration file.
pub fn log_config_path() -> String {
    env::var("IPAM_LOG_CONFIG").unwrap_or_else(|_| DEFAULT_LOG_CONFIG.to_string())
}
