use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use std::env;
use std::str::FromStr;

/// How the binary prints the registered DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("unknown output format '{}', expected text or json", other)),
        }
    }
}

/// Runtime settings read from the environment (after `.env` is loaded).
///
/// * `PIPELINE_OUTPUT`: `text` (default) or `json`
/// * `PIPELINE_LAST_RUN_END`: RFC 3339 end of the last interval that ran, if any
/// * `PIPELINE_MAX_LISTED_RUNS`: how many due runs to print, at least 1 (default 16)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub output: OutputFormat,
    pub last_run_end: Option<DateTime<Utc>>,
    pub max_listed_runs: usize,
}

pub const DEFAULT_MAX_LISTED_RUNS: usize = 16;

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: OutputFormat::default(),
            last_run_end: None,
            max_listed_runs: DEFAULT_MAX_LISTED_RUNS,
        }
    }
}

impl Settings {
    /// Reads the settings from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is set to a value that does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let output = match lookup("PIPELINE_OUTPUT") {
            Some(value) => value.parse().context("invalid PIPELINE_OUTPUT")?,
            None => OutputFormat::default(),
        };

        let last_run_end = lookup("PIPELINE_LAST_RUN_END")
            .map(|value| {
                DateTime::parse_from_rfc3339(value.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .with_context(|| format!("invalid PIPELINE_LAST_RUN_END '{}'", value))
            })
            .transpose()?;

        let max_listed_runs = match lookup("PIPELINE_MAX_LISTED_RUNS") {
            Some(value) => {
                let n: usize = value
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid PIPELINE_MAX_LISTED_RUNS '{}'", value))?;
                if n == 0 {
                    return Err(anyhow!("PIPELINE_MAX_LISTED_RUNS must be at least 1"));
                }
                n
            }
            None => DEFAULT_MAX_LISTED_RUNS,
        };

        Ok(Self {
            output,
            last_run_end,
            max_listed_runs,
        })
    }
}
