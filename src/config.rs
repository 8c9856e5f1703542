//! Configuration for the feed handler
//!
//! All settings come from `--key=value` command line flags; there is no
//! separate-argument form.

use std::path::PathBuf;

use crate::error::{FeedError, Result};

const DEFAULT_TOP_N: usize = 5;
const DEFAULT_WS_ENDPOINT: &str = "wss://stream.binance.com:9443/ws";
const DEFAULT_REST_ENDPOINT: &str = "https://api.binance.com/api/v3";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Trading symbols, normalized to lowercase (e.g. ["btcusdt", "ethusdt"])
    pub symbols: Vec<String>,

    /// Depth levels per side in published rows
    pub top_n: usize,

    /// CSV output path; `None` means stdout
    pub log_path: Option<PathBuf>,

    /// WebSocket endpoint for depth and trade streams
    pub ws_endpoint: String,

    /// REST endpoint for book snapshots
    pub rest_endpoint: String,
}

impl Config {
    /// Parse configuration from command line flags (without the program name).
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut symbols: Vec<String> = Vec::new();
        let mut top_n = DEFAULT_TOP_N;
        let mut log_path: Option<PathBuf> = None;

        for arg in args {
            if let Some(list) = arg.strip_prefix("--symbols=") {
                symbols = list
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.trim().to_lowercase())
                    .collect();
            } else if let Some(value) = arg.strip_prefix("--topN=") {
                top_n = value
                    .parse::<i64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .map(|n| n as usize)
                    .ok_or_else(|| {
                        FeedError::Config(format!("--topN must be a positive integer, got '{value}'"))
                    })?;
            } else if let Some(path) = arg.strip_prefix("--log=") {
                if !path.is_empty() {
                    log_path = Some(PathBuf::from(path));
                }
            } else {
                return Err(FeedError::Config(format!("unknown argument: {arg}")));
            }
        }

        if symbols.is_empty() {
            return Err(FeedError::Config(
                "missing --symbols=btcusdt,ethusdt,...".to_string(),
            ));
        }

        // One set of workers per symbol; repeats would double-subscribe.
        let mut seen = std::collections::HashSet::new();
        symbols.retain(|s| seen.insert(s.clone()));

        Ok(Self {
            symbols,
            top_n,
            log_path,
            ws_endpoint: DEFAULT_WS_ENDPOINT.to_string(),
            rest_endpoint: DEFAULT_REST_ENDPOINT.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args<'a>(list: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
        list.iter().map(|s| s.to_string())
    }

    #[test]
    fn parses_all_flags() {
        let config =
            Config::from_args(args(&["--symbols=BTCUSDT,ethusdt", "--topN=3", "--log=/tmp/out.csv"]))
                .unwrap();
        assert_eq!(config.symbols, vec!["btcusdt", "ethusdt"]);
        assert_eq!(config.top_n, 3);
        assert_eq!(config.log_path, Some(PathBuf::from("/tmp/out.csv")));
    }

    #[test]
    fn top_n_defaults_to_five() {
        let config = Config::from_args(args(&["--symbols=btcusdt"])).unwrap();
        assert_eq!(config.top_n, 5);
        assert!(config.log_path.is_none());
    }

    #[test]
    fn empty_log_means_stdout() {
        let config = Config::from_args(args(&["--symbols=btcusdt", "--log="])).unwrap();
        assert!(config.log_path.is_none());
    }

    #[test]
    fn duplicate_symbols_are_collapsed() {
        let config = Config::from_args(args(&["--symbols=btcusdt,ETHUSDT,BTCUSDT"])).unwrap();
        assert_eq!(config.symbols, vec!["btcusdt", "ethusdt"]);
    }

    #[test]
    fn rejects_unknown_flag() {
        let err = Config::from_args(args(&["--symbols=btcusdt", "--depth=10"])).unwrap_err();
        assert!(matches!(err, FeedError::Config(_)));
    }

    #[test]
    fn rejects_missing_symbols() {
        assert!(Config::from_args(args(&["--topN=5"])).is_err());
        assert!(Config::from_args(args(&["--symbols="])).is_err());
    }

    #[test]
    fn rejects_non_positive_top_n() {
        assert!(Config::from_args(args(&["--symbols=btcusdt", "--topN=0"])).is_err());
        assert!(Config::from_args(args(&["--symbols=btcusdt", "--topN=-2"])).is_err());
        assert!(Config::from_args(args(&["--symbols=btcusdt", "--topN=abc"])).is_err());
    }
}
