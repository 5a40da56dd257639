//! Configuration loading and representation.
//!
//! Everything comes from environment variables with defaults; see
//! [`AppConfig::from_lookup`] for the full table.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use sensorcast_core::HorizonConfig;
use sensorcast_observability::LogFormat;

use crate::history::postgres::is_plain_identifier;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_HISTORY_TABLE: &str = "tag_data_30mins";
pub const DEFAULT_MODEL_PATH: &str = "models/seq2seq.onnx";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value `{value}`: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid forecast horizon: {0}")]
    Horizon(String),
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Where historical readings come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryBackend {
    Postgres { database_url: String, table: String },
    /// In-process store, optionally seeded from a JSON readings file.
    InMemory { seed_file: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub history: HistoryBackend,
    pub model_path: PathBuf,
    pub model_cache: bool,
    pub horizon: HorizonConfig,
    pub request_timeout: Option<Duration>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SENSORCAST_BIND_ADDR` | `0.0.0.0:8080` |
    /// | `DATABASE_URL` | unset: in-memory history |
    /// | `SENSORCAST_HISTORY_TABLE` | `tag_data_30mins` |
    /// | `SENSORCAST_HISTORY_FILE` | unset |
    /// | `SENSORCAST_MODEL_PATH` | `models/seq2seq.onnx` |
    /// | `SENSORCAST_MODEL_CACHE` | `false` |
    /// | `SENSORCAST_INTERVAL_MINUTES` | `30` |
    /// | `SENSORCAST_LOOKBACK_DAYS` | `30` |
    /// | `SENSORCAST_PREDICT_DAYS` | `60` |
    /// | `SENSORCAST_REQUEST_TIMEOUT_SECS` | unset: no deadline |
    /// | `SENSORCAST_LOG_FORMAT` | `json` |
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr: SocketAddr = parse_or("SENSORCAST_BIND_ADDR", get("SENSORCAST_BIND_ADDR"), || {
            DEFAULT_BIND_ADDR.parse().map_err(|e| ConfigError::invalid("SENSORCAST_BIND_ADDR", DEFAULT_BIND_ADDR, e))
        })?;

        let history = match get("DATABASE_URL") {
            Some(database_url) => {
                let table = get("SENSORCAST_HISTORY_TABLE").unwrap_or_else(|| DEFAULT_HISTORY_TABLE.to_string());
                if !is_plain_identifier(&table) {
                    return Err(ConfigError::invalid(
                        "SENSORCAST_HISTORY_TABLE",
                        &table,
                        "expected `name` or `schema.name` made of letters, digits and underscores",
                    ));
                }
                HistoryBackend::Postgres { database_url, table }
            }
            None => HistoryBackend::InMemory {
                seed_file: get("SENSORCAST_HISTORY_FILE").map(PathBuf::from),
            },
        };

        let model_path = get("SENSORCAST_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        let model_cache = match get("SENSORCAST_MODEL_CACHE") {
            Some(raw) => parse_bool("SENSORCAST_MODEL_CACHE", &raw)?,
            None => false,
        };

        let defaults = HorizonConfig::default();
        let horizon = HorizonConfig::new(
            parse_or("SENSORCAST_INTERVAL_MINUTES", get("SENSORCAST_INTERVAL_MINUTES"), || {
                Ok(defaults.interval_minutes)
            })?,
            parse_or("SENSORCAST_LOOKBACK_DAYS", get("SENSORCAST_LOOKBACK_DAYS"), || {
                Ok(defaults.lookback_days)
            })?,
            parse_or("SENSORCAST_PREDICT_DAYS", get("SENSORCAST_PREDICT_DAYS"), || {
                Ok(defaults.predict_days)
            })?,
        )
        .map_err(|e| ConfigError::Horizon(e.to_string()))?;

        let request_timeout = match get("SENSORCAST_REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = parse_value("SENSORCAST_REQUEST_TIMEOUT_SECS", &raw)?;
                if secs == 0 {
                    return Err(ConfigError::invalid("SENSORCAST_REQUEST_TIMEOUT_SECS", &raw, "must be > 0"));
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let log_format = match get("SENSORCAST_LOG_FORMAT") {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid("SENSORCAST_LOG_FORMAT", &raw, e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            history,
            model_path,
            model_cache,
            horizon,
            request_timeout,
            log_format,
        })
    }
}

fn parse_value<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::invalid(var, raw, e))
}

fn parse_or<T>(
    var: &'static str,
    raw: Option<String>,
    default: impl FnOnce() -> Result<T, ConfigError>,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match raw {
        Some(raw) => parse_value(var, &raw),
        None => default(),
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, raw, "expected a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_any_variables() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.history, HistoryBackend::InMemory { seed_file: None });
        assert_eq!(cfg.model_path, PathBuf::from("models/seq2seq.onnx"));
        assert!(!cfg.model_cache);
        assert_eq!(cfg.horizon.seq_len(), 1440);
        assert_eq!(cfg.horizon.pred_len(), 2880);
        assert_eq!(cfg.request_timeout, None);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn database_url_selects_postgres_with_default_table() {
        let cfg = config(&[("DATABASE_URL", "postgres://u:p@db/sensors")]).unwrap();
        assert_eq!(
            cfg.history,
            HistoryBackend::Postgres {
                database_url: "postgres://u:p@db/sensors".into(),
                table: "tag_data_30mins".into(),
            }
        );
    }

    #[test]
    fn reads_every_override() {
        let cfg = config(&[
            ("SENSORCAST_BIND_ADDR", "127.0.0.1:9000"),
            ("SENSORCAST_HISTORY_FILE", "/data/history.json"),
            ("SENSORCAST_MODEL_PATH", "/models/m.onnx"),
            ("SENSORCAST_MODEL_CACHE", "TRUE"),
            ("SENSORCAST_INTERVAL_MINUTES", "60"),
            ("SENSORCAST_LOOKBACK_DAYS", "7"),
            ("SENSORCAST_PREDICT_DAYS", "2"),
            ("SENSORCAST_REQUEST_TIMEOUT_SECS", "30"),
            ("SENSORCAST_LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(
            cfg.history,
            HistoryBackend::InMemory {
                seed_file: Some(PathBuf::from("/data/history.json"))
            }
        );
        assert!(cfg.model_cache);
        assert_eq!(cfg.horizon.seq_len(), 168);
        assert_eq!(cfg.horizon.pred_len(), 48);
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let cfg = config(&[("DATABASE_URL", "  "), ("SENSORCAST_MODEL_PATH", "")]).unwrap();
        assert!(matches!(cfg.history, HistoryBackend::InMemory { .. }));
        assert_eq!(cfg.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn malformed_values_name_the_variable() {
        for (var, value) in [
            ("SENSORCAST_BIND_ADDR", "not-an-addr"),
            ("SENSORCAST_MODEL_CACHE", "maybe"),
            ("SENSORCAST_INTERVAL_MINUTES", "-5"),
            ("SENSORCAST_REQUEST_TIMEOUT_SECS", "0"),
            ("SENSORCAST_LOG_FORMAT", "xml"),
        ] {
            match config(&[(var, value)]) {
                Err(ConfigError::Invalid { var: got, .. }) => assert_eq!(got, var),
                other => panic!("{var}={value}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let err = config(&[("SENSORCAST_INTERVAL_MINUTES", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Horizon(_)));
    }

    #[test]
    fn oversized_lookback_is_a_horizon_error() {
        for var in ["SENSORCAST_LOOKBACK_DAYS", "SENSORCAST_PREDICT_DAYS"] {
            let err = config(&[(var, "3000000")]).unwrap_err();
            assert!(matches!(err, ConfigError::Horizon(_)), "{var}: {err:?}");
        }
    }

    #[test]
    fn unsafe_table_name_is_rejected() {
        let err = config(&[
            ("DATABASE_URL", "postgres://db/sensors"),
            ("SENSORCAST_HISTORY_TABLE", "t; DROP TABLE t"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SENSORCAST_HISTORY_TABLE", .. }));
    }
}
