//! StoreConfig - 接続先とタイムアウトの設定
//!
//! 変数名 → 値の lookup から読むか、コード上で直接組み立てます。
//! 値の妥当性（スキームなど）は `StoreBuilder::build` がまとめて検証します。

use std::time::Duration;

use thiserror::Error;

pub const DATABASE_URL_ENV: &str = "TASKMASTER_DATABASE_URL";
pub const STATEMENT_TIMEOUT_ENV: &str = "TASKMASTER_STATEMENT_TIMEOUT_MS";

pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// e.g. `sqlite://tasks.db?mode=rwc`
    pub database_url: String,
    /// 1 スコープ（接続の確立から解放まで）の上限
    pub statement_timeout: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} must be a number of milliseconds, got {value:?}")]
    InvalidTimeout { name: &'static str, value: String },
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// 任意の lookup 関数から読む
    ///
    /// CLI はフラグ → 環境変数の順に引く関数を、テストは HashMap を渡す。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_ENV).ok_or(ConfigError::Missing(DATABASE_URL_ENV))?;

        let statement_timeout = match lookup(STATEMENT_TIMEOUT_ENV) {
            None => DEFAULT_STATEMENT_TIMEOUT,
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidTimeout {
                    name: STATEMENT_TIMEOUT_ENV,
                    value: raw.clone(),
                })?,
        };

        Ok(Self {
            database_url,
            statement_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn url_is_required() {
        let err = StoreConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(DATABASE_URL_ENV));
    }

    #[test]
    fn timeout_defaults_when_unset() {
        let config =
            StoreConfig::from_lookup(lookup(&[(DATABASE_URL_ENV, "sqlite::memory:")])).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.statement_timeout, DEFAULT_STATEMENT_TIMEOUT);
    }

    #[test]
    fn timeout_is_read_in_milliseconds() {
        let config = StoreConfig::from_lookup(lookup(&[
            (DATABASE_URL_ENV, "sqlite://tasks.db"),
            (STATEMENT_TIMEOUT_ENV, "250"),
        ]))
        .unwrap();
        assert_eq!(config.statement_timeout, Duration::from_millis(250));
    }

    #[test]
    fn garbage_timeout_is_rejected() {
        let err = StoreConfig::from_lookup(lookup(&[
            (DATABASE_URL_ENV, "sqlite://tasks.db"),
            (STATEMENT_TIMEOUT_ENV, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { value, .. } if value == "soon"));
    }
}
