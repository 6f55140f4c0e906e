//! StoreBuilder - ストアの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）：接続先の誤りは最初のリクエストではなく build() で気づく
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use crate::app::config::StoreConfig;
use crate::impls::SqliteTaskStore;
use crate::ports::{Clock, SystemClock};

/// StoreBuilder は SqliteTaskStore を構築
///
/// # 使用例
/// ```ignore
/// let store = StoreBuilder::new(StoreConfig::from_lookup(|name| std::env::var(name).ok())?)
///     .clock(Arc::new(SystemClock))
///     .build()?;
/// ```
pub struct StoreBuilder {
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

/// BuildError はストア構築時のエラー
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Unsupported database url {0:?}. Expected a sqlite: url such as sqlite://tasks.db")]
    UnsupportedUrl(String),

    #[error("Statement timeout must be greater than zero.")]
    ZeroTimeout,
}

impl StoreBuilder {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// 書き込み時刻の取得元を設定
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// # 検証
    /// - database_url が `sqlite:` スキーム
    /// - statement_timeout が 0 より大きい
    pub fn build(self) -> Result<SqliteTaskStore, BuildError> {
        if !self.config.database_url.starts_with("sqlite:") {
            return Err(BuildError::UnsupportedUrl(self.config.database_url));
        }
        if self.config.statement_timeout.is_zero() {
            return Err(BuildError::ZeroTimeout);
        }
        Ok(SqliteTaskStore::new(&self.config).with_clock(self.clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_build_success() {
        let store = StoreBuilder::new(StoreConfig::new("sqlite://tasks.db"))
            .clock(Arc::new(FixedClock::new(Utc::now())))
            .build();
        assert!(store.is_ok());
    }

    #[test]
    fn test_build_rejects_other_databases() {
        let store = StoreBuilder::new(StoreConfig::new("postgres://localhost/tasks")).build();
        assert!(matches!(
            store,
            Err(BuildError::UnsupportedUrl(url)) if url == "postgres://localhost/tasks"
        ));
    }

    #[test]
    fn test_build_rejects_zero_timeout() {
        let config = StoreConfig::new("sqlite::memory:").with_statement_timeout(Duration::ZERO);
        let store = StoreBuilder::new(config).build();
        assert!(matches!(store, Err(BuildError::ZeroTimeout)));
    }
}
