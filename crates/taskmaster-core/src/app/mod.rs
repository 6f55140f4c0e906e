//! App - アプリケーション層
//!
//! 設定の読み込みと、ports を組み合わせたストアの構築を行います。
//!
//! # 主要コンポーネント
//! - **StoreConfig**: 接続先とタイムアウト（環境変数から読める）
//! - **StoreBuilder**: 起動時検証つきのストア構築

pub mod builder;
pub mod config;

pub use self::builder::{BuildError, StoreBuilder};
pub use self::config::{ConfigError, StoreConfig};
