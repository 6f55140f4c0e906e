//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **SqliteTaskStore**: 呼び出しごとに接続を開く本番用の TaskStore
//! - **InMemoryTaskStore**: テスト・デモ用の TaskStore

pub mod inmem_store;
pub mod sqlite;

pub use self::inmem_store::InMemoryTaskStore;
pub use self::sqlite::SqliteTaskStore;
