//! taskmaster-core
//!
//! 個人用タスク管理の Task Store。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, tag, task, addendum, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, Clock）
//! - **impls**: 実装（SqliteTaskStore, InMemoryTaskStore）
//! - **app**: 設定とストアの構築（StoreConfig, StoreBuilder）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{StoreBuilder, StoreConfig};
pub use domain::{
    Addendum, Priority, Status, StoreError, StoreResult, Tag, TagSummary, Task, TaskDraft, TaskId,
    UserId,
};
pub use impls::{InMemoryTaskStore, SqliteTaskStore};
pub use ports::TaskStore;
