//! SQLite 実装
//!
//! # 構成
//! - `connection`: 1 呼び出し = 1 接続のスコープ（+ トランザクション）
//! - `tag_resolver` / `task_writer` / `task_reader` / `addendum_writer`: 各操作の SQL
//! - `rows`: 行 ⇔ ドメイン型の変換
//! - `schema`: テーブル定義（`provision` はテストと CLI の init 用）
//!
//! 接続プールは持ちません。各操作が自分の接続を開き、必ず閉じます。

pub mod connection;
pub mod schema;

mod addendum_writer;
mod rows;
mod tag_resolver;
mod task_reader;
mod task_writer;

use std::sync::Arc;

use async_trait::async_trait;

use self::connection::ConnectionScope;
use crate::app::config::StoreConfig;
use crate::domain::{Addendum, Status, StoreError, StoreResult, Tag, TagSummary, Task, TaskId, UserId};
use crate::ports::{Clock, SystemClock, TaskStore};

pub struct SqliteTaskStore {
    scope: ConnectionScope,
    clock: Arc<dyn Clock>,
}

impl SqliteTaskStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            scope: ConnectionScope::new(config),
            clock: Arc::new(SystemClock),
        }
    }

    /// 書き込み時刻の取得元を差し替える（テスト用）
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 空のデータベースにスキーマを作る（冪等）
    pub async fn provision(&self) -> StoreResult<()> {
        self.scope
            .with_connection("provisioning schema", |conn| {
                Box::pin(async move { schema::provision(conn).await.map_err(StoreError::from) })
            })
            .await?;
        tracing::info!(database_url = self.scope.database_url(), "schema provisioned");
        Ok(())
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn insert(&self, user: UserId, task: &Task) -> StoreResult<TaskId> {
        let task = task.clone();
        let now = self.clock.now();

        let task_id = self
            .scope
            .with_transaction("putting task", move |conn| {
                Box::pin(async move { task_writer::insert_task(conn, user, &task, now).await })
            })
            .await?;

        tracing::info!(%user, %task_id, "task stored");
        Ok(task_id)
    }

    async fn get(
        &self,
        user: UserId,
        status: Status,
        required_tags: &[Tag],
    ) -> StoreResult<Vec<(TaskId, Task)>> {
        let required_tags = required_tags.to_vec();

        self.scope
            .with_connection("getting tasks", move |conn| {
                Box::pin(async move {
                    task_reader::find_tasks(conn, user, status, &required_tags).await
                })
            })
            .await
    }

    async fn describe(&self, user: UserId, task_id: TaskId) -> StoreResult<(Task, Vec<Addendum>)> {
        self.scope
            .with_connection("describing task", move |conn| {
                Box::pin(async move { task_reader::describe_task(conn, user, task_id).await })
            })
            .await
    }

    async fn mark(&self, user: UserId, task_id: TaskId, content: &str) -> StoreResult<()> {
        Addendum::validate_content(content)?;
        let content = content.to_owned();
        let now = self.clock.now();

        self.scope
            .with_transaction("marking task", move |conn| {
                Box::pin(async move {
                    addendum_writer::append(conn, user, task_id, &content, now).await
                })
            })
            .await?;

        tracing::info!(%user, %task_id, "addendum stored");
        Ok(())
    }

    async fn set_status(&self, user: UserId, task_id: TaskId, status: Status) -> StoreResult<()> {
        self.scope
            .with_transaction("setting task status", move |conn| {
                Box::pin(async move { task_writer::update_status(conn, user, task_id, status).await })
            })
            .await?;

        tracing::info!(%user, %task_id, %status, "task status changed");
        Ok(())
    }

    async fn tags(&self, user: UserId) -> StoreResult<Vec<TagSummary>> {
        self.scope
            .with_connection("listing tags", move |conn| {
                Box::pin(async move { task_reader::list_tags(conn, user).await })
            })
            .await
    }
}
