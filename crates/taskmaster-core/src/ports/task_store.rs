//! TaskStore port - タスク・タグ・追記の正本
//!
//! すべての操作は認証済みの `UserId` を受け取り、そのユーザーの
//! パーティションだけを読み書きします。他ユーザーのタスクは
//! 「存在しない」と区別できません（NotFound）。
//!
//! # 実装
//! - `impls::sqlite::SqliteTaskStore`: 呼び出しごとに接続を開く SQLite 実装
//! - `impls::inmem_store::InMemoryTaskStore`: テスト・デモ用

use async_trait::async_trait;

use crate::domain::{
    Addendum, Status, StoreResult, Tag, TagSummary, Task, TaskDraft, TaskId, UserId,
};

/// TaskStore はタスクの作成・検索・追記を提供
///
/// # 設計原則
/// - 書き込みは 1 トランザクション（途中失敗で部分的な行を残さない）
/// - ストア自身はリトライしない（Transient かどうかは StorageError が示す）
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// 検証済みの Task を保存し、新しい TaskId を返す
    async fn insert(&self, user: UserId, task: &Task) -> StoreResult<TaskId>;

    /// status が一致し、required_tags をすべて持つタスクを priority 昇順で返す
    async fn get(
        &self,
        user: UserId,
        status: Status,
        required_tags: &[Tag],
    ) -> StoreResult<Vec<(TaskId, Task)>>;

    /// 1 件のタスクと、write_time 昇順の追記一覧
    async fn describe(&self, user: UserId, task_id: TaskId) -> StoreResult<(Task, Vec<Addendum>)>;

    /// タスクに追記を 1 件加える
    async fn mark(&self, user: UserId, task_id: TaskId, content: &str) -> StoreResult<()>;

    async fn set_status(&self, user: UserId, task_id: TaskId, status: Status) -> StoreResult<()>;

    /// ユーザーのタグ一覧（名前順、参照しているタスク数つき）
    async fn tags(&self, user: UserId) -> StoreResult<Vec<TagSummary>>;

    /// TaskDraft を検証してから保存する
    ///
    /// 検証エラーの場合はストレージに触れません。
    async fn put(&self, user: UserId, draft: &TaskDraft) -> StoreResult<TaskId> {
        let task = Task::from_draft(draft)?;
        self.insert(user, &task).await
    }
}
