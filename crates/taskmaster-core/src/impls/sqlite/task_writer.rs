//! Task Writer - タスク行とタグの関連を書き込む
//!
//! 呼び出し側（`SqliteTaskStore::insert`）がトランザクションで包みます。
//! ここで失敗すると、タグ行も含めてすべてロールバックされます。

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::rows::{encode_minutes, encode_prerequisites, encode_time};
use super::tag_resolver::resolve_tags;
use crate::domain::errors::StorageContext;
use crate::domain::{Status, StoreError, StoreResult, Task, TaskId, UserId};

pub(crate) async fn insert_task(
    conn: &mut SqliteConnection,
    user: UserId,
    task: &Task,
    now: DateTime<Utc>,
) -> StoreResult<TaskId> {
    let tag_ids = resolve_tags(conn, user, task.tags(), now).await?;

    let (task_id,): (i64,) = sqlx::query_as(
        "INSERT INTO tasks (user_id, name, minutes_to_complete, priority, status, prerequisites, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING task_id",
    )
    .bind(user.get())
    .bind(task.name())
    .bind(encode_minutes(task.minutes_to_complete())?)
    .bind(i64::from(task.priority().ordinal()))
    .bind(i64::from(task.status().ordinal()))
    .bind(encode_prerequisites(task.prerequisites())?)
    .bind(encode_time(now))
    .fetch_one(&mut *conn)
    .await
    .storage_context("inserting task")?;

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO tags_to_tasks (tag_id, task_id) ");
    qb.push_values(tag_ids.values(), |mut b, tag_id| {
        b.push_bind(tag_id.get()).push_bind(task_id);
    });
    qb.build()
        .execute(&mut *conn)
        .await
        .storage_context("linking tags to task")?;

    Ok(TaskId::new(task_id))
}

pub(crate) async fn update_status(
    conn: &mut SqliteConnection,
    user: UserId,
    task_id: TaskId,
    status: Status,
) -> StoreResult<()> {
    let result = sqlx::query("UPDATE tasks SET status = ? WHERE task_id = ? AND user_id = ?")
        .bind(i64::from(status.ordinal()))
        .bind(task_id.get())
        .bind(user.get())
        .execute(&mut *conn)
        .await
        .storage_context("updating task status")?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound { task_id });
    }
    Ok(())
}
