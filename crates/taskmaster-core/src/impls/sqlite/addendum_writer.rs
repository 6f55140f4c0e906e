//! Addendum Writer - タスクへの追記
//!
//! 所有者の確認と INSERT は同じトランザクション内で行います。

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use super::rows::encode_time;
use super::task_reader::ensure_owned;
use crate::domain::errors::StorageContext;
use crate::domain::{StoreResult, TaskId, UserId};

pub(crate) async fn append(
    conn: &mut SqliteConnection,
    user: UserId,
    task_id: TaskId,
    content: &str,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    ensure_owned(conn, user, task_id).await?;

    sqlx::query("INSERT INTO addendums (task_id, write_time, content) VALUES (?, ?, ?)")
        .bind(task_id.get())
        .bind(encode_time(now))
        .bind(content)
        .execute(&mut *conn)
        .await
        .storage_context("inserting addendum")?;
    Ok(())
}

