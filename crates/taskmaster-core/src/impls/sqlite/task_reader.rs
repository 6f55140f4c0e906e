//! Task Reader - 検索（Get）と詳細（Describe）
//!
//! # Get の絞り込み
//! タグ条件は AND です。要求タグとの JOIN を task_id でグループ化し、
//! 一致した「異なるタグ名」の数が要求数と等しいものだけを残します。
//! タグは一致したタスク全体に対して 1 回のバッチクエリで読み込みます（N+1 を避ける）。

use std::collections::{BTreeMap, BTreeSet};

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::rows::{TaskRow, decode_count, decode_task, decode_time};
use crate::domain::errors::StorageContext;
use crate::domain::{
    Addendum, Status, StorageError, StoreError, StoreResult, Tag, TagId, TagSummary, Task, TaskId,
    UserId,
};

const TASK_COLUMNS: &str = "SELECT t.task_id, t.name, t.minutes_to_complete, t.priority, t.status, t.prerequisites, \
     (SELECT COUNT(*) FROM addendums a WHERE a.task_id = t.task_id) AS number_of_addendums \
     FROM tasks t";

pub(crate) async fn find_tasks(
    conn: &mut SqliteConnection,
    user: UserId,
    status: Status,
    required_tags: &[Tag],
) -> StoreResult<Vec<(TaskId, Task)>> {
    let required: BTreeSet<&str> = required_tags.iter().map(Tag::as_str).collect();

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(TASK_COLUMNS);
    if !required.is_empty() {
        qb.push(
            " JOIN tags_to_tasks tt ON tt.task_id = t.task_id \
              JOIN tags tg ON tg.tag_id = tt.tag_id AND tg.name IN (",
        );
        let mut separated = qb.separated(", ");
        for name in &required {
            separated.push_bind(name.to_string());
        }
        separated.push_unseparated(")");
    }
    qb.push(" WHERE t.user_id = ");
    qb.push_bind(user.get());
    qb.push(" AND t.status = ");
    qb.push_bind(i64::from(status.ordinal()));
    if !required.is_empty() {
        qb.push(" GROUP BY t.task_id HAVING COUNT(DISTINCT tg.name) = ");
        qb.push_bind(required.len() as i64);
    }
    qb.push(" ORDER BY t.priority, t.task_id");

    let rows: Vec<TaskRow> = qb
        .build_query_as()
        .fetch_all(&mut *conn)
        .await
        .storage_context("querying tasks")?;

    let ids: Vec<i64> = rows.iter().map(|row| row.0).collect();
    let mut tags = hydrate_tags(conn, &ids).await?;

    let mut tasks = Vec::with_capacity(rows.len());
    for row in rows {
        let task_tags = tags.remove(&row.0).unwrap_or_default();
        tasks.push(decode_task(row, task_tags)?);
    }
    Ok(tasks)
}

pub(crate) async fn describe_task(
    conn: &mut SqliteConnection,
    user: UserId,
    task_id: TaskId,
) -> StoreResult<(Task, Vec<Addendum>)> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(TASK_COLUMNS);
    qb.push(" WHERE t.task_id = ");
    qb.push_bind(task_id.get());
    qb.push(" AND t.user_id = ");
    qb.push_bind(user.get());

    let row: Option<TaskRow> = qb
        .build_query_as()
        .fetch_optional(&mut *conn)
        .await
        .storage_context("describing task")?;
    let Some(row) = row else {
        return Err(StoreError::NotFound { task_id });
    };

    let tags = hydrate_tags(conn, &[row.0])
        .await?
        .remove(&row.0)
        .unwrap_or_default();
    let (_, task) = decode_task(row, tags)?;

    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT write_time, content FROM addendums WHERE task_id = ? ORDER BY write_time, addendum_id",
    )
    .bind(task_id.get())
    .fetch_all(&mut *conn)
    .await
    .storage_context("reading addendums")?;

    let addendums = rows
        .into_iter()
        .map(|(write_time, content)| Ok(Addendum::new(decode_time(&write_time)?, content)))
        .collect::<Result<Vec<_>, StorageError>>()?;

    Ok((task, addendums))
}

/// タスクが存在し、かつ `user` のものか
pub(crate) async fn ensure_owned(
    conn: &mut SqliteConnection,
    user: UserId,
    task_id: TaskId,
) -> StoreResult<()> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM tasks WHERE task_id = ? AND user_id = ?")
        .bind(task_id.get())
        .bind(user.get())
        .fetch_optional(&mut *conn)
        .await
        .storage_context("checking task owner")?;

    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::NotFound { task_id }),
    }
}

pub(crate) async fn list_tags(
    conn: &mut SqliteConnection,
    user: UserId,
) -> StoreResult<Vec<TagSummary>> {
    let rows: Vec<(i64, String, String, i64)> = sqlx::query_as(
        "SELECT tg.tag_id, tg.name, tg.created_at, COUNT(tt.task_id)
         FROM tags tg
         LEFT JOIN tags_to_tasks tt ON tt.tag_id = tg.tag_id
         WHERE tg.user_id = ?
         GROUP BY tg.tag_id
         ORDER BY tg.name",
    )
    .bind(user.get())
    .fetch_all(&mut *conn)
    .await
    .storage_context("listing tags")?;

    let summaries = rows
        .into_iter()
        .map(|(id, name, created_at, count)| {
            Ok(TagSummary {
                id: TagId::new(id),
                name: Tag::new(name),
                created_at: decode_time(&created_at)?,
                task_count: decode_count(count)?,
            })
        })
        .collect::<Result<Vec<_>, StorageError>>()?;
    Ok(summaries)
}

/// task_id → タグ集合（1 クエリ）
async fn hydrate_tags(
    conn: &mut SqliteConnection,
    task_ids: &[i64],
) -> Result<BTreeMap<i64, BTreeSet<Tag>>, StorageError> {
    if task_ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT tt.task_id, tg.name FROM tags_to_tasks tt \
         JOIN tags tg ON tg.tag_id = tt.tag_id WHERE tt.task_id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in task_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<(i64, String)> = qb
        .build_query_as()
        .fetch_all(&mut *conn)
        .await
        .storage_context("loading task tags")?;

    let mut tags: BTreeMap<i64, BTreeSet<Tag>> = BTreeMap::new();
    for (task_id, name) in rows {
        tags.entry(task_id).or_default().insert(Tag::new(name));
    }
    Ok(tags)
}
