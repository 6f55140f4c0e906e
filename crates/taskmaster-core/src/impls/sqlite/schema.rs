//! SQLite スキーマ
//!
//! 本番ではマイグレーションで適用済みの前提です。ストアの操作は DDL を発行しません。
//! `provision` はテストと CLI の `init` から空のデータベースを用意するためだけに使います。

use sqlx::SqliteConnection;

use crate::domain::StorageError;
use crate::domain::errors::StorageContext;

pub const SQLITE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
  task_id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  name TEXT NOT NULL,
  minutes_to_complete INTEGER NOT NULL CHECK (minutes_to_complete > 0),
  priority INTEGER NOT NULL,
  status INTEGER NOT NULL,
  prerequisites TEXT NOT NULL DEFAULT '[]',
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_user_status ON tasks(user_id, status, priority);

CREATE TABLE IF NOT EXISTS tags (
  tag_id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL,
  name TEXT NOT NULL,
  created_at TEXT NOT NULL,
  UNIQUE (user_id, name)
);

CREATE TABLE IF NOT EXISTS tags_to_tasks (
  tag_id INTEGER NOT NULL REFERENCES tags(tag_id),
  task_id INTEGER NOT NULL REFERENCES tasks(task_id),
  PRIMARY KEY (tag_id, task_id)
);

CREATE INDEX IF NOT EXISTS idx_tags_to_tasks_task ON tags_to_tasks(task_id);

CREATE TABLE IF NOT EXISTS addendums (
  addendum_id INTEGER PRIMARY KEY AUTOINCREMENT,
  task_id INTEGER NOT NULL REFERENCES tasks(task_id),
  write_time TEXT NOT NULL,
  content TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_addendums_task ON addendums(task_id, write_time);
"#;

/// スキーマを適用する（冪等）
pub async fn provision(conn: &mut SqliteConnection) -> Result<(), StorageError> {
    for statement in SQLITE_SCHEMA.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .storage_context("applying schema")?;
    }
    Ok(())
}
