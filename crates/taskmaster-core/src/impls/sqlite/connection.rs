//! ConnectionScope - 1 呼び出し = 1 接続
//!
//! # 学習ポイント
//! - 高階トレイト境界（`for<'c>`）で「借用した接続を使うクロージャ」を受け取る
//! - 接続はどの終了経路（成功・エラー・drop によるキャンセル）でも 1 回だけ解放される
//! - トランザクションは `BEGIN IMMEDIATE` で書き込みロックを先に取り、
//!   SQLITE_BUSY を途中ではなく開始時点で発生させる
//!
//! クロージャは接続を借りるだけなので、環境から借用せず
//! 必要な値はすべて move で持ち込みます。

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use sqlx::{Connection, SqliteConnection};

use crate::app::config::StoreConfig;
use crate::domain::errors::StorageContext;
use crate::domain::{StorageError, StoreResult};

/// スコープ内で実行される操作の Future
pub type ScopedFuture<'c, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'c>>;

#[derive(Debug, Clone)]
pub struct ConnectionScope {
    database_url: String,
    timeout: Duration,
}

impl ConnectionScope {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            database_url: config.database_url.clone(),
            timeout: config.statement_timeout,
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// 接続を開いて `op` を実行し、結果にかかわらず接続を閉じる
    ///
    /// 接続の確立から解放までが `statement_timeout` を超えた場合は
    /// Transient な StorageError を返します（Future が drop されるので接続も捨てられる）。
    pub async fn with_connection<T, F>(&self, context: &'static str, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> ScopedFuture<'c, T> + Send + 'static,
    {
        let work = async move {
            let mut conn = SqliteConnection::connect(&self.database_url)
                .await
                .map_err(StorageError::connect)?;
            tracing::trace!(context, "connection opened");

            let result = op(&mut conn).await;

            if let Err(e) = conn.close().await {
                tracing::warn!(error = %e, context, "failed to close connection");
            }
            result
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(elapsed) => {
                tracing::warn!(context, timeout = ?self.timeout, "scope timed out");
                Err(StorageError::timeout(context, elapsed).into())
            }
        }
    }

    /// `with_connection` に加えて `op` を 1 トランザクションで包む
    ///
    /// `op` が Err を返したらロールバックし、そのエラーをそのまま返します。
    pub async fn with_transaction<T, F>(&self, context: &'static str, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> ScopedFuture<'c, T> + Send + 'static,
    {
        self.with_connection(context, move |conn| Box::pin(in_transaction(conn, context, op)))
            .await
    }
}

async fn in_transaction<T, F>(
    conn: &mut SqliteConnection,
    context: &'static str,
    op: F,
) -> StoreResult<T>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> ScopedFuture<'c, T>,
{
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *conn)
        .await
        .storage_context("beginning transaction")?;

    match op(&mut *conn).await {
        Ok(value) => {
            sqlx::query("COMMIT")
                .execute(&mut *conn)
                .await
                .storage_context("committing transaction")?;
            Ok(value)
        }
        Err(err) => {
            if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                tracing::warn!(error = %e, context, "rollback failed");
            }
            Err(err)
        }
    }
}
