//! Errors - エラー型と分類
//!
//! 公開操作のエラーは必ず次のどれかです。
//! - **Validation**: I/O 前にドメイン制約に違反した（呼び出し側が入力を直す）
//! - **NotFound**: タスクが存在しない、または呼び出しユーザーの所有ではない
//! - **Storage**: バックエンド由来の失敗（ErrorKind でリトライ可否を区別）
//!
//! ストア自身はリトライしません。`sqlx::Error` などインフラの生の型は
//! `StorageError` の source に包み、公開 API には出しません。

use std::fmt;

use thiserror::Error;

use super::ids::TaskId;
use super::status::UnknownOrdinal;

/// ErrorKind はストレージエラーの運用分類
///
/// - Transient: 接続断・タイムアウト・ロック競合（上位レイヤーでバックオフ付きリトライ可）
/// - Structural: 制約違反・デコード失敗（リトライ無意味）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Structural,
}

/// ドメイン制約の違反 1 件
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("task must have a name")]
    EmptyName,

    #[error("task must have a positive time to complete")]
    NonPositiveDuration,

    #[error("task time to complete of {minutes} minutes is out of range")]
    DurationOutOfRange { minutes: u64 },

    #[error("task must have at least one tag")]
    NoTags,

    #[error("tag names must not be empty")]
    EmptyTagName,

    #[error(transparent)]
    UnknownOrdinal(#[from] UnknownOrdinal),

    #[error("addendum content must not be empty")]
    EmptyAddendum,
}

/// 集約されたバリデーションエラー（最初の 1 件ではなく全件）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self(violations)
    }

    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.0.contains(violation)
    }
}

impl From<Violation> for ValidationErrors {
    fn from(violation: Violation) -> Self {
        Self(vec![violation])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// バックエンド由来のエラー
#[derive(Debug, Error)]
#[error("storage error (kind: {kind:?}) while {context}: {source}")]
pub struct StorageError {
    kind: ErrorKind,
    context: String,
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl StorageError {
    pub fn new(
        kind: ErrorKind,
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            context: context.into(),
            source: source.into(),
        }
    }

    /// sqlx のエラーを分類して包む
    pub fn from_sqlx(context: impl Into<String>, err: sqlx::Error) -> Self {
        Self::new(classify(&err), context, err)
    }

    /// 接続の確立に失敗した（常に Transient。URL の誤りは StoreBuilder が先に弾く）
    pub fn connect(err: sqlx::Error) -> Self {
        Self::new(ErrorKind::Transient, "opening connection", err)
    }

    pub fn timeout(context: impl Into<String>, elapsed: tokio::time::error::Elapsed) -> Self {
        Self::new(ErrorKind::Transient, context, elapsed)
    }

    /// ドメイン型の値を列の表現にできなかった
    pub fn encode(context: impl Into<String>, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::new(ErrorKind::Structural, context, message)
    }

    /// 保存済みの値がドメイン型に戻せなかった
    pub fn decode(context: impl Into<String>, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::new(ErrorKind::Structural, context, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::Transient
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

fn classify(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => ErrorKind::Transient,
        sqlx::Error::Database(db) => {
            // SQLITE_BUSY(5) / SQLITE_LOCKED(6) と、その拡張コード
            let primary = db
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| code & 0xff);
            match primary {
                Some(5) | Some(6) => ErrorKind::Transient,
                _ => ErrorKind::Structural,
            }
        }
        _ => ErrorKind::Structural,
    }
}

/// `Result<T, sqlx::Error>` に文脈を付けて StorageError に変換する
pub(crate) trait StorageContext<T> {
    fn storage_context(self, context: &'static str) -> Result<T, StorageError>;
}

impl<T> StorageContext<T> for Result<T, sqlx::Error> {
    fn storage_context(self, context: &'static str) -> Result<T, StorageError> {
        self.map_err(|err| StorageError::from_sqlx(context, err))
    }
}

/// Task Store の公開操作が返すエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{task_id} not found")]
    NotFound { task_id: TaskId },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
