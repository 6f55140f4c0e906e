//! Domain identifiers (strongly-typed IDs).
//!
//! # 整数サロゲートキー + Phantom type
//! ID はすべてストア側（DB の AUTOINCREMENT）が採番する整数です。
//! `Id<T>` というジェネリック型で共通実装を提供し、
//! `T` は実行時には使わない（PhantomData）マーカー型として
//! コンパイル時の型安全性だけを提供します。
//!
//! - TaskId: ストア全体で単調増加・再利用なし
//! - TagId: (user, name) ごとに遅延作成
//! - UserId: 外部の認証サービスが払い出す不透明なパーティションキー

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"task-", "tag-", "user-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// # 例
/// ```ignore
/// let task_id = TaskId::new(1);
/// let tag_id = TagId::new(1);
/// // task_id と tag_id は異なる型なので、混同できない
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: i64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub const fn new(value: i64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// DB にバインドする生の値
    pub const fn get(&self) -> i64 {
        self.value
    }
}

impl<T: IdMarker> From<i64> for Id<T> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

// ========================================
// マーカー型の定義
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn prefix() -> &'static str {
        "task-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {}

impl IdMarker for Tag {
    fn prefix() -> &'static str {
        "tag-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum User {}

impl IdMarker for User {
    fn prefix() -> &'static str {
        "user-"
    }
}

/// Identifier of a Task (server-assigned, never reused).
pub type TaskId = Id<Task>;

/// Surrogate key of a Tag, unique per (user, name).
pub type TagId = Id<Tag>;

/// Opaque partition key supplied by the identity service.
pub type UserId = Id<User>;
