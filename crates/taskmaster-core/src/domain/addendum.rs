//! Addendum - タスクに追記される進捗メモ
//!
//! 書き込み時刻はストアが付与します。一度書いたら更新・削除はしません。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{ValidationErrors, Violation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addendum {
    write_time: DateTime<Utc>,
    content: String,
}

impl Addendum {
    pub fn new(write_time: DateTime<Utc>, content: impl Into<String>) -> Self {
        Self {
            write_time,
            content: content.into(),
        }
    }

    pub fn write_time(&self) -> DateTime<Utc> {
        self.write_time
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// 書き込み前の検証（空の追記は受け付けない）
    pub fn validate_content(content: &str) -> Result<(), ValidationErrors> {
        if content.is_empty() {
            return Err(Violation::EmptyAddendum.into());
        }
        Ok(())
    }
}
