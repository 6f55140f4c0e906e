//! Task - タスク本体と、外部表現（TaskDraft）からの検証付き構築
//!
//! # 学習ポイント
//! - 単一の検証付きコンストラクタ（`Task::from_draft`）
//! - 最初の 1 件で止めず、違反をすべて集めて返す
//! - タグは順序を持たない集合（BTreeSet）、前提タスクは順序付きリスト

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{ValidationErrors, Violation};
use super::ids::TaskId;
use super::status::{Priority, Status};
use super::tag::Tag;

/// DB の INTEGER に収まる上限
const MAX_MINUTES_TO_COMPLETE: u64 = i64::MAX as u64;

/// 信頼できない外部表現（RPC / CLI から届く形）
///
/// 列挙型は序数のまま受け取り、`Task::from_draft` で検証します。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    pub name: String,
    pub minutes_to_complete: u64,
    pub priority: u32,
    pub status: u32,
    pub tags: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<TaskId>,
}

/// 検証済みのタスク
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    name: String,
    minutes_to_complete: u64,
    priority: Priority,
    status: Status,
    tags: BTreeSet<Tag>,
    prerequisites: Vec<TaskId>,
    number_of_addendums: u64,
}

impl Task {
    /// TaskDraft を検証して Task を作る
    ///
    /// # 検証内容
    /// - name が空でない
    /// - minutes_to_complete > 0（かつ保存可能な範囲）
    /// - tags が 1 件以上、空文字のタグ名を含まない
    /// - status / priority が既知の序数
    ///
    /// 違反はすべて `ValidationErrors` に集約されます。
    pub fn from_draft(draft: &TaskDraft) -> Result<Self, ValidationErrors> {
        let mut violations = Vec::new();

        if draft.name.is_empty() {
            violations.push(Violation::EmptyName);
        }

        if draft.minutes_to_complete == 0 {
            violations.push(Violation::NonPositiveDuration);
        } else if draft.minutes_to_complete > MAX_MINUTES_TO_COMPLETE {
            violations.push(Violation::DurationOutOfRange {
                minutes: draft.minutes_to_complete,
            });
        }

        if draft.tags.is_empty() {
            violations.push(Violation::NoTags);
        } else if draft.tags.iter().any(String::is_empty) {
            violations.push(Violation::EmptyTagName);
        }

        let status = Status::try_from(draft.status)
            .map_err(|e| violations.push(e.into()))
            .ok();
        let priority = Priority::try_from(draft.priority)
            .map_err(|e| violations.push(e.into()))
            .ok();

        match (status, priority) {
            (Some(status), Some(priority)) if violations.is_empty() => Ok(Self {
                name: draft.name.clone(),
                minutes_to_complete: draft.minutes_to_complete,
                priority,
                status,
                tags: draft.tags.iter().map(Tag::new).collect(),
                prerequisites: draft.prerequisites.clone(),
                number_of_addendums: 0,
            }),
            _ => Err(ValidationErrors::new(violations)),
        }
    }

    /// ストレージから読み戻した値で組み立てる（検証はしない）
    pub(crate) fn from_storage(
        name: String,
        minutes_to_complete: u64,
        priority: Priority,
        status: Status,
        tags: BTreeSet<Tag>,
        prerequisites: Vec<TaskId>,
        number_of_addendums: u64,
    ) -> Self {
        Self {
            name,
            minutes_to_complete,
            priority,
            status,
            tags,
            prerequisites,
            number_of_addendums,
        }
    }

    /// 外部表現に戻す
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            name: self.name.clone(),
            minutes_to_complete: self.minutes_to_complete,
            priority: self.priority.ordinal(),
            status: self.status.ordinal(),
            tags: self.tags.iter().map(|t| t.as_str().to_string()).collect(),
            prerequisites: self.prerequisites.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn minutes_to_complete(&self) -> u64 {
        self.minutes_to_complete
    }

    pub fn time_to_complete(&self) -> Duration {
        Duration::from_secs(self.minutes_to_complete.saturating_mul(60))
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    pub fn prerequisites(&self) -> &[TaskId] {
        &self.prerequisites
    }

    pub fn number_of_addendums(&self) -> u64 {
        self.number_of_addendums
    }

    pub fn has_status(&self, status: Status) -> bool {
        self.status == status
    }

    /// 要求されたタグをすべて持っているか（集合の包含）
    ///
    /// 要求が空なら常に true。
    pub fn has_all_tags<'a>(&self, required: impl IntoIterator<Item = &'a Tag>) -> bool {
        required.into_iter().all(|tag| self.tags.contains(tag))
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub(crate) fn set_number_of_addendums(&mut self, count: u64) {
        self.number_of_addendums = count;
    }
}
