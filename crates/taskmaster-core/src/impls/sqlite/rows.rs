//! 行 ⇔ ドメイン型の変換
//!
//! 保存済みの値が戻せない場合は Structural な StorageError にします
//! （デフォルト値で埋めることはしない）。

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::{Priority, Status, StorageError, Tag, Task, TaskId};

/// `SELECT` 列順: task_id, name, minutes_to_complete, priority, status, prerequisites, number_of_addendums
pub(crate) type TaskRow = (i64, String, i64, i64, i64, String, i64);

/// 固定桁の RFC 3339（文字列の辞書順 = 時刻順）
pub(crate) fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_time(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::decode("reading timestamp", format!("{raw:?}: {e}")))
}

pub(crate) fn encode_minutes(minutes: u64) -> Result<i64, StorageError> {
    i64::try_from(minutes).map_err(|_| {
        StorageError::encode("writing task", format!("{minutes} minutes does not fit a column"))
    })
}

pub(crate) fn encode_prerequisites(prerequisites: &[TaskId]) -> Result<String, StorageError> {
    serde_json::to_string(prerequisites)
        .map_err(|e| StorageError::encode("writing prerequisites", e.to_string()))
}

fn decode_prerequisites(raw: &str) -> Result<Vec<TaskId>, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::decode("reading prerequisites", format!("{raw:?}: {e}")))
}

fn decode_ordinal<E: TryFrom<u32>>(kind: &str, raw: i64) -> Result<E, StorageError> {
    u32::try_from(raw)
        .ok()
        .and_then(|ordinal| E::try_from(ordinal).ok())
        .ok_or_else(|| StorageError::decode("reading task", format!("{kind} ordinal {raw}")))
}

pub(crate) fn decode_count(raw: i64) -> Result<u64, StorageError> {
    u64::try_from(raw).map_err(|_| StorageError::decode("reading task", format!("count {raw}")))
}

/// 1 行とハイドレート済みのタグから Task を組み立てる
pub(crate) fn decode_task(row: TaskRow, tags: BTreeSet<Tag>) -> Result<(TaskId, Task), StorageError> {
    let (task_id, name, minutes, priority, status, prerequisites, addendums) = row;

    let minutes = u64::try_from(minutes)
        .ok()
        .filter(|m| *m > 0)
        .ok_or_else(|| StorageError::decode("reading task", format!("minutes_to_complete {minutes}")))?;
    let priority: Priority = decode_ordinal("priority", priority)?;
    let status: Status = decode_ordinal("status", status)?;

    let task = Task::from_storage(
        name,
        minutes,
        priority,
        status,
        tags,
        decode_prerequisites(&prerequisites)?,
        decode_count(addendums)?,
    );
    Ok((TaskId::new(task_id), task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(priority: i64, status: i64, prerequisites: &str) -> TaskRow {
        (7, "write tests".to_string(), 30, priority, status, prerequisites.to_string(), 2)
    }

    #[test]
    fn timestamps_sort_lexicographically() {
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let late = early + chrono::Duration::microseconds(1);

        let (a, b) = (encode_time(early), encode_time(late));
        assert!(a < b);
        assert_eq!(decode_time(&a).unwrap(), early);
        assert_eq!(decode_time(&b).unwrap(), late);
    }

    #[test]
    fn stored_task_decodes() {
        let tags: BTreeSet<Tag> = [Tag::new("home")].into_iter().collect();
        let (id, task) = decode_task(row(3, 0, "[4,1]"), tags).unwrap();

        assert_eq!(id, TaskId::new(7));
        assert_eq!(task.priority(), Priority::ShouldDo);
        assert_eq!(task.status(), Status::Tracking);
        assert_eq!(task.prerequisites(), &[TaskId::new(4), TaskId::new(1)]);
        assert_eq!(task.number_of_addendums(), 2);
    }

    #[test]
    fn unknown_stored_ordinal_is_structural() {
        let err = decode_task(row(3, 9, "[]"), BTreeSet::new()).unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("status ordinal 9"));
    }

    #[test]
    fn corrupt_prerequisites_are_structural() {
        let err = decode_task(row(1, 1, "not json"), BTreeSet::new()).unwrap_err();
        assert_eq!(err.context(), "reading prerequisites");
    }

    #[test]
    fn oversized_minutes_fail_on_the_write_side() {
        let err = encode_minutes(u64::MAX).unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(err.context(), "writing task");
        assert_eq!(encode_minutes(90).unwrap(), 90);
    }
}
