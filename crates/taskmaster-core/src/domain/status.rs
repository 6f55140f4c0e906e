//! Status / Priority - 閉じた列挙型とワイヤ序数の相互変換
//!
//! 序数は隣接レイヤー（RPC, CLI, DB カラム）との固定マッピングです。
//! 未知の序数はデフォルト値に置き換えず、必ずエラーにします。

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 序数 → 列挙型の変換失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind} ordinal {value}")]
pub struct UnknownOrdinal {
    pub kind: &'static str,
    pub value: u32,
}

/// タスクの状態
///
/// # 序数
/// - 0: Tracking
/// - 1: Completed
/// - 2: Backlog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Tracking,
    Completed,
    Backlog,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Tracking, Status::Completed, Status::Backlog];

    pub fn ordinal(self) -> u32 {
        match self {
            Status::Tracking => 0,
            Status::Completed => 1,
            Status::Backlog => 2,
        }
    }
}

impl TryFrom<u32> for Status {
    type Error = UnknownOrdinal;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Tracking),
            1 => Ok(Status::Completed),
            2 => Ok(Status::Backlog),
            _ => Err(UnknownOrdinal {
                kind: "status",
                value,
            }),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Tracking => "tracking",
            Status::Completed => "completed",
            Status::Backlog => "backlog",
        };
        f.write_str(label)
    }
}

/// タスクの優先度
///
/// 序数が小さいほど先にソートされます。ラベルの意味は表示層のもので、
/// ストアは序数の大小しか見ません。
///
/// # 序数
/// - 0: Unassigned
/// - 1: DoBeforeSleep
/// - 2: DoImmediately
/// - 3: ShouldDo
/// - 4: EventuallyDo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Unassigned,
    DoBeforeSleep,
    DoImmediately,
    ShouldDo,
    EventuallyDo,
}

impl Priority {
    pub fn ordinal(self) -> u32 {
        match self {
            Priority::Unassigned => 0,
            Priority::DoBeforeSleep => 1,
            Priority::DoImmediately => 2,
            Priority::ShouldDo => 3,
            Priority::EventuallyDo => 4,
        }
    }
}

impl TryFrom<u32> for Priority {
    type Error = UnknownOrdinal;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::Unassigned),
            1 => Ok(Priority::DoBeforeSleep),
            2 => Ok(Priority::DoImmediately),
            3 => Ok(Priority::ShouldDo),
            4 => Ok(Priority::EventuallyDo),
            _ => Err(UnknownOrdinal {
                kind: "priority",
                value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::tracking(0, Status::Tracking)]
    #[case::completed(1, Status::Completed)]
    #[case::backlog(2, Status::Backlog)]
    fn status_ordinals_are_fixed(#[case] ordinal: u32, #[case] status: Status) {
        assert_eq!(Status::try_from(ordinal), Ok(status));
        assert_eq!(status.ordinal(), ordinal);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = Status::try_from(3).unwrap_err();
        assert_eq!(err.kind, "status");
        assert_eq!(err.to_string(), "unrecognized status ordinal 3");
    }

    #[test]
    fn priority_ordinals_cover_zero_through_four() {
        for ordinal in 0..=4 {
            let priority = Priority::try_from(ordinal).unwrap();
            assert_eq!(priority.ordinal(), ordinal);
        }
        assert!(Priority::try_from(5).is_err());
    }

    #[test]
    fn priority_orders_by_ordinal() {
        assert!(Priority::Unassigned < Priority::DoBeforeSleep);
        assert!(Priority::ShouldDo < Priority::EventuallyDo);
    }
}
