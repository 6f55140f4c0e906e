//! Domain model (IDs, tasks, tags, addendums, errors).
//!
//! ストレージやトランスポートに依存しない純粋な型だけを置きます。

pub mod addendum;
pub mod errors;
pub mod ids;
pub mod status;
pub mod tag;
pub mod task;

pub use addendum::Addendum;
pub use errors::{ErrorKind, StorageError, StoreError, StoreResult, ValidationErrors, Violation};
pub use ids::{TagId, TaskId, UserId};
pub use status::{Priority, Status, UnknownOrdinal};
pub use tag::{Tag, TagSummary};
pub use task::{Task, TaskDraft};
