//! InMemoryTaskStore - テスト・デモ用の TaskStore
//!
//! # 学習ポイント
//! - `Arc<Mutex<State>>` で状態を共有（tokio の Mutex なので await をまたげる）
//! - SQLite 実装と同じ意味論（ユーザー分離・AND フィルタ・priority 順・NotFound）
//! - 1 回のロック区間 = 1 トランザクション（途中で失敗したら何も書かない）

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{
    Addendum, Status, StoreError, StoreResult, Tag, TagId, TagSummary, Task, TaskId, UserId,
};
use crate::ports::{Clock, SystemClock, TaskStore};

struct TagRecord {
    id: TagId,
    created_at: DateTime<Utc>,
}

struct TaskRecord {
    owner: UserId,
    task: Task,
    addendums: Vec<Addendum>,
}

#[derive(Default)]
struct State {
    tasks: BTreeMap<TaskId, TaskRecord>,
    tags: BTreeMap<(UserId, Tag), TagRecord>,
    next_task_id: i64,
    next_tag_id: i64,
}

impl State {
    fn owned(&self, user: UserId, task_id: TaskId) -> StoreResult<&TaskRecord> {
        self.tasks
            .get(&task_id)
            .filter(|record| record.owner == user)
            .ok_or(StoreError::NotFound { task_id })
    }

    fn owned_mut(&mut self, user: UserId, task_id: TaskId) -> StoreResult<&mut TaskRecord> {
        self.tasks
            .get_mut(&task_id)
            .filter(|record| record.owner == user)
            .ok_or(StoreError::NotFound { task_id })
    }

    fn resolve_tag(&mut self, user: UserId, tag: &Tag, now: DateTime<Utc>) -> TagId {
        let next_tag_id = &mut self.next_tag_id;
        self.tags
            .entry((user, tag.clone()))
            .or_insert_with(|| {
                *next_tag_id += 1;
                TagRecord {
                    id: TagId::new(*next_tag_id),
                    created_at: now,
                }
            })
            .id
    }

    fn view(record: &TaskRecord) -> Task {
        let mut task = record.task.clone();
        task.set_number_of_addendums(record.addendums.len() as u64);
        task
    }
}

#[derive(Clone)]
pub struct InMemoryTaskStore {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, user: UserId, task: &Task) -> StoreResult<TaskId> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        for tag in task.tags() {
            state.resolve_tag(user, tag, now);
        }
        state.next_task_id += 1;
        let task_id = TaskId::new(state.next_task_id);
        state.tasks.insert(
            task_id,
            TaskRecord {
                owner: user,
                task: task.clone(),
                addendums: Vec::new(),
            },
        );

        tracing::info!(%user, %task_id, "task stored");
        Ok(task_id)
    }

    async fn get(
        &self,
        user: UserId,
        status: Status,
        required_tags: &[Tag],
    ) -> StoreResult<Vec<(TaskId, Task)>> {
        let state = self.state.lock().await;

        let mut found: Vec<(TaskId, Task)> = state
            .tasks
            .iter()
            .filter(|(_, record)| record.owner == user)
            .filter(|(_, record)| record.task.has_status(status))
            .filter(|(_, record)| record.task.has_all_tags(required_tags))
            .map(|(id, record)| (*id, State::view(record)))
            .collect();
        found.sort_by_key(|(id, task)| (task.priority(), *id));
        Ok(found)
    }

    async fn describe(&self, user: UserId, task_id: TaskId) -> StoreResult<(Task, Vec<Addendum>)> {
        let state = self.state.lock().await;
        let record = state.owned(user, task_id)?;

        let mut addendums = record.addendums.clone();
        addendums.sort_by_key(Addendum::write_time);
        Ok((State::view(record), addendums))
    }

    async fn mark(&self, user: UserId, task_id: TaskId, content: &str) -> StoreResult<()> {
        Addendum::validate_content(content)?;
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        state
            .owned_mut(user, task_id)?
            .addendums
            .push(Addendum::new(now, content));
        Ok(())
    }

    async fn set_status(&self, user: UserId, task_id: TaskId, status: Status) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.owned_mut(user, task_id)?.task.set_status(status);
        Ok(())
    }

    async fn tags(&self, user: UserId) -> StoreResult<Vec<TagSummary>> {
        let state = self.state.lock().await;

        // BTreeMap のキー順 = (user, name) 順
        let summaries = state
            .tags
            .iter()
            .filter(|((owner, _), _)| *owner == user)
            .map(|((_, name), record)| TagSummary {
                id: record.id,
                name: name.clone(),
                created_at: record.created_at,
                task_count: state
                    .tasks
                    .values()
                    .filter(|t| t.owner == user && t.task.tags().contains(name))
                    .count() as u64,
            })
            .collect();
        Ok(summaries)
    }
}
