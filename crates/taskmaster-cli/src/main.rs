//! taskmaster - Task Store を直接操作するライン CLI
//!
//! 出力は 1 行 1 JSON オブジェクト。ログは stderr（`RUST_LOG` で制御）。

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use taskmaster_core::app::config::{ConfigError, DATABASE_URL_ENV, STATEMENT_TIMEOUT_ENV};
use taskmaster_core::{
    Addendum, Status, StoreBuilder, StoreConfig, Tag, TagSummary, Task, TaskDraft, TaskId,
    TaskStore, UserId,
};

#[derive(Parser)]
#[command(name = "taskmaster", version)]
struct Cli {
    /// e.g. sqlite://tasks.db?mode=rwc (falls back to TASKMASTER_DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Identity of the caller (normally resolved by the identity service)
    #[arg(long, env = "TASKMASTER_USER_ID")]
    user_id: i64,

    /// falls back to TASKMASTER_STATEMENT_TIMEOUT_MS, then 5000
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    cmd: Command,
}

impl Cli {
    /// フラグを優先し、無ければ `env` で引く
    fn store_config(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<StoreConfig, ConfigError> {
        StoreConfig::from_lookup(|name| {
            let flag = match name {
                DATABASE_URL_ENV => self.database_url.clone(),
                STATEMENT_TIMEOUT_ENV => self.timeout_ms.map(|ms| ms.to_string()),
                _ => None,
            };
            flag.or_else(|| env(name))
        })
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create the schema in an empty database
    Init,

    /// Create a task
    Put {
        #[arg(long)]
        name: String,
        #[arg(long)]
        minutes: u64,
        /// 0) unassigned .. 4) eventually do
        #[arg(long, default_value_t = 0)]
        priority: u32,
        /// 0) tracking, 1) completed, 2) backlog
        #[arg(long, default_value_t = 0)]
        status_id: u32,
        /// tags separated by ','
        #[arg(long, value_delimiter = ',', required = true)]
        tags: Vec<String>,
        /// task ids separated by ','
        #[arg(long, value_delimiter = ',')]
        prerequisites: Vec<i64>,
    },

    /// List tasks with a status, optionally requiring every given tag
    Get {
        #[arg(long, default_value_t = 0)]
        status_id: u32,
        /// tags separated by ','. If empty all tasks with the status are returned
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Show one task and its addendums
    Describe {
        #[arg(long)]
        task_id: i64,
    },

    /// Append a progress note to a task
    Mark {
        #[arg(long)]
        task_id: i64,
        #[arg(long)]
        content: String,
    },

    /// Move a task to another status
    SetStatus {
        #[arg(long)]
        task_id: i64,
        #[arg(long)]
        status_id: u32,
    },

    /// List tags with the number of tasks using them
    Tags,
}

#[derive(Serialize)]
struct TaskRef {
    task_id: TaskId,
}

#[derive(Serialize)]
struct Listed<'a> {
    task_id: TaskId,
    #[serde(flatten)]
    task: &'a Task,
}

#[derive(Serialize)]
struct Described<'a> {
    task_id: TaskId,
    task: &'a Task,
    addendums: &'a [Addendum],
}

#[derive(Serialize)]
struct StatusChanged {
    task_id: TaskId,
    status: Status,
}

fn emit(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.store_config(|name| std::env::var(name).ok())?;
    let store = StoreBuilder::new(config).build()?;
    let user = UserId::new(cli.user_id);

    match cli.cmd {
        Command::Init => {
            store.provision().await.context("provisioning schema")?;
        }
        Command::Put {
            name,
            minutes,
            priority,
            status_id,
            tags,
            prerequisites,
        } => {
            let draft = TaskDraft {
                name,
                minutes_to_complete: minutes,
                priority,
                status: status_id,
                tags,
                prerequisites: prerequisites.into_iter().map(TaskId::new).collect(),
            };
            let task_id = store.put(user, &draft).await.context("putting task")?;
            emit(&TaskRef { task_id })?;
        }
        Command::Get { status_id, tags } => {
            let status = Status::try_from(status_id)?;
            let tags: Vec<Tag> = tags.into_iter().map(Tag::new).collect();
            for (task_id, task) in store.get(user, status, &tags).await.context("getting tasks")? {
                emit(&Listed {
                    task_id,
                    task: &task,
                })?;
            }
        }
        Command::Describe { task_id } => {
            let task_id = TaskId::new(task_id);
            let (task, addendums) = store
                .describe(user, task_id)
                .await
                .context("describing task")?;
            emit(&Described {
                task_id,
                task: &task,
                addendums: &addendums,
            })?;
        }
        Command::Mark { task_id, content } => {
            let task_id = TaskId::new(task_id);
            store
                .mark(user, task_id, &content)
                .await
                .context("marking task")?;
            emit(&TaskRef { task_id })?;
        }
        Command::SetStatus { task_id, status_id } => {
            let task_id = TaskId::new(task_id);
            let status = Status::try_from(status_id)?;
            store
                .set_status(user, task_id, status)
                .await
                .context("setting status")?;
            emit(&StatusChanged { task_id, status })?;
        }
        Command::Tags => {
            let tags: Vec<TagSummary> = store.tags(user).await.context("listing tags")?;
            for tag in &tags {
                emit(tag)?;
            }
        }
    }

    Ok(())
}
