/// Database models for TaskHub
///
/// Each model carries its own plain-data helpers plus the SQL that reads and
/// writes it. Query functions take any `PgExecutor`, so they run equally well
/// against the pool or inside a transaction.
///
/// # Models
///
/// - `user`: Accounts and their task references
/// - `task`: Shared tasks with collaborators and embedded subtasks
/// - `todo`: Owner-only checklist items
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::models::task::{CreateTask, Task};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::insert(&pool, CreateTask {
///     owner_id,
///     name: "Finish lab exercise".to_string(),
///     status: Default::default(),
///     priority: Default::default(),
///     is_completed: false,
///     collaborators: vec![],
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod task;
pub mod todo;
pub mod user;
