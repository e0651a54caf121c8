/// Storage abstraction for users, tasks and todos
///
/// Handlers talk to storage only through these traits. Two implementations
/// exist:
///
/// - [`crate::db::postgres::PgStore`]: the production store, one transaction
///   per multi-row write
/// - [`memory::MemoryStore`]: an in-process store used by tests and local runs
///
/// Both keep user task lists in sync with task ownership and collaboration:
/// creating a task links it to its owner and collaborators, changing
/// collaborators links or unlinks the affected users, and deleting a task
/// unlinks it from every user.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::task::{CreateTask, Subtask, Task, UpdateTask};
use crate::models::todo::{CreateTodo, Todo, UpdateTodo};
use crate::models::user::{CreateUser, User};

pub mod memory;

pub use memory::MemoryStore;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique field already holds this value
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    /// A referenced row (usually a user) does not exist
    #[error("Referenced record does not exist: {0}")]
    MissingReference(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StoreError::Duplicate("username" | "email")` on collisions
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Exact match on the already normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Loads every existing user in `ids`; unknown IDs are skipped
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts the task and links it to its owner and collaborators
    ///
    /// Fails with `StoreError::MissingReference` if the owner does not exist.
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// All tasks ordered by status, priority, then ID
    async fn list_tasks(&self) -> StoreResult<Vec<Task>>;

    /// Applies a partial update and syncs user links for collaborator changes
    ///
    /// Returns `None` if the task does not exist.
    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>>;

    /// Replaces the task's subtask list
    async fn save_subtasks(&self, id: Uuid, subtasks: Vec<Subtask>) -> StoreResult<Option<Task>>;

    /// Deletes the task and unlinks it from every user; false if absent
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn create_todo(&self, data: CreateTodo) -> StoreResult<Todo>;

    async fn find_todo(&self, id: Uuid) -> StoreResult<Option<Todo>>;

    /// All todos, completed first, then priority (missing first), name, ID
    async fn list_todos(&self) -> StoreResult<Vec<Todo>>;

    async fn update_todo(&self, id: Uuid, data: UpdateTodo) -> StoreResult<Option<Todo>>;

    async fn delete_todo(&self, id: Uuid) -> StoreResult<bool>;
}

/// Everything the API needs from storage
#[async_trait]
pub trait Store: UserStore + TaskStore + TodoStore {
    /// Cheap liveness probe used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}
