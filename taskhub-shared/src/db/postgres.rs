/// PostgreSQL-backed store
///
/// Single-row reads and writes go straight to the pool. Writes that touch a
/// task and user task lists together run in one transaction, with the task
/// row locked (`FOR UPDATE`) for updates so concurrent collaborator changes
/// cannot interleave.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::pool::health_check;
use crate::models::task::{CreateTask, Subtask, Task, UpdateTask};
use crate::models::todo::{CreateTodo, Todo, UpdateTodo};
use crate::models::user::{CreateUser, User};
use crate::store::{Store, StoreError, StoreResult, TaskStore, TodoStore, UserStore};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Deletes every todo, task and user
    ///
    /// Only the seeding binary calls this.
    pub async fn wipe(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM todos").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM tasks").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM users").execute(&mut *tx).await?;
        tx.commit().await?;

        info!("Wiped users, tasks and todos");
        Ok(())
    }
}

/// Maps constraint violations onto store errors
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(c) if c.contains("username") => "username",
                Some(c) if c.contains("email") => "email",
                Some(c) => c,
                None => "unknown",
            };
            return StoreError::Duplicate(field.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(
                db_err.constraint().unwrap_or("foreign key").to_string(),
            );
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data).await.map_err(map_db_error)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(User::find_many(&self.pool, ids).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut tx = self.pool.begin().await?;

        let task = Task::insert(&mut *tx, data).await.map_err(map_db_error)?;
        let linked = User::link_task(&mut *tx, task.id, &task.members()).await?;

        tx.commit().await?;

        debug!(task_id = %task.id, linked_users = linked, "Task inserted");
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        Ok(Task::list(&self.pool).await?)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut task) = Task::find_for_update(&mut *tx, id).await? else {
            return Ok(None);
        };

        let changes = task.apply_update(data);
        let saved = Task::save(&mut *tx, &task).await.map_err(map_db_error)?;

        if !changes.added.is_empty() {
            User::link_task(&mut *tx, id, &changes.added).await?;
        }
        if !changes.removed.is_empty() {
            User::unlink_task(&mut *tx, id, &changes.removed).await?;
        }

        tx.commit().await?;

        debug!(
            task_id = %id,
            added = changes.added.len(),
            removed = changes.removed.len(),
            "Task updated"
        );
        Ok(saved)
    }

    async fn save_subtasks(&self, id: Uuid, subtasks: Vec<Subtask>) -> StoreResult<Option<Task>> {
        Ok(Task::save_subtasks(&self.pool, id, &subtasks).await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = Task::delete(&mut *tx, id).await?;
        if deleted {
            let unlinked = User::unlink_task_everywhere(&mut *tx, id).await?;
            debug!(task_id = %id, unlinked_users = unlinked, "Task deleted");
        }

        tx.commit().await?;
        Ok(deleted)
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn create_todo(&self, data: CreateTodo) -> StoreResult<Todo> {
        Todo::insert(&self.pool, data).await.map_err(map_db_error)
    }

    async fn find_todo(&self, id: Uuid) -> StoreResult<Option<Todo>> {
        Ok(Todo::find_by_id(&self.pool, id).await?)
    }

    async fn list_todos(&self) -> StoreResult<Vec<Todo>> {
        Ok(Todo::list(&self.pool).await?)
    }

    async fn update_todo(&self, id: Uuid, data: UpdateTodo) -> StoreResult<Option<Todo>> {
        Todo::update(&self.pool, id, data).await.map_err(map_db_error)
    }

    async fn delete_todo(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Todo::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = map_db_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }
}
