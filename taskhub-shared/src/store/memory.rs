/// In-memory store
///
/// Holds every record in hash maps behind a single `RwLock`. Each trait call
/// takes the lock once, so multi-record writes (task creation plus user
/// links, for example) are atomic with respect to other callers.
///
/// Uniqueness of usernames and emails and the existence of task and todo
/// owners are enforced the same way the database constraints enforce them.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskStore, TodoStore, UserStore};
use crate::models::task::{self, CreateTask, Subtask, Task, UpdateTask};
use crate::models::todo::{self, CreateTodo, Todo, UpdateTodo};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    tasks: HashMap<Uuid, Task>,
    todos: HashMap<Uuid, Todo>,
}

impl MemoryState {
    fn link(&mut self, task_id: Uuid, user_ids: &[Uuid]) {
        let now = Utc::now();
        for user_id in user_ids {
            if let Some(user) = self.users.get_mut(user_id) {
                if !user.tasks.contains(&task_id) {
                    user.tasks.push(task_id);
                    user.updated_at = now;
                }
            }
        }
    }

    fn unlink(&mut self, task_id: Uuid, user_ids: &[Uuid]) {
        let now = Utc::now();
        for user_id in user_ids {
            if let Some(user) = self.users.get_mut(user_id) {
                if user.tasks.contains(&task_id) {
                    user.tasks.retain(|id| *id != task_id);
                    user.updated_at = now;
                }
            }
        }
    }
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == data.username) {
            return Err(StoreError::Duplicate("username".to_string()));
        }
        if state.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        if data.password_hash.is_empty() {
            return Err(StoreError::Internal("empty password hash".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&data.owner_id) {
            return Err(StoreError::MissingReference(format!("user {}", data.owner_id)));
        }

        let task = Task::new(data);
        state.link(task.id, &task.members());
        state.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.state.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self.state.read().await.tasks.values().cloned().collect();
        task::sort_for_listing(&mut tasks);
        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(None);
        };
        let changes = task.apply_update(data);
        task.updated_at = Utc::now();
        let updated = task.clone();

        state.link(id, &changes.added);
        state.unlink(id, &changes.removed);

        Ok(Some(updated))
    }

    async fn save_subtasks(&self, id: Uuid, subtasks: Vec<Subtask>) -> StoreResult<Option<Task>> {
        let mut state = self.state.write().await;

        Ok(state.tasks.get_mut(&id).map(|task| {
            task.subtasks = subtasks;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        if state.tasks.remove(&id).is_none() {
            return Ok(false);
        }

        let now = Utc::now();
        for user in state.users.values_mut() {
            if user.tasks.contains(&id) {
                user.tasks.retain(|task_id| *task_id != id);
                user.updated_at = now;
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn create_todo(&self, data: CreateTodo) -> StoreResult<Todo> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&data.owner_id) {
            return Err(StoreError::MissingReference(format!("user {}", data.owner_id)));
        }

        let todo = Todo::new(data);
        state.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn find_todo(&self, id: Uuid) -> StoreResult<Option<Todo>> {
        Ok(self.state.read().await.todos.get(&id).cloned())
    }

    async fn list_todos(&self) -> StoreResult<Vec<Todo>> {
        let mut todos: Vec<Todo> = self.state.read().await.todos.values().cloned().collect();
        todo::sort_for_listing(&mut todos);
        Ok(todos)
    }

    async fn update_todo(&self, id: Uuid, data: UpdateTodo) -> StoreResult<Option<Todo>> {
        let mut state = self.state.write().await;

        Ok(state.todos.get_mut(&id).map(|todo| {
            todo.apply_update(data);
            todo.updated_at = Utc::now();
            todo.clone()
        }))
    }

    async fn delete_todo(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.write().await.todos.remove(&id).is_some())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(CreateUser {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "$argon2id$hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn tasks_of(store: &MemoryStore, id: Uuid) -> Vec<Uuid> {
        store.find_user(id).await.unwrap().unwrap().tasks
    }

    fn new_task(owner_id: Uuid, collaborators: Vec<Uuid>) -> CreateTask {
        CreateTask {
            owner_id,
            name: "Shared".to_string(),
            status: TaskStatus::Todo,
            priority: TaskPriority::P2,
            is_completed: false,
            collaborators,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let store = MemoryStore::new();
        user(&store, "ada").await;

        let err = store
            .create_user(CreateUser {
                username: "ada".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "$argon2id$hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref f) if f == "username"));

        let err = store
            .create_user(CreateUser {
                username: "other".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: "$argon2id$hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref f) if f == "email"));
    }

    #[tokio::test]
    async fn test_create_task_requires_existing_owner() {
        let store = MemoryStore::new();

        let err = store.create_task(new_task(Uuid::new_v4(), vec![])).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }

    #[tokio::test]
    async fn test_task_links_follow_collaborators() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let first = user(&store, "first").await;
        let second = user(&store, "second").await;

        let task = store.create_task(new_task(owner.id, vec![first.id])).await.unwrap();

        assert_eq!(tasks_of(&store, owner.id).await, vec![task.id]);
        assert_eq!(tasks_of(&store, first.id).await, vec![task.id]);
        assert!(tasks_of(&store, second.id).await.is_empty());

        let updated = store
            .update_task(
                task.id,
                UpdateTask {
                    collaborators: Some(vec![second.id]),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.collaborators, vec![second.id]);
        assert!(tasks_of(&store, first.id).await.is_empty());
        assert_eq!(tasks_of(&store, second.id).await, vec![task.id]);

        assert!(store.delete_task(task.id).await.unwrap());
        assert!(tasks_of(&store, owner.id).await.is_empty());
        assert!(tasks_of(&store, second.id).await.is_empty());
        assert!(!store.delete_task(task.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_task_returns_none() {
        let store = MemoryStore::new();

        let result = store.update_task(Uuid::new_v4(), UpdateTask::default()).await.unwrap();
        assert!(result.is_none());
        assert!(store.save_subtasks(Uuid::new_v4(), vec![]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_users_skips_unknown() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;

        let found = store.find_users(&[ada.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ada.id);
    }

    #[tokio::test]
    async fn test_todo_crud() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;

        let created = store
            .create_todo(CreateTodo {
                owner_id: owner.id,
                name: "Buy milk".to_string(),
                priority: None,
                is_completed: false,
            })
            .await
            .unwrap();

        let updated = store
            .update_todo(
                created.id,
                UpdateTodo {
                    is_completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_completed);
        assert_eq!(store.list_todos().await.unwrap().len(), 1);

        assert!(store.delete_todo(created.id).await.unwrap());
        assert!(store.find_todo(created.id).await.unwrap().is_none());
    }
}
