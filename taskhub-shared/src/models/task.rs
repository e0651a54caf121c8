/// Task model and database operations
///
/// A task is owned by exactly one user, may be shared with any number of
/// collaborators, and carries an ordered list of subtasks. Subtasks have no
/// lifecycle of their own: they are stored inside the task row and only ever
/// change by rewriting the parent's list.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL CHECK (name <> ''),
///     owner_id UUID NOT NULL REFERENCES users(id),
///     status TEXT NOT NULL DEFAULT 'todo',
///     priority TEXT NOT NULL DEFAULT 'P3',
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     collaborators UUID[] NOT NULL DEFAULT '{}',
///     subtasks JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use uuid::Uuid;

use super::user::UserSummary;

/// Error returned when a stored enum column holds an unknown value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind} value: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "todo")]
    Todo,

    #[serde(rename = "in-progress", alias = "in progress")]
    InProgress,

    #[serde(rename = "done")]
    Done,
}

impl TaskStatus {
    /// Storage and wire representation
    ///
    /// Listing order is the ascending order of these strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decodes the stored column, which only ever holds [`TaskStatus::as_str`]
impl TryFrom<String> for TaskStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(ParseEnumError {
                kind: "task status",
                value,
            }),
        }
    }
}

/// Task priority (P0 = critical, P3 = low)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum TaskPriority {
    P0,
    P1,
    P2,
    #[default]
    P3,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::P0 => "P0",
            TaskPriority::P1 => "P1",
            TaskPriority::P2 => "P2",
            TaskPriority::P3 => "P3",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "P0" => Ok(TaskPriority::P0),
            "P1" => Ok(TaskPriority::P1),
            "P2" => Ok(TaskPriority::P2),
            "P3" => Ok(TaskPriority::P3),
            _ => Err(ParseEnumError {
                kind: "task priority",
                value,
            }),
        }
    }
}

/// Checklist item embedded in a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: Uuid,
    pub name: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for adding a subtask
#[derive(Debug, Clone)]
pub struct CreateSubtask {
    pub name: String,
    pub is_completed: bool,
}

/// Partial subtask update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateSubtask {
    pub name: Option<String>,
    pub is_completed: Option<bool>,
}

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Human-readable name
    pub name: String,

    /// Owning user; fixed at creation
    #[serde(rename = "owner")]
    pub owner_id: Uuid,

    #[sqlx(try_from = "String")]
    pub status: TaskStatus,

    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,

    pub is_completed: bool,

    /// Users allowed to edit the task and its subtasks; never contains the owner
    pub collaborators: Vec<Uuid>,

    /// Ordered subtasks
    #[sqlx(json)]
    pub subtasks: Vec<Subtask>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// `owner_id` always comes from the authenticated caller, never from the
/// request body.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub owner_id: Uuid,
    pub name: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub is_completed: bool,
    pub collaborators: Vec<Uuid>,
}

/// Partial task update; `None` fields are left unchanged
///
/// There is deliberately no owner field.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub is_completed: Option<bool>,
    /// Replaces the whole collaborator set when present
    pub collaborators: Option<Vec<Uuid>>,
}

/// Collaborators gained and lost by a single update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollaboratorChanges {
    pub added: Vec<Uuid>,
    pub removed: Vec<Uuid>,
}

impl CollaboratorChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Task as rendered by the listing endpoint, with user references expanded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: Uuid,
    pub name: String,
    pub owner: Option<UserSummary>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub is_completed: bool,
    pub collaborators: Vec<UserSummary>,
    pub subtasks: Vec<Subtask>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskSummary {
    /// Expands owner and collaborator IDs using `lookup`
    ///
    /// References that no longer resolve are dropped (owner becomes `None`).
    pub fn expand<F>(task: Task, lookup: F) -> Self
    where
        F: Fn(Uuid) -> Option<UserSummary>,
    {
        Self {
            owner: lookup(task.owner_id),
            collaborators: task.collaborators.iter().filter_map(|id| lookup(*id)).collect(),
            id: task.id,
            name: task.name,
            status: task.status,
            priority: task.priority,
            is_completed: task.is_completed,
            subtasks: task.subtasks,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Deduplicates collaborators, preserving first-seen order, and drops the owner
pub fn normalize_collaborators(owner_id: Uuid, collaborators: &[Uuid]) -> Vec<Uuid> {
    let mut normalized: Vec<Uuid> = Vec::with_capacity(collaborators.len());
    for id in collaborators {
        if *id != owner_id && !normalized.contains(id) {
            normalized.push(*id);
        }
    }
    normalized
}

/// Sorts tasks in listing order: status, then priority, then ID (all ascending)
pub fn sort_for_listing(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.status
            .as_str()
            .cmp(b.status.as_str())
            .then_with(|| a.priority.cmp(&b.priority))
            .then_with(|| a.id.cmp(&b.id))
    });
}

impl Task {
    /// Builds a fresh task from creation input, as the in-memory store does
    pub fn new(data: CreateTask) -> Self {
        let now = Utc::now();
        let collaborators = normalize_collaborators(data.owner_id, &data.collaborators);

        Self {
            id: Uuid::new_v4(),
            name: data.name,
            owner_id: data.owner_id,
            status: data.status,
            priority: data.priority,
            is_completed: data.is_completed,
            collaborators,
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn is_collaborator(&self, user_id: Uuid) -> bool {
        self.collaborators.contains(&user_id)
    }

    /// Owner plus collaborators: everyone whose task list should hold this task
    pub fn members(&self) -> Vec<Uuid> {
        let mut members = Vec::with_capacity(self.collaborators.len() + 1);
        members.push(self.owner_id);
        members.extend(self.collaborators.iter().copied());
        members
    }

    /// Applies a partial update in place and reports collaborator changes
    ///
    /// Does not touch `updated_at`; stores stamp it when persisting.
    pub fn apply_update(&mut self, data: UpdateTask) -> CollaboratorChanges {
        if let Some(name) = data.name {
            self.name = name;
        }
        if let Some(status) = data.status {
            self.status = status;
        }
        if let Some(priority) = data.priority {
            self.priority = priority;
        }
        if let Some(is_completed) = data.is_completed {
            self.is_completed = is_completed;
        }

        let Some(requested) = data.collaborators else {
            return CollaboratorChanges::default();
        };

        let next = normalize_collaborators(self.owner_id, &requested);
        let changes = CollaboratorChanges {
            added: next
                .iter()
                .filter(|id| !self.collaborators.contains(id))
                .copied()
                .collect(),
            removed: self
                .collaborators
                .iter()
                .filter(|id| !next.contains(id))
                .copied()
                .collect(),
        };
        self.collaborators = next;
        changes
    }

    pub fn subtask(&self, subtask_id: Uuid) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }

    /// Appends a subtask and returns its ID
    pub fn add_subtask(&mut self, data: CreateSubtask) -> Uuid {
        let now = Utc::now();
        let subtask = Subtask {
            id: Uuid::new_v4(),
            name: data.name,
            is_completed: data.is_completed,
            created_at: now,
            updated_at: now,
        };
        let id = subtask.id;
        self.subtasks.push(subtask);
        id
    }

    /// Updates a subtask in place; returns false if it does not exist
    pub fn update_subtask(&mut self, subtask_id: Uuid, data: UpdateSubtask) -> bool {
        let Some(subtask) = self.subtasks.iter_mut().find(|s| s.id == subtask_id) else {
            return false;
        };

        if let Some(name) = data.name {
            subtask.name = name;
        }
        if let Some(is_completed) = data.is_completed {
            subtask.is_completed = is_completed;
        }
        subtask.updated_at = Utc::now();
        true
    }

    /// Removes a subtask; returns false if it does not exist
    pub fn remove_subtask(&mut self, subtask_id: Uuid) -> bool {
        let before = self.subtasks.len();
        self.subtasks.retain(|s| s.id != subtask_id);
        self.subtasks.len() != before
    }
}

const TASK_COLUMNS: &str = "id, name, owner_id, status, priority, is_completed, collaborators, subtasks, created_at, updated_at";

impl Task {
    /// Inserts a new task
    ///
    /// Fails with a foreign key violation when the owner does not exist.
    pub async fn insert<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let collaborators = normalize_collaborators(data.owner_id, &data.collaborators);
        let query = format!(
            r#"
            INSERT INTO tasks (name, owner_id, status, priority, is_completed, collaborators)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.name)
            .bind(data.owner_id)
            .bind(data.status.as_str())
            .bind(data.priority.as_str())
            .bind(data.is_completed)
            .bind(collaborators)
            .fetch_one(executor)
            .await
    }

    /// Finds a task by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a task by ID and locks the row until the transaction ends
    pub async fn find_for_update<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists every task in listing order (see [`sort_for_listing`])
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"SELECT {TASK_COLUMNS} FROM tasks ORDER BY status COLLATE "C" ASC, priority COLLATE "C" ASC, id ASC"#
        );

        sqlx::query_as::<_, Task>(&query).fetch_all(executor).await
    }

    /// Overwrites every mutable field of the stored task with `task`'s values
    ///
    /// Owner and creation time are never written. Last write wins.
    pub async fn save<'e, E>(executor: E, task: &Task) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            UPDATE tasks
            SET name = $2,
                status = $3,
                priority = $4,
                is_completed = $5,
                collaborators = $6,
                subtasks = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(task.id)
            .bind(&task.name)
            .bind(task.status.as_str())
            .bind(task.priority.as_str())
            .bind(task.is_completed)
            .bind(&task.collaborators)
            .bind(sqlx::types::Json(&task.subtasks))
            .fetch_optional(executor)
            .await
    }

    /// Replaces only the subtask list
    pub async fn save_subtasks<'e, E>(
        executor: E,
        id: Uuid,
        subtasks: &[Subtask],
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE tasks SET subtasks = $2, updated_at = NOW() WHERE id = $1 RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(sqlx::types::Json(subtasks))
            .fetch_optional(executor)
            .await
    }

    /// Deletes a task; returns false if it did not exist
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with(owner: Uuid, collaborators: Vec<Uuid>) -> Task {
        Task::new(CreateTask {
            owner_id: owner,
            name: "Write report".to_string(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            is_completed: false,
            collaborators,
        })
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::P3);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in-progress\"");

        let parsed: TaskStatus = serde_json::from_str("\"in progress\"").unwrap();
        assert_eq!(parsed, TaskStatus::InProgress);

        assert!(serde_json::from_str::<TaskStatus>("\"blocked\"").is_err());
    }

    #[test]
    fn test_enum_try_from_string() {
        assert_eq!(TaskStatus::try_from("done".to_string()).unwrap(), TaskStatus::Done);
        assert_eq!(
            TaskStatus::try_from("in-progress".to_string()).unwrap(),
            TaskStatus::InProgress
        );
        // The spaced spelling is a JSON input alias only; rows never hold it
        assert!(TaskStatus::try_from("in progress".to_string()).is_err());
        assert_eq!(TaskPriority::try_from("P1".to_string()).unwrap(), TaskPriority::P1);

        let err = TaskPriority::try_from("P9".to_string()).unwrap_err();
        assert!(err.to_string().contains("P9"));
    }

    #[test]
    fn test_normalize_collaborators() {
        let owner = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let normalized = normalize_collaborators(owner, &[a, owner, b, a]);
        assert_eq!(normalized, vec![a, b]);
    }

    #[test]
    fn test_new_task_drops_owner_from_collaborators() {
        let owner = Uuid::new_v4();
        let task = task_with(owner, vec![owner]);

        assert!(task.is_owner(owner));
        assert!(!task.is_collaborator(owner));
        assert!(task.collaborators.is_empty());
        assert_eq!(task.members(), vec![owner]);
    }

    #[test]
    fn test_apply_update_reports_collaborator_changes() {
        let owner = Uuid::new_v4();
        let kept = Uuid::new_v4();
        let dropped = Uuid::new_v4();
        let added = Uuid::new_v4();
        let mut task = task_with(owner, vec![kept, dropped]);

        let changes = task.apply_update(UpdateTask {
            name: Some("Renamed".to_string()),
            status: Some(TaskStatus::Done),
            collaborators: Some(vec![kept, added]),
            ..Default::default()
        });

        assert_eq!(task.name, "Renamed");
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.priority, TaskPriority::P3);
        assert_eq!(task.owner_id, owner);
        assert_eq!(task.collaborators, vec![kept, added]);
        assert_eq!(changes.added, vec![added]);
        assert_eq!(changes.removed, vec![dropped]);
    }

    #[test]
    fn test_apply_update_without_collaborators_is_unchanged() {
        let owner = Uuid::new_v4();
        let collaborator = Uuid::new_v4();
        let mut task = task_with(owner, vec![collaborator]);

        let changes = task.apply_update(UpdateTask {
            is_completed: Some(true),
            ..Default::default()
        });

        assert!(changes.is_empty());
        assert!(task.is_completed);
        assert_eq!(task.collaborators, vec![collaborator]);
    }

    #[test]
    fn test_subtask_lifecycle() {
        let mut task = task_with(Uuid::new_v4(), vec![]);

        let first = task.add_subtask(CreateSubtask {
            name: "Outline".to_string(),
            is_completed: false,
        });
        let second = task.add_subtask(CreateSubtask {
            name: "Draft".to_string(),
            is_completed: false,
        });
        assert_eq!(task.subtasks.len(), 2);
        assert_eq!(task.subtasks[0].id, first);

        assert!(task.update_subtask(
            second,
            UpdateSubtask {
                is_completed: Some(true),
                ..Default::default()
            }
        ));
        let updated = task.subtask(second).unwrap();
        assert!(updated.is_completed);
        assert_eq!(updated.name, "Draft");

        assert!(!task.update_subtask(Uuid::new_v4(), UpdateSubtask::default()));

        assert!(task.remove_subtask(first));
        assert!(!task.remove_subtask(first));
        assert_eq!(task.subtasks.len(), 1);
        assert!(task.subtask(first).is_none());
    }

    #[test]
    fn test_sort_for_listing() {
        let owner = Uuid::new_v4();
        let mut todo_p0 = task_with(owner, vec![]);
        todo_p0.priority = TaskPriority::P0;
        let mut done_p3 = task_with(owner, vec![]);
        done_p3.status = TaskStatus::Done;
        let mut progress_p1 = task_with(owner, vec![]);
        progress_p1.status = TaskStatus::InProgress;
        progress_p1.priority = TaskPriority::P1;
        let mut done_p1 = task_with(owner, vec![]);
        done_p1.status = TaskStatus::Done;
        done_p1.priority = TaskPriority::P1;

        let mut tasks = vec![todo_p0.clone(), done_p3.clone(), progress_p1.clone(), done_p1.clone()];
        sort_for_listing(&mut tasks);

        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![done_p1.id, done_p3.id, progress_p1.id, todo_p0.id]);
    }

    #[test]
    fn test_summary_drops_unresolved_references() {
        let owner = Uuid::new_v4();
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let task = task_with(owner, vec![known, unknown]);

        let summary = TaskSummary::expand(task, |id| {
            (id == owner || id == known).then(|| UserSummary {
                id,
                username: format!("user-{id}"),
                email: format!("{id}@example.com"),
            })
        });

        assert_eq!(summary.owner.map(|o| o.id), Some(owner));
        assert_eq!(summary.collaborators.len(), 1);
        assert_eq!(summary.collaborators[0].id, known);
    }

    #[test]
    fn test_task_json_uses_owner_key() {
        let owner = Uuid::new_v4();
        let json = serde_json::to_value(task_with(owner, vec![])).unwrap();

        assert_eq!(json["owner"], owner.to_string());
        assert_eq!(json["status"], "todo");
        assert_eq!(json["priority"], "P3");
        assert_eq!(json["isCompleted"], false);
        assert!(json["subtasks"].as_array().unwrap().is_empty());
    }
}
