/// Todo model and database operations
///
/// Todos are the lightweight sibling of tasks: a name, an optional priority,
/// and a completion flag. Only the owner may modify or delete one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub name: String,
    /// Free-form priority label; absent sorts first
    pub priority: Option<String>,
    pub is_completed: bool,
    #[serde(rename = "owner")]
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTodo {
    pub owner_id: Uuid,
    pub name: String,
    pub priority: Option<String>,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTodo {
    pub name: Option<String>,
    pub priority: Option<String>,
    pub is_completed: Option<bool>,
}

impl Todo {
    pub fn new(data: CreateTodo) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: data.name,
            priority: data.priority,
            is_completed: data.is_completed,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, data: UpdateTodo) {
        if let Some(name) = data.name {
            self.name = name;
        }
        if let Some(priority) = data.priority {
            self.priority = Some(priority);
        }
        if let Some(is_completed) = data.is_completed {
            self.is_completed = is_completed;
        }
    }
}

/// Completed first, then priority (missing first), then name, then ID
pub fn sort_for_listing(todos: &mut [Todo]) {
    todos.sort_by(|a, b| {
        b.is_completed
            .cmp(&a.is_completed)
            .then_with(|| compare_priority(a.priority.as_deref(), b.priority.as_deref()))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn compare_priority(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

const TODO_COLUMNS: &str = "id, name, priority, is_completed, owner_id, created_at, updated_at";

impl Todo {
    pub async fn insert<'e, E>(executor: E, data: CreateTodo) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            INSERT INTO todos (name, priority, is_completed, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {TODO_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Todo>(&query)
            .bind(data.name)
            .bind(data.priority)
            .bind(data.is_completed)
            .bind(data.owner_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1");

        sqlx::query_as::<_, Todo>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists every todo in listing order (see [`sort_for_listing`])
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            SELECT {TODO_COLUMNS} FROM todos
            ORDER BY is_completed DESC, priority COLLATE "C" ASC NULLS FIRST, name COLLATE "C" ASC, id ASC
            "#
        );

        sqlx::query_as::<_, Todo>(&query).fetch_all(executor).await
    }

    /// Applies a partial update; `None` fields keep their stored value
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateTodo,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            UPDATE todos
            SET name = COALESCE($2, name),
                priority = COALESCE($3, priority),
                is_completed = COALESCE($4, is_completed),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TODO_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Todo>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.priority)
            .bind(data.is_completed)
            .fetch_optional(executor)
            .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(name: &str, priority: Option<&str>, is_completed: bool) -> Todo {
        Todo::new(CreateTodo {
            owner_id: Uuid::nil(),
            name: name.to_string(),
            priority: priority.map(str::to_string),
            is_completed,
        })
    }

    #[test]
    fn test_sort_for_listing() {
        let mut todos = vec![
            todo("b", Some("P1"), false),
            todo("a", Some("P1"), false),
            todo("c", None, false),
            todo("z", Some("P2"), true),
            todo("y", None, true),
        ];
        sort_for_listing(&mut todos);

        let names: Vec<&str> = todos.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["y", "z", "c", "a", "b"]);
    }

    #[test]
    fn test_apply_update_keeps_unset_fields() {
        let mut item = todo("Buy milk", Some("P2"), false);

        item.apply_update(UpdateTodo {
            is_completed: Some(true),
            ..Default::default()
        });

        assert_eq!(item.name, "Buy milk");
        assert_eq!(item.priority.as_deref(), Some("P2"));
        assert!(item.is_completed);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(todo("Buy milk", None, false)).unwrap();

        assert_eq!(json["owner"], Uuid::nil().to_string());
        assert!(json["priority"].is_null());
        assert_eq!(json["isCompleted"], false);
    }
}
