/// Access control decisions for tasks and todos
///
/// Every check here is a pure function of the caller and the resource: no
/// store access, no I/O. Handlers load the resource first, then ask.
///
/// # Rules
///
/// | Action | Allowed for |
/// |---|---|
/// | read task | anyone, including anonymous callers |
/// | create task | any authenticated caller (who becomes the owner) |
/// | update task, any subtask change | owner or collaborator |
/// | delete task | owner only |
/// | update / delete todo | owner only |
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::access::{authorize_task, TaskAction};
/// use taskhub_shared::auth::session::AuthContext;
/// use taskhub_shared::models::task::{CreateTask, Task};
/// use uuid::Uuid;
///
/// let owner = AuthContext::new(Uuid::new_v4(), "owner@example.com");
/// let task = Task::new(CreateTask {
///     owner_id: owner.user_id,
///     name: "Write report".to_string(),
///     status: Default::default(),
///     priority: Default::default(),
///     is_completed: false,
///     collaborators: vec![],
/// });
///
/// assert!(authorize_task(Some(&owner), &task, TaskAction::Delete).is_ok());
/// assert!(authorize_task(None, &task, TaskAction::Read).is_ok());
/// assert!(authorize_task(None, &task, TaskAction::Update).is_err());
/// ```

use uuid::Uuid;

use super::session::AuthContext;
use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// No resolved identity on the request
    #[error("Unauthorized: No token provided")]
    Unauthenticated,

    /// Caller must own the resource
    #[error("Unauthorised: you must own the {resource} to be able to {verb} it")]
    NotOwner {
        resource: &'static str,
        verb: &'static str,
    },

    /// Caller must own or collaborate on the task
    #[error("Unauthorised: you must either own or be a collaborator on the task to {0}")]
    NotOwnerOrCollaborator(&'static str),
}

/// Things a caller can attempt on an existing task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Read,
    Update,
    Delete,
    CreateSubtask,
    UpdateSubtask,
    DeleteSubtask,
}

impl TaskAction {
    fn verb(&self) -> &'static str {
        match self {
            TaskAction::Read => "read it",
            TaskAction::Update => "edit it",
            TaskAction::Delete => "delete",
            TaskAction::CreateSubtask => "add subtasks",
            TaskAction::UpdateSubtask => "edit its subtasks",
            TaskAction::DeleteSubtask => "delete its subtasks",
        }
    }
}

/// Decides whether `caller` may perform `action` on `task`
pub fn authorize_task(
    caller: Option<&AuthContext>,
    task: &Task,
    action: TaskAction,
) -> Result<(), AuthzError> {
    if action == TaskAction::Read {
        return Ok(());
    }

    let caller = caller.ok_or(AuthzError::Unauthenticated)?;

    match action {
        TaskAction::Read => Ok(()),
        TaskAction::Delete => require_ownership(Some(caller), task.owner_id, "task", action.verb()),
        _ if task.is_owner(caller.user_id) || task.is_collaborator(caller.user_id) => Ok(()),
        _ => Err(AuthzError::NotOwnerOrCollaborator(action.verb())),
    }
}

/// Task creation only needs an identity; returns the ID that becomes the owner
pub fn authorize_task_create(caller: Option<&AuthContext>) -> Result<Uuid, AuthzError> {
    caller
        .map(|c| c.user_id)
        .ok_or(AuthzError::Unauthenticated)
}

/// Strict ownership check
///
/// `resource` and `verb` only shape the denial message, e.g. "item" and
/// "delete" give "you must own the item to be able to delete it".
pub fn require_ownership(
    caller: Option<&AuthContext>,
    owner_id: Uuid,
    resource: &'static str,
    verb: &'static str,
) -> Result<(), AuthzError> {
    let caller = caller.ok_or(AuthzError::Unauthenticated)?;

    if caller.user_id != owner_id {
        return Err(AuthzError::NotOwner { resource, verb });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::CreateTask;

    struct Fixture {
        owner: AuthContext,
        collaborator: AuthContext,
        stranger: AuthContext,
        task: Task,
    }

    fn fixture() -> Fixture {
        let owner = AuthContext::new(Uuid::new_v4(), "owner@example.com");
        let collaborator = AuthContext::new(Uuid::new_v4(), "collab@example.com");
        let stranger = AuthContext::new(Uuid::new_v4(), "stranger@example.com");
        let task = Task::new(CreateTask {
            owner_id: owner.user_id,
            name: "Shared task".to_string(),
            status: Default::default(),
            priority: Default::default(),
            is_completed: false,
            collaborators: vec![collaborator.user_id],
        });

        Fixture {
            owner,
            collaborator,
            stranger,
            task,
        }
    }

    #[test]
    fn test_read_is_open() {
        let f = fixture();

        assert!(authorize_task(None, &f.task, TaskAction::Read).is_ok());
        assert!(authorize_task(Some(&f.stranger), &f.task, TaskAction::Read).is_ok());
    }

    #[test]
    fn test_owner_may_do_everything() {
        let f = fixture();

        for action in [
            TaskAction::Update,
            TaskAction::Delete,
            TaskAction::CreateSubtask,
            TaskAction::UpdateSubtask,
            TaskAction::DeleteSubtask,
        ] {
            assert!(authorize_task(Some(&f.owner), &f.task, action).is_ok(), "{action:?}");
        }
    }

    #[test]
    fn test_collaborator_may_edit_but_not_delete() {
        let f = fixture();

        assert!(authorize_task(Some(&f.collaborator), &f.task, TaskAction::Update).is_ok());
        assert!(authorize_task(Some(&f.collaborator), &f.task, TaskAction::CreateSubtask).is_ok());
        assert!(authorize_task(Some(&f.collaborator), &f.task, TaskAction::UpdateSubtask).is_ok());
        assert!(authorize_task(Some(&f.collaborator), &f.task, TaskAction::DeleteSubtask).is_ok());

        let err = authorize_task(Some(&f.collaborator), &f.task, TaskAction::Delete).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unauthorised: you must own the task to be able to delete it"
        );
    }

    #[test]
    fn test_stranger_is_denied() {
        let f = fixture();

        let err = authorize_task(Some(&f.stranger), &f.task, TaskAction::Update).unwrap_err();
        assert_eq!(err, AuthzError::NotOwnerOrCollaborator("edit it"));
        assert!(authorize_task(Some(&f.stranger), &f.task, TaskAction::DeleteSubtask).is_err());
        assert!(authorize_task(Some(&f.stranger), &f.task, TaskAction::Delete).is_err());
    }

    #[test]
    fn test_anonymous_mutation_is_unauthenticated() {
        let f = fixture();

        assert_eq!(
            authorize_task(None, &f.task, TaskAction::Update),
            Err(AuthzError::Unauthenticated)
        );
        assert_eq!(authorize_task_create(None), Err(AuthzError::Unauthenticated));
    }

    #[test]
    fn test_create_returns_caller_as_owner() {
        let f = fixture();
        assert_eq!(authorize_task_create(Some(&f.stranger)), Ok(f.stranger.user_id));
    }

    #[test]
    fn test_require_ownership() {
        let f = fixture();

        assert!(require_ownership(Some(&f.owner), f.owner.user_id, "item", "delete").is_ok());

        let err = require_ownership(Some(&f.stranger), f.owner.user_id, "item", "delete").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unauthorised: you must own the item to be able to delete it"
        );
    }
}
