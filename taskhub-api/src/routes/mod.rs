/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Signup and login
/// - `tasks`: Task CRUD
/// - `subtasks`: Subtasks nested under a task
/// - `todos`: Todo CRUD

pub mod health;
pub mod subtasks;
pub mod tasks;
pub mod todos;
pub mod users;
