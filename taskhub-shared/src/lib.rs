//! # TaskHub Shared Library
//!
//! Domain types, persistence and authentication used by the TaskHub API
//! server and its seeding tool.
//!
//! ## Module Organization
//!
//! - `models`: users, tasks (with subtasks) and todos, plus their SQL
//! - `store`: storage traits and the in-memory store
//! - `db`: connection pool, migrations and the PostgreSQL store
//! - `auth`: passwords, tokens, sessions and access control
//! - `error`: the domain error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
