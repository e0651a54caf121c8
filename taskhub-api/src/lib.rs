//! # TaskHub API Server Library
//!
//! HTTP surface for TaskHub: user signup and login, shared tasks with
//! subtasks, and simple todos.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Caller, JSON and path extractors
//! - `middleware`: Security headers
//! - `routes`: API route handlers
//! - `telemetry`: Tracing subscriber setup

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod telemetry;
