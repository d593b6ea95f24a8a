/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check and API index
/// - `auth`: Account endpoints (register, login, profile)
/// - `tasks`: Owner-scoped task endpoints

pub mod auth;
pub mod health;
pub mod tasks;
