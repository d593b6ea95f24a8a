/// Database models
///
/// - `user`: User accounts (the principals tasks belong to)
/// - `task`: Owner-scoped tasks and their status
///
/// Models expose their SQL as associated functions taking a `PgPool`. The
/// storage-agnostic contract over them lives in [`crate::store`].

pub mod task;
pub mod user;
