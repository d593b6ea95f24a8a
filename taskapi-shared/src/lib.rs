//! # Task API Shared Library
//!
//! Domain logic for the per-user task backend: accounts, tokens, owner-scoped
//! task persistence and the bulk completion orchestrator. The HTTP server in
//! `taskapi-api` is a thin layer over this crate.
//!
//! ## Module Organization
//!
//! - `auth`: Token service, password hashing and request authentication
//! - `bulk`: Concurrent bulk "mark done"
//! - `db`: Connection pool and migrations
//! - `models`: Database models and data structures
//! - `store`: Persistence contract with PostgreSQL and in-memory backends

pub mod auth;
pub mod bulk;
pub mod db;
pub mod models;
pub mod store;
