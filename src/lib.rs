//! taskboard - a three-column task board
//!
//! Tasks live in one collection persisted as a single JSON document in a
//! flat key-value store, next to a plaintext user list and a session marker.
//! Every change rewrites the collection and re-derives the todo /
//! in-progress / done columns after filtering and sorting.
//!
//! # Module Organization
//!
//! - `storage`: key-value seam (`MemoryStore`, `FileStore`)
//! - `auth`: credential store and session marker
//! - `task`: task record, priority and status
//! - `kanban_board`: the collection, filters, sorting and column moves
//! - `route`: login / dashboard navigation
//! - `ui`: terminal front end (ratatui)
//! - `cli`: one-shot commands (clap)
//! - `config`: `taskboard.toml`
//! - `export`: CSV export
//! - `error`: error type and exit codes

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod kanban_board;
pub mod route;
pub mod storage;
pub mod task;
pub mod ui;

pub use error::{Error, Result};
