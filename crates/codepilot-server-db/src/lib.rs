// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for the Codepilot server.
//!
//! Each table has a repository struct wrapping the pool and a matching
//! `*Store` trait so handlers can be tested against other backends.

pub mod ai_interaction;
pub mod error;
pub mod pool;
pub mod pull_request;
pub mod task;
pub mod testing;
pub mod types;
pub mod user;

pub use ai_interaction::{AiInteractionRepository, AiInteractionStore};
pub use error::{DbError, Result};
pub use pool::{create_pool, ping, run_migrations};
pub use pull_request::{PullRequestRepository, PullRequestStore};
pub use sqlx::SqlitePool;
pub use task::{TaskRepository, TaskStore};
pub use types::*;
pub use user::{UserRepository, UserStore};
