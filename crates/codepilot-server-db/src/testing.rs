// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers for tests in this and dependent crates.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::pool::run_migrations;

/// An in-memory database with the full schema applied.
///
/// The pool holds exactly one connection that never expires, because every
/// new connection to `:memory:` would open an empty database.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")
		.unwrap()
		.foreign_keys(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect_with(options)
		.await
		.expect("failed to create test pool");

	run_migrations(&pool).await.expect("migrations failed");
	pool
}
