// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

/// Embedded schema, applied in order. Every statement is idempotent.
const MIGRATIONS: &[(&str, &str)] = &[
	("001_create_users", include_str!("../migrations/001_create_users.sql")),
	("002_create_tasks", include_str!("../migrations/002_create_tasks.sql")),
	(
		"003_create_pull_requests",
		include_str!("../migrations/003_create_pull_requests.sql"),
	),
	(
		"004_create_ai_interactions",
		include_str!("../migrations/004_create_ai_interactions.sql"),
	),
];

/// Create a SqlitePool with WAL mode and foreign keys enforced.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./codepilot.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.foreign_keys(true)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Apply the embedded migrations. Safe to run on every startup.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			sqlx::query(stmt).execute(pool).await?;
		}
		tracing::debug!(migration = name, "migration applied");
	}
	tracing::info!(count = MIGRATIONS.len(), "database migrations complete");
	Ok(())
}

/// Cheap liveness probe used by the health endpoint.
pub async fn ping(pool: &SqlitePool) -> Result<(), DbError> {
	sqlx::query("SELECT 1").execute(pool).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn file_pool_migrates_twice() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("test.db").display());
		let pool = create_pool(&url).await.unwrap();
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();
		ping(&pool).await.unwrap();

		let tables: Vec<(String,)> =
			sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
				.fetch_all(&pool)
				.await
				.unwrap();
		let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
		for table in ["ai_interactions", "pull_requests", "tasks", "users"] {
			assert!(names.contains(&table), "missing table {table}");
		}
	}

	#[tokio::test]
	async fn unreachable_path_fails() {
		let result = create_pool("sqlite:/nonexistent-codepilot-dir/nested/db.sqlite").await;
		assert!(result.is_err());
	}
}
