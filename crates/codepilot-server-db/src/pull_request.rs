// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Local record of pull requests opened through the server.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;
use crate::types::{now_timestamp, parse_timestamp, NewPullRequest, PullRequestRecord};

#[async_trait]
pub trait PullRequestStore: Send + Sync {
	async fn upsert_pull_request(&self, input: &NewPullRequest) -> Result<PullRequestRecord, DbError>;
	async fn list_pull_requests_for_task(
		&self,
		task_id: &str,
	) -> Result<Vec<PullRequestRecord>, DbError>;
}

#[async_trait]
impl PullRequestStore for PullRequestRepository {
	async fn upsert_pull_request(&self, input: &NewPullRequest) -> Result<PullRequestRecord, DbError> {
		self.upsert_pull_request(input).await
	}

	async fn list_pull_requests_for_task(
		&self,
		task_id: &str,
	) -> Result<Vec<PullRequestRecord>, DbError> {
		self.list_pull_requests_for_task(task_id).await
	}
}

#[derive(Clone)]
pub struct PullRequestRepository {
	pool: SqlitePool,
}

const PR_COLUMNS: &str = "id, github_id, repository, number, title, state, html_url, \
	head_branch, base_branch, task_id, user_id, created_at, updated_at";

impl PullRequestRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Keyed on the GitHub id. A later call refreshes title and state and
	/// only replaces the task link when one is given.
	#[tracing::instrument(skip(self, input), fields(repository = %input.repository, number = input.number))]
	pub async fn upsert_pull_request(
		&self,
		input: &NewPullRequest,
	) -> Result<PullRequestRecord, DbError> {
		let id = Uuid::new_v4().to_string();
		let now = now_timestamp();

		sqlx::query(
			r#"
			INSERT INTO pull_requests (
				id, github_id, repository, number, title, state, html_url,
				head_branch, base_branch, task_id, user_id, created_at, updated_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(github_id) DO UPDATE SET
				title = excluded.title,
				state = excluded.state,
				html_url = excluded.html_url,
				base_branch = excluded.base_branch,
				task_id = COALESCE(excluded.task_id, pull_requests.task_id),
				updated_at = excluded.updated_at
			"#,
		)
		.bind(&id)
		.bind(input.github_id)
		.bind(&input.repository)
		.bind(input.number)
		.bind(&input.title)
		.bind(&input.state)
		.bind(&input.html_url)
		.bind(&input.head_branch)
		.bind(&input.base_branch)
		.bind(&input.task_id)
		.bind(&input.user_id)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await
		.map_err(DbError::from_write)?;

		let row = sqlx::query(&format!(
			"SELECT {PR_COLUMNS} FROM pull_requests WHERE github_id = ?"
		))
		.bind(input.github_id)
		.fetch_one(&self.pool)
		.await?;

		let record = parse_pull_request_row(&row)?;
		tracing::debug!(pull_request_id = %record.id, "pull request recorded");
		Ok(record)
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_pull_requests_for_task(
		&self,
		task_id: &str,
	) -> Result<Vec<PullRequestRecord>, DbError> {
		let rows = sqlx::query(&format!(
			"SELECT {PR_COLUMNS} FROM pull_requests WHERE task_id = ? ORDER BY created_at DESC, rowid DESC"
		))
		.bind(task_id)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(parse_pull_request_row).collect()
	}
}

fn parse_pull_request_row(row: &sqlx::sqlite::SqliteRow) -> Result<PullRequestRecord, DbError> {
	let created_at: String = row.try_get("created_at")?;
	let updated_at: String = row.try_get("updated_at")?;

	Ok(PullRequestRecord {
		id: row.try_get("id")?,
		github_id: row.try_get("github_id")?,
		repository: row.try_get("repository")?,
		number: row.try_get("number")?,
		title: row.try_get("title")?,
		state: row.try_get("state")?,
		html_url: row.try_get("html_url")?,
		head_branch: row.try_get("head_branch")?,
		base_branch: row.try_get("base_branch")?,
		task_id: row.try_get("task_id")?,
		user_id: row.try_get("user_id")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}
