// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Task repository.
//!
//! A task is a saved piece of development work: a requirement, the target
//! repository and branch, and whatever code has been generated for it.
//! Listings are newest-first by `updated_at`.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use crate::error::DbError;
use crate::types::{
	now_timestamp, parse_timestamp, NewTask, Task, TaskFilter, TaskPatch, TaskStatus,
	DEFAULT_TASK_NAME,
};

#[async_trait]
pub trait TaskStore: Send + Sync {
	async fn create_task(&self, input: &NewTask) -> Result<Task, DbError>;
	async fn get_task(&self, id: &str) -> Result<Option<Task>, DbError>;
	async fn list_tasks(&self, filter: &TaskFilter) -> Result<(Vec<Task>, i64), DbError>;
	async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, DbError>;
	async fn rename_task(&self, id: &str, name: &str) -> Result<Task, DbError>;
	async fn set_archived(&self, id: &str, archived: bool) -> Result<Task, DbError>;
	async fn delete_task(&self, id: &str) -> Result<bool, DbError>;
}

#[async_trait]
impl TaskStore for TaskRepository {
	async fn create_task(&self, input: &NewTask) -> Result<Task, DbError> {
		self.create_task(input).await
	}

	async fn get_task(&self, id: &str) -> Result<Option<Task>, DbError> {
		self.get_task(id).await
	}

	async fn list_tasks(&self, filter: &TaskFilter) -> Result<(Vec<Task>, i64), DbError> {
		self.list_tasks(filter).await
	}

	async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, DbError> {
		self.update_task(id, patch).await
	}

	async fn rename_task(&self, id: &str, name: &str) -> Result<Task, DbError> {
		self.rename_task(id, name).await
	}

	async fn set_archived(&self, id: &str, archived: bool) -> Result<Task, DbError> {
		self.set_archived(id, archived).await
	}

	async fn delete_task(&self, id: &str) -> Result<bool, DbError> {
		self.delete_task(id).await
	}
}

#[derive(Clone)]
pub struct TaskRepository {
	pool: SqlitePool,
}

const TASK_COLUMNS: &str = "id, name, description, repository, branch, requirement, \
	generated_code, language, status, is_archived, metadata, user_id, created_at, updated_at";

impl TaskRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a draft task. A blank name becomes [`DEFAULT_TASK_NAME`].
	#[tracing::instrument(skip(self, input))]
	pub async fn create_task(&self, input: &NewTask) -> Result<Task, DbError> {
		let id = Uuid::new_v4().to_string();
		let now = now_timestamp();
		let name = input
			.name
			.as_deref()
			.map(str::trim)
			.filter(|n| !n.is_empty())
			.unwrap_or(DEFAULT_TASK_NAME);

		sqlx::query(
			r#"
			INSERT INTO tasks (
				id, name, description, repository, branch, requirement, language,
				status, is_archived, user_id, created_at, updated_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
			"#,
		)
		.bind(&id)
		.bind(name)
		.bind(&input.description)
		.bind(&input.repository)
		.bind(&input.branch)
		.bind(&input.requirement)
		.bind(&input.language)
		.bind(TaskStatus::Draft.as_str())
		.bind(&input.user_id)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await
		.map_err(DbError::from_write)?;

		tracing::debug!(task_id = %id, "task created");
		self.require(&id).await
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_task(&self, id: &str) -> Result<Option<Task>, DbError> {
		let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		row.as_ref().map(parse_task_row).transpose()
	}

	/// One page of tasks plus the total matching the filter.
	#[tracing::instrument(skip(self), fields(page = filter.page, per_page = filter.per_page))]
	pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<(Vec<Task>, i64), DbError> {
		let per_page = i64::from(filter.per_page.max(1));
		let offset = i64::from(filter.page.max(1) - 1) * per_page;

		let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tasks");
		push_filter(&mut count, filter);
		let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

		let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
		push_filter(&mut query, filter);
		query.push(" ORDER BY updated_at DESC, rowid DESC LIMIT ");
		query.push_bind(per_page);
		query.push(" OFFSET ");
		query.push_bind(offset);

		let rows = query.build().fetch_all(&self.pool).await?;
		let tasks = rows.iter().map(parse_task_row).collect::<Result<Vec<_>, _>>()?;

		Ok((tasks, total))
	}

	/// Apply every field present in `patch` and bump `updated_at`.
	#[tracing::instrument(skip(self, patch))]
	pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, DbError> {
		let metadata = patch
			.metadata
			.as_ref()
			.map(serde_json::to_string)
			.transpose()?;

		let mut query = QueryBuilder::<Sqlite>::new("UPDATE tasks SET updated_at = ");
		query.push_bind(now_timestamp());

		let text_fields = [
			("name", patch.name.as_deref().map(str::trim).filter(|n| !n.is_empty())),
			("description", patch.description.as_deref()),
			("repository", patch.repository.as_deref()),
			("branch", patch.branch.as_deref()),
			("requirement", patch.requirement.as_deref()),
			("generated_code", patch.generated_code.as_deref()),
			("language", patch.language.as_deref()),
			("status", patch.status.as_ref().map(TaskStatus::as_str)),
			("metadata", metadata.as_deref()),
		];
		for (column, value) in text_fields {
			if let Some(value) = value {
				query.push(format!(", {column} = "));
				query.push_bind(value.to_string());
			}
		}
		if let Some(archived) = patch.is_archived {
			query.push(", is_archived = ");
			query.push_bind(archived);
		}

		query.push(" WHERE id = ");
		query.push_bind(id.to_string());

		let result = query
			.build()
			.execute(&self.pool)
			.await
			.map_err(DbError::from_write)?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("task {id}")));
		}

		tracing::debug!(task_id = %id, "task updated");
		self.require(id).await
	}

	pub async fn rename_task(&self, id: &str, name: &str) -> Result<Task, DbError> {
		let patch = TaskPatch {
			name: Some(name.to_string()),
			..Default::default()
		};
		self.update_task(id, &patch).await
	}

	pub async fn set_archived(&self, id: &str, archived: bool) -> Result<Task, DbError> {
		let patch = TaskPatch {
			is_archived: Some(archived),
			..Default::default()
		};
		self.update_task(id, &patch).await
	}

	/// Returns `false` if no task had this id.
	#[tracing::instrument(skip(self))]
	pub async fn delete_task(&self, id: &str) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
			.bind(id)
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::debug!(task_id = %id, "task deleted");
		}
		Ok(deleted)
	}

	async fn require(&self, id: &str) -> Result<Task, DbError> {
		self.get_task(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("task {id}")))
	}
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &TaskFilter) {
	query.push(" WHERE is_archived = ");
	query.push_bind(filter.is_archived);
	if let Some(status) = filter.status {
		query.push(" AND status = ");
		query.push_bind(status.as_str());
	}
}

fn parse_task_row(row: &sqlx::sqlite::SqliteRow) -> Result<Task, DbError> {
	let status: String = row.try_get("status")?;
	let metadata: Option<String> = row.try_get("metadata")?;
	let created_at: String = row.try_get("created_at")?;
	let updated_at: String = row.try_get("updated_at")?;

	Ok(Task {
		id: row.try_get("id")?,
		name: row.try_get("name")?,
		description: row.try_get("description")?,
		repository: row.try_get("repository")?,
		branch: row.try_get("branch")?,
		requirement: row.try_get("requirement")?,
		generated_code: row.try_get("generated_code")?,
		language: row.try_get("language")?,
		status: status.parse()?,
		is_archived: row.try_get("is_archived")?,
		metadata: metadata
			.as_deref()
			.map(serde_json::from_str::<serde_json::Value>)
			.transpose()?,
		user_id: row.try_get("user_id")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}
