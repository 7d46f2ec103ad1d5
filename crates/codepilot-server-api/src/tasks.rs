// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use codepilot_server_db::{PullRequestRecord, Task, TaskStatus};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

use crate::common::default_page;

/// Lifecycle of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TaskStatusApi {
	Draft,
	InProgress,
	Completed,
}

impl From<TaskStatus> for TaskStatusApi {
	fn from(status: TaskStatus) -> Self {
		match status {
			TaskStatus::Draft => TaskStatusApi::Draft,
			TaskStatus::InProgress => TaskStatusApi::InProgress,
			TaskStatus::Completed => TaskStatusApi::Completed,
		}
	}
}

impl From<TaskStatusApi> for TaskStatus {
	fn from(status: TaskStatusApi) -> Self {
		match status {
			TaskStatusApi::Draft => TaskStatus::Draft,
			TaskStatusApi::InProgress => TaskStatus::InProgress,
			TaskStatusApi::Completed => TaskStatus::Completed,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateTaskRequest {
	/// Defaults to `新建任务`.
	pub name: Option<String>,
	pub description: Option<String>,
	/// `owner/repo`
	pub repository: Option<String>,
	pub branch: Option<String>,
	pub requirement: Option<String>,
	pub language: Option<String>,
}

/// Fields left out (or null) are not touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateTaskRequest {
	pub name: Option<String>,
	pub description: Option<String>,
	pub repository: Option<String>,
	pub branch: Option<String>,
	pub requirement: Option<String>,
	pub generated_code: Option<String>,
	pub language: Option<String>,
	/// `draft`, `in_progress` or `completed`.
	pub status: Option<String>,
	pub is_archived: Option<bool>,
	pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct ListTasksParams {
	#[serde(default = "default_page")]
	pub page: u32,
	/// 1..=100
	#[serde(default = "default_task_per_page")]
	pub per_page: u32,
	pub status: Option<String>,
	#[serde(default)]
	pub is_archived: bool,
}

fn default_task_per_page() -> u32 {
	20
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct RenameTaskParams {
	/// 1..=255 characters.
	pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RenameTaskResponse {
	pub status: String,
	pub name: String,
}

impl RenameTaskResponse {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			status: crate::common::success(),
			name: name.into(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TaskResponse {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
	pub repository: Option<String>,
	pub branch: Option<String>,
	pub requirement: Option<String>,
	pub generated_code: Option<String>,
	pub language: Option<String>,
	pub status: TaskStatusApi,
	pub is_archived: bool,
	pub metadata: Option<serde_json::Value>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
	fn from(task: Task) -> Self {
		Self {
			id: task.id,
			name: task.name,
			description: task.description,
			repository: task.repository,
			branch: task.branch,
			requirement: task.requirement,
			generated_code: task.generated_code,
			language: task.language,
			status: task.status.into(),
			is_archived: task.is_archived,
			metadata: task.metadata,
			created_at: task.created_at,
			updated_at: task.updated_at,
		}
	}
}

/// A pull request opened for a task, as recorded when it was created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TaskPullRequestApi {
	pub github_id: i64,
	/// `owner/repo`
	pub repository: String,
	pub number: i64,
	pub title: String,
	pub state: String,
	pub html_url: String,
	pub head_branch: String,
	pub base_branch: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<PullRequestRecord> for TaskPullRequestApi {
	fn from(pr: PullRequestRecord) -> Self {
		Self {
			github_id: pr.github_id,
			repository: pr.repository,
			number: pr.number,
			title: pr.title,
			state: pr.state,
			html_url: pr.html_url,
			head_branch: pr.head_branch,
			base_branch: pr.base_branch,
			created_at: pr.created_at,
			updated_at: pr.updated_at,
		}
	}
}
