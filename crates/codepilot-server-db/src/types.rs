// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Row types and inputs for the repositories.

use chrono::{DateTime, SecondsFormat, Utc};
use codepilot_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::DbError;

pub const DEFAULT_TASK_NAME: &str = "新建任务";

/// Fixed-width RFC 3339 so that TEXT ordering matches time ordering.
pub(crate) fn now_timestamp() -> String {
	format_timestamp(Utc::now())
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn parse_optional_timestamp(
	value: Option<String>,
	column: &str,
) -> Result<Option<DateTime<Utc>>, DbError> {
	value.map(|v| parse_timestamp(&v, column)).transpose()
}

// =============================================================================
// Users
// =============================================================================

/// A GitHub-backed account. The access token is only available through
/// `UserStore::get_access_token`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub id: String,
	pub github_id: i64,
	pub username: String,
	pub email: Option<String>,
	pub name: Option<String>,
	pub avatar_url: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub last_login_at: Option<DateTime<Utc>>,
}

/// Profile and token captured at OAuth sign-in.
#[derive(Debug, Clone)]
pub struct GitHubUserUpsert {
	pub github_id: i64,
	pub username: String,
	pub email: Option<String>,
	pub name: Option<String>,
	pub avatar_url: Option<String>,
	pub access_token: SecretString,
}

// =============================================================================
// Tasks
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
	#[default]
	Draft,
	InProgress,
	Completed,
}

impl TaskStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			TaskStatus::Draft => "draft",
			TaskStatus::InProgress => "in_progress",
			TaskStatus::Completed => "completed",
		}
	}
}

impl std::fmt::Display for TaskStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for TaskStatus {
	type Err = DbError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"draft" => Ok(TaskStatus::Draft),
			"in_progress" => Ok(TaskStatus::InProgress),
			"completed" => Ok(TaskStatus::Completed),
			other => Err(DbError::Internal(format!("unknown task status '{other}'"))),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
	/// `owner/repo`
	pub repository: Option<String>,
	pub branch: Option<String>,
	pub requirement: Option<String>,
	pub generated_code: Option<String>,
	pub language: Option<String>,
	pub status: TaskStatus,
	pub is_archived: bool,
	pub metadata: Option<serde_json::Value>,
	pub user_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
	/// Falls back to [`DEFAULT_TASK_NAME`].
	pub name: Option<String>,
	pub description: Option<String>,
	pub repository: Option<String>,
	pub branch: Option<String>,
	pub requirement: Option<String>,
	pub language: Option<String>,
	pub user_id: Option<String>,
}

/// Partial update. `None` leaves the column as it is.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
	pub name: Option<String>,
	pub description: Option<String>,
	pub repository: Option<String>,
	pub branch: Option<String>,
	pub requirement: Option<String>,
	pub generated_code: Option<String>,
	pub language: Option<String>,
	pub status: Option<TaskStatus>,
	pub is_archived: Option<bool>,
	pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct TaskFilter {
	/// 1-based.
	pub page: u32,
	pub per_page: u32,
	pub status: Option<TaskStatus>,
	pub is_archived: bool,
}

impl Default for TaskFilter {
	fn default() -> Self {
		Self {
			page: 1,
			per_page: 20,
			status: None,
			is_archived: false,
		}
	}
}

// =============================================================================
// Pull requests
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestRecord {
	pub id: String,
	pub github_id: i64,
	pub repository: String,
	pub number: i64,
	pub title: String,
	pub state: String,
	pub html_url: String,
	pub head_branch: String,
	pub base_branch: String,
	pub task_id: Option<String>,
	pub user_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPullRequest {
	pub github_id: i64,
	pub repository: String,
	pub number: i64,
	pub title: String,
	pub state: String,
	pub html_url: String,
	pub head_branch: String,
	pub base_branch: String,
	pub task_id: Option<String>,
	pub user_id: Option<String>,
}

// =============================================================================
// AI interactions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiInteraction {
	pub id: String,
	pub user_id: Option<String>,
	pub provider: String,
	pub model_name: String,
	/// Which operation produced it, e.g. `generate` or `review`.
	pub context_type: String,
	pub prompt: String,
	pub response: String,
	pub prompt_tokens: i64,
	pub completion_tokens: i64,
	pub total_tokens: i64,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAiInteraction {
	pub user_id: Option<String>,
	pub provider: String,
	pub model_name: String,
	pub context_type: String,
	pub prompt: String,
	pub response: String,
	pub prompt_tokens: i64,
	pub completion_tokens: i64,
	pub total_tokens: i64,
}
