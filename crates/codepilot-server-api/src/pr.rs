// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

use crate::common::{default_direction, default_page, default_per_page, default_state_open};

fn default_base_branch() -> String {
	"main".to_string()
}

fn default_merge_method() -> String {
	"merge".to_string()
}

fn default_review_event() -> String {
	"COMMENT".to_string()
}

fn default_pr_sort() -> String {
	"created".to_string()
}

/// Request to open a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreatePrRequest {
	pub repo_owner: String,
	pub repo_name: String,
	pub title: String,
	#[serde(default)]
	pub body: String,
	pub head_branch: String,
	#[serde(default = "default_base_branch")]
	pub base_branch: String,
	#[serde(default)]
	pub draft: bool,
	#[serde(default)]
	pub reviewers: Vec<String>,
	#[serde(default)]
	pub labels: Vec<String>,
	/// Appended to the body as `Related to #N`.
	pub issue_number: Option<i64>,
	/// Local task to link the new pull request to.
	pub task_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreatePrResponse {
	pub status: String,
	pub pr_number: u64,
	pub pr_url: String,
	pub title: String,
	pub state: String,
	pub head_branch: String,
	pub base_branch: String,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PrDetailApi {
	pub number: u64,
	pub title: String,
	pub body: Option<String>,
	pub state: String,
	pub html_url: String,
	pub head_branch: String,
	pub base_branch: String,
	/// Author login.
	pub user: Option<String>,
	pub draft: bool,
	pub mergeable: Option<bool>,
	pub mergeable_state: Option<String>,
	pub commits: u32,
	pub additions: u32,
	pub deletions: u32,
	pub changed_files: u32,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub merged_at: Option<DateTime<Utc>>,
	pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PrDetailResponse {
	pub status: String,
	pub pr: PrDetailApi,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct ListPrsParams {
	pub access_token: Option<String>,
	/// `open`, `closed` or `all`.
	#[serde(default = "default_state_open")]
	pub state: String,
	#[serde(default = "default_pr_sort")]
	pub sort: String,
	#[serde(default = "default_direction")]
	pub direction: String,
	pub base: Option<String>,
	pub head: Option<String>,
	#[serde(default = "default_page")]
	pub page: u32,
	#[serde(default = "default_per_page")]
	pub per_page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PrSummaryApi {
	pub number: u64,
	pub title: String,
	pub state: String,
	pub html_url: String,
	pub head_branch: String,
	pub base_branch: String,
	pub user: Option<String>,
	pub draft: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListPrsResponse {
	pub status: String,
	pub pull_requests: Vec<PrSummaryApi>,
	pub page: u32,
	pub per_page: u32,
}

/// Only the supplied fields are sent to GitHub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdatePrRequest {
	pub repo_owner: String,
	pub repo_name: String,
	pub pr_number: u64,
	pub title: Option<String>,
	pub body: Option<String>,
	/// `open` or `closed`.
	pub state: Option<String>,
	pub base_branch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdatePrResponse {
	pub status: String,
	pub pr_number: u64,
	pub pr_url: String,
	pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MergePrRequest {
	pub repo_owner: String,
	pub repo_name: String,
	pub pr_number: u64,
	pub commit_title: Option<String>,
	pub commit_message: Option<String>,
	/// `merge`, `squash` or `rebase`.
	#[serde(default = "default_merge_method")]
	pub merge_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MergePrResponse {
	pub status: String,
	pub merged: bool,
	pub sha: Option<String>,
	pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AddCommentRequest {
	pub repo_owner: String,
	pub repo_name: String,
	pub pr_number: u64,
	pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AddCommentResponse {
	pub status: String,
	pub comment_id: i64,
	pub html_url: String,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PrFileApi {
	pub filename: String,
	pub status: String,
	pub additions: u32,
	pub deletions: u32,
	pub changes: u32,
	pub patch: Option<String>,
	pub blob_url: Option<String>,
	pub raw_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PrFilesResponse {
	pub status: String,
	pub files: Vec<PrFileApi>,
	pub total: usize,
}

/// Inline comment attached to a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ReviewCommentApi {
	pub path: String,
	pub line: u32,
	pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateReviewRequest {
	pub repo_owner: String,
	pub repo_name: String,
	pub pr_number: u64,
	#[serde(default)]
	pub body: String,
	/// `APPROVE`, `REQUEST_CHANGES` or `COMMENT`.
	#[serde(default = "default_review_event")]
	pub event: String,
	#[serde(default)]
	pub comments: Vec<ReviewCommentApi>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateReviewResponse {
	pub status: String,
	pub review_id: i64,
	pub state: String,
	pub html_url: Option<String>,
}
