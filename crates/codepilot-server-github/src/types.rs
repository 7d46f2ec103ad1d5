// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the subset of the GitHub REST API the platform uses.
//!
//! Response types only declare the fields we read; GitHub sends many more and
//! serde ignores them.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GitHubError;

/// Profile of the authenticated user from `GET /user`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubUser {
	/// Stable numeric id; survives username changes.
	pub id: i64,
	pub login: String,
	pub name: Option<String>,
	pub email: Option<String>,
	pub avatar_url: Option<String>,
	pub html_url: Option<String>,
	pub bio: Option<String>,
	pub company: Option<String>,
	pub location: Option<String>,
	#[serde(default)]
	pub public_repos: u32,
	#[serde(default)]
	pub followers: u32,
	#[serde(default)]
	pub following: u32,
	pub created_at: Option<DateTime<Utc>>,
}

/// The short user object embedded in pulls, reviews and comments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimpleUser {
	pub id: i64,
	pub login: String,
	pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repository {
	pub id: i64,
	pub name: String,
	pub full_name: String,
	pub description: Option<String>,
	pub html_url: String,
	pub clone_url: Option<String>,
	pub ssh_url: Option<String>,
	#[serde(default = "default_branch_name")]
	pub default_branch: String,
	#[serde(default)]
	pub private: bool,
	#[serde(default)]
	pub fork: bool,
	#[serde(default)]
	pub archived: bool,
	pub language: Option<String>,
	#[serde(default)]
	pub stargazers_count: u32,
	#[serde(default)]
	pub forks_count: u32,
	#[serde(default)]
	pub watchers_count: u32,
	#[serde(default)]
	pub open_issues_count: u32,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
	pub pushed_at: Option<DateTime<Utc>>,
}

fn default_branch_name() -> String {
	"main".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branch {
	pub name: String,
	pub commit: BranchCommit,
	#[serde(default)]
	pub protected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BranchCommit {
	pub sha: String,
}

/// One side of a pull request (`head` or `base`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PullRequestRef {
	#[serde(rename = "ref")]
	pub ref_name: String,
	pub sha: String,
	pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PullRequest {
	pub id: i64,
	pub number: u64,
	pub title: String,
	pub body: Option<String>,
	pub state: String,
	pub html_url: String,
	pub head: PullRequestRef,
	pub base: PullRequestRef,
	pub user: Option<SimpleUser>,
	#[serde(default)]
	pub draft: bool,
	#[serde(default)]
	pub merged: bool,
	pub mergeable: Option<bool>,
	pub mergeable_state: Option<String>,
	pub merge_commit_sha: Option<String>,
	#[serde(default)]
	pub commits: u32,
	#[serde(default)]
	pub additions: u32,
	#[serde(default)]
	pub deletions: u32,
	#[serde(default)]
	pub changed_files: u32,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub closed_at: Option<DateTime<Utc>>,
	pub merged_at: Option<DateTime<Utc>>,
}

/// A file touched by a pull request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PullRequestFile {
	pub sha: Option<String>,
	pub filename: String,
	pub status: String,
	#[serde(default)]
	pub additions: u32,
	#[serde(default)]
	pub deletions: u32,
	#[serde(default)]
	pub changes: u32,
	/// Absent for binary files and very large diffs.
	pub patch: Option<String>,
	pub blob_url: Option<String>,
	pub raw_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeResult {
	pub sha: Option<String>,
	pub merged: bool,
	pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
	pub id: i64,
	pub state: String,
	pub body: Option<String>,
	pub html_url: Option<String>,
	pub user: Option<SimpleUser>,
	pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueComment {
	pub id: i64,
	pub body: Option<String>,
	pub html_url: String,
	pub user: Option<SimpleUser>,
	pub created_at: DateTime<Utc>,
}

// =============================================================================
// Git data and contents
// =============================================================================

/// A reference as returned by `POST /repos/{owner}/{repo}/git/refs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitRef {
	/// Fully qualified, e.g. `refs/heads/feature`.
	#[serde(rename = "ref")]
	pub ref_name: String,
	pub object: GitObject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitObject {
	pub sha: String,
	#[serde(rename = "type")]
	pub kind: String,
}

/// A single file from `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileContent {
	pub name: String,
	pub path: String,
	/// Blob sha; required to overwrite the file.
	pub sha: String,
	#[serde(default)]
	pub size: u64,
	/// `file`, `symlink` or `submodule`.
	#[serde(rename = "type")]
	pub kind: String,
	/// `base64`, or `none` when the file is over the 1 MB contents limit.
	pub encoding: Option<String>,
	pub content: Option<String>,
	pub html_url: Option<String>,
}

impl FileContent {
	/// Raw bytes of the file. GitHub wraps the base64 text at 60 columns.
	pub fn decode(&self) -> Result<Vec<u8>, GitHubError> {
		match (self.encoding.as_deref(), self.content.as_deref()) {
			(Some("base64"), Some(content)) => {
				let packed: String = content.chars().filter(|c| !c.is_whitespace()).collect();
				STANDARD
					.decode(packed)
					.map_err(|e| GitHubError::InvalidResponse(format!("bad base64 content: {e}")))
			}
			(encoding, _) => Err(GitHubError::InvalidResponse(format!(
				"{} has no inline content (encoding {})",
				self.path,
				encoding.unwrap_or("missing")
			))),
		}
	}
}

/// Answer to a contents write: the new blob and the commit that holds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileCommit {
	pub content: Option<FileSummary>,
	pub commit: CommitSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSummary {
	pub path: String,
	pub sha: String,
	pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitSummary {
	pub sha: String,
	pub html_url: Option<String>,
	pub message: Option<String>,
}

/// `GET /repos/{owner}/{repo}/git/trees/{sha}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
	pub sha: String,
	pub tree: Vec<TreeEntry>,
	/// Set when GitHub cut a recursive listing short.
	#[serde(default)]
	pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeEntry {
	pub path: String,
	pub mode: String,
	/// `blob`, `tree` or `commit`.
	#[serde(rename = "type")]
	pub kind: String,
	pub sha: String,
	/// Only blobs carry a size.
	pub size: Option<u64>,
}

impl TreeEntry {
	pub fn is_file(&self) -> bool {
		self.kind == "blob"
	}
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CreatePullRequest {
	pub title: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	pub head: String,
	pub base: String,
	pub draft: bool,
}

/// Partial update; unset fields are left untouched by GitHub.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatePullRequest {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub base: Option<String>,
}

impl UpdatePullRequest {
	pub fn is_empty(&self) -> bool {
		self.title.is_none() && self.body.is_none() && self.state.is_none() && self.base.is_none()
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct MergePullRequest {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub commit_title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub commit_message: Option<String>,
	pub merge_method: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateReview {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	pub event: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub comments: Vec<ReviewComment>,
}

/// An inline review comment anchored to a line of the diff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewComment {
	pub path: String,
	pub line: u32,
	pub body: String,
}

/// Body of `PUT /repos/{owner}/{repo}/contents/{path}`. Creates the file
/// when `sha` is absent, otherwise replaces the blob with that sha.
#[derive(Debug, Clone, Serialize)]
pub struct PutFileContents {
	pub message: String,
	/// Base64 of the new file.
	pub content: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub branch: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sha: Option<String>,
}

impl PutFileContents {
	pub fn new(message: impl Into<String>, content: &[u8]) -> Self {
		Self {
			message: message.into(),
			content: STANDARD.encode(content),
			branch: None,
			sha: None,
		}
	}

	pub fn on_branch(mut self, branch: impl Into<String>) -> Self {
		self.branch = Some(branch.into());
		self
	}

	pub fn replacing(mut self, sha: Option<String>) -> Self {
		self.sha = sha;
		self
	}
}

/// Query for `GET /user/repos`.
#[derive(Debug, Clone)]
pub struct ListReposQuery {
	pub sort: String,
	pub direction: String,
	pub page: u32,
	pub per_page: u32,
}

impl Default for ListReposQuery {
	fn default() -> Self {
		Self {
			sort: "updated".to_string(),
			direction: "desc".to_string(),
			page: 1,
			per_page: 30,
		}
	}
}

/// Query for `GET /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone)]
pub struct ListPullsQuery {
	pub state: String,
	pub sort: String,
	pub direction: String,
	pub head: Option<String>,
	pub base: Option<String>,
	pub page: u32,
	pub per_page: u32,
}

impl Default for ListPullsQuery {
	fn default() -> Self {
		Self {
			state: "open".to_string(),
			sort: "created".to_string(),
			direction: "desc".to_string(),
			head: None,
			base: None,
			page: 1,
			per_page: 30,
		}
	}
}
