// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

use crate::common::{default_direction, default_page, default_per_page};

/// Response for starting the OAuth flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AuthUrlResponse {
	pub auth_url: String,
	pub state: String,
}

/// Query GitHub sends back to the callback. Both fields are checked by hand
/// so a missing one can be answered with the regular error body.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct CallbackQuery {
	pub code: Option<String>,
	pub state: Option<String>,
	pub error: Option<String>,
	pub error_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TokenRequest {
	pub code: String,
	pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TokenResponse {
	pub access_token: String,
	pub token_type: String,
	pub scope: String,
}

/// Explicit GitHub token. When absent the session user's stored token is used.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct AccessTokenQuery {
	pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct ListReposParams {
	pub access_token: Option<String>,
	#[serde(default = "default_page")]
	pub page: u32,
	/// 1..=100
	#[serde(default = "default_per_page")]
	pub per_page: u32,
	#[serde(default = "default_repo_sort")]
	pub sort: String,
	#[serde(default = "default_direction")]
	pub direction: String,
}

fn default_repo_sort() -> String {
	"updated".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct GitHubUserApi {
	pub id: i64,
	pub login: String,
	pub name: Option<String>,
	pub email: Option<String>,
	pub avatar_url: Option<String>,
	pub html_url: Option<String>,
	pub bio: Option<String>,
	pub company: Option<String>,
	pub location: Option<String>,
	pub public_repos: u32,
	pub followers: u32,
	pub following: u32,
	pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct GitHubUserResponse {
	pub status: String,
	pub user: GitHubUserApi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RepositoryApi {
	pub id: i64,
	pub name: String,
	pub full_name: String,
	pub description: Option<String>,
	pub html_url: String,
	pub clone_url: Option<String>,
	pub ssh_url: Option<String>,
	pub default_branch: String,
	pub private: bool,
	pub fork: bool,
	pub archived: bool,
	pub language: Option<String>,
	pub stargazers_count: u32,
	pub forks_count: u32,
	pub watchers_count: u32,
	pub open_issues_count: u32,
	pub created_at: Option<DateTime<Utc>>,
	pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListReposResponse {
	pub status: String,
	pub repositories: Vec<RepositoryApi>,
	pub page: u32,
	pub per_page: u32,
}

/// A repository plus its language byte counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RepositoryDetailApi {
	#[serde(flatten)]
	pub repository: RepositoryApi,
	pub languages: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RepositoryResponse {
	pub status: String,
	pub repository: RepositoryDetailApi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BranchApi {
	pub name: String,
	pub protected: bool,
	pub commit_sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListBranchesResponse {
	pub status: String,
	pub branches: Vec<BranchApi>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateBranchRequest {
	pub branch_name: String,
	/// Branch the new one starts from. Defaults to the repository default.
	pub base_branch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateBranchResponse {
	pub status: String,
	pub branch: String,
	pub base_branch: String,
	/// Commit the new branch points at.
	pub sha: String,
}

/// Token plus the branch, tag or sha to read from.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct FileQuery {
	pub access_token: Option<String>,
	/// Defaults to the repository default branch.
	#[serde(rename = "ref")]
	pub git_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct FileContentResponse {
	pub status: String,
	pub path: String,
	/// Blob sha; send it back when overwriting the file.
	pub sha: String,
	pub size: u64,
	pub content: String,
	pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WriteFileRequest {
	pub content: String,
	/// Commit message.
	pub message: String,
	pub branch: String,
	/// Sha of the blob being replaced. Looked up on `branch` when omitted.
	pub sha: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WriteFileResponse {
	pub status: String,
	pub path: String,
	pub branch: String,
	/// New blob sha.
	pub sha: Option<String>,
	pub commit_sha: String,
	pub commit_url: Option<String>,
	/// False when the file did not exist before.
	pub replaced: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct ListFilesParams {
	pub access_token: Option<String>,
	/// Defaults to the repository default branch.
	#[serde(rename = "ref")]
	pub git_ref: Option<String>,
	/// Only files under this directory.
	pub path: Option<String>,
	/// Comma separated, e.g. `rs,toml`.
	pub extensions: Option<String>,
}

impl ListFilesParams {
	/// Lowercased extensions without the leading dot.
	pub fn extension_list(&self) -> Vec<String> {
		self.extensions
			.as_deref()
			.unwrap_or_default()
			.split(',')
			.map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
			.filter(|e| !e.is_empty())
			.collect()
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RepoFileApi {
	pub path: String,
	pub sha: String,
	pub size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListFilesResponse {
	pub status: String,
	#[serde(rename = "ref")]
	pub git_ref: String,
	pub files: Vec<RepoFileApi>,
	/// GitHub stopped the listing early.
	pub truncated: bool,
}
