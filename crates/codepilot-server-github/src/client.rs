// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! REST client for repositories, branches, file contents and pull requests.
//!
//! Every call is made on behalf of a user and takes that user's OAuth access
//! token. Reads are retried on transient failures; writes are not, since a
//! retried `POST` could open a second pull request.

use std::collections::BTreeMap;
use std::time::Duration;

use codepilot_common_http::{retry, RetryConfig};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::GitHubError;
use crate::types::{
	Branch, CreatePullRequest, CreateReview, FileCommit, FileContent, GitHubUser, GitRef,
	IssueComment, ListPullsQuery, ListReposQuery, MergePullRequest, MergeResult, PullRequest,
	PullRequestFile, PutFileContents, Repository, Review, Tree, UpdatePullRequest,
};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone)]
pub struct GitHubClient {
	http_client: reqwest::Client,
	base_url: String,
	retry_config: RetryConfig,
}

impl GitHubClient {
	pub fn new(base_url: impl Into<String>) -> Result<Self, GitHubError> {
		let http_client = codepilot_common_http::new_client_with_timeout(Duration::from_secs(30))?;
		Ok(Self {
			http_client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			retry_config: RetryConfig::default(),
		})
	}

	pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
		self.retry_config = retry_config;
		self
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
		self
			.http_client
			.request(method, format!("{}{path}", self.base_url))
			.header("Accept", "application/vnd.github+json")
			.header("Authorization", format!("Bearer {token}"))
			.header("X-GitHub-Api-Version", API_VERSION)
	}

	async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, GitHubError> {
		let status = response.status();
		if !status.is_success() {
			let err = GitHubError::from_response(response).await;
			debug!(status = status.as_u16(), error = %err, "GitHub request failed");
			return Err(err);
		}
		let body = response.text().await?;
		serde_json::from_str(&body)
			.map_err(|e| GitHubError::InvalidResponse(format!("unexpected response body: {e}")))
	}

	async fn get<T: DeserializeOwned>(
		&self,
		token: &str,
		path: &str,
		query: &[(&str, String)],
	) -> Result<T, GitHubError> {
		retry(&self.retry_config, || async {
			let response = self
				.request(Method::GET, path, token)
				.query(query)
				.send()
				.await?;
			Self::parse(response).await
		})
		.await
	}

	async fn send<B: Serialize, T: DeserializeOwned>(
		&self,
		method: Method,
		token: &str,
		path: &str,
		body: &B,
	) -> Result<T, GitHubError> {
		let response = self.request(method, path, token).json(body).send().await?;
		Self::parse(response).await
	}

	// =========================================================================
	// Users and repositories
	// =========================================================================

	#[instrument(skip(self, token), name = "GitHubClient::get_user")]
	pub async fn get_user(&self, token: &str) -> Result<GitHubUser, GitHubError> {
		debug!("fetching authenticated user");
		self.get(token, "/user", &[]).await
	}

	#[instrument(skip(self, token, query), fields(page = query.page, per_page = query.per_page))]
	pub async fn list_repos(
		&self,
		token: &str,
		query: &ListReposQuery,
	) -> Result<Vec<Repository>, GitHubError> {
		self
			.get(
				token,
				"/user/repos",
				&[
					("sort", query.sort.clone()),
					("direction", query.direction.clone()),
					("page", query.page.max(1).to_string()),
					("per_page", query.per_page.clamp(1, MAX_PER_PAGE).to_string()),
				],
			)
			.await
	}

	#[instrument(skip(self, token))]
	pub async fn get_repo(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
	) -> Result<Repository, GitHubError> {
		self.get(token, &format!("/repos/{owner}/{repo}"), &[]).await
	}

	/// Bytes of code per language.
	#[instrument(skip(self, token))]
	pub async fn get_languages(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
	) -> Result<BTreeMap<String, u64>, GitHubError> {
		self
			.get(token, &format!("/repos/{owner}/{repo}/languages"), &[])
			.await
	}

	#[instrument(skip(self, token))]
	pub async fn list_branches(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		page: u32,
		per_page: u32,
	) -> Result<Vec<Branch>, GitHubError> {
		self
			.get(
				token,
				&format!("/repos/{owner}/{repo}/branches"),
				&[
					("page", page.max(1).to_string()),
					("per_page", per_page.clamp(1, MAX_PER_PAGE).to_string()),
				],
			)
			.await
	}

	#[instrument(skip(self, token))]
	pub async fn get_branch(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		branch: &str,
	) -> Result<Branch, GitHubError> {
		self
			.get(token, &format!("/repos/{owner}/{repo}/branches/{branch}"), &[])
			.await
	}

	/// Branch `name` off the current tip of `from`.
	#[instrument(skip(self, token))]
	pub async fn create_branch(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		name: &str,
		from: &str,
	) -> Result<GitRef, GitHubError> {
		let base = self.get_branch(token, owner, repo, from).await?;
		let git_ref: GitRef = self
			.send(
				Method::POST,
				token,
				&format!("/repos/{owner}/{repo}/git/refs"),
				&serde_json::json!({
					"ref": format!("refs/heads/{name}"),
					"sha": base.commit.sha,
				}),
			)
			.await?;
		debug!(sha = %git_ref.object.sha, "branch created");
		Ok(git_ref)
	}

	// =========================================================================
	// Contents
	// =========================================================================

	/// Directories, symlinks and submodules are refused; only regular files
	/// come back.
	#[instrument(skip(self, token))]
	pub async fn get_file(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		path: &str,
		git_ref: Option<&str>,
	) -> Result<FileContent, GitHubError> {
		let query: Vec<(&str, String)> = git_ref.map(|r| ("ref", r.to_string())).into_iter().collect();
		let value: serde_json::Value = self
			.get(token, &format!("/repos/{owner}/{repo}/contents/{path}"), &query)
			.await?;
		if value.is_array() {
			return Err(GitHubError::Api {
				status: 400,
				message: format!("{path} is a directory"),
			});
		}
		let file: FileContent = serde_json::from_value(value)
			.map_err(|e| GitHubError::InvalidResponse(format!("unexpected contents body: {e}")))?;
		if file.kind != "file" {
			return Err(GitHubError::Api {
				status: 400,
				message: format!("{path} is a {}, not a file", file.kind),
			});
		}
		Ok(file)
	}

	/// Create or replace one file with a single commit.
	#[instrument(skip(self, token, body), fields(branch = ?body.branch, replacing = body.sha.is_some()))]
	pub async fn put_file(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		path: &str,
		body: &PutFileContents,
	) -> Result<FileCommit, GitHubError> {
		let commit: FileCommit = self
			.send(
				Method::PUT,
				token,
				&format!("/repos/{owner}/{repo}/contents/{path}"),
				body,
			)
			.await?;
		debug!(commit = %commit.commit.sha, "file committed");
		Ok(commit)
	}

	/// `tree_sha` may be a commit sha; GitHub resolves it to the root tree.
	#[instrument(skip(self, token))]
	pub async fn get_tree(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		tree_sha: &str,
		recursive: bool,
	) -> Result<Tree, GitHubError> {
		let query: Vec<(&str, String)> = if recursive {
			vec![("recursive", "1".to_string())]
		} else {
			Vec::new()
		};
		let tree: Tree = self
			.get(token, &format!("/repos/{owner}/{repo}/git/trees/{tree_sha}"), &query)
			.await?;
		if tree.truncated {
			tracing::warn!(entries = tree.tree.len(), "GitHub truncated the tree listing");
		}
		Ok(tree)
	}

	// =========================================================================
	// Pull requests
	// =========================================================================

	#[instrument(skip(self, token, body), fields(head = %body.head, base = %body.base))]
	pub async fn create_pull(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		body: &CreatePullRequest,
	) -> Result<PullRequest, GitHubError> {
		let pr: PullRequest = self
			.send(Method::POST, token, &format!("/repos/{owner}/{repo}/pulls"), body)
			.await?;
		debug!(number = pr.number, "pull request created");
		Ok(pr)
	}

	#[instrument(skip(self, token))]
	pub async fn get_pull(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		number: u64,
	) -> Result<PullRequest, GitHubError> {
		self
			.get(token, &format!("/repos/{owner}/{repo}/pulls/{number}"), &[])
			.await
	}

	#[instrument(skip(self, token, query), fields(state = %query.state))]
	pub async fn list_pulls(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		query: &ListPullsQuery,
	) -> Result<Vec<PullRequest>, GitHubError> {
		let mut params = vec![
			("state", query.state.clone()),
			("sort", query.sort.clone()),
			("direction", query.direction.clone()),
			("page", query.page.max(1).to_string()),
			("per_page", query.per_page.clamp(1, MAX_PER_PAGE).to_string()),
		];
		if let Some(head) = &query.head {
			params.push(("head", head.clone()));
		}
		if let Some(base) = &query.base {
			params.push(("base", base.clone()));
		}
		self
			.get(token, &format!("/repos/{owner}/{repo}/pulls"), &params)
			.await
	}

	#[instrument(skip(self, token, update))]
	pub async fn update_pull(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		number: u64,
		update: &UpdatePullRequest,
	) -> Result<PullRequest, GitHubError> {
		self
			.send(
				Method::PATCH,
				token,
				&format!("/repos/{owner}/{repo}/pulls/{number}"),
				update,
			)
			.await
	}

	/// GitHub answers 405 when the pull request is not mergeable and 409
	/// when the head moved; both surface as [`GitHubError::Api`].
	#[instrument(skip(self, token, merge), fields(method = %merge.merge_method))]
	pub async fn merge_pull(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		number: u64,
		merge: &MergePullRequest,
	) -> Result<MergeResult, GitHubError> {
		self
			.send(
				Method::PUT,
				token,
				&format!("/repos/{owner}/{repo}/pulls/{number}/merge"),
				merge,
			)
			.await
	}

	#[instrument(skip(self, token))]
	pub async fn list_pull_files(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		number: u64,
	) -> Result<Vec<PullRequestFile>, GitHubError> {
		self
			.get(
				token,
				&format!("/repos/{owner}/{repo}/pulls/{number}/files"),
				&[("per_page", MAX_PER_PAGE.to_string())],
			)
			.await
	}

	#[instrument(skip(self, token, review), fields(event = %review.event))]
	pub async fn create_review(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		number: u64,
		review: &CreateReview,
	) -> Result<Review, GitHubError> {
		self
			.send(
				Method::POST,
				token,
				&format!("/repos/{owner}/{repo}/pulls/{number}/reviews"),
				review,
			)
			.await
	}

	#[instrument(skip(self, token))]
	pub async fn request_reviewers(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		number: u64,
		reviewers: &[String],
	) -> Result<(), GitHubError> {
		let _: serde_json::Value = self
			.send(
				Method::POST,
				token,
				&format!("/repos/{owner}/{repo}/pulls/{number}/requested_reviewers"),
				&serde_json::json!({ "reviewers": reviewers }),
			)
			.await?;
		Ok(())
	}

	/// Labels live on the issue that backs every pull request.
	#[instrument(skip(self, token))]
	pub async fn add_labels(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		number: u64,
		labels: &[String],
	) -> Result<(), GitHubError> {
		let _: serde_json::Value = self
			.send(
				Method::POST,
				token,
				&format!("/repos/{owner}/{repo}/issues/{number}/labels"),
				&serde_json::json!({ "labels": labels }),
			)
			.await?;
		Ok(())
	}

	#[instrument(skip(self, token, body))]
	pub async fn create_issue_comment(
		&self,
		token: &str,
		owner: &str,
		repo: &str,
		number: u64,
		body: &str,
	) -> Result<IssueComment, GitHubError> {
		self
			.send(
				Method::POST,
				token,
				&format!("/repos/{owner}/{repo}/issues/{number}/comments"),
				&serde_json::json!({ "body": body }),
			)
			.await
	}
}
