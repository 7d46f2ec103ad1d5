// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pull request management.
//!
//! Every route accepts an `access_token` query parameter and falls back to
//! the token stored for the session user.

use axum::{
	extract::{Path, Query, State},
	routing::{get, post, put},
	Json, Router,
};
use codepilot_server_api::{
	AccessTokenQuery, AddCommentRequest, AddCommentResponse, CreatePrRequest, CreatePrResponse,
	CreateReviewRequest, CreateReviewResponse, ListPrsParams, ListPrsResponse, MergePrRequest,
	MergePrResponse, PrDetailApi, PrDetailResponse, PrFileApi, PrFilesResponse, PrSummaryApi,
	UpdatePrRequest, UpdatePrResponse, STATUS_SUCCESS,
};
use codepilot_server_db::NewPullRequest;
use codepilot_server_github::{
	CreatePullRequest, CreateReview, GitHubError, ListPullsQuery, MergePullRequest, PullRequest,
	ReviewComment, UpdatePullRequest,
};
use tracing::instrument;

use super::resolve_github_token;
use crate::{api::AppState, error::ServerError, session::OptionalSession, validation};

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/pr/create", post(create_pr))
		.route("/pr/update", put(update_pr))
		.route("/pr/merge", post(merge_pr))
		.route("/pr/comment", post(add_comment))
		.route("/pr/review", post(create_review))
		.route("/pr/{owner}/{repo}", get(list_prs))
		.route("/pr/{owner}/{repo}/{number}", get(get_pr))
		.route("/pr/{owner}/{repo}/{number}/files", get(list_pr_files))
}

/// Link the PR to an issue by appending a reference to the body.
pub fn pr_body_with_issue(body: &str, issue_number: Option<i64>) -> String {
	match issue_number {
		Some(number) => format!("{body}\n\nRelated to #{number}"),
		None => body.to_string(),
	}
}

fn validate_repo(owner: &str, repo: &str) -> Result<(), ServerError> {
	validation::validate_repo_part("repo_owner", owner)?;
	validation::validate_repo_part("repo_name", repo)
}

fn validate_create(request: &CreatePrRequest) -> Result<(), ServerError> {
	validate_repo(&request.repo_owner, &request.repo_name)?;
	validation::validate_title(&request.title)?;
	validation::validate_body(&request.body)?;
	validation::validate_branch("head_branch", &request.head_branch)?;
	validation::validate_branch("base_branch", &request.base_branch)?;
	validation::validate_reviewers(&request.reviewers)?;
	validation::validate_labels(&request.labels)?;
	validation::validate_issue_number(request.issue_number)
}

#[utoipa::path(
	post,
	path = "/api/v1/pr/create",
	params(AccessTokenQuery),
	request_body = CreatePrRequest,
	responses(
		(status = 200, description = "Pull request created", body = CreatePrResponse),
		(status = 400, description = "Head branch missing", body = codepilot_server_api::ErrorResponse),
		(status = 404, description = "Linked task not found", body = codepilot_server_api::ErrorResponse),
		(status = 422, description = "Invalid input", body = codepilot_server_api::ErrorResponse)
	),
	tag = "pr"
)]
#[instrument(
	skip(state, session, query, request),
	fields(owner = %request.repo_owner, repo = %request.repo_name, head = %request.head_branch)
)]
pub async fn create_pr(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Query(query): Query<AccessTokenQuery>,
	Json(request): Json<CreatePrRequest>,
) -> Result<Json<CreatePrResponse>, ServerError> {
	validate_create(&request)?;
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;
	let (owner, repo) = (request.repo_owner.as_str(), request.repo_name.as_str());

	if let Some(task_id) = &request.task_id {
		if state.tasks.get_task(task_id).await?.is_none() {
			return Err(ServerError::not_found("Task", task_id.clone()));
		}
	}

	match state
		.github
		.get_branch(&token, owner, repo, &request.head_branch)
		.await
	{
		Ok(_) => {}
		Err(GitHubError::NotFound(_)) => {
			return Err(ServerError::BadRequest(format!(
				"Branch '{}' does not exist",
				request.head_branch
			)));
		}
		Err(e) => return Err(e.into()),
	}

	let body = pr_body_with_issue(&request.body, request.issue_number);
	let pr = state
		.github
		.create_pull(
			&token,
			owner,
			repo,
			&CreatePullRequest {
				title: request.title.clone(),
				body: (!body.is_empty()).then_some(body),
				head: request.head_branch.clone(),
				base: request.base_branch.clone(),
				draft: request.draft,
			},
		)
		.await?;

	if !request.reviewers.is_empty() {
		if let Err(e) = state
			.github
			.request_reviewers(&token, owner, repo, pr.number, &request.reviewers)
			.await
		{
			tracing::warn!(number = pr.number, error = %e, "failed to request reviewers");
		}
	}

	if !request.labels.is_empty() {
		if let Err(e) = state
			.github
			.add_labels(&token, owner, repo, pr.number, &request.labels)
			.await
		{
			tracing::warn!(number = pr.number, error = %e, "failed to add labels");
		}
	}

	let record = NewPullRequest {
		github_id: pr.id,
		repository: format!("{owner}/{repo}"),
		number: pr.number as i64,
		title: pr.title.clone(),
		state: pr.state.clone(),
		html_url: pr.html_url.clone(),
		head_branch: pr.head.ref_name.clone(),
		base_branch: pr.base.ref_name.clone(),
		task_id: request.task_id.clone(),
		user_id: session.map(|s| s.user_id),
	};
	if let Err(e) = state.pull_requests.upsert_pull_request(&record).await {
		tracing::error!(number = pr.number, error = %e, "failed to record pull request");
	}

	tracing::info!(number = pr.number, "pull request created");
	Ok(Json(CreatePrResponse {
		status: STATUS_SUCCESS.to_string(),
		pr_number: pr.number,
		pr_url: pr.html_url,
		title: pr.title,
		state: pr.state,
		head_branch: pr.head.ref_name,
		base_branch: pr.base.ref_name,
		created_at: pr.created_at,
	}))
}

#[utoipa::path(
	get,
	path = "/api/v1/pr/{owner}/{repo}/{number}",
	params(
		("owner" = String, Path, description = "Repository owner"),
		("repo" = String, Path, description = "Repository name"),
		("number" = u64, Path, description = "Pull request number"),
		AccessTokenQuery
	),
	responses((status = 200, description = "Pull request", body = PrDetailResponse)),
	tag = "pr"
)]
#[instrument(skip(state, session, query))]
pub async fn get_pr(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Path((owner, repo, number)): Path<(String, String, u64)>,
	Query(query): Query<AccessTokenQuery>,
) -> Result<Json<PrDetailResponse>, ServerError> {
	validate_repo(&owner, &repo)?;
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;
	let pr = state.github.get_pull(&token, &owner, &repo, number).await?;
	Ok(Json(PrDetailResponse {
		status: STATUS_SUCCESS.to_string(),
		pr: pr_detail_api(pr),
	}))
}

#[utoipa::path(
	get,
	path = "/api/v1/pr/{owner}/{repo}",
	params(
		("owner" = String, Path, description = "Repository owner"),
		("repo" = String, Path, description = "Repository name"),
		ListPrsParams
	),
	responses((status = 200, description = "Pull requests", body = ListPrsResponse)),
	tag = "pr"
)]
#[instrument(skip(state, session, params), fields(state = %params.state))]
pub async fn list_prs(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Path((owner, repo)): Path<(String, String)>,
	Query(params): Query<ListPrsParams>,
) -> Result<Json<ListPrsResponse>, ServerError> {
	validate_repo(&owner, &repo)?;
	validation::validate_one_of("state", &params.state, validation::LIST_PR_STATES)?;
	validation::validate_page(params.page)?;
	validation::validate_per_page(params.per_page)?;
	let token = resolve_github_token(&state, params.access_token, session.as_ref()).await?;

	let pulls = state
		.github
		.list_pulls(
			&token,
			&owner,
			&repo,
			&ListPullsQuery {
				state: params.state,
				sort: params.sort,
				direction: params.direction,
				head: params.head,
				base: params.base,
				page: params.page,
				per_page: params.per_page,
			},
		)
		.await?;

	Ok(Json(ListPrsResponse {
		status: STATUS_SUCCESS.to_string(),
		pull_requests: pulls.into_iter().map(pr_summary_api).collect(),
		page: params.page,
		per_page: params.per_page,
	}))
}

#[utoipa::path(
	put,
	path = "/api/v1/pr/update",
	params(AccessTokenQuery),
	request_body = UpdatePrRequest,
	responses((status = 200, description = "Pull request updated", body = UpdatePrResponse)),
	tag = "pr"
)]
#[instrument(skip(state, session, query, request), fields(number = request.pr_number))]
pub async fn update_pr(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Query(query): Query<AccessTokenQuery>,
	Json(request): Json<UpdatePrRequest>,
) -> Result<Json<UpdatePrResponse>, ServerError> {
	validate_repo(&request.repo_owner, &request.repo_name)?;
	if let Some(title) = &request.title {
		validation::validate_title(title)?;
	}
	if let Some(body) = &request.body {
		validation::validate_body(body)?;
	}
	if let Some(pr_state) = &request.state {
		validation::validate_one_of("state", pr_state, validation::UPDATE_PR_STATES)?;
	}
	if let Some(base) = &request.base_branch {
		validation::validate_branch("base_branch", base)?;
	}
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;

	let update = UpdatePullRequest {
		title: request.title,
		body: request.body,
		state: request.state,
		base: request.base_branch,
	};
	if update.is_empty() {
		tracing::debug!("update carries no fields");
	}

	let pr = state
		.github
		.update_pull(
			&token,
			&request.repo_owner,
			&request.repo_name,
			request.pr_number,
			&update,
		)
		.await?;

	Ok(Json(UpdatePrResponse {
		status: STATUS_SUCCESS.to_string(),
		pr_number: pr.number,
		pr_url: pr.html_url,
		message: "PR updated successfully".to_string(),
	}))
}

#[utoipa::path(
	post,
	path = "/api/v1/pr/merge",
	params(AccessTokenQuery),
	request_body = MergePrRequest,
	responses(
		(status = 200, description = "Merge result", body = MergePrResponse),
		(status = 400, description = "Pull request not mergeable", body = codepilot_server_api::ErrorResponse)
	),
	tag = "pr"
)]
#[instrument(
	skip(state, session, query, request),
	fields(number = request.pr_number, method = %request.merge_method)
)]
pub async fn merge_pr(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Query(query): Query<AccessTokenQuery>,
	Json(request): Json<MergePrRequest>,
) -> Result<Json<MergePrResponse>, ServerError> {
	validate_repo(&request.repo_owner, &request.repo_name)?;
	validation::validate_one_of(
		"merge_method",
		&request.merge_method,
		validation::MERGE_METHODS,
	)?;
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;
	let (owner, repo) = (request.repo_owner.as_str(), request.repo_name.as_str());

	let pr = state
		.github
		.get_pull(&token, owner, repo, request.pr_number)
		.await?;
	ensure_mergeable(&pr)?;

	let result = state
		.github
		.merge_pull(
			&token,
			owner,
			repo,
			request.pr_number,
			&MergePullRequest {
				commit_title: request.commit_title,
				commit_message: request.commit_message,
				merge_method: request.merge_method,
			},
		)
		.await?;

	tracing::info!(merged = result.merged, "merge attempted");
	Ok(Json(MergePrResponse {
		status: STATUS_SUCCESS.to_string(),
		merged: result.merged,
		sha: result.sha,
		message: result.message,
	}))
}

/// GitHub computes mergeability lazily, so `None` is let through and the
/// merge call decides.
pub fn ensure_mergeable(pr: &PullRequest) -> Result<(), ServerError> {
	if pr.mergeable == Some(false) {
		return Err(ServerError::BadRequest(format!(
			"PR is not mergeable. State: {}",
			pr.mergeable_state.as_deref().unwrap_or("unknown")
		)));
	}
	Ok(())
}

#[utoipa::path(
	post,
	path = "/api/v1/pr/comment",
	params(AccessTokenQuery),
	request_body = AddCommentRequest,
	responses((status = 200, description = "Comment added", body = AddCommentResponse)),
	tag = "pr"
)]
#[instrument(skip(state, session, query, request), fields(number = request.pr_number))]
pub async fn add_comment(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Query(query): Query<AccessTokenQuery>,
	Json(request): Json<AddCommentRequest>,
) -> Result<Json<AddCommentResponse>, ServerError> {
	validate_repo(&request.repo_owner, &request.repo_name)?;
	if request.body.trim().is_empty() {
		return Err(ServerError::validation("body", "body must not be empty"));
	}
	validation::validate_body(&request.body)?;
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;

	let comment = state
		.github
		.create_issue_comment(
			&token,
			&request.repo_owner,
			&request.repo_name,
			request.pr_number,
			&request.body,
		)
		.await?;

	Ok(Json(AddCommentResponse {
		status: STATUS_SUCCESS.to_string(),
		comment_id: comment.id,
		html_url: comment.html_url,
		created_at: comment.created_at,
	}))
}

#[utoipa::path(
	get,
	path = "/api/v1/pr/{owner}/{repo}/{number}/files",
	params(
		("owner" = String, Path, description = "Repository owner"),
		("repo" = String, Path, description = "Repository name"),
		("number" = u64, Path, description = "Pull request number"),
		AccessTokenQuery
	),
	responses((status = 200, description = "Changed files", body = PrFilesResponse)),
	tag = "pr"
)]
#[instrument(skip(state, session, query))]
pub async fn list_pr_files(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Path((owner, repo, number)): Path<(String, String, u64)>,
	Query(query): Query<AccessTokenQuery>,
) -> Result<Json<PrFilesResponse>, ServerError> {
	validate_repo(&owner, &repo)?;
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;

	let files: Vec<PrFileApi> = state
		.github
		.list_pull_files(&token, &owner, &repo, number)
		.await?
		.into_iter()
		.map(|f| PrFileApi {
			filename: f.filename,
			status: f.status,
			additions: f.additions,
			deletions: f.deletions,
			changes: f.changes,
			patch: f.patch,
			blob_url: f.blob_url,
			raw_url: f.raw_url,
		})
		.collect();

	Ok(Json(PrFilesResponse {
		status: STATUS_SUCCESS.to_string(),
		total: files.len(),
		files,
	}))
}

#[utoipa::path(
	post,
	path = "/api/v1/pr/review",
	params(AccessTokenQuery),
	request_body = CreateReviewRequest,
	responses((status = 200, description = "Review submitted", body = CreateReviewResponse)),
	tag = "pr"
)]
#[instrument(
	skip(state, session, query, request),
	fields(number = request.pr_number, event = %request.event)
)]
pub async fn create_review(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Query(query): Query<AccessTokenQuery>,
	Json(request): Json<CreateReviewRequest>,
) -> Result<Json<CreateReviewResponse>, ServerError> {
	validate_repo(&request.repo_owner, &request.repo_name)?;
	validation::validate_one_of("event", &request.event, validation::REVIEW_EVENTS)?;
	validation::validate_body(&request.body)?;
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;

	let review = state
		.github
		.create_review(
			&token,
			&request.repo_owner,
			&request.repo_name,
			request.pr_number,
			&CreateReview {
				body: (!request.body.is_empty()).then_some(request.body),
				event: request.event,
				comments: request
					.comments
					.into_iter()
					.map(|c| ReviewComment {
						path: c.path,
						line: c.line,
						body: c.body,
					})
					.collect(),
			},
		)
		.await?;

	Ok(Json(CreateReviewResponse {
		status: STATUS_SUCCESS.to_string(),
		review_id: review.id,
		state: review.state,
		html_url: review.html_url,
	}))
}

fn pr_detail_api(pr: PullRequest) -> PrDetailApi {
	PrDetailApi {
		number: pr.number,
		title: pr.title,
		body: pr.body,
		state: pr.state,
		html_url: pr.html_url,
		head_branch: pr.head.ref_name,
		base_branch: pr.base.ref_name,
		user: pr.user.map(|u| u.login),
		draft: pr.draft,
		mergeable: pr.mergeable,
		mergeable_state: pr.mergeable_state,
		commits: pr.commits,
		additions: pr.additions,
		deletions: pr.deletions,
		changed_files: pr.changed_files,
		created_at: pr.created_at,
		updated_at: pr.updated_at,
		merged_at: pr.merged_at,
		closed_at: pr.closed_at,
	}
}

fn pr_summary_api(pr: PullRequest) -> PrSummaryApi {
	PrSummaryApi {
		number: pr.number,
		title: pr.title,
		state: pr.state,
		html_url: pr.html_url,
		head_branch: pr.head.ref_name,
		base_branch: pr.base.ref_name,
		user: pr.user.map(|u| u.login),
		draft: pr.draft,
		created_at: pr.created_at,
		updated_at: pr.updated_at,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn pull(mergeable: Option<bool>, mergeable_state: Option<&str>) -> PullRequest {
		serde_json::from_value(serde_json::json!({
			"id": 1,
			"number": 5,
			"title": "Add feature",
			"state": "open",
			"html_url": "https://github.com/octo/repo/pull/5",
			"head": {"ref": "feature", "sha": "abc"},
			"base": {"ref": "main", "sha": "def"},
			"mergeable": mergeable,
			"mergeable_state": mergeable_state,
			"created_at": "2025-01-01T00:00:00Z",
			"updated_at": "2025-01-01T00:00:00Z"
		}))
		.unwrap()
	}

	#[test]
	fn issue_link_appended() {
		assert_eq!(
			pr_body_with_issue("Adds login", Some(42)),
			"Adds login\n\nRelated to #42"
		);
		assert_eq!(pr_body_with_issue("Adds login", None), "Adds login");
	}

	#[test]
	fn non_mergeable_pr_refused() {
		let err = ensure_mergeable(&pull(Some(false), Some("dirty"))).unwrap_err();
		assert_eq!(err.to_string(), "PR is not mergeable. State: dirty");
		assert!(ensure_mergeable(&pull(Some(true), Some("clean"))).is_ok());
		assert!(ensure_mergeable(&pull(None, None)).is_ok());
	}

	#[test]
	fn detail_maps_branches() {
		let detail = pr_detail_api(pull(Some(true), Some("clean")));
		assert_eq!(detail.head_branch, "feature");
		assert_eq!(detail.base_branch, "main");
		assert_eq!(detail.number, 5);
		assert_eq!(detail.user, None);
	}

	proptest! {
		#[test]
		fn issue_link_always_last(body in "\\PC{0,200}", number in 1i64..100_000) {
			let full = pr_body_with_issue(&body, Some(number));
			let expected_suffix = format!("Related to #{number}");
			prop_assert!(full.starts_with(&body));
			prop_assert!(full.ends_with(&expected_suffix));
		}
	}
}
