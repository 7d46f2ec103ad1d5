// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub sign-in, repository browsing and the write path that puts
//! generated code onto a branch: branch creation, file reads and commits.

use std::path::Path as FsPath;

use axum::{
	extract::{Path, Query, State},
	http::{header::LOCATION, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
	Json, Router,
};
use codepilot_common_secret::SecretString;
use codepilot_server_api::{
	AccessTokenQuery, AuthUrlResponse, BranchApi, CallbackQuery, CreateBranchRequest,
	CreateBranchResponse, FileContentResponse, FileQuery, GitHubUserApi, GitHubUserResponse,
	ListBranchesResponse, ListFilesParams, ListFilesResponse, ListReposParams, ListReposResponse,
	RepoFileApi, RepositoryApi, RepositoryDetailApi, RepositoryResponse, TokenRequest,
	TokenResponse, WriteFileRequest, WriteFileResponse, STATUS_SUCCESS,
};
use codepilot_server_db::GitHubUserUpsert;
use codepilot_server_github::{
	Branch, GitHubError, GitHubTokenResponse, GitHubUser, ListReposQuery, PutFileContents,
	Repository,
};
use tracing::instrument;
use url::Url;

use super::resolve_github_token;
use crate::{
	api::AppState,
	error::ServerError,
	oauth_state::generate_state,
	session::{OptionalSession, SessionUser},
	validation,
};

const INVALID_STATE: &str = "Invalid state parameter";
const BRANCHES_PER_PAGE: u32 = 100;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/github/auth", get(auth_url))
		.route("/github/callback", get(callback))
		.route("/github/token", post(exchange_token))
		.route("/github/user", get(get_user))
		.route("/github/repos", get(list_repos))
		.route("/github/repos/{owner}/{repo}", get(get_repo))
		.route(
			"/github/repos/{owner}/{repo}/branches",
			get(list_branches).post(create_branch),
		)
		.route(
			"/github/repos/{owner}/{repo}/contents/{*path}",
			get(read_file).put(write_file),
		)
		.route("/github/repos/{owner}/{repo}/tree", get(list_files))
}

// ============================================================================
// OAuth
// ============================================================================

#[utoipa::path(
	get,
	path = "/api/v1/github/auth",
	responses(
		(status = 200, description = "Authorization URL", body = AuthUrlResponse),
		(status = 500, description = "OAuth not configured", body = codepilot_server_api::ErrorResponse)
	),
	tag = "github"
)]
#[instrument(skip(state))]
pub async fn auth_url(State(state): State<AppState>) -> Result<Json<AuthUrlResponse>, ServerError> {
	let oauth = state.github_oauth()?;
	let oauth_state = generate_state();
	state
		.oauth_states
		.store(oauth_state.clone(), &oauth.config().client_id)
		.await;

	Ok(Json(AuthUrlResponse {
		auth_url: oauth.authorization_url(&oauth_state),
		state: oauth_state,
	}))
}

#[utoipa::path(
	get,
	path = "/api/v1/github/callback",
	params(CallbackQuery),
	responses(
		(status = 302, description = "Redirect to the frontend with the session or an error"),
		(status = 400, description = "Missing code or state", body = codepilot_server_api::ErrorResponse)
	),
	tag = "github"
)]
#[instrument(skip(state, query))]
pub async fn callback(
	State(state): State<AppState>,
	Query(query): Query<CallbackQuery>,
) -> Result<Response, ServerError> {
	let frontend_url = state.config.http.frontend_url.clone();

	if let Some(error) = query.error {
		let message = query.error_description.unwrap_or(error);
		tracing::warn!(error = %message, "GitHub authorization was denied");
		return callback_redirect(&frontend_url, &[("error", message.as_str())]);
	}

	let (Some(code), Some(oauth_state)) = (query.code, query.state) else {
		return Err(ServerError::BadRequest(
			"Missing code or state parameter".to_string(),
		));
	};

	match sign_in(&state, &code, &oauth_state).await {
		Ok(signed_in) => callback_redirect(
			&frontend_url,
			&[
				("token", signed_in.access_token.expose().as_str()),
				("session", signed_in.session_token.as_str()),
			],
		),
		Err(e) => {
			tracing::warn!(error = %e, "GitHub sign-in failed");
			callback_redirect(&frontend_url, &[("error", e.redirect_message().as_str())])
		}
	}
}

#[utoipa::path(
	post,
	path = "/api/v1/github/token",
	request_body = TokenRequest,
	responses(
		(status = 200, description = "Access token", body = TokenResponse),
		(status = 400, description = "Invalid state or code", body = codepilot_server_api::ErrorResponse)
	),
	tag = "github"
)]
#[instrument(skip(state, request))]
pub async fn exchange_token(
	State(state): State<AppState>,
	Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ServerError> {
	let token = exchange_code(&state, &request.code, &request.state).await?;
	Ok(Json(TokenResponse {
		access_token: token.access_token.expose().to_string(),
		token_type: token.token_type,
		scope: token.scope,
	}))
}

struct SignedIn {
	access_token: SecretString,
	session_token: String,
}

/// Check the state, swap the code for a token, then record the user and
/// open a session.
async fn sign_in(
	state: &AppState,
	code: &str,
	oauth_state: &str,
) -> Result<SignedIn, ServerError> {
	let oauth = state.github_oauth()?;
	consume_state(state, &oauth.config().client_id, oauth_state).await?;
	let token = oauth.exchange_code(code).await.map_err(|e| match e {
		GitHubError::OAuth(message) | GitHubError::Unauthorized(message) => {
			ServerError::GitHubAuth(format!("GitHub auth error: {message}"))
		}
		other => other.into(),
	})?;
	let github_user = state.github.get_user(token.access_token.expose()).await?;

	let user = state
		.users
		.upsert_github_user(&GitHubUserUpsert {
			github_id: github_user.id,
			username: github_user.login,
			email: github_user.email,
			name: github_user.name,
			avatar_url: github_user.avatar_url,
			access_token: token.access_token.clone(),
		})
		.await?;

	let session_token = state.session_keys.mint(&SessionUser {
		user_id: user.id.clone(),
		username: user.username.clone(),
		email: user.email.clone(),
		scopes: parse_granted_scopes(&token.scope),
	})?;

	tracing::info!(user_id = %user.id, username = %user.username, "user signed in with GitHub");
	Ok(SignedIn {
		access_token: token.access_token,
		session_token,
	})
}

async fn exchange_code(
	state: &AppState,
	code: &str,
	oauth_state: &str,
) -> Result<GitHubTokenResponse, ServerError> {
	let oauth = state.github_oauth()?;
	consume_state(state, &oauth.config().client_id, oauth_state).await?;

	oauth.exchange_code(code).await.map_err(|e| match e {
		GitHubError::OAuth(message) | GitHubError::Unauthorized(message) => {
			ServerError::BadRequest(message)
		}
		other => other.into(),
	})
}

async fn consume_state(
	state: &AppState,
	client_id: &str,
	oauth_state: &str,
) -> Result<(), ServerError> {
	state
		.oauth_states
		.validate_and_consume(oauth_state, client_id)
		.await
		.map_err(|rejection| {
			tracing::debug!(?rejection, "OAuth state rejected");
			ServerError::BadRequest(INVALID_STATE.to_string())
		})
}

/// GitHub reports granted scopes comma separated.
fn parse_granted_scopes(scope: &str) -> Vec<String> {
	scope
		.split([',', ' '])
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
		.collect()
}

fn callback_redirect(frontend_url: &str, params: &[(&str, &str)]) -> Result<Response, ServerError> {
	let location = callback_location(frontend_url, params)?;
	let value = HeaderValue::from_str(&location)
		.map_err(|e| ServerError::Internal(format!("invalid redirect location: {e}")))?;
	Ok((StatusCode::FOUND, [(LOCATION, value)]).into_response())
}

fn callback_location(frontend_url: &str, params: &[(&str, &str)]) -> Result<String, ServerError> {
	let mut url = Url::parse(&format!(
		"{}/github/callback",
		frontend_url.trim_end_matches('/')
	))
	.map_err(|e| ServerError::Configuration(format!("invalid frontend URL: {e}")))?;
	{
		let mut query = url.query_pairs_mut();
		for (key, value) in params {
			query.append_pair(key, value);
		}
	}
	Ok(url.into())
}

// ============================================================================
// Users and repositories
// ============================================================================

#[utoipa::path(
	get,
	path = "/api/v1/github/user",
	params(AccessTokenQuery),
	responses(
		(status = 200, description = "Authenticated GitHub user", body = GitHubUserResponse),
		(status = 401, description = "Invalid or expired access token", body = codepilot_server_api::ErrorResponse)
	),
	tag = "github"
)]
#[instrument(skip(state, session, query))]
pub async fn get_user(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Query(query): Query<AccessTokenQuery>,
) -> Result<Json<GitHubUserResponse>, ServerError> {
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;
	let user = state.github.get_user(&token).await?;
	Ok(Json(GitHubUserResponse {
		status: STATUS_SUCCESS.to_string(),
		user: user_api(user),
	}))
}

#[utoipa::path(
	get,
	path = "/api/v1/github/repos",
	params(ListReposParams),
	responses(
		(status = 200, description = "Repositories of the user", body = ListReposResponse),
		(status = 422, description = "Invalid paging", body = codepilot_server_api::ErrorResponse)
	),
	tag = "github"
)]
#[instrument(skip(state, session, params), fields(page = params.page, per_page = params.per_page))]
pub async fn list_repos(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Query(params): Query<ListReposParams>,
) -> Result<Json<ListReposResponse>, ServerError> {
	validation::validate_page(params.page)?;
	validation::validate_per_page(params.per_page)?;
	let token = resolve_github_token(&state, params.access_token, session.as_ref()).await?;

	let repositories = state
		.github
		.list_repos(
			&token,
			&ListReposQuery {
				sort: params.sort,
				direction: params.direction,
				page: params.page,
				per_page: params.per_page,
			},
		)
		.await?;

	Ok(Json(ListReposResponse {
		status: STATUS_SUCCESS.to_string(),
		repositories: repositories.into_iter().map(repository_api).collect(),
		page: params.page,
		per_page: params.per_page,
	}))
}

#[utoipa::path(
	get,
	path = "/api/v1/github/repos/{owner}/{repo}",
	params(
		("owner" = String, Path, description = "Repository owner"),
		("repo" = String, Path, description = "Repository name"),
		AccessTokenQuery
	),
	responses(
		(status = 200, description = "Repository with languages", body = RepositoryResponse),
		(status = 404, description = "Repository not found", body = codepilot_server_api::ErrorResponse)
	),
	tag = "github"
)]
#[instrument(skip(state, session, query))]
pub async fn get_repo(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Path((owner, repo)): Path<(String, String)>,
	Query(query): Query<AccessTokenQuery>,
) -> Result<Json<RepositoryResponse>, ServerError> {
	validation::validate_repo_part("owner", &owner)?;
	validation::validate_repo_part("repo", &repo)?;
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;

	let repository = state.github.get_repo(&token, &owner, &repo).await?;
	let languages = match state.github.get_languages(&token, &owner, &repo).await {
		Ok(languages) => languages,
		Err(e) => {
			tracing::warn!(error = %e, "failed to fetch repository languages");
			Default::default()
		}
	};

	Ok(Json(RepositoryResponse {
		status: STATUS_SUCCESS.to_string(),
		repository: RepositoryDetailApi {
			repository: repository_api(repository),
			languages,
		},
	}))
}

#[utoipa::path(
	get,
	path = "/api/v1/github/repos/{owner}/{repo}/branches",
	params(
		("owner" = String, Path, description = "Repository owner"),
		("repo" = String, Path, description = "Repository name"),
		AccessTokenQuery
	),
	responses((status = 200, description = "Branches", body = ListBranchesResponse)),
	tag = "github"
)]
#[instrument(skip(state, session, query))]
pub async fn list_branches(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Path((owner, repo)): Path<(String, String)>,
	Query(query): Query<AccessTokenQuery>,
) -> Result<Json<ListBranchesResponse>, ServerError> {
	validation::validate_repo_part("owner", &owner)?;
	validation::validate_repo_part("repo", &repo)?;
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;

	let branches = state
		.github
		.list_branches(&token, &owner, &repo, 1, BRANCHES_PER_PAGE)
		.await?;

	Ok(Json(ListBranchesResponse {
		status: STATUS_SUCCESS.to_string(),
		branches: branches.into_iter().map(branch_api).collect(),
	}))
}

#[utoipa::path(
	post,
	path = "/api/v1/github/repos/{owner}/{repo}/branches",
	params(
		("owner" = String, Path, description = "Repository owner"),
		("repo" = String, Path, description = "Repository name"),
		AccessTokenQuery
	),
	request_body = CreateBranchRequest,
	responses(
		(status = 200, description = "Branch created", body = CreateBranchResponse),
		(status = 404, description = "Base branch not found", body = codepilot_server_api::ErrorResponse),
		(status = 422, description = "Invalid name or branch already exists", body = codepilot_server_api::ErrorResponse)
	),
	tag = "github"
)]
#[instrument(skip(state, session, query, request), fields(branch = %request.branch_name))]
pub async fn create_branch(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Path((owner, repo)): Path<(String, String)>,
	Query(query): Query<AccessTokenQuery>,
	Json(request): Json<CreateBranchRequest>,
) -> Result<Json<CreateBranchResponse>, ServerError> {
	validation::validate_repo_part("owner", &owner)?;
	validation::validate_repo_part("repo", &repo)?;
	validation::validate_branch("branch_name", &request.branch_name)?;
	if let Some(base) = &request.base_branch {
		validation::validate_branch("base_branch", base)?;
	}
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;

	let base_branch = match request.base_branch {
		Some(base) => base,
		None => state.github.get_repo(&token, &owner, &repo).await?.default_branch,
	};
	let git_ref = state
		.github
		.create_branch(&token, &owner, &repo, &request.branch_name, &base_branch)
		.await?;

	tracing::info!(base = %base_branch, sha = %git_ref.object.sha, "branch created");
	Ok(Json(CreateBranchResponse {
		status: STATUS_SUCCESS.to_string(),
		branch: request.branch_name,
		base_branch,
		sha: git_ref.object.sha,
	}))
}

// ============================================================================
// Files
// ============================================================================

#[utoipa::path(
	get,
	path = "/api/v1/github/repos/{owner}/{repo}/contents/{path}",
	params(
		("owner" = String, Path, description = "Repository owner"),
		("repo" = String, Path, description = "Repository name"),
		("path" = String, Path, description = "File path inside the repository"),
		FileQuery
	),
	responses(
		(status = 200, description = "File text", body = FileContentResponse),
		(status = 400, description = "Directory, binary or oversized file", body = codepilot_server_api::ErrorResponse),
		(status = 404, description = "File not found", body = codepilot_server_api::ErrorResponse)
	),
	tag = "github"
)]
#[instrument(skip(state, session, query), fields(git_ref = ?query.git_ref))]
pub async fn read_file(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Path((owner, repo, path)): Path<(String, String, String)>,
	Query(query): Query<FileQuery>,
) -> Result<Json<FileContentResponse>, ServerError> {
	let path = path.trim_start_matches('/');
	validation::validate_repo_part("owner", &owner)?;
	validation::validate_repo_part("repo", &repo)?;
	validation::validate_file_path("path", path)?;
	if let Some(git_ref) = &query.git_ref {
		validation::validate_branch("ref", git_ref)?;
	}
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;

	let file = state
		.github
		.get_file(&token, &owner, &repo, path, query.git_ref.as_deref())
		.await?;
	if file.encoding.as_deref() == Some("none") {
		return Err(ServerError::BadRequest(format!(
			"{path} is larger than the 1 MB contents limit"
		)));
	}
	let content = String::from_utf8(file.decode()?)
		.map_err(|_| ServerError::BadRequest(format!("{path} is not UTF-8 text")))?;

	Ok(Json(FileContentResponse {
		status: STATUS_SUCCESS.to_string(),
		path: file.path,
		sha: file.sha,
		size: file.size,
		content,
		html_url: file.html_url,
	}))
}

/// Create or overwrite one file on a branch as a single commit.
#[utoipa::path(
	put,
	path = "/api/v1/github/repos/{owner}/{repo}/contents/{path}",
	params(
		("owner" = String, Path, description = "Repository owner"),
		("repo" = String, Path, description = "Repository name"),
		("path" = String, Path, description = "File path inside the repository"),
		AccessTokenQuery
	),
	request_body = WriteFileRequest,
	responses(
		(status = 200, description = "File committed", body = WriteFileResponse),
		(status = 404, description = "Branch not found", body = codepilot_server_api::ErrorResponse),
		(status = 409, description = "The file changed since `sha` was read", body = codepilot_server_api::ErrorResponse),
		(status = 422, description = "Invalid input", body = codepilot_server_api::ErrorResponse)
	),
	tag = "github"
)]
#[instrument(skip(state, session, query, request), fields(branch = %request.branch))]
pub async fn write_file(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Path((owner, repo, path)): Path<(String, String, String)>,
	Query(query): Query<AccessTokenQuery>,
	Json(request): Json<WriteFileRequest>,
) -> Result<Json<WriteFileResponse>, ServerError> {
	let path = path.trim_start_matches('/');
	validation::validate_repo_part("owner", &owner)?;
	validation::validate_repo_part("repo", &repo)?;
	validation::validate_file_path("path", path)?;
	validation::validate_branch("branch", &request.branch)?;
	validation::validate_commit_message(&request.message)?;
	validation::validate_file_content(&request.content)?;
	let token = resolve_github_token(&state, query.access_token, session.as_ref()).await?;

	let previous_sha = match request.sha {
		Some(sha) => Some(sha),
		None => current_blob_sha(&state, &token, &owner, &repo, path, &request.branch).await?,
	};
	let replaced = previous_sha.is_some();
	let body = PutFileContents::new(request.message, request.content.as_bytes())
		.on_branch(request.branch.as_str())
		.replacing(previous_sha);
	let commit = state
		.github
		.put_file(&token, &owner, &repo, path, &body)
		.await?;

	tracing::info!(path, commit = %commit.commit.sha, replaced, "file committed");
	Ok(Json(WriteFileResponse {
		status: STATUS_SUCCESS.to_string(),
		path: path.to_string(),
		branch: request.branch,
		sha: commit.content.map(|c| c.sha),
		commit_sha: commit.commit.sha,
		commit_url: commit.commit.html_url,
		replaced,
	}))
}

/// Sha of the blob at `path` on `branch`, or `None` when there is no such file yet.
async fn current_blob_sha(
	state: &AppState,
	token: &str,
	owner: &str,
	repo: &str,
	path: &str,
	branch: &str,
) -> Result<Option<String>, ServerError> {
	match state
		.github
		.get_file(token, owner, repo, path, Some(branch))
		.await
	{
		Ok(file) => Ok(Some(file.sha)),
		Err(GitHubError::NotFound(_)) => Ok(None),
		Err(e) => Err(e.into()),
	}
}

/// Files (never directories) of a branch, tag or commit.
#[utoipa::path(
	get,
	path = "/api/v1/github/repos/{owner}/{repo}/tree",
	params(
		("owner" = String, Path, description = "Repository owner"),
		("repo" = String, Path, description = "Repository name"),
		ListFilesParams
	),
	responses(
		(status = 200, description = "Files", body = ListFilesResponse),
		(status = 404, description = "Unknown ref", body = codepilot_server_api::ErrorResponse),
		(status = 422, description = "Invalid input", body = codepilot_server_api::ErrorResponse)
	),
	tag = "github"
)]
#[instrument(skip(state, session, params), fields(git_ref = ?params.git_ref))]
pub async fn list_files(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Path((owner, repo)): Path<(String, String)>,
	Query(params): Query<ListFilesParams>,
) -> Result<Json<ListFilesResponse>, ServerError> {
	validation::validate_repo_part("owner", &owner)?;
	validation::validate_repo_part("repo", &repo)?;
	if let Some(git_ref) = &params.git_ref {
		validation::validate_branch("ref", git_ref)?;
	}
	let directory = params
		.path
		.as_deref()
		.map(|p| p.trim_matches('/'))
		.filter(|p| !p.is_empty());
	if let Some(directory) = directory {
		validation::validate_file_path("path", directory)?;
	}
	let extensions = params.extension_list();
	let token = resolve_github_token(&state, params.access_token.clone(), session.as_ref()).await?;

	let git_ref = match params.git_ref.clone() {
		Some(git_ref) => git_ref,
		None => state.github.get_repo(&token, &owner, &repo).await?.default_branch,
	};
	let tree = state
		.github
		.get_tree(&token, &owner, &repo, &git_ref, true)
		.await?;

	let files: Vec<RepoFileApi> = tree
		.tree
		.into_iter()
		.filter(|entry| entry.is_file() && keep_file(&entry.path, directory, &extensions))
		.map(|entry| RepoFileApi {
			path: entry.path,
			sha: entry.sha,
			size: entry.size,
		})
		.collect();

	tracing::debug!(returned = files.len(), truncated = tree.truncated, "listed files");
	Ok(Json(ListFilesResponse {
		status: STATUS_SUCCESS.to_string(),
		git_ref,
		files,
		truncated: tree.truncated,
	}))
}

/// Whether `path` lies under `directory` and carries one of `extensions`.
/// An empty extension list keeps every file.
fn keep_file(path: &str, directory: Option<&str>, extensions: &[String]) -> bool {
	if let Some(directory) = directory {
		let under = path
			.strip_prefix(directory)
			.is_some_and(|rest| rest.starts_with('/'));
		if !under {
			return false;
		}
	}
	if extensions.is_empty() {
		return true;
	}
	FsPath::new(path)
		.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

fn user_api(user: GitHubUser) -> GitHubUserApi {
	GitHubUserApi {
		id: user.id,
		login: user.login,
		name: user.name,
		email: user.email,
		avatar_url: user.avatar_url,
		html_url: user.html_url,
		bio: user.bio,
		company: user.company,
		location: user.location,
		public_repos: user.public_repos,
		followers: user.followers,
		following: user.following,
		created_at: user.created_at,
	}
}

fn repository_api(repo: Repository) -> RepositoryApi {
	RepositoryApi {
		id: repo.id,
		name: repo.name,
		full_name: repo.full_name,
		description: repo.description,
		html_url: repo.html_url,
		clone_url: repo.clone_url,
		ssh_url: repo.ssh_url,
		default_branch: repo.default_branch,
		private: repo.private,
		fork: repo.fork,
		archived: repo.archived,
		language: repo.language,
		stargazers_count: repo.stargazers_count,
		forks_count: repo.forks_count,
		watchers_count: repo.watchers_count,
		open_issues_count: repo.open_issues_count,
		created_at: repo.created_at,
		updated_at: repo.updated_at,
	}
}

fn branch_api(branch: Branch) -> BranchApi {
	BranchApi {
		name: branch.name,
		protected: branch.protected,
		commit_sha: branch.commit.sha,
	}
}
