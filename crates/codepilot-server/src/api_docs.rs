// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for codepilot-server, generated from the route
//! annotations with utoipa. The JSON document is served at
//! `/api/v1/openapi.json`; `/docs` redirects there.

use axum::{
	extract::State,
	http::{header, StatusCode},
	response::IntoResponse,
	Json,
};
use utoipa::{
	openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
	Modify, OpenApi,
};

use crate::api::{api_prefix, AppState};

#[derive(OpenApi)]
#[openapi(
	info(
		title = "Codepilot Server API",
		version = "1.0.0",
		description = "GitHub repository and pull request management with LLM code assistance.",
		license(name = "Proprietary")
	),
	tags(
		(name = "health", description = "Service banner and health checks"),
		(name = "github", description = "GitHub sign-in, repositories, branches and files"),
		(name = "pr", description = "Pull request management"),
		(name = "llm", description = "LLM code generation, review and chat"),
		(name = "tasks", description = "Task records for generated code"),
		(name = "auth", description = "Session user profile")
	),
	paths(
		crate::routes::health::root,
		crate::routes::health::health,
		crate::routes::github::auth_url,
		crate::routes::github::callback,
		crate::routes::github::exchange_token,
		crate::routes::github::get_user,
		crate::routes::github::list_repos,
		crate::routes::github::get_repo,
		crate::routes::github::list_branches,
		crate::routes::github::create_branch,
		crate::routes::github::read_file,
		crate::routes::github::write_file,
		crate::routes::github::list_files,
		crate::routes::pr::create_pr,
		crate::routes::pr::get_pr,
		crate::routes::pr::list_prs,
		crate::routes::pr::update_pr,
		crate::routes::pr::merge_pr,
		crate::routes::pr::add_comment,
		crate::routes::pr::list_pr_files,
		crate::routes::pr::create_review,
		crate::routes::llm::generate_code,
		crate::routes::llm::modify_code,
		crate::routes::llm::review_code,
		crate::routes::llm::fix_bug,
		crate::routes::llm::generate_docs,
		crate::routes::llm::pr_description,
		crate::routes::llm::commit_message,
		crate::routes::llm::chat,
		crate::routes::tasks::create_task,
		crate::routes::tasks::list_tasks,
		crate::routes::tasks::get_task,
		crate::routes::tasks::list_task_pull_requests,
		crate::routes::tasks::update_task,
		crate::routes::tasks::rename_task,
		crate::routes::tasks::archive_task,
		crate::routes::tasks::unarchive_task,
		crate::routes::tasks::delete_task,
		crate::routes::auth::current_user,
		crate::routes::auth::list_interactions,
	),
	components(
		schemas(
			codepilot_server_api::ErrorResponse,
			codepilot_server_api::ErrorBody,
			codepilot_server_api::MessageResponse,
			codepilot_server_api::RootResponse,
			codepilot_server_api::HealthResponse,
			// GitHub
			codepilot_server_api::AuthUrlResponse,
			codepilot_server_api::TokenRequest,
			codepilot_server_api::TokenResponse,
			codepilot_server_api::GitHubUserApi,
			codepilot_server_api::GitHubUserResponse,
			codepilot_server_api::RepositoryApi,
			codepilot_server_api::RepositoryDetailApi,
			codepilot_server_api::RepositoryResponse,
			codepilot_server_api::ListReposResponse,
			codepilot_server_api::BranchApi,
			codepilot_server_api::ListBranchesResponse,
			codepilot_server_api::CreateBranchRequest,
			codepilot_server_api::CreateBranchResponse,
			codepilot_server_api::FileContentResponse,
			codepilot_server_api::WriteFileRequest,
			codepilot_server_api::WriteFileResponse,
			codepilot_server_api::RepoFileApi,
			codepilot_server_api::ListFilesResponse,
			// Pull requests
			codepilot_server_api::CreatePrRequest,
			codepilot_server_api::CreatePrResponse,
			codepilot_server_api::PrDetailApi,
			codepilot_server_api::PrDetailResponse,
			codepilot_server_api::PrSummaryApi,
			codepilot_server_api::ListPrsResponse,
			codepilot_server_api::UpdatePrRequest,
			codepilot_server_api::UpdatePrResponse,
			codepilot_server_api::MergePrRequest,
			codepilot_server_api::MergePrResponse,
			codepilot_server_api::AddCommentRequest,
			codepilot_server_api::AddCommentResponse,
			codepilot_server_api::PrFileApi,
			codepilot_server_api::PrFilesResponse,
			codepilot_server_api::ReviewCommentApi,
			codepilot_server_api::CreateReviewRequest,
			codepilot_server_api::CreateReviewResponse,
			// LLM
			codepilot_server_api::GenerateCodeRequest,
			codepilot_server_api::ModifyCodeRequest,
			codepilot_server_api::ReviewCodeRequest,
			codepilot_server_api::FixBugRequest,
			codepilot_server_api::GenerateDocsRequest,
			codepilot_server_api::PrDescriptionRequest,
			codepilot_server_api::CommitMessageRequest,
			codepilot_server_api::ChatMessageApi,
			codepilot_server_api::ChatRequest,
			codepilot_server_api::TokenUsageApi,
			codepilot_server_api::LlmOutput,
			codepilot_server_api::LlmResponse,
			// Tasks
			codepilot_server_api::TaskStatusApi,
			codepilot_server_api::CreateTaskRequest,
			codepilot_server_api::UpdateTaskRequest,
			codepilot_server_api::TaskResponse,
			codepilot_server_api::RenameTaskResponse,
			codepilot_server_api::TaskPullRequestApi,
			// Auth
			codepilot_server_api::CurrentUserResponse,
			codepilot_server_api::AiInteractionApi,
		)
	),
	modifiers(&SessionSecurity)
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme used by session-protected routes.
struct SessionSecurity;

impl Modify for SessionSecurity {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		if let Some(components) = openapi.components.as_mut() {
			components.add_security_scheme(
				"bearer",
				SecurityScheme::Http(
					HttpBuilder::new()
						.scheme(HttpAuthScheme::Bearer)
						.bearer_format("JWT")
						.build(),
				),
			);
		}
	}
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
	Json(ApiDoc::openapi())
}

/// Where the JSON document lives for the configured API prefix.
pub fn openapi_path(prefix: &str) -> String {
	format!("{}/openapi.json", prefix.trim_end_matches('/'))
}

pub async fn docs_redirect(State(state): State<AppState>) -> impl IntoResponse {
	let location = openapi_path(&api_prefix(&state.config));
	(StatusCode::FOUND, [(header::LOCATION, location)])
}
