// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Code assistance routes backed by the configured LLM providers.

use std::str::FromStr;

use axum::{extract::State, routing::post, Json, Router};
use codepilot_server_api::{
	ChatMessageApi, ChatRequest, CommitMessageRequest, FixBugRequest, GenerateCodeRequest,
	GenerateDocsRequest, LlmOutput, LlmResponse, ModifyCodeRequest, PrDescriptionRequest,
	ReviewCodeRequest, TokenUsageApi,
};
use codepilot_server_db::NewAiInteraction;
use codepilot_server_llm::{ChatMessage, Completion, LlmProvider, ProviderChoice};
use tracing::instrument;

use crate::{
	api::AppState,
	error::ServerError,
	session::{OptionalSession, SessionUser},
};

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/llm/generate", post(generate_code))
		.route("/llm/modify", post(modify_code))
		.route("/llm/review", post(review_code))
		.route("/llm/fix", post(fix_bug))
		.route("/llm/docs", post(generate_docs))
		.route("/llm/pr-description", post(pr_description))
		.route("/llm/commit-message", post(commit_message))
		.route("/llm/chat", post(chat))
}

/// Turn the request's `provider`/`use_local` pair into a [`ProviderChoice`].
pub fn provider_choice(provider: Option<&str>, use_local: bool) -> Result<ProviderChoice, ServerError> {
	let provider = provider
		.map(str::trim)
		.filter(|p| !p.is_empty())
		.map(|p| {
			LlmProvider::from_str(p).map_err(|_| {
				ServerError::validation(
					"provider",
					format!("unknown provider '{p}', expected one of openai, siliconflow, qwen, zhipu, local"),
				)
			})
		})
		.transpose()?;
	Ok(ProviderChoice::new(provider, use_local))
}

fn parse_messages(messages: Vec<ChatMessageApi>) -> Result<Vec<ChatMessage>, ServerError> {
	if messages.is_empty() {
		return Err(ServerError::validation(
			"messages",
			"at least one message is required",
		));
	}
	messages
		.into_iter()
		.map(|m| match m.role.as_str() {
			"system" => Ok(ChatMessage::system(m.content)),
			"user" => Ok(ChatMessage::user(m.content)),
			"assistant" => Ok(ChatMessage::assistant(m.content)),
			other => Err(ServerError::validation(
				"messages",
				format!("unknown role '{other}', expected system, user or assistant"),
			)),
		})
		.collect()
}

fn require_text(field: &str, value: &str) -> Result<(), ServerError> {
	if value.trim().is_empty() {
		return Err(ServerError::validation(field, format!("{field} must not be empty")));
	}
	Ok(())
}

fn tokens(completion: &Completion) -> TokenUsageApi {
	TokenUsageApi {
		prompt: completion.prompt_tokens,
		completion: completion.completion_tokens,
		total: completion.total_tokens,
	}
}

/// Record the call for usage accounting. Failures are logged and dropped.
async fn record(
	state: &AppState,
	session: Option<&SessionUser>,
	context_type: &str,
	prompt: &str,
	completion: &Completion,
) {
	let interaction = NewAiInteraction {
		user_id: session.map(|s| s.user_id.clone()),
		provider: completion.provider.as_str().to_string(),
		model_name: completion.model.clone(),
		context_type: context_type.to_string(),
		prompt: prompt.to_string(),
		response: completion.content.clone(),
		prompt_tokens: i64::from(completion.prompt_tokens),
		completion_tokens: i64::from(completion.completion_tokens),
		total_tokens: i64::from(completion.total_tokens),
	};
	if let Err(e) = state.ai_interactions.record_interaction(&interaction).await {
		tracing::error!(context_type, error = %e, "failed to record AI interaction");
	}
}

fn respond(completion: Completion, output: impl FnOnce(String) -> LlmOutput) -> Json<LlmResponse> {
	let usage = tokens(&completion);
	Json(LlmResponse::new(output(completion.content), completion.model, usage))
}

#[utoipa::path(
	post,
	path = "/api/v1/llm/generate",
	request_body = GenerateCodeRequest,
	responses(
		(status = 200, description = "Generated code", body = LlmResponse),
		(status = 500, description = "Provider failure", body = codepilot_server_api::ErrorResponse)
	),
	tag = "llm"
)]
#[instrument(skip(state, session, request), fields(language = %request.language))]
pub async fn generate_code(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Json(request): Json<GenerateCodeRequest>,
) -> Result<Json<LlmResponse>, ServerError> {
	require_text("requirements", &request.requirements)?;
	let choice = provider_choice(request.provider.as_deref(), request.use_local)?;
	let completion = state
		.llm
		.generate_code(
			choice,
			&request.requirements,
			&request.language,
			request.context.as_deref(),
		)
		.await?;
	record(&state, session.as_ref(), "generate", &request.requirements, &completion).await;
	Ok(respond(completion, |code| LlmOutput::Code { code }))
}

#[utoipa::path(
	post,
	path = "/api/v1/llm/modify",
	request_body = ModifyCodeRequest,
	responses((status = 200, description = "Modified code", body = LlmResponse)),
	tag = "llm"
)]
#[instrument(skip(state, session, request), fields(language = %request.language))]
pub async fn modify_code(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Json(request): Json<ModifyCodeRequest>,
) -> Result<Json<LlmResponse>, ServerError> {
	require_text("original_code", &request.original_code)?;
	require_text("requirements", &request.requirements)?;
	let choice = provider_choice(request.provider.as_deref(), request.use_local)?;
	let completion = state
		.llm
		.modify_code(
			choice,
			&request.original_code,
			&request.requirements,
			&request.language,
			request.context.as_deref(),
		)
		.await?;
	record(&state, session.as_ref(), "modify", &request.requirements, &completion).await;
	Ok(respond(completion, |code| LlmOutput::Code { code }))
}

#[utoipa::path(
	post,
	path = "/api/v1/llm/review",
	request_body = ReviewCodeRequest,
	responses((status = 200, description = "Review notes", body = LlmResponse)),
	tag = "llm"
)]
#[instrument(skip(state, session, request), fields(language = %request.language))]
pub async fn review_code(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Json(request): Json<ReviewCodeRequest>,
) -> Result<Json<LlmResponse>, ServerError> {
	require_text("code", &request.code)?;
	let choice = provider_choice(request.provider.as_deref(), request.use_local)?;
	let completion = state
		.llm
		.review_code(choice, &request.code, &request.language)
		.await?;
	record(&state, session.as_ref(), "review", &request.code, &completion).await;
	Ok(respond(completion, |review| LlmOutput::Review { review }))
}

#[utoipa::path(
	post,
	path = "/api/v1/llm/fix",
	request_body = FixBugRequest,
	responses((status = 200, description = "Fixed code", body = LlmResponse)),
	tag = "llm"
)]
#[instrument(skip(state, session, request), fields(language = %request.language))]
pub async fn fix_bug(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Json(request): Json<FixBugRequest>,
) -> Result<Json<LlmResponse>, ServerError> {
	require_text("code", &request.code)?;
	require_text("error_description", &request.error_description)?;
	let choice = provider_choice(request.provider.as_deref(), request.use_local)?;
	let completion = state
		.llm
		.fix_bug(
			choice,
			&request.code,
			&request.error_description,
			&request.language,
			request.stack_trace.as_deref(),
		)
		.await?;
	record(&state, session.as_ref(), "fix", &request.error_description, &completion).await;
	Ok(respond(completion, |fixed_code| LlmOutput::FixedCode { fixed_code }))
}

#[utoipa::path(
	post,
	path = "/api/v1/llm/docs",
	request_body = GenerateDocsRequest,
	responses((status = 200, description = "Documentation", body = LlmResponse)),
	tag = "llm"
)]
#[instrument(skip(state, session, request), fields(language = %request.language))]
pub async fn generate_docs(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Json(request): Json<GenerateDocsRequest>,
) -> Result<Json<LlmResponse>, ServerError> {
	require_text("code", &request.code)?;
	let choice = provider_choice(request.provider.as_deref(), request.use_local)?;
	let completion = state
		.llm
		.generate_docs(choice, &request.code, &request.language)
		.await?;
	record(&state, session.as_ref(), "docs", &request.code, &completion).await;
	Ok(respond(completion, |documentation| LlmOutput::Documentation {
		documentation,
	}))
}

#[utoipa::path(
	post,
	path = "/api/v1/llm/pr-description",
	request_body = PrDescriptionRequest,
	responses((status = 200, description = "Pull request description", body = LlmResponse)),
	tag = "llm"
)]
#[instrument(skip_all, fields(files = request.changed_files.len()))]
pub async fn pr_description(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Json(request): Json<PrDescriptionRequest>,
) -> Result<Json<LlmResponse>, ServerError> {
	let choice = provider_choice(request.provider.as_deref(), request.use_local)?;
	let completion = state
		.llm
		.generate_pr_description(choice, &request.changed_files, &request.commit_messages)
		.await?;
	let prompt = request.commit_messages.join("\n");
	record(&state, session.as_ref(), "pr_description", &prompt, &completion).await;
	Ok(respond(completion, |description| LlmOutput::Description {
		description,
	}))
}

#[utoipa::path(
	post,
	path = "/api/v1/llm/commit-message",
	request_body = CommitMessageRequest,
	responses((status = 200, description = "Commit message", body = LlmResponse)),
	tag = "llm"
)]
#[instrument(skip_all, fields(files = request.changed_files.len()))]
pub async fn commit_message(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Json(request): Json<CommitMessageRequest>,
) -> Result<Json<LlmResponse>, ServerError> {
	let choice = provider_choice(request.provider.as_deref(), request.use_local)?;
	let completion = state
		.llm
		.generate_commit_message(choice, &request.changed_files, &request.diff_summary)
		.await?;
	record(
		&state,
		session.as_ref(),
		"commit_message",
		&request.diff_summary,
		&completion,
	)
	.await;
	Ok(respond(completion, |message| LlmOutput::Message { message }))
}

#[utoipa::path(
	post,
	path = "/api/v1/llm/chat",
	request_body = ChatRequest,
	responses(
		(status = 200, description = "Assistant reply", body = LlmResponse),
		(status = 422, description = "Empty conversation or unknown role", body = codepilot_server_api::ErrorResponse)
	),
	tag = "llm"
)]
#[instrument(skip_all, fields(messages = request.messages.len()))]
pub async fn chat(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Json(request): Json<ChatRequest>,
) -> Result<Json<LlmResponse>, ServerError> {
	let choice = provider_choice(request.provider.as_deref(), request.use_local)?;
	let prompt = request
		.messages
		.last()
		.map(|m| m.content.clone())
		.unwrap_or_default();
	let messages = parse_messages(request.messages)?;
	let completion = state
		.llm
		.chat(choice, messages, request.system_prompt.as_deref())
		.await?;
	record(&state, session.as_ref(), "chat", &prompt, &completion).await;
	Ok(respond(completion, |response| LlmOutput::Response { response }))
}
