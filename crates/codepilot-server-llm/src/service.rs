// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Code assistant operations built on top of [`ChatClient`].

use std::time::Duration;

use codepilot_common_http::RetryConfig;
use codepilot_server_config::{LlmConfig, LlmProvider};
use tracing::{debug, instrument};

use crate::client::{ChatClient, LlmClient};
use crate::error::LlmError;
use crate::prompts;
use crate::provider::ProviderConfig;
use crate::types::{ChatMessage, Completion, CompletionRequest};

const ANALYSIS_TEMPERATURE: f32 = 0.3;
const PR_DESCRIPTION_TEMPERATURE: f32 = 0.5;
const PR_DESCRIPTION_MAX_TOKENS: u32 = 1024;
const COMMIT_MESSAGE_MAX_TOKENS: u32 = 256;

/// How a caller picks the provider for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderChoice {
	/// Wins over everything else when set.
	pub provider: Option<LlmProvider>,
	pub use_local: bool,
}

impl ProviderChoice {
	pub fn new(provider: Option<LlmProvider>, use_local: bool) -> Self {
		Self {
			provider,
			use_local,
		}
	}
}

#[derive(Debug, Clone)]
pub struct LlmService {
	config: LlmConfig,
	http_client: reqwest::Client,
	retry_config: Option<RetryConfig>,
}

impl LlmService {
	pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
		let http_client = codepilot_common_http::new_client_with_timeout(Duration::from_secs(
			config.timeout_secs,
		))?;
		Ok(Self {
			config,
			http_client,
			retry_config: None,
		})
	}

	pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
		self.retry_config = Some(retry_config);
		self
	}

	pub fn config(&self) -> &LlmConfig {
		&self.config
	}

	pub fn select_provider(&self, choice: ProviderChoice) -> LlmProvider {
		match choice {
			ProviderChoice {
				provider: Some(provider),
				..
			} => provider,
			ProviderChoice {
				use_local: true, ..
			} => LlmProvider::Local,
			_ => self.config.default_provider,
		}
	}

	/// Resolve the provider for `choice` and build a client for it.
	pub fn client_for(&self, choice: ProviderChoice) -> Result<ChatClient, LlmError> {
		let provider = self.select_provider(choice);
		let endpoint = ProviderConfig::resolve(&self.config, provider)?;
		let client = ChatClient::with_http_client(endpoint, self.http_client.clone());
		Ok(match &self.retry_config {
			Some(retry_config) => client.with_retry_config(retry_config.clone()),
			None => client,
		})
	}

	async fn complete(
		&self,
		choice: ProviderChoice,
		messages: Vec<ChatMessage>,
		temperature: Option<f32>,
		max_tokens: Option<u32>,
	) -> Result<Completion, LlmError> {
		let client = self.client_for(choice)?;
		client
			.complete(CompletionRequest {
				messages,
				max_tokens: max_tokens.unwrap_or(self.config.max_tokens),
				temperature: temperature.unwrap_or(self.config.temperature),
			})
			.await
	}

	#[instrument(skip(self, requirements, context), fields(language = %language))]
	pub async fn generate_code(
		&self,
		choice: ProviderChoice,
		requirements: &str,
		language: &str,
		context: Option<&str>,
	) -> Result<Completion, LlmError> {
		let prompt = prompts::code_generation(requirements, language, context);
		self
			.complete(
				choice,
				vec![
					ChatMessage::system(prompts::SYSTEM_DEVELOPER),
					ChatMessage::user(prompt),
				],
				None,
				None,
			)
			.await
	}

	/// Like [`Self::generate_code`], with any surrounding markdown fence
	/// removed from the returned code.
	#[instrument(skip(self, original_code, requirements, context), fields(language = %language))]
	pub async fn modify_code(
		&self,
		choice: ProviderChoice,
		original_code: &str,
		requirements: &str,
		language: &str,
		context: Option<&str>,
	) -> Result<Completion, LlmError> {
		let prompt = prompts::code_modification(original_code, requirements, language, context);
		let mut completion = self
			.complete(
				choice,
				vec![
					ChatMessage::system(prompts::SYSTEM_DEVELOPER),
					ChatMessage::user(prompt),
				],
				None,
				None,
			)
			.await?;
		completion.content = strip_code_fence(&completion.content);
		Ok(completion)
	}

	#[instrument(skip(self, code), fields(language = %language))]
	pub async fn review_code(
		&self,
		choice: ProviderChoice,
		code: &str,
		language: &str,
	) -> Result<Completion, LlmError> {
		self
			.complete(
				choice,
				vec![
					ChatMessage::system(prompts::SYSTEM_REVIEWER),
					ChatMessage::user(prompts::code_review(code, language)),
				],
				Some(ANALYSIS_TEMPERATURE),
				None,
			)
			.await
	}

	#[instrument(skip(self, code, error_description, stack_trace), fields(language = %language))]
	pub async fn fix_bug(
		&self,
		choice: ProviderChoice,
		code: &str,
		error_description: &str,
		language: &str,
		stack_trace: Option<&str>,
	) -> Result<Completion, LlmError> {
		self
			.complete(
				choice,
				vec![
					ChatMessage::system(prompts::SYSTEM_DEBUGGER),
					ChatMessage::user(prompts::bug_fix(
						code,
						error_description,
						language,
						stack_trace,
					)),
				],
				Some(ANALYSIS_TEMPERATURE),
				None,
			)
			.await
	}

	#[instrument(skip(self, code), fields(language = %language))]
	pub async fn generate_docs(
		&self,
		choice: ProviderChoice,
		code: &str,
		language: &str,
	) -> Result<Completion, LlmError> {
		self
			.complete(
				choice,
				vec![
					ChatMessage::system(prompts::SYSTEM_TECH_WRITER),
					ChatMessage::user(prompts::documentation(code, language)),
				],
				Some(ANALYSIS_TEMPERATURE),
				None,
			)
			.await
	}

	#[instrument(skip_all, fields(files = changed_files.len(), commits = commit_messages.len()))]
	pub async fn generate_pr_description(
		&self,
		choice: ProviderChoice,
		changed_files: &[String],
		commit_messages: &[String],
	) -> Result<Completion, LlmError> {
		self
			.complete(
				choice,
				vec![
					ChatMessage::system(prompts::SYSTEM_PR_WRITER),
					ChatMessage::user(prompts::pr_description(changed_files, commit_messages)),
				],
				Some(PR_DESCRIPTION_TEMPERATURE),
				Some(PR_DESCRIPTION_MAX_TOKENS),
			)
			.await
	}

	#[instrument(skip_all, fields(files = changed_files.len()))]
	pub async fn generate_commit_message(
		&self,
		choice: ProviderChoice,
		changed_files: &[String],
		diff_summary: &str,
	) -> Result<Completion, LlmError> {
		self
			.complete(
				choice,
				vec![
					ChatMessage::system(prompts::SYSTEM_COMMIT_WRITER),
					ChatMessage::user(prompts::commit_message(changed_files, diff_summary)),
				],
				Some(ANALYSIS_TEMPERATURE),
				Some(COMMIT_MESSAGE_MAX_TOKENS),
			)
			.await
	}

	/// Free-form conversation. `system_prompt` is prepended when given.
	#[instrument(skip_all, fields(messages = messages.len()))]
	pub async fn chat(
		&self,
		choice: ProviderChoice,
		messages: Vec<ChatMessage>,
		system_prompt: Option<&str>,
	) -> Result<Completion, LlmError> {
		let mut full = Vec::with_capacity(messages.len() + 1);
		if let Some(system_prompt) = system_prompt.filter(|s| !s.is_empty()) {
			full.push(ChatMessage::system(system_prompt));
		}
		full.extend(messages);
		debug!(total_messages = full.len(), "sending chat");
		self.complete(choice, full, None, None).await
	}
}

/// Remove a markdown code fence wrapped around model output.
///
/// Only a leading fence triggers stripping: its line is dropped, and the last
/// line too when it is exactly "```".
pub fn strip_code_fence(content: &str) -> String {
	if !content.starts_with("```") {
		return content.to_string();
	}
	let lines: Vec<&str> = content.split('\n').collect();
	let end = if lines.last() == Some(&"```") {
		lines.len() - 1
	} else {
		lines.len()
	};
	lines[1..end.max(1)].join("\n")
}
