// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use codepilot_common_http::{retry, RetryConfig};
use reqwest::Client;
use tracing::{debug, error, info, instrument, trace};

use crate::error::LlmError;
use crate::provider::ProviderConfig;
use crate::types::{
	ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, Completion, CompletionRequest,
};

/// Anything that can turn a conversation into a completion.
#[async_trait]
pub trait LlmClient: Send + Sync {
	async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;
}

/// Talks to one provider. Every supported provider speaks the OpenAI chat
/// completions dialect, so only the endpoint and key differ.
#[derive(Debug, Clone)]
pub struct ChatClient {
	endpoint: ProviderConfig,
	http_client: Client,
	retry_config: RetryConfig,
}

impl ChatClient {
	pub fn new(endpoint: ProviderConfig, timeout: Duration) -> Result<Self, LlmError> {
		let http_client = codepilot_common_http::new_client_with_timeout(timeout)?;
		Ok(Self::with_http_client(endpoint, http_client))
	}

	/// Reuse an existing connection pool.
	pub fn with_http_client(endpoint: ProviderConfig, http_client: Client) -> Self {
		Self {
			endpoint,
			http_client,
			retry_config: RetryConfig {
				base_delay: Duration::from_millis(500),
				max_delay: Duration::from_secs(30),
				..Default::default()
			},
		}
	}

	pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
		self.retry_config = retry_config;
		self
	}

	pub fn endpoint(&self) -> &ProviderConfig {
		&self.endpoint
	}

	fn build_request(&self, request: &CompletionRequest) -> reqwest::RequestBuilder {
		let url = format!("{}/chat/completions", self.endpoint.base_url());
		let body = ChatCompletionRequest {
			model: self.endpoint.model(),
			messages: &request.messages,
			max_tokens: request.max_tokens,
			temperature: request.temperature,
		};

		trace!(
			url = %url,
			model = %self.endpoint.model(),
			message_count = request.messages.len(),
			"building chat completion request"
		);

		let builder = self.http_client.post(&url).json(&body);
		match self.endpoint.api_key() {
			Some(key) => builder.bearer_auth(key.expose()),
			None => builder,
		}
	}

	async fn handle_error_response(&self, response: reqwest::Response) -> LlmError {
		let status = response.status();
		debug!(status = %status, provider = %self.endpoint.provider(), "error response from provider");

		if status.as_u16() == 429 {
			let retry_after_secs = response
				.headers()
				.get("retry-after")
				.and_then(|v| v.to_str().ok())
				.and_then(|v| v.trim().parse().ok());
			return LlmError::RateLimited { retry_after_secs };
		}

		let message = match response.json::<ApiErrorBody>().await {
			Ok(body) => {
				error!(
					error_type = ?body.error.error_type,
					code = ?body.error.code,
					message = %body.error.message,
					"provider API error"
				);
				body.error.message
			}
			Err(e) => {
				error!(status = %status, parse_error = %e, "failed to parse provider error response");
				format!("HTTP {status}")
			}
		};

		if status.as_u16() == 401 {
			return LlmError::InvalidKey(message);
		}

		LlmError::Api {
			status: status.as_u16(),
			message,
		}
	}

	fn to_completion(&self, response: ChatCompletionResponse) -> Result<Completion, LlmError> {
		let usage = response.usage.unwrap_or_default();
		let choice = response
			.choices
			.into_iter()
			.next()
			.ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

		Ok(Completion {
			content: choice.message.content.unwrap_or_default(),
			model: response
				.model
				.unwrap_or_else(|| self.endpoint.model().to_string()),
			provider: self.endpoint.provider(),
			prompt_tokens: usage.prompt_tokens,
			completion_tokens: usage.completion_tokens,
			total_tokens: usage.total_tokens,
			finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
		})
	}
}

#[async_trait]
impl LlmClient for ChatClient {
	#[instrument(skip(self, request), fields(provider = %self.endpoint.provider(), model = %self.endpoint.model()))]
	async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
		debug!(
			message_count = request.messages.len(),
			max_tokens = request.max_tokens,
			"starting completion request"
		);

		let result = retry(&self.retry_config, || async {
			let response = self.build_request(&request).send().await?;

			if !response.status().is_success() {
				return Err(self.handle_error_response(response).await);
			}

			let parsed: ChatCompletionResponse = response
				.json()
				.await
				.map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
			self.to_completion(parsed)
		})
		.await;

		match &result {
			Ok(completion) => info!(
				content_len = completion.content.len(),
				prompt_tokens = completion.prompt_tokens,
				completion_tokens = completion.completion_tokens,
				finish_reason = %completion.finish_reason,
				"completion request successful"
			),
			Err(e) => error!(error = %e, "completion request failed"),
		}

		result
	}
}
