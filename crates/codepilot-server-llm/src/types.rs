// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Chat completion types shared by every OpenAI-compatible provider.

use codepilot_server_config::LlmProvider;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	System,
	User,
	Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
	pub role: Role,
	pub content: String,
}

impl ChatMessage {
	pub fn system(content: impl Into<String>) -> Self {
		Self {
			role: Role::System,
			content: content.into(),
		}
	}

	pub fn user(content: impl Into<String>) -> Self {
		Self {
			role: Role::User,
			content: content.into(),
		}
	}

	pub fn assistant(content: impl Into<String>) -> Self {
		Self {
			role: Role::Assistant,
			content: content.into(),
		}
	}
}

/// A single completion call. The model comes from the provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
	pub messages: Vec<ChatMessage>,
	pub max_tokens: u32,
	pub temperature: f32,
}

/// Normalized result of a completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
	pub content: String,
	pub model: String,
	pub provider: LlmProvider,
	pub prompt_tokens: u32,
	pub completion_tokens: u32,
	pub total_tokens: u32,
	pub finish_reason: String,
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
	pub model: &'a str,
	pub messages: &'a [ChatMessage],
	pub max_tokens: u32,
	pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
	#[serde(default)]
	pub model: Option<String>,
	#[serde(default)]
	pub choices: Vec<ChatChoice>,
	#[serde(default)]
	pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
	pub message: ChatChoiceMessage,
	#[serde(default)]
	pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
	#[serde(default)]
	pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ChatUsage {
	pub prompt_tokens: u32,
	pub completion_tokens: u32,
	pub total_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
	pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
	pub message: String,
	#[serde(rename = "type", default)]
	pub error_type: Option<String>,
	/// Some providers send a string code, others a number.
	#[serde(default)]
	pub code: Option<serde_json::Value>,
}
