// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bodies for the LLM routes. Every request may pick a `provider` by name
//! or ask for the local model with `use_local`.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

fn default_language() -> String {
	"python".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct GenerateCodeRequest {
	pub requirements: String,
	#[serde(default = "default_language")]
	pub language: String,
	pub context: Option<String>,
	#[serde(default)]
	pub use_local: bool,
	/// `openai`, `siliconflow`, `qwen`, `zhipu` or `local`.
	pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ModifyCodeRequest {
	pub original_code: String,
	pub requirements: String,
	#[serde(default = "default_language")]
	pub language: String,
	pub context: Option<String>,
	#[serde(default)]
	pub use_local: bool,
	pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ReviewCodeRequest {
	pub code: String,
	#[serde(default = "default_language")]
	pub language: String,
	#[serde(default)]
	pub use_local: bool,
	pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct FixBugRequest {
	pub code: String,
	pub error_description: String,
	#[serde(default = "default_language")]
	pub language: String,
	pub stack_trace: Option<String>,
	#[serde(default)]
	pub use_local: bool,
	pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct GenerateDocsRequest {
	pub code: String,
	#[serde(default = "default_language")]
	pub language: String,
	#[serde(default)]
	pub use_local: bool,
	pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PrDescriptionRequest {
	pub changed_files: Vec<String>,
	pub commit_messages: Vec<String>,
	#[serde(default)]
	pub use_local: bool,
	pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CommitMessageRequest {
	pub changed_files: Vec<String>,
	pub diff_summary: String,
	#[serde(default)]
	pub use_local: bool,
	pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ChatMessageApi {
	/// `system`, `user` or `assistant`.
	pub role: String,
	pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ChatRequest {
	pub messages: Vec<ChatMessageApi>,
	pub system_prompt: Option<String>,
	#[serde(default)]
	pub use_local: bool,
	pub provider: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TokenUsageApi {
	pub prompt: u32,
	pub completion: u32,
	pub total: u32,
}

/// Shared shape of every LLM response. The payload sits under a
/// route-specific key (`code`, `review`, `fixed_code`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LlmResponse {
	pub status: String,
	#[serde(flatten)]
	pub output: LlmOutput,
	pub model: String,
	pub tokens: TokenUsageApi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(untagged)]
pub enum LlmOutput {
	Code { code: String },
	Review { review: String },
	FixedCode { fixed_code: String },
	Documentation { documentation: String },
	Description { description: String },
	Message { message: String },
	Response { response: String },
}

impl LlmResponse {
	pub fn new(output: LlmOutput, model: impl Into<String>, tokens: TokenUsageApi) -> Self {
		Self {
			status: crate::common::success(),
			output,
			model: model.into(),
			tokens,
		}
	}
}
