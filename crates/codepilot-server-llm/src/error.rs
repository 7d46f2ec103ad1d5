// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use codepilot_common_http::RetryableError;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
	#[error("HTTP error: {0}")]
	Http(String),

	#[error("request timed out")]
	Timeout,

	#[error("LLM API error ({status}): {message}")]
	Api { status: u16, message: String },

	#[error("rate limited by provider")]
	RateLimited { retry_after_secs: Option<u64> },

	#[error("provider rejected the API key: {0}")]
	InvalidKey(String),

	#[error("invalid response: {0}")]
	InvalidResponse(String),

	/// The selected provider lacks a key or endpoint.
	#[error("{0}")]
	NotConfigured(String),
}

impl From<reqwest::Error> for LlmError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			LlmError::Timeout
		} else {
			LlmError::Http(err.to_string())
		}
	}
}

impl RetryableError for LlmError {
	fn is_retryable(&self) -> bool {
		match self {
			LlmError::Http(_) | LlmError::Timeout | LlmError::RateLimited { .. } => true,
			LlmError::Api { status, .. } => *status >= 500,
			_ => false,
		}
	}
}
