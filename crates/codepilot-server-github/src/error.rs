// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use codepilot_common_http::RetryableError;
use reqwest::{header::HeaderMap, Response, StatusCode};
use serde::Deserialize;

/// Errors raised while talking to GitHub.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
	/// The HTTP request failed before a response arrived.
	#[error("HTTP request failed: {0}")]
	Network(#[source] reqwest::Error),

	#[error("request to GitHub timed out")]
	Timeout,

	/// The access token was missing, revoked, or expired.
	#[error("GitHub rejected the credentials: {0}")]
	Unauthorized(String),

	#[error("GitHub resource not found: {0}")]
	NotFound(String),

	/// Primary or secondary rate limit hit.
	#[error("GitHub rate limit exceeded")]
	RateLimited { retry_after_secs: Option<u64> },

	/// Any other non-success response.
	#[error("GitHub API error ({status}): {message}")]
	Api { status: u16, message: String },

	/// The OAuth token endpoint refused the exchange.
	#[error("GitHub OAuth error: {0}")]
	OAuth(String),

	#[error("invalid response from GitHub: {0}")]
	InvalidResponse(String),

	#[error("invalid GitHub client configuration: {0}")]
	Config(String),
}

impl GitHubError {
	/// The HTTP status GitHub answered with, when there was one.
	pub fn status_code(&self) -> Option<u16> {
		match self {
			GitHubError::Unauthorized(_) => Some(401),
			GitHubError::NotFound(_) => Some(404),
			GitHubError::RateLimited { .. } => Some(429),
			GitHubError::Api { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Build the error for a non-success response, consuming its body.
	pub(crate) async fn from_response(response: Response) -> Self {
		let status = response.status();
		let rate_limited = is_rate_limited(status, response.headers());
		let retry_after_secs = retry_after(response.headers());
		let body = response.text().await.unwrap_or_default();
		let message = error_message(&body).unwrap_or_else(|| {
			status
				.canonical_reason()
				.unwrap_or("unknown error")
				.to_string()
		});

		if rate_limited {
			return GitHubError::RateLimited { retry_after_secs };
		}

		match status {
			StatusCode::UNAUTHORIZED => GitHubError::Unauthorized(message),
			StatusCode::NOT_FOUND => GitHubError::NotFound(message),
			_ => GitHubError::Api {
				status: status.as_u16(),
				message,
			},
		}
	}
}

impl From<reqwest::Error> for GitHubError {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			GitHubError::Timeout
		} else {
			GitHubError::Network(err)
		}
	}
}

impl RetryableError for GitHubError {
	fn is_retryable(&self) -> bool {
		match self {
			GitHubError::Timeout | GitHubError::RateLimited { .. } => true,
			GitHubError::Network(e) => e.is_retryable(),
			GitHubError::Api { status, .. } => *status >= 500,
			_ => false,
		}
	}
}

/// GitHub signals an exhausted quota with 429, or with 403 and a zero
/// remaining count.
fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
	if status == StatusCode::TOO_MANY_REQUESTS {
		return true;
	}
	status == StatusCode::FORBIDDEN
		&& headers
			.get("x-ratelimit-remaining")
			.and_then(|v| v.to_str().ok())
			== Some("0")
}

fn retry_after(headers: &HeaderMap) -> Option<u64> {
	headers
		.get("retry-after")
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.trim().parse().ok())
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
	message: Option<String>,
	#[serde(default)]
	errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
	message: Option<String>,
	code: Option<String>,
	field: Option<String>,
}

/// Flatten GitHub's `{"message", "errors": [...]}` body into one line.
fn error_message(body: &str) -> Option<String> {
	let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
	let mut message = parsed.message?;
	let details: Vec<String> = parsed
		.errors
		.into_iter()
		.filter_map(|e| {
			e.message.or(match (e.field, e.code) {
				(Some(field), Some(code)) => Some(format!("{field} {code}")),
				(None, Some(code)) => Some(code),
				_ => None,
			})
		})
		.collect();
	if !details.is_empty() {
		message = format!("{message}: {}", details.join("; "));
	}
	Some(message)
}
