// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::{header, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use codepilot_server_api::{ErrorBody, ErrorResponse};
use codepilot_server_db::DbError;
use codepilot_server_github::GitHubError;
use codepilot_server_llm::LlmError;
use serde_json::json;

use crate::request_id;

const GENERIC_INTERNAL_MESSAGE: &str = "An internal error occurred";
const GENERIC_DATABASE_MESSAGE: &str = "A database error occurred";

/// The single error type returned by handlers and middleware.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("{0}")]
	AuthenticationFailed(String),

	#[error("{0}")]
	InvalidToken(String),

	#[error("Token has expired")]
	TokenExpired,

	/// Request payload failed validation.
	#[error("{message}")]
	Validation {
		field: Option<String>,
		message: String,
	},

	#[error("{0}")]
	BadRequest(String),

	#[error("{resource_type} not found")]
	NotFound {
		resource_type: String,
		resource_id: Option<String>,
	},

	#[error("{0}")]
	Conflict(String),

	/// GitHub answered with an error, or could not be reached at all.
	#[error("GitHub API error: {message}")]
	GitHubApi {
		status: Option<u16>,
		message: String,
	},

	#[error("{0}")]
	GitHubAuth(String),

	#[error("GitHub API rate limit exceeded")]
	GitHubRateLimit { retry_after_secs: Option<u64> },

	#[error("LLM API error: {0}")]
	Llm(String),

	#[error("LLM API rate limit exceeded")]
	LlmRateLimit { retry_after_secs: Option<u64> },

	#[error("Invalid LLM API key: {0}")]
	LlmInvalidKey(String),

	#[error("{0}")]
	Configuration(String),

	#[error("Database error: {0}")]
	Database(DbError),

	#[error("Rate limit exceeded")]
	RateLimited { retry_after_secs: u64 },

	#[error("Internal error: {0}")]
	Internal(String),
}

impl ServerError {
	pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
		ServerError::Validation {
			field: Some(field.into()),
			message: message.into(),
		}
	}

	pub fn not_found(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
		ServerError::NotFound {
			resource_type: resource_type.into(),
			resource_id: Some(resource_id.into()),
		}
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			ServerError::AuthenticationFailed(_)
			| ServerError::InvalidToken(_)
			| ServerError::TokenExpired
			| ServerError::GitHubAuth(_)
			| ServerError::LlmInvalidKey(_) => StatusCode::UNAUTHORIZED,
			ServerError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
			ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ServerError::NotFound { .. } => StatusCode::NOT_FOUND,
			ServerError::Conflict(_) => StatusCode::CONFLICT,
			ServerError::GitHubApi { status, .. } => github_status(*status),
			ServerError::GitHubRateLimit { .. }
			| ServerError::LlmRateLimit { .. }
			| ServerError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
			ServerError::Llm(_)
			| ServerError::Configuration(_)
			| ServerError::Database(_)
			| ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub fn error_code(&self) -> &'static str {
		match self {
			ServerError::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
			ServerError::InvalidToken(_) => "INVALID_TOKEN",
			ServerError::TokenExpired => "TOKEN_EXPIRED",
			ServerError::Validation { .. } => "VALIDATION_ERROR",
			ServerError::BadRequest(_) => "BAD_REQUEST",
			ServerError::NotFound { .. } => "RESOURCE_NOT_FOUND",
			ServerError::Conflict(_) => "RESOURCE_EXISTS",
			ServerError::GitHubApi { .. } => "GITHUB_API_ERROR",
			ServerError::GitHubAuth(_) => "GITHUB_AUTH_ERROR",
			ServerError::GitHubRateLimit { .. } => "GITHUB_RATE_LIMIT",
			ServerError::Llm(_) => "OPENAI_API_ERROR",
			ServerError::LlmRateLimit { .. } => "OPENAI_RATE_LIMIT",
			ServerError::LlmInvalidKey(_) => "OPENAI_INVALID_KEY",
			ServerError::Configuration(_) => "CONFIGURATION_ERROR",
			ServerError::Database(_) => "DATABASE_ERROR",
			ServerError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
			ServerError::Internal(_) => "INTERNAL_ERROR",
		}
	}

	fn details(&self) -> Option<serde_json::Value> {
		match self {
			ServerError::Validation {
				field: Some(field), ..
			} => Some(json!({ "field": field })),
			ServerError::NotFound {
				resource_type,
				resource_id,
			} => Some(json!({
				"resource_type": resource_type,
				"resource_id": resource_id,
			})),
			ServerError::GitHubApi {
				status: Some(status),
				..
			} => Some(json!({ "github_status_code": status })),
			ServerError::GitHubRateLimit {
				retry_after_secs: Some(secs),
			}
			| ServerError::LlmRateLimit {
				retry_after_secs: Some(secs),
			}
			| ServerError::RateLimited {
				retry_after_secs: secs,
			} => Some(json!({ "retry_after_seconds": secs })),
			_ => None,
		}
	}

	fn retry_after(&self) -> Option<u64> {
		match self {
			ServerError::GitHubRateLimit { retry_after_secs }
			| ServerError::LlmRateLimit { retry_after_secs } => *retry_after_secs,
			ServerError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
			_ => None,
		}
	}

	/// Message shown to the client. Internal and database failures stay
	/// generic unless the server runs with `debug` enabled.
	fn public_message(&self, expose_internal: bool) -> String {
		match self {
			ServerError::Internal(_) if !expose_internal => GENERIC_INTERNAL_MESSAGE.to_string(),
			ServerError::Database(_) if !expose_internal => GENERIC_DATABASE_MESSAGE.to_string(),
			other => other.to_string(),
		}
	}

	/// Message safe to place in a redirect URL, where it lands in browser
	/// history. Server-side failures are never described there.
	pub fn redirect_message(&self) -> String {
		let expose_internal = request_id::current().is_some_and(|c| c.expose_internal_errors);
		if self.status_code().is_server_error() && !expose_internal {
			return GENERIC_INTERNAL_MESSAGE.to_string();
		}
		self.public_message(expose_internal)
	}
}

/// GitHub's own status is passed through for client errors; server errors
/// and transport failures become 502.
fn github_status(status: Option<u16>) -> StatusCode {
	match status.and_then(|s| StatusCode::from_u16(s).ok()) {
		Some(code) if code.is_client_error() => code,
		_ => StatusCode::BAD_GATEWAY,
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		let context = request_id::current();
		let request_id = context.as_ref().map(|c| c.request_id.clone());
		let expose_internal = context.as_ref().is_some_and(|c| c.expose_internal_errors);

		if status.is_server_error() {
			tracing::error!(
				error = %self,
				error_code = self.error_code(),
				request_id = request_id.as_deref(),
				"request failed"
			);
		} else {
			tracing::warn!(
				error = %self,
				error_code = self.error_code(),
				request_id = request_id.as_deref(),
				"request rejected"
			);
		}

		let body = ErrorResponse {
			error: ErrorBody {
				error_code: self.error_code().to_string(),
				message: self.public_message(expose_internal),
				details: self.details(),
			},
			request_id,
		};

		let mut response = (status, Json(body)).into_response();
		if let Some(secs) = self.retry_after() {
			if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
				response.headers_mut().insert(header::RETRY_AFTER, value);
			}
		}
		if status == StatusCode::UNAUTHORIZED
			&& !matches!(
				self,
				ServerError::GitHubAuth(_) | ServerError::LlmInvalidKey(_)
			) {
			response
				.headers_mut()
				.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
		}
		response
	}
}

impl From<GitHubError> for ServerError {
	fn from(err: GitHubError) -> Self {
		match err {
			GitHubError::Unauthorized(_) => {
				ServerError::GitHubAuth("Invalid or expired access token".to_string())
			}
			GitHubError::RateLimited { retry_after_secs } => {
				ServerError::GitHubRateLimit { retry_after_secs }
			}
			GitHubError::OAuth(message) => ServerError::GitHubAuth(message),
			GitHubError::Config(message) => ServerError::Configuration(message),
			GitHubError::NotFound(message) => ServerError::GitHubApi {
				status: Some(404),
				message,
			},
			GitHubError::Api { status, message } => ServerError::GitHubApi {
				status: Some(status),
				message,
			},
			other @ (GitHubError::Network(_)
			| GitHubError::Timeout
			| GitHubError::InvalidResponse(_)) => ServerError::GitHubApi {
				status: None,
				message: other.to_string(),
			},
		}
	}
}

impl From<LlmError> for ServerError {
	fn from(err: LlmError) -> Self {
		match err {
			LlmError::NotConfigured(message) => ServerError::Configuration(message),
			LlmError::RateLimited { retry_after_secs } => ServerError::LlmRateLimit { retry_after_secs },
			LlmError::InvalidKey(message) => ServerError::LlmInvalidKey(message),
			other => ServerError::Llm(other.to_string()),
		}
	}
}

impl From<DbError> for ServerError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::NotFound(what) => ServerError::NotFound {
				resource_type: "Resource".to_string(),
				resource_id: Some(what),
			},
			DbError::Conflict(message) => ServerError::Conflict(message),
			other => ServerError::Database(other),
		}
	}
}
