// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Value of the `status` field on successful responses.
pub const STATUS_SUCCESS: &str = "success";

pub(crate) fn success() -> String {
	STATUS_SUCCESS.to_string()
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
	pub error: ErrorBody,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorBody {
	/// Stable machine-readable code, e.g. `RESOURCE_NOT_FOUND`.
	pub error_code: String,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// `{status, message}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MessageResponse {
	pub status: String,
	pub message: String,
}

impl MessageResponse {
	pub fn success(message: impl Into<String>) -> Self {
		Self {
			status: success(),
			message: message.into(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RootResponse {
	pub name: String,
	pub version: String,
	pub status: String,
	pub docs: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct HealthResponse {
	/// `healthy` or `unhealthy`.
	pub status: String,
	pub version: String,
	/// `ok` or `error`.
	pub database: String,
}

pub(crate) fn default_page() -> u32 {
	1
}

pub(crate) fn default_per_page() -> u32 {
	30
}

pub(crate) fn default_direction() -> String {
	"desc".to_string()
}

pub(crate) fn default_state_open() -> String {
	"open".to_string()
}
