// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use codepilot_server_db::{AiInteraction, User};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// Profile of the signed-in user. Never carries the GitHub token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CurrentUserResponse {
	pub id: String,
	pub github_id: i64,
	pub username: String,
	pub email: Option<String>,
	pub name: Option<String>,
	pub avatar_url: Option<String>,
	pub created_at: DateTime<Utc>,
	pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for CurrentUserResponse {
	fn from(user: User) -> Self {
		Self {
			id: user.id,
			github_id: user.github_id,
			username: user.username,
			email: user.email,
			name: user.name,
			avatar_url: user.avatar_url,
			created_at: user.created_at,
			last_login_at: user.last_login_at,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct InteractionsParams {
	/// 1..=100, newest first.
	#[serde(default = "default_interaction_limit")]
	pub limit: u32,
}

fn default_interaction_limit() -> u32 {
	20
}

/// One recorded LLM call made by the session user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AiInteractionApi {
	pub id: String,
	pub provider: String,
	pub model: String,
	/// `generate`, `review`, `chat`, ...
	pub context_type: String,
	pub prompt: String,
	pub response: String,
	pub prompt_tokens: i64,
	pub completion_tokens: i64,
	pub total_tokens: i64,
	pub created_at: DateTime<Utc>,
}

impl From<AiInteraction> for AiInteractionApi {
	fn from(interaction: AiInteraction) -> Self {
		Self {
			id: interaction.id,
			provider: interaction.provider,
			model: interaction.model_name,
			context_type: interaction.context_type,
			prompt: interaction.prompt,
			response: interaction.response,
			prompt_tokens: interaction.prompt_tokens,
			completion_tokens: interaction.completion_tokens,
			total_tokens: interaction.total_tokens,
			created_at: interaction.created_at,
		}
	}
}
