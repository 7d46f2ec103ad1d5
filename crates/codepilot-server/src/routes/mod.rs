// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP route handlers, one module per API area.

pub mod auth;
pub mod github;
pub mod health;
pub mod llm;
pub mod pr;
pub mod tasks;

use crate::{api::AppState, error::ServerError, session::SessionUser};

/// Pick the GitHub token for a request: an explicit `access_token` wins,
/// then the token stored for the signed-in user.
pub(crate) async fn resolve_github_token(
	state: &AppState,
	explicit: Option<String>,
	session: Option<&SessionUser>,
) -> Result<String, ServerError> {
	if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
		return Ok(token);
	}

	if let Some(user) = session {
		if let Some(token) = state.users.get_access_token(&user.user_id).await? {
			return Ok(token.expose().to_string());
		}
		tracing::debug!(user_id = %user.user_id, "session user has no stored GitHub token");
	}

	Err(ServerError::AuthenticationFailed(
		"GitHub access token required".to_string(),
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use codepilot_server_config::ServerConfig;
	use codepilot_server_db::GitHubUserUpsert;

	async fn state() -> AppState {
		let pool = codepilot_server_db::testing::create_test_pool().await;
		crate::api::create_app_state(pool, &ServerConfig::default()).unwrap()
	}

	#[tokio::test]
	async fn explicit_token_wins() {
		let state = state().await;
		let token = resolve_github_token(&state, Some("gho_explicit".to_string()), None)
			.await
			.unwrap();
		assert_eq!(token, "gho_explicit");
	}

	#[tokio::test]
	async fn falls_back_to_stored_token() {
		let state = state().await;
		let user = state
			.users
			.upsert_github_user(&GitHubUserUpsert {
				github_id: 7,
				username: "octocat".to_string(),
				email: None,
				name: None,
				avatar_url: None,
				access_token: "gho_stored".into(),
			})
			.await
			.unwrap();
		let session = SessionUser {
			user_id: user.id,
			username: user.username,
			email: None,
			scopes: vec![],
		};
		let token = resolve_github_token(&state, Some("  ".to_string()), Some(&session))
			.await
			.unwrap();
		assert_eq!(token, "gho_stored");
	}

	#[tokio::test]
	async fn no_token_is_unauthorized() {
		let state = state().await;
		let err = resolve_github_token(&state, None, None).await.unwrap_err();
		assert!(matches!(err, ServerError::AuthenticationFailed(_)));
	}
}
