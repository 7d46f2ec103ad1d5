// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{Query, State},
	routing::get,
	Json, Router,
};
use codepilot_server_api::{AiInteractionApi, CurrentUserResponse, InteractionsParams};
use tracing::instrument;

use crate::{api::AppState, error::ServerError, session::RequireSession, validation};

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/auth/me", get(current_user))
		.route("/auth/me/interactions", get(list_interactions))
}

/// Profile of the session user.
#[utoipa::path(
	get,
	path = "/api/v1/auth/me",
	responses(
		(status = 200, description = "Signed-in user", body = CurrentUserResponse),
		(status = 401, description = "Missing or invalid session", body = codepilot_server_api::ErrorResponse),
		(status = 404, description = "User no longer exists", body = codepilot_server_api::ErrorResponse)
	),
	security(("bearer" = [])),
	tag = "auth"
)]
#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn current_user(
	State(state): State<AppState>,
	RequireSession(session): RequireSession,
) -> Result<Json<CurrentUserResponse>, ServerError> {
	let user = state
		.users
		.get_user_by_id(&session.user_id)
		.await?
		.ok_or_else(|| ServerError::not_found("User", session.user_id.as_str()))?;
	Ok(Json(user.into()))
}

/// LLM calls made while signed in, newest first.
#[utoipa::path(
	get,
	path = "/api/v1/auth/me/interactions",
	params(InteractionsParams),
	responses(
		(status = 200, description = "Recorded interactions", body = [AiInteractionApi]),
		(status = 401, description = "Missing or invalid session", body = codepilot_server_api::ErrorResponse),
		(status = 422, description = "Limit out of range", body = codepilot_server_api::ErrorResponse)
	),
	security(("bearer" = [])),
	tag = "auth"
)]
#[instrument(skip(state, session), fields(user_id = %session.user_id, limit = params.limit))]
pub async fn list_interactions(
	State(state): State<AppState>,
	RequireSession(session): RequireSession,
	Query(params): Query<InteractionsParams>,
) -> Result<Json<Vec<AiInteractionApi>>, ServerError> {
	validation::validate_limit(params.limit)?;
	let interactions = state
		.ai_interactions
		.list_interactions_for_user(&session.user_id, params.limit)
		.await?;
	tracing::debug!(returned = interactions.len(), "listed interactions");
	Ok(Json(
		interactions.into_iter().map(AiInteractionApi::from).collect(),
	))
}
