// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use codepilot_server_api::{HealthResponse, RootResponse};

use crate::api::AppState;

#[utoipa::path(
	get,
	path = "/",
	responses((status = 200, description = "Service banner", body = RootResponse)),
	tag = "health"
)]
pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
	Json(RootResponse {
		name: state.config.app.name.clone(),
		version: state.config.app.version.clone(),
		status: "running".to_string(),
		docs: "/docs".to_string(),
	})
}

/// Liveness plus a database probe.
#[utoipa::path(
	get,
	path = "/health",
	responses(
		(status = 200, description = "Service healthy", body = HealthResponse),
		(status = 503, description = "Database unreachable", body = HealthResponse)
	),
	tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
	let version = state.config.app.version.clone();
	match codepilot_server_db::ping(&state.pool).await {
		Ok(()) => (
			StatusCode::OK,
			Json(HealthResponse {
				status: "healthy".to_string(),
				version,
				database: "ok".to_string(),
			}),
		),
		Err(e) => {
			tracing::error!(error = %e, "health check database probe failed");
			(
				StatusCode::SERVICE_UNAVAILABLE,
				Json(HealthResponse {
					status: "unhealthy".to_string(),
					version,
					database: "error".to_string(),
				}),
			)
		}
	}
}
