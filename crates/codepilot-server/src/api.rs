// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;
use std::time::Duration;

use axum::{
	http::{HeaderName, HeaderValue},
	middleware::from_fn_with_state,
	routing::get,
	Router,
};
use codepilot_server_config::{HttpConfig, ServerConfig};
use codepilot_server_db::{
	AiInteractionRepository, AiInteractionStore, PullRequestRepository, PullRequestStore,
	SqlitePool, TaskRepository, TaskStore, UserRepository, UserStore,
};
use codepilot_server_github::{GitHubClient, GitHubOAuthClient, GitHubOAuthConfig};
use codepilot_server_llm::LlmService;
use tower_http::{
	cors::{AllowOrigin, Any, CorsLayer},
	trace::TraceLayer,
};

use crate::{
	api_docs,
	error::ServerError,
	oauth_state::OAuthStateStore,
	rate_limit::{rate_limit_layer, RateLimiter},
	request_id::{request_id_layer, REQUEST_ID_HEADER},
	routes,
	session::{session_layer, SessionKeys},
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
	pub config: Arc<ServerConfig>,
	pub pool: SqlitePool,
	pub users: Arc<dyn UserStore>,
	pub tasks: Arc<dyn TaskStore>,
	pub pull_requests: Arc<dyn PullRequestStore>,
	pub ai_interactions: Arc<dyn AiInteractionStore>,
	pub github: GitHubClient,
	/// `None` when no OAuth app credentials are configured.
	pub github_oauth: Option<GitHubOAuthClient>,
	pub llm: LlmService,
	pub oauth_states: OAuthStateStore,
	pub rate_limiter: RateLimiter,
	pub session_keys: SessionKeys,
}

impl AppState {
	pub fn github_oauth(&self) -> Result<&GitHubOAuthClient, ServerError> {
		self
			.github_oauth
			.as_ref()
			.ok_or_else(|| ServerError::Configuration("GitHub OAuth is not configured".to_string()))
	}
}

/// Build the application state from a migrated pool and resolved config.
pub fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> Result<AppState, ServerError> {
	let github = GitHubClient::new(config.github.api_base_url.clone())?;

	let github_oauth = match (&config.github.client_id, &config.github.client_secret) {
		(Some(client_id), Some(client_secret)) => {
			Some(GitHubOAuthClient::new(GitHubOAuthConfig {
				client_id: client_id.clone(),
				client_secret: client_secret.clone(),
				redirect_uri: config.github.redirect_uri.clone(),
				scopes: config.github.scopes.clone(),
				oauth_base_url: config.github.oauth_base_url.clone(),
			})?)
		}
		_ => {
			tracing::info!("GitHub OAuth credentials not set, sign-in routes are disabled");
			None
		}
	};

	let llm = LlmService::new(config.llm.clone())?;

	Ok(AppState {
		config: Arc::new(config.clone()),
		users: Arc::new(UserRepository::new(pool.clone())),
		tasks: Arc::new(TaskRepository::new(pool.clone())),
		pull_requests: Arc::new(PullRequestRepository::new(pool.clone())),
		ai_interactions: Arc::new(AiInteractionRepository::new(pool.clone())),
		pool,
		github,
		github_oauth,
		llm,
		oauth_states: OAuthStateStore::new(Duration::from_secs(config.auth.oauth_state_ttl_secs)),
		rate_limiter: RateLimiter::new(
			config.rate_limit.enabled,
			config.rate_limit.requests,
			Duration::from_secs(config.rate_limit.period_secs),
		),
		session_keys: SessionKeys::from_config(&config.auth),
	})
}

/// `api_prefix` with a leading slash and no trailing one.
pub(crate) fn api_prefix(config: &ServerConfig) -> String {
	let trimmed = config.app.api_prefix.trim().trim_matches('/');
	format!("/{trimmed}")
}

fn cors_layer(http: &HttpConfig) -> CorsLayer {
	let layer = CorsLayer::new()
		.allow_methods(Any)
		.allow_headers(Any)
		.expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

	if http.cors_origins.iter().any(|o| o == "*") {
		return layer.allow_origin(Any);
	}

	let origins: Vec<HeaderValue> = http
		.cors_origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
				None
			}
		})
		.collect();
	layer.allow_origin(AllowOrigin::list(origins))
}

/// Assemble the full router with middleware.
///
/// Layers run outermost first: CORS, tracing, request id, session, then
/// rate limiting, which needs the session to key by user.
pub fn create_router(state: AppState) -> Router {
	let prefix = api_prefix(&state.config);

	let api = Router::new()
		.merge(routes::github::router())
		.merge(routes::pr::router())
		.merge(routes::llm::router())
		.merge(routes::tasks::router())
		.merge(routes::auth::router())
		.route("/openapi.json", get(api_docs::openapi_json));

	let router = Router::new()
		.route("/", get(routes::health::root))
		.route("/health", get(routes::health::health))
		.route("/docs", get(api_docs::docs_redirect));
	let router = if prefix == "/" {
		router.merge(api)
	} else {
		router.nest(&prefix, api)
	};

	router
		.layer(from_fn_with_state(state.clone(), rate_limit_layer))
		.layer(from_fn_with_state(state.clone(), session_layer))
		.layer(from_fn_with_state(state.clone(), request_id_layer))
		.layer(TraceLayer::new_for_http())
		.layer(cors_layer(&state.config.http))
		.with_state(state)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prefix_is_normalised() {
		let mut config = ServerConfig::default();
		assert_eq!(api_prefix(&config), "/api/v1");
		config.app.api_prefix = "api/v2/".to_string();
		assert_eq!(api_prefix(&config), "/api/v2");
	}

	#[tokio::test]
	async fn state_without_github_credentials_has_no_oauth() {
		let pool = codepilot_server_db::testing::create_test_pool().await;
		let state = create_app_state(pool, &ServerConfig::default()).unwrap();
		assert!(state.github_oauth.is_none());
		assert!(matches!(
			state.github_oauth(),
			Err(ServerError::Configuration(_))
		));
	}

	#[tokio::test]
	async fn state_with_github_credentials_builds_oauth_client() {
		let pool = codepilot_server_db::testing::create_test_pool().await;
		let mut config = ServerConfig::default();
		config.github.client_id = Some("Iv1.abc".to_string());
		config.github.client_secret = Some("shh".into());
		let state = create_app_state(pool, &config).unwrap();
		assert_eq!(state.github_oauth().unwrap().config().client_id, "Iv1.abc");
	}
}
