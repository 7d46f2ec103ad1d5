// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	body::Body,
	http::{header, HeaderMap, Method, Request, StatusCode},
	Router,
};
use codepilot_common_secret::SecretString;
use codepilot_server::{create_app_state, create_router, AppState, ServerConfig, SessionUser};
use codepilot_server_db::GitHubUserUpsert;
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-integration";

/// Defaults with rate limiting off and a fixed session secret.
pub fn test_config() -> ServerConfig {
	let mut config = ServerConfig::default();
	config.rate_limit.enabled = false;
	config.auth.jwt_secret = Some(SecretString::from(TEST_JWT_SECRET));
	config.http.frontend_url = "http://frontend.test".to_string();
	config
}

/// Config whose GitHub OAuth and REST calls go to `base_url`.
pub fn github_config(base_url: &str) -> ServerConfig {
	let mut config = test_config();
	config.github.client_id = Some("Iv1.test".to_string());
	config.github.client_secret = Some(SecretString::from("client-secret"));
	config.github.oauth_base_url = base_url.to_string();
	config.github.api_base_url = base_url.to_string();
	config
}

pub struct TestApp {
	pub router: Router,
	pub state: AppState,
}

pub struct TestResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Value,
}

impl TestApp {
	pub async fn new(config: ServerConfig) -> Self {
		let pool = codepilot_server_db::testing::create_test_pool().await;
		let state = create_app_state(pool, &config).expect("app state should build");
		let router = create_router(state.clone());
		Self { router, state }
	}

	pub async fn send(&self, request: Request<Body>) -> TestResponse {
		let response = self
			.router
			.clone()
			.oneshot(request)
			.await
			.expect("router is infallible");
		let status = response.status();
		let headers = response.headers().clone();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.expect("body should be readable");
		let body = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap_or_else(|_| {
				Value::String(String::from_utf8_lossy(&bytes).into_owned())
			})
		};
		TestResponse {
			status,
			headers,
			body,
		}
	}

	pub async fn get(&self, uri: &str) -> TestResponse {
		self.send(request(Method::GET, uri, None, None)).await
	}

	pub async fn json(&self, method: Method, uri: &str, body: Value) -> TestResponse {
		self.send(request(method, uri, Some(body), None)).await
	}

	/// Store a GitHub user and return a session token for them.
	pub async fn sign_in(&self, username: &str, github_token: &str) -> (SessionUser, String) {
		let user = self
			.state
			.users
			.upsert_github_user(&GitHubUserUpsert {
				github_id: 1000 + username.len() as i64,
				username: username.to_string(),
				email: Some(format!("{username}@example.com")),
				name: None,
				avatar_url: None,
				access_token: SecretString::from(github_token),
			})
			.await
			.expect("user upsert");
		let session = SessionUser {
			user_id: user.id,
			username: user.username,
			email: user.email,
			scopes: vec!["repo".to_string()],
		};
		let token = self.state.session_keys.mint(&session).expect("mint session");
		(session, token)
	}
}

pub fn request(
	method: Method,
	uri: &str,
	body: Option<Value>,
	bearer: Option<&str>,
) -> Request<Body> {
	let mut builder = Request::builder().method(method).uri(uri);
	if let Some(token) = bearer {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}
	let body = match body {
		Some(json) => {
			builder = builder.header(header::CONTENT_TYPE, "application/json");
			Body::from(json.to_string())
		}
		None => Body::empty(),
	};
	builder.body(body).expect("valid request")
}
