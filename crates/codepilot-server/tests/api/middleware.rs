// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{header, Method, StatusCode};

use super::support::{request, test_config, TestApp};

#[tokio::test]
async fn root_reports_running() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/").await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body["status"], "running");
	assert_eq!(res.body["docs"], "/docs");
}

#[tokio::test]
async fn health_probes_database() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/health").await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body["status"], "healthy");
	assert_eq!(res.body["database"], "ok");
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/api/v1/tasks/missing").await;
	let id = res
		.headers
		.get("x-request-id")
		.and_then(|v| v.to_str().ok())
		.expect("request id header")
		.to_string();
	assert_eq!(id.len(), 8);
	assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
	assert_eq!(res.body["request_id"], id.as_str());
}

#[tokio::test]
async fn me_requires_session() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/api/v1/auth/me").await;
	assert_eq!(res.status, StatusCode::UNAUTHORIZED);
	assert_eq!(res.body["error"]["error_code"], "AUTHENTICATION_FAILED");
	assert_eq!(
		res.headers.get(header::WWW_AUTHENTICATE).unwrap(),
		"Bearer"
	);
}

#[tokio::test]
async fn me_returns_profile_without_token() {
	let app = TestApp::new(test_config()).await;
	let (_, session) = app.sign_in("octocat", "gho_secret").await;
	let res = app
		.send(request(Method::GET, "/api/v1/auth/me", None, Some(&session)))
		.await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body["username"], "octocat");
	assert_eq!(res.body["email"], "octocat@example.com");
	assert!(!res.body.to_string().contains("gho_secret"));
}

#[tokio::test]
async fn invalid_session_is_ignored_on_public_routes() {
	let app = TestApp::new(test_config()).await;
	let res = app
		.send(request(Method::GET, "/api/v1/tasks", None, Some("not-a-jwt")))
		.await;
	assert_eq!(res.status, StatusCode::OK);

	let res = app
		.send(request(Method::GET, "/api/v1/auth/me", None, Some("not-a-jwt")))
		.await;
	assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rate_limit_rejects_after_quota() {
	let mut config = test_config();
	config.rate_limit.enabled = true;
	config.rate_limit.requests = 2;
	config.rate_limit.period_secs = 60;
	let app = TestApp::new(config).await;

	for _ in 0..2 {
		assert_eq!(app.get("/api/v1/tasks").await.status, StatusCode::OK);
	}
	let res = app.get("/api/v1/tasks").await;
	assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(res.body["error"]["error_code"], "RATE_LIMIT_EXCEEDED");
	let retry_after: u64 = res
		.headers
		.get(header::RETRY_AFTER)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.parse().ok())
		.expect("retry-after header");
	assert!((1..=60).contains(&retry_after));
	assert_eq!(
		res.body["error"]["details"]["retry_after_seconds"],
		retry_after
	);

	assert_eq!(app.get("/health").await.status, StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_is_served() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/api/v1/openapi.json").await;
	assert_eq!(res.status, StatusCode::OK);
	assert!(res.body["paths"]["/api/v1/pr/create"].is_object());

	let res = app.get("/docs").await;
	assert_eq!(res.status, StatusCode::FOUND);
	assert_eq!(
		res.headers.get(header::LOCATION).unwrap(),
		"/api/v1/openapi.json"
	);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/api/v1/nothing-here").await;
	assert_eq!(res.status, StatusCode::NOT_FOUND);
}
