// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;

use axum::http::{header, Method, StatusCode};
use serde_json::json;
use wiremock::{
	matchers::{
		body_partial_json, body_string_contains, header as header_matcher, method, path,
		query_param,
	},
	Mock, MockServer, ResponseTemplate,
};

use super::support::{github_config, request, test_config, TestApp, TestResponse};

fn redirect_params(res: &TestResponse) -> (String, HashMap<String, String>) {
	assert_eq!(res.status, StatusCode::FOUND, "{:?}", res.body);
	let location = res
		.headers
		.get(header::LOCATION)
		.and_then(|v| v.to_str().ok())
		.expect("location header");
	let url = url::Url::parse(location).expect("absolute redirect");
	let base = format!("{}{}", url.origin().ascii_serialization(), url.path());
	(base, url.query_pairs().into_owned().collect())
}

async fn mount_oauth(server: &MockServer) {
	Mock::given(method("POST"))
		.and(path("/login/oauth/access_token"))
		.and(body_string_contains("code=good-code"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"access_token": "gho_abc123",
			"token_type": "bearer",
			"scope": "repo,user"
		})))
		.mount(server)
		.await;

	Mock::given(method("GET"))
		.and(path("/user"))
		.and(header_matcher("authorization", "Bearer gho_abc123"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"id": 583231,
			"login": "octocat",
			"name": "The Octocat",
			"email": "octocat@github.com",
			"avatar_url": "https://avatars.githubusercontent.com/u/583231"
		})))
		.mount(server)
		.await;
}

async fn start_flow(app: &TestApp) -> String {
	let res = app.get("/api/v1/github/auth").await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	let auth_url = url::Url::parse(res.body["auth_url"].as_str().unwrap()).unwrap();
	let state = res.body["state"].as_str().unwrap().to_string();
	let params: HashMap<_, _> = auth_url.query_pairs().into_owned().collect();
	assert_eq!(params.get("state"), Some(&state));
	assert_eq!(params.get("client_id").map(String::as_str), Some("Iv1.test"));
	state
}

#[tokio::test]
async fn auth_url_needs_oauth_credentials() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/api/v1/github/auth").await;
	assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(res.body["error"]["error_code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn callback_without_code_is_bad_request() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/api/v1/github/callback?state=abc").await;
	assert_eq!(res.status, StatusCode::BAD_REQUEST);
	assert_eq!(res.body["error"]["error_code"], "BAD_REQUEST");
	assert_eq!(res.body["error"]["message"], "Missing code or state parameter");
}

#[tokio::test]
async fn callback_with_unknown_state_redirects_with_error() {
	let server = MockServer::start().await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.get("/api/v1/github/callback?code=good-code&state=forged")
		.await;
	let (base, params) = redirect_params(&res);
	assert_eq!(base, "http://frontend.test/github/callback");
	assert_eq!(params.get("error").map(String::as_str), Some("Invalid state parameter"));
	assert!(!params.contains_key("token"));
}

#[tokio::test]
async fn callback_forwards_denied_authorization() {
	let app = TestApp::new(test_config()).await;
	let res = app
		.get("/api/v1/github/callback?error=access_denied&error_description=The%20user%20denied")
		.await;
	let (_, params) = redirect_params(&res);
	assert_eq!(params.get("error").map(String::as_str), Some("The user denied"));
}

#[tokio::test]
async fn callback_signs_user_in_once() {
	let server = MockServer::start().await;
	mount_oauth(&server).await;
	let app = TestApp::new(github_config(&server.uri())).await;
	let state = start_flow(&app).await;

	let uri = format!("/api/v1/github/callback?code=good-code&state={state}");
	let res = app.get(&uri).await;
	let (base, params) = redirect_params(&res);
	assert_eq!(base, "http://frontend.test/github/callback");
	assert_eq!(params.get("token").map(String::as_str), Some("gho_abc123"));

	let claims = app
		.state
		.session_keys
		.verify(params.get("session").expect("session param"))
		.expect("valid session");
	assert_eq!(claims.username, "octocat");
	assert_eq!(claims.scopes, vec!["repo".to_string(), "user".to_string()]);

	let user = app
		.state
		.users
		.get_user_by_id(&claims.sub)
		.await
		.unwrap()
		.expect("user stored");
	assert_eq!(user.github_id, 583231);
	assert_eq!(user.username, "octocat");
	let stored = app.state.users.get_access_token(&user.id).await.unwrap().unwrap();
	assert_eq!(stored.expose(), "gho_abc123");

	// The state is consumed by the first callback.
	let (_, params) = redirect_params(&app.get(&uri).await);
	assert_eq!(params.get("error").map(String::as_str), Some("Invalid state parameter"));
}

#[tokio::test]
async fn callback_prefixes_github_auth_failures() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/login/oauth/access_token"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"error": "bad_verification_code",
			"error_description": "The code passed is incorrect or expired."
		})))
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;
	let state = start_flow(&app).await;

	let res = app
		.get(&format!("/api/v1/github/callback?code=stale&state={state}"))
		.await;
	let (_, params) = redirect_params(&res);
	assert_eq!(
		params.get("error").map(String::as_str),
		Some("GitHub auth error: The code passed is incorrect or expired.")
	);
}

#[tokio::test]
async fn callback_hides_server_side_failure_details() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/login/oauth/access_token"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"access_token": "gho_abc123",
			"token_type": "bearer",
			"scope": "repo"
		})))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/user"))
		.respond_with(
			ResponseTemplate::new(500)
				.set_body_json(json!({"message": "internal shard db-7 unavailable"})),
		)
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;
	let state = start_flow(&app).await;

	let res = app
		.get(&format!("/api/v1/github/callback?code=good-code&state={state}"))
		.await;
	let (_, params) = redirect_params(&res);
	let error = params.get("error").expect("error param");
	assert_eq!(error, "An internal error occurred");
	assert!(!params.contains_key("session"));
}

#[tokio::test]
async fn token_exchange_reports_github_error_as_bad_request() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/login/oauth/access_token"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"error": "bad_verification_code",
			"error_description": "The code passed is incorrect or expired."
		})))
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;
	let state = start_flow(&app).await;

	let res = app
		.json(
			Method::POST,
			"/api/v1/github/token",
			json!({"code": "stale", "state": state}),
		)
		.await;
	assert_eq!(res.status, StatusCode::BAD_REQUEST);
	assert!(res.body["error"]["message"]
		.as_str()
		.unwrap()
		.contains("incorrect or expired"));
}

#[tokio::test]
async fn user_route_requires_a_token() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/api/v1/github/user").await;
	assert_eq!(res.status, StatusCode::UNAUTHORIZED);
	assert_eq!(res.body["error"]["message"], "GitHub access token required");
}

#[tokio::test]
async fn user_route_uses_stored_token_for_session() {
	let server = MockServer::start().await;
	mount_oauth(&server).await;
	let app = TestApp::new(github_config(&server.uri())).await;
	let (_, session) = app.sign_in("octocat", "gho_abc123").await;

	let res = app
		.send(request(Method::GET, "/api/v1/github/user", None, Some(&session)))
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["status"], "success");
	assert_eq!(res.body["user"]["login"], "octocat");
}

#[tokio::test]
async fn expired_github_token_is_unauthorized() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/user"))
		.respond_with(
			ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
		)
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app.get("/api/v1/github/user?access_token=gho_revoked").await;
	assert_eq!(res.status, StatusCode::UNAUTHORIZED);
	assert_eq!(res.body["error"]["error_code"], "GITHUB_AUTH_ERROR");
	assert_eq!(res.body["error"]["message"], "Invalid or expired access token");
}

#[tokio::test]
async fn branches_are_listed() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/branches"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!([
			{"name": "main", "commit": {"sha": "aaa111"}, "protected": true},
			{"name": "feature", "commit": {"sha": "bbb222"}}
		])))
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.get("/api/v1/github/repos/octo/hello/branches?access_token=gho_x")
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["branches"][0]["name"], "main");
	assert_eq!(res.body["branches"][0]["protected"], true);
	assert_eq!(res.body["branches"][1]["commit_sha"], "bbb222");
}

#[tokio::test]
async fn repo_owner_is_validated() {
	let app = TestApp::new(test_config()).await;
	let res = app
		.get("/api/v1/github/repos/bad%20owner/hello?access_token=gho_x")
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(res.body["error"]["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn branch_is_created_from_default_branch() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"id": 1,
			"name": "hello",
			"full_name": "octo/hello",
			"description": null,
			"html_url": "https://github.com/octo/hello",
			"default_branch": "develop"
		})))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/branches/develop"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"name": "develop",
			"commit": {"sha": "d3v"}
		})))
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/repos/octo/hello/git/refs"))
		.and(body_partial_json(json!({"ref": "refs/heads/codepilot/login", "sha": "d3v"})))
		.respond_with(ResponseTemplate::new(201).set_body_json(json!({
			"ref": "refs/heads/codepilot/login",
			"object": {"sha": "d3v", "type": "commit"}
		})))
		.expect(1)
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.json(
			Method::POST,
			"/api/v1/github/repos/octo/hello/branches?access_token=gho_x",
			json!({"branch_name": "codepilot/login"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["branch"], "codepilot/login");
	assert_eq!(res.body["base_branch"], "develop");
	assert_eq!(res.body["sha"], "d3v");
}

#[tokio::test]
async fn branch_name_is_validated() {
	let server = MockServer::start().await;
	let app = TestApp::new(github_config(&server.uri())).await;
	let res = app
		.json(
			Method::POST,
			"/api/v1/github/repos/octo/hello/branches?access_token=gho_x",
			json!({"branch_name": "bad..name", "base_branch": "main"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(res.body["error"]["details"]["field"], "branch_name");
	assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn file_is_read_as_text() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/contents/src/math.py"))
		.and(query_param("ref", "feature"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"name": "math.py",
			"path": "src/math.py",
			"sha": "blob1",
			"size": 33,
			"type": "file",
			"encoding": "base64",
			"content": "ZGVmIGFkZChhLCBiKToKICAg\nIHJldHVybiBhICsgYgo=\n",
			"html_url": "https://github.com/octo/hello/blob/feature/src/math.py"
		})))
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.get("/api/v1/github/repos/octo/hello/contents/src/math.py?ref=feature&access_token=gho_x")
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["path"], "src/math.py");
	assert_eq!(res.body["sha"], "blob1");
	assert_eq!(res.body["content"], "def add(a, b):\n    return a + b\n");
}

#[tokio::test]
async fn file_path_may_not_climb_out() {
	let app = TestApp::new(test_config()).await;
	let res = app
		.get("/api/v1/github/repos/octo/hello/contents/src/../secrets.env?access_token=gho_x")
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(res.body["error"]["details"]["field"], "path");
}

#[tokio::test]
async fn new_file_is_committed_to_branch() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/contents/src/login.py"))
		.and(query_param("ref", "codepilot/login"))
		.respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("PUT"))
		.and(path("/repos/octo/hello/contents/src/login.py"))
		.and(body_partial_json(json!({
			"message": "Add login",
			"content": "cHJpbnQoJ2hpJykK",
			"branch": "codepilot/login"
		})))
		.respond_with(ResponseTemplate::new(201).set_body_json(json!({
			"content": {"path": "src/login.py", "sha": "blob2"},
			"commit": {"sha": "c0mm1t", "html_url": "https://github.com/octo/hello/commit/c0mm1t"}
		})))
		.expect(1)
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;
	let (_, session) = app.sign_in("octocat", "gho_abc123").await;

	let res = app
		.send(request(
			Method::PUT,
			"/api/v1/github/repos/octo/hello/contents/src/login.py",
			Some(json!({
				"content": "print('hi')\n",
				"message": "Add login",
				"branch": "codepilot/login"
			})),
			Some(&session),
		))
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["commit_sha"], "c0mm1t");
	assert_eq!(res.body["sha"], "blob2");
	assert_eq!(res.body["replaced"], false);

	let requests = server.received_requests().await.unwrap();
	let put = requests
		.iter()
		.find(|r| r.method.as_str() == "PUT")
		.expect("PUT sent");
	let sent: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
	assert!(sent.get("sha").is_none());
	assert_eq!(
		put.headers.get("authorization").and_then(|v| v.to_str().ok()),
		Some("Bearer gho_abc123")
	);
}

#[tokio::test]
async fn stale_sha_write_is_a_conflict() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/contents/README.md"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
		.expect(0)
		.mount(&server)
		.await;
	Mock::given(method("PUT"))
		.and(path("/repos/octo/hello/contents/README.md"))
		.and(body_partial_json(json!({"sha": "old"})))
		.respond_with(
			ResponseTemplate::new(409)
				.set_body_json(json!({"message": "README.md does not match old"})),
		)
		.expect(1)
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.send(request(
			Method::PUT,
			"/api/v1/github/repos/octo/hello/contents/README.md?access_token=gho_x",
			Some(json!({
				"content": "# hello",
				"message": "Update readme",
				"branch": "main",
				"sha": "old"
			})),
			None,
		))
		.await;
	assert_eq!(res.status, StatusCode::CONFLICT);
	assert_eq!(res.body["error"]["error_code"], "GITHUB_API_ERROR");
	assert_eq!(res.body["error"]["details"]["github_status_code"], 409);
	assert!(res.body["error"]["message"]
		.as_str()
		.unwrap()
		.contains("README.md does not match old"));
}

#[tokio::test]
async fn files_are_filtered_by_directory_and_extension() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/git/trees/main"))
		.and(query_param("recursive", "1"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"sha": "t0",
			"tree": [
				{"path": "README.md", "mode": "100644", "type": "blob", "sha": "b0", "size": 10},
				{"path": "src", "mode": "040000", "type": "tree", "sha": "t1"},
				{"path": "src/app.py", "mode": "100644", "type": "blob", "sha": "b1", "size": 200},
				{"path": "src/app.js", "mode": "100644", "type": "blob", "sha": "b2", "size": 90},
				{"path": "src/util/io.py", "mode": "100644", "type": "blob", "sha": "b3", "size": 40}
			],
			"truncated": false
		})))
		.expect(1)
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.get("/api/v1/github/repos/octo/hello/tree?ref=main&path=src&extensions=py&access_token=gho_x")
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["ref"], "main");
	assert_eq!(res.body["truncated"], false);
	let paths: Vec<&str> = res.body["files"]
		.as_array()
		.unwrap()
		.iter()
		.map(|f| f["path"].as_str().unwrap())
		.collect();
	assert_eq!(paths, vec!["src/app.py", "src/util/io.py"]);
	assert_eq!(res.body["files"][0]["size"], 200);
}
