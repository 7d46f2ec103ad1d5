// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{Method, StatusCode};
use codepilot_common_secret::SecretString;
use codepilot_server::ServerConfig;
use serde_json::json;
use wiremock::{
	matchers::{body_string_contains, header, method, path},
	Mock, MockServer, ResponseTemplate,
};

use super::support::{request, test_config, TestApp};

fn openai_config(base_url: &str) -> ServerConfig {
	let mut config = test_config();
	config.llm.openai.api_key = Some(SecretString::from("sk-test"));
	config.llm.openai.base_url = base_url.to_string();
	config
}

async fn mount_completion(server: &MockServer, content: &str) {
	Mock::given(method("POST"))
		.and(path("/chat/completions"))
		.and(header("authorization", "Bearer sk-test"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"id": "chatcmpl-1",
			"model": "gpt-4o-2024-08-06",
			"choices": [{
				"index": 0,
				"message": {"role": "assistant", "content": content},
				"finish_reason": "stop"
			}],
			"usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
		})))
		.mount(server)
		.await;
}

#[tokio::test]
async fn generate_returns_code_and_usage() {
	let server = MockServer::start().await;
	mount_completion(&server, "def add(a, b):\n    return a + b").await;
	let app = TestApp::new(openai_config(&server.uri())).await;

	let res = app
		.json(
			Method::POST,
			"/api/v1/llm/generate",
			json!({"requirements": "add two numbers"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["status"], "success");
	assert_eq!(res.body["code"], "def add(a, b):\n    return a + b");
	assert_eq!(res.body["model"], "gpt-4o-2024-08-06");
	assert_eq!(res.body["tokens"]["prompt"], 12);
	assert_eq!(res.body["tokens"]["completion"], 8);
	assert_eq!(res.body["tokens"]["total"], 20);

	let requests = server.received_requests().await.unwrap();
	assert_eq!(requests.len(), 1);
	let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
	assert_eq!(sent["messages"][0]["role"], "system");
	assert!(sent["messages"][1]["content"]
		.as_str()
		.unwrap()
		.contains("add two numbers"));
}

#[tokio::test]
async fn interactions_are_recorded_for_session_user() {
	let server = MockServer::start().await;
	mount_completion(&server, "Looks good.").await;
	let app = TestApp::new(openai_config(&server.uri())).await;
	let (user, session) = app.sign_in("octocat", "gho_x").await;

	let res = app
		.send(request(
			Method::POST,
			"/api/v1/llm/review",
			Some(json!({"code": "x = 1", "language": "python"})),
			Some(&session),
		))
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["review"], "Looks good.");

	let history = app
		.state
		.ai_interactions
		.list_interactions_for_user(&user.user_id, 10)
		.await
		.unwrap();
	assert_eq!(history.len(), 1);
	assert_eq!(history[0].context_type, "review");
	assert_eq!(history[0].provider, "openai");
	assert_eq!(history[0].prompt, "x = 1");
	assert_eq!(history[0].response, "Looks good.");
	assert_eq!(history[0].total_tokens, 20);

	let res = app
		.send(request(
			Method::GET,
			"/api/v1/auth/me/interactions?limit=5",
			None,
			Some(&session),
		))
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body.as_array().unwrap().len(), 1);
	assert_eq!(res.body[0]["context_type"], "review");
	assert_eq!(res.body[0]["model"], "gpt-4o-2024-08-06");
	assert_eq!(res.body[0]["total_tokens"], 20);
}

#[tokio::test]
async fn interaction_history_needs_session_and_sane_limit() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/api/v1/auth/me/interactions").await;
	assert_eq!(res.status, StatusCode::UNAUTHORIZED);

	let (_, session) = app.sign_in("octocat", "gho_x").await;
	let res = app
		.send(request(
			Method::GET,
			"/api/v1/auth/me/interactions",
			None,
			Some(&session),
		))
		.await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body, json!([]));

	let res = app
		.send(request(
			Method::GET,
			"/api/v1/auth/me/interactions?limit=0",
			None,
			Some(&session),
		))
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(res.body["error"]["details"]["field"], "limit");
}

#[tokio::test]
async fn chat_passes_conversation_through() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/chat/completions"))
		.and(body_string_contains("what does this do?"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"choices": [{"message": {"role": "assistant", "content": "It adds."}}]
		})))
		.expect(1)
		.mount(&server)
		.await;
	let app = TestApp::new(openai_config(&server.uri())).await;

	let res = app
		.json(
			Method::POST,
			"/api/v1/llm/chat",
			json!({
				"messages": [
					{"role": "user", "content": "def add(a, b): return a + b"},
					{"role": "assistant", "content": "Noted."},
					{"role": "user", "content": "what does this do?"}
				]
			}),
		)
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["response"], "It adds.");
	// No model in the reply falls back to the configured one.
	assert_eq!(res.body["model"], "gpt-4o");
	assert_eq!(res.body["tokens"]["total"], 0);
}

#[tokio::test]
async fn chat_rejects_unknown_role_and_empty_history() {
	let app = TestApp::new(test_config()).await;

	let res = app
		.json(
			Method::POST,
			"/api/v1/llm/chat",
			json!({"messages": [{"role": "tool", "content": "hi"}]}),
		)
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(res.body["error"]["details"]["field"], "messages");

	let res = app
		.json(Method::POST, "/api/v1/llm/chat", json!({"messages": []}))
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_api_key_is_configuration_error() {
	let app = TestApp::new(test_config()).await;
	let res = app
		.json(
			Method::POST,
			"/api/v1/llm/generate",
			json!({"requirements": "add two numbers"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(res.body["error"]["error_code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn unknown_provider_is_rejected() {
	let server = MockServer::start().await;
	let app = TestApp::new(openai_config(&server.uri())).await;
	let res = app
		.json(
			Method::POST,
			"/api/v1/llm/docs",
			json!({"code": "x = 1", "provider": "claude"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(res.body["error"]["details"]["field"], "provider");
	assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_code_is_rejected() {
	let app = TestApp::new(test_config()).await;
	let res = app
		.json(
			Method::POST,
			"/api/v1/llm/fix",
			json!({"code": "   ", "error_description": "panics"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(res.body["error"]["details"]["field"], "code");
}

#[tokio::test]
async fn rejected_key_is_unauthorized() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/chat/completions"))
		.respond_with(ResponseTemplate::new(401).set_body_json(json!({
			"error": {"message": "Incorrect API key provided", "type": "invalid_request_error", "code": "invalid_api_key"}
		})))
		.mount(&server)
		.await;
	let app = TestApp::new(openai_config(&server.uri())).await;

	let res = app
		.json(
			Method::POST,
			"/api/v1/llm/commit-message",
			json!({"changed_files": ["src/lib.rs"], "diff_summary": "add parser"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::UNAUTHORIZED);
	assert_eq!(res.body["error"]["error_code"], "OPENAI_INVALID_KEY");
}
