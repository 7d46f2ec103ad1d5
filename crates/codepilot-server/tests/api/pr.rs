// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use wiremock::{
	matchers::{body_partial_json, method, path},
	Mock, MockServer, ResponseTemplate,
};

use super::support::{github_config, TestApp};

fn pull_json(number: u64, mergeable: Option<bool>, mergeable_state: &str) -> Value {
	json!({
		"id": 9000 + number,
		"number": number,
		"title": "Add login",
		"body": "Adds login",
		"state": "open",
		"html_url": format!("https://github.com/octo/hello/pull/{number}"),
		"head": {"ref": "feature", "sha": "aaa"},
		"base": {"ref": "main", "sha": "bbb"},
		"user": {"id": 1, "login": "octocat"},
		"draft": false,
		"mergeable": mergeable,
		"mergeable_state": mergeable_state,
		"commits": 2,
		"additions": 10,
		"deletions": 1,
		"changed_files": 3,
		"created_at": "2025-03-01T10:00:00Z",
		"updated_at": "2025-03-01T11:00:00Z"
	})
}

async fn mount_branch(server: &MockServer, branch: &str, status: u16) {
	let template = if status == 200 {
		ResponseTemplate::new(200).set_body_json(json!({
			"name": branch,
			"commit": {"sha": "aaa"},
			"protected": false
		}))
	} else {
		ResponseTemplate::new(status).set_body_json(json!({"message": "Branch not found"}))
	};
	Mock::given(method("GET"))
		.and(path(format!("/repos/octo/hello/branches/{branch}")))
		.respond_with(template)
		.mount(server)
		.await;
}

fn create_body(extra: Value) -> Value {
	let mut body = json!({
		"repo_owner": "octo",
		"repo_name": "hello",
		"title": "Add login",
		"body": "Adds login",
		"head_branch": "feature",
		"base_branch": "main"
	});
	if let (Some(target), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
		for (k, v) in extra {
			target.insert(k.clone(), v.clone());
		}
	}
	body
}

#[tokio::test]
async fn create_links_issue_and_records_pull_request() {
	let server = MockServer::start().await;
	mount_branch(&server, "feature", 200).await;
	Mock::given(method("POST"))
		.and(path("/repos/octo/hello/pulls"))
		.and(body_partial_json(json!({
			"title": "Add login",
			"body": "Adds login\n\nRelated to #7",
			"head": "feature",
			"base": "main"
		})))
		.respond_with(ResponseTemplate::new(201).set_body_json(pull_json(5, None, "unknown")))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/repos/octo/hello/pulls/5/requested_reviewers"))
		.respond_with(
			ResponseTemplate::new(422).set_body_json(json!({"message": "Reviews may only be requested from collaborators."})),
		)
		.expect(1)
		.mount(&server)
		.await;

	let app = TestApp::new(github_config(&server.uri())).await;
	let task = app
		.json(Method::POST, "/api/v1/tasks", json!({"name": "login"}))
		.await;
	let task_id = task.body["id"].as_str().unwrap().to_string();

	let res = app
		.json(
			Method::POST,
			"/api/v1/pr/create?access_token=gho_x",
			create_body(json!({
				"issue_number": 7,
				"reviewers": ["hubot"],
				"task_id": task_id
			})),
		)
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["status"], "success");
	assert_eq!(res.body["pr_number"], 5);
	assert_eq!(res.body["pr_url"], "https://github.com/octo/hello/pull/5");
	assert_eq!(res.body["head_branch"], "feature");

	let records = app
		.state
		.pull_requests
		.list_pull_requests_for_task(&task_id)
		.await
		.unwrap();
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].number, 5);
	assert_eq!(records[0].repository, "octo/hello");

	let linked = app
		.get(&format!("/api/v1/tasks/{task_id}/pull-requests"))
		.await;
	assert_eq!(linked.status, StatusCode::OK, "{:?}", linked.body);
	assert_eq!(linked.body[0]["number"], 5);
	assert_eq!(linked.body[0]["github_id"], 9005);
	assert_eq!(linked.body[0]["head_branch"], "feature");
	assert_eq!(linked.body[0]["html_url"], "https://github.com/octo/hello/pull/5");
}

#[tokio::test]
async fn create_refuses_missing_head_branch() {
	let server = MockServer::start().await;
	mount_branch(&server, "ghost", 404).await;
	Mock::given(method("POST"))
		.and(path("/repos/octo/hello/pulls"))
		.respond_with(ResponseTemplate::new(201).set_body_json(pull_json(1, None, "unknown")))
		.expect(0)
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.json(
			Method::POST,
			"/api/v1/pr/create?access_token=gho_x",
			create_body(json!({"head_branch": "ghost"})),
		)
		.await;
	assert_eq!(res.status, StatusCode::BAD_REQUEST);
	assert_eq!(res.body["error"]["message"], "Branch 'ghost' does not exist");
}

#[tokio::test]
async fn create_passes_github_validation_failure_through() {
	let server = MockServer::start().await;
	mount_branch(&server, "feature", 200).await;
	Mock::given(method("POST"))
		.and(path("/repos/octo/hello/pulls"))
		.respond_with(ResponseTemplate::new(422).set_body_json(json!({
			"message": "Validation Failed",
			"errors": [{"message": "A pull request already exists for octo:feature."}]
		})))
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.json(
			Method::POST,
			"/api/v1/pr/create?access_token=gho_x",
			create_body(json!({})),
		)
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(res.body["error"]["error_code"], "GITHUB_API_ERROR");
	assert_eq!(
		res.body["error"]["message"],
		"GitHub API error: Validation Failed: A pull request already exists for octo:feature."
	);
}

#[tokio::test]
async fn create_validates_input_before_calling_github() {
	let server = MockServer::start().await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let cases = [
		(json!({"head_branch": "feature/../main"}), "head_branch"),
		(json!({"title": ""}), "title"),
		(json!({"issue_number": 0}), "issue_number"),
		(json!({"reviewers": ["not a login"]}), "reviewers"),
		(json!({"repo_owner": "octo/evil"}), "repo_owner"),
	];
	for (extra, field) in cases {
		let res = app
			.json(
				Method::POST,
				"/api/v1/pr/create?access_token=gho_x",
				create_body(extra),
			)
			.await;
		assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "{field}");
		assert_eq!(res.body["error"]["details"]["field"], field);
	}
	assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_with_unknown_task_is_404() {
	let server = MockServer::start().await;
	let app = TestApp::new(github_config(&server.uri())).await;
	let res = app
		.json(
			Method::POST,
			"/api/v1/pr/create?access_token=gho_x",
			create_body(json!({"task_id": "missing-task"})),
		)
		.await;
	assert_eq!(res.status, StatusCode::NOT_FOUND);
	assert_eq!(res.body["error"]["message"], "Task not found");
}

#[tokio::test]
async fn merge_refuses_unmergeable_pull_request() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/pulls/5"))
		.respond_with(ResponseTemplate::new(200).set_body_json(pull_json(5, Some(false), "dirty")))
		.mount(&server)
		.await;
	Mock::given(method("PUT"))
		.and(path("/repos/octo/hello/pulls/5/merge"))
		.respond_with(ResponseTemplate::new(200))
		.expect(0)
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.json(
			Method::POST,
			"/api/v1/pr/merge?access_token=gho_x",
			json!({"repo_owner": "octo", "repo_name": "hello", "pr_number": 5}),
		)
		.await;
	assert_eq!(res.status, StatusCode::BAD_REQUEST);
	assert_eq!(res.body["error"]["message"], "PR is not mergeable. State: dirty");
}

#[tokio::test]
async fn merge_sends_method_and_reports_result() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/pulls/5"))
		.respond_with(ResponseTemplate::new(200).set_body_json(pull_json(5, Some(true), "clean")))
		.mount(&server)
		.await;
	Mock::given(method("PUT"))
		.and(path("/repos/octo/hello/pulls/5/merge"))
		.and(body_partial_json(json!({"merge_method": "squash"})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"sha": "ccc333",
			"merged": true,
			"message": "Pull Request successfully merged"
		})))
		.expect(1)
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.json(
			Method::POST,
			"/api/v1/pr/merge?access_token=gho_x",
			json!({
				"repo_owner": "octo",
				"repo_name": "hello",
				"pr_number": 5,
				"merge_method": "squash"
			}),
		)
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["merged"], true);
	assert_eq!(res.body["sha"], "ccc333");
}

#[tokio::test]
async fn merge_method_must_be_known() {
	let server = MockServer::start().await;
	let app = TestApp::new(github_config(&server.uri())).await;
	let res = app
		.json(
			Method::POST,
			"/api/v1/pr/merge?access_token=gho_x",
			json!({
				"repo_owner": "octo",
				"repo_name": "hello",
				"pr_number": 5,
				"merge_method": "fast-forward"
			}),
		)
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(res.body["error"]["details"]["field"], "merge_method");
}

#[tokio::test]
async fn get_pull_request_flattens_refs() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/pulls/5"))
		.respond_with(ResponseTemplate::new(200).set_body_json(pull_json(5, Some(true), "clean")))
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app.get("/api/v1/pr/octo/hello/5?access_token=gho_x").await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["pr"]["head_branch"], "feature");
	assert_eq!(res.body["pr"]["base_branch"], "main");
	assert_eq!(res.body["pr"]["user"], "octocat");
	assert_eq!(res.body["pr"]["changed_files"], 3);
}

#[tokio::test]
async fn missing_pull_request_keeps_github_status() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/pulls/404"))
		.respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app.get("/api/v1/pr/octo/hello/404?access_token=gho_x").await;
	assert_eq!(res.status, StatusCode::NOT_FOUND);
	assert_eq!(res.body["error"]["error_code"], "GITHUB_API_ERROR");
	assert_eq!(res.body["error"]["message"], "GitHub API error: Not Found");
	assert_eq!(res.body["error"]["details"]["github_status_code"], 404);
}

#[tokio::test]
async fn files_are_listed_with_total() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/repos/octo/hello/pulls/5/files"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!([
			{"filename": "src/login.rs", "status": "added", "additions": 40, "deletions": 0, "changes": 40, "patch": "@@ -0,0 +1,40 @@"},
			{"filename": "README.md", "status": "modified", "additions": 2, "deletions": 1, "changes": 3}
		])))
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.get("/api/v1/pr/octo/hello/5/files?access_token=gho_x")
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["total"], 2);
	assert_eq!(res.body["files"][0]["filename"], "src/login.rs");
	assert!(res.body["files"][1]["patch"].is_null());
}

#[tokio::test]
async fn update_sends_only_supplied_fields() {
	let server = MockServer::start().await;
	Mock::given(method("PATCH"))
		.and(path("/repos/octo/hello/pulls/5"))
		.and(body_partial_json(json!({"state": "closed"})))
		.respond_with(ResponseTemplate::new(200).set_body_json(pull_json(5, None, "unknown")))
		.expect(1)
		.mount(&server)
		.await;
	let app = TestApp::new(github_config(&server.uri())).await;

	let res = app
		.json(
			Method::PUT,
			"/api/v1/pr/update?access_token=gho_x",
			json!({"repo_owner": "octo", "repo_name": "hello", "pr_number": 5, "state": "closed"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	assert_eq!(res.body["message"], "PR updated successfully");

	let requests = server.received_requests().await.unwrap();
	let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
	assert_eq!(sent, json!({"state": "closed"}));
}

#[tokio::test]
async fn update_rejects_unknown_state() {
	let server = MockServer::start().await;
	let app = TestApp::new(github_config(&server.uri())).await;
	let res = app
		.json(
			Method::PUT,
			"/api/v1/pr/update?access_token=gho_x",
			json!({"repo_owner": "octo", "repo_name": "hello", "pr_number": 5, "state": "all"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}
