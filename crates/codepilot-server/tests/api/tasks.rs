// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::support::{request, test_config, TestApp};

async fn create(app: &TestApp, body: serde_json::Value) -> String {
	let res = app.json(Method::POST, "/api/v1/tasks", body).await;
	assert_eq!(res.status, StatusCode::OK, "{:?}", res.body);
	res.body["id"].as_str().expect("task id").to_string()
}

#[tokio::test]
async fn create_applies_defaults() {
	let app = TestApp::new(test_config()).await;
	let res = app
		.json(
			Method::POST,
			"/api/v1/tasks",
			json!({"requirement": "add a login form", "language": "typescript"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body["name"], codepilot_server_db::DEFAULT_TASK_NAME);
	assert_eq!(res.body["status"], "draft");
	assert_eq!(res.body["is_archived"], false);
	assert_eq!(res.body["requirement"], "add a login form");
}

#[tokio::test]
async fn session_user_owns_created_task() {
	let app = TestApp::new(test_config()).await;
	let (user, session) = app.sign_in("octocat", "gho_x").await;
	let res = app
		.send(request(
			Method::POST,
			"/api/v1/tasks",
			Some(json!({"name": "mine"})),
			Some(&session),
		))
		.await;
	assert_eq!(res.status, StatusCode::OK);
	let id = res.body["id"].as_str().unwrap();
	let task = app.state.tasks.get_task(id).await.unwrap().unwrap();
	assert_eq!(task.user_id.as_deref(), Some(user.user_id.as_str()));
}

#[tokio::test]
async fn get_missing_task_is_404() {
	let app = TestApp::new(test_config()).await;
	let res = app.get("/api/v1/tasks/does-not-exist").await;
	assert_eq!(res.status, StatusCode::NOT_FOUND);
	assert_eq!(res.body["error"]["error_code"], "RESOURCE_NOT_FOUND");
	assert_eq!(res.body["error"]["message"], "Task not found");
	assert_eq!(res.body["error"]["details"]["resource_id"], "does-not-exist");
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
	let app = TestApp::new(test_config()).await;
	let id = create(&app, json!({"name": "first", "description": "keep me"})).await;

	let res = app
		.json(
			Method::PUT,
			&format!("/api/v1/tasks/{id}"),
			json!({"status": "in_progress", "generated_code": "fn main() {}"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body["status"], "in_progress");
	assert_eq!(res.body["generated_code"], "fn main() {}");
	assert_eq!(res.body["name"], "first");
	assert_eq!(res.body["description"], "keep me");
}

#[tokio::test]
async fn update_rejects_unknown_status() {
	let app = TestApp::new(test_config()).await;
	let id = create(&app, json!({})).await;
	let res = app
		.json(
			Method::PUT,
			&format!("/api/v1/tasks/{id}"),
			json!({"status": "done"}),
		)
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(res.body["error"]["details"]["field"], "status");
}

#[tokio::test]
async fn update_missing_task_is_404() {
	let app = TestApp::new(test_config()).await;
	let res = app
		.json(Method::PUT, "/api/v1/tasks/nope", json!({"name": "x"}))
		.await;
	assert_eq!(res.status, StatusCode::NOT_FOUND);
	assert_eq!(res.body["error"]["message"], "Task not found");
}

#[tokio::test]
async fn rename_validates_length() {
	let app = TestApp::new(test_config()).await;
	let id = create(&app, json!({})).await;

	let res = app
		.send(request(
			Method::PATCH,
			&format!("/api/v1/tasks/{id}/rename?name=Renamed%20task"),
			None,
			None,
		))
		.await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body["status"], "success");
	assert_eq!(res.body["name"], "Renamed task");

	let too_long = "a".repeat(256);
	let res = app
		.send(request(
			Method::PATCH,
			&format!("/api/v1/tasks/{id}/rename?name={too_long}"),
			None,
			None,
		))
		.await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn archive_moves_task_between_listings() {
	let app = TestApp::new(test_config()).await;
	let keep = create(&app, json!({"name": "keep"})).await;
	let archive = create(&app, json!({"name": "archive"})).await;

	let res = app
		.send(request(
			Method::PATCH,
			&format!("/api/v1/tasks/{archive}/archive"),
			None,
			None,
		))
		.await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body["message"], "Task archived");

	let active = app.get("/api/v1/tasks").await;
	let ids: Vec<&str> = active
		.body
		.as_array()
		.unwrap()
		.iter()
		.map(|t| t["id"].as_str().unwrap())
		.collect();
	assert_eq!(ids, vec![keep.as_str()]);

	let archived = app.get("/api/v1/tasks?is_archived=true").await;
	assert_eq!(archived.body.as_array().unwrap().len(), 1);
	assert_eq!(archived.body[0]["id"], archive.as_str());

	let res = app
		.send(request(
			Method::PATCH,
			&format!("/api/v1/tasks/{archive}/unarchive"),
			None,
			None,
		))
		.await;
	assert_eq!(res.body["message"], "Task unarchived");
	assert_eq!(app.get("/api/v1/tasks").await.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_filters_status_and_validates_paging() {
	let app = TestApp::new(test_config()).await;
	let done = create(&app, json!({"name": "done"})).await;
	create(&app, json!({"name": "draft"})).await;
	app.json(
		Method::PUT,
		&format!("/api/v1/tasks/{done}"),
		json!({"status": "completed"}),
	)
	.await;

	let res = app.get("/api/v1/tasks?status=completed").await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body.as_array().unwrap().len(), 1);
	assert_eq!(res.body[0]["id"], done.as_str());

	let res = app.get("/api/v1/tasks?status=finished").await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

	let res = app.get("/api/v1/tasks?per_page=101").await;
	assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

	let res = app.get("/api/v1/tasks?per_page=1&page=2").await;
	assert_eq!(res.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_then_missing() {
	let app = TestApp::new(test_config()).await;
	let id = create(&app, json!({})).await;

	let res = app
		.send(request(Method::DELETE, &format!("/api/v1/tasks/{id}"), None, None))
		.await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body["message"], "Task deleted");

	let res = app
		.send(request(Method::DELETE, &format!("/api/v1/tasks/{id}"), None, None))
		.await;
	assert_eq!(res.status, StatusCode::NOT_FOUND);
	assert_eq!(app.get(&format!("/api/v1/tasks/{id}")).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn linked_pull_requests_need_an_existing_task() {
	let app = TestApp::new(test_config()).await;
	let id = create(&app, json!({"name": "no prs yet"})).await;

	let res = app.get(&format!("/api/v1/tasks/{id}/pull-requests")).await;
	assert_eq!(res.status, StatusCode::OK);
	assert_eq!(res.body, json!([]));

	let res = app.get("/api/v1/tasks/does-not-exist/pull-requests").await;
	assert_eq!(res.status, StatusCode::NOT_FOUND);
	assert_eq!(res.body["error"]["message"], "Task not found");
}
