// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Task CRUD. A task records a requirement and the code generated for it.

use std::str::FromStr;

use axum::{
	extract::{Path, Query, State},
	routing::{get, patch},
	Json, Router,
};
use codepilot_server_api::{
	CreateTaskRequest, ListTasksParams, MessageResponse, RenameTaskParams, RenameTaskResponse,
	TaskPullRequestApi, TaskResponse, UpdateTaskRequest,
};
use codepilot_server_db::{DbError, NewTask, TaskFilter, TaskPatch, TaskStatus};
use tracing::instrument;

use crate::{api::AppState, error::ServerError, session::OptionalSession, validation};

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/tasks", get(list_tasks).post(create_task))
		.route(
			"/tasks/{id}",
			get(get_task).put(update_task).delete(delete_task),
		)
		.route("/tasks/{id}/pull-requests", get(list_task_pull_requests))
		.route("/tasks/{id}/rename", patch(rename_task))
		.route("/tasks/{id}/archive", patch(archive_task))
		.route("/tasks/{id}/unarchive", patch(unarchive_task))
}

/// Repository misses surface as "Task not found" rather than a generic resource.
fn task_error(id: &str) -> impl FnOnce(DbError) -> ServerError + '_ {
	move |e| match e {
		DbError::NotFound(_) => ServerError::not_found("Task", id),
		other => other.into(),
	}
}

fn parse_status(value: &str) -> Result<TaskStatus, ServerError> {
	TaskStatus::from_str(value).map_err(|_| {
		ServerError::validation(
			"status",
			format!("invalid status '{value}', expected draft, in_progress or completed"),
		)
	})
}

#[utoipa::path(
	post,
	path = "/api/v1/tasks",
	request_body = CreateTaskRequest,
	responses(
		(status = 200, description = "Task created", body = TaskResponse),
		(status = 422, description = "Invalid input", body = codepilot_server_api::ErrorResponse)
	),
	tag = "tasks"
)]
#[instrument(skip(state, session, request))]
pub async fn create_task(
	State(state): State<AppState>,
	OptionalSession(session): OptionalSession,
	Json(request): Json<CreateTaskRequest>,
) -> Result<Json<TaskResponse>, ServerError> {
	if let Some(name) = &request.name {
		validation::validate_task_name(name)?;
	}

	let task = state
		.tasks
		.create_task(&NewTask {
			name: request.name,
			description: request.description,
			repository: request.repository,
			branch: request.branch,
			requirement: request.requirement,
			language: request.language,
			user_id: session.map(|s| s.user_id),
		})
		.await?;

	tracing::info!(task_id = %task.id, "task created");
	Ok(Json(task.into()))
}

#[utoipa::path(
	get,
	path = "/api/v1/tasks",
	params(ListTasksParams),
	responses((status = 200, description = "Tasks, most recently updated first", body = [TaskResponse])),
	tag = "tasks"
)]
#[instrument(skip(state, params), fields(page = params.page, per_page = params.per_page))]
pub async fn list_tasks(
	State(state): State<AppState>,
	Query(params): Query<ListTasksParams>,
) -> Result<Json<Vec<TaskResponse>>, ServerError> {
	validation::validate_page(params.page)?;
	validation::validate_per_page(params.per_page)?;
	let status = params.status.as_deref().map(parse_status).transpose()?;

	let (tasks, total) = state
		.tasks
		.list_tasks(&TaskFilter {
			page: params.page,
			per_page: params.per_page,
			status,
			is_archived: params.is_archived,
		})
		.await?;

	tracing::debug!(returned = tasks.len(), total, "listed tasks");
	Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

#[utoipa::path(
	get,
	path = "/api/v1/tasks/{id}",
	params(("id" = String, Path, description = "Task id")),
	responses(
		(status = 200, description = "Task", body = TaskResponse),
		(status = 404, description = "Task not found", body = codepilot_server_api::ErrorResponse)
	),
	tag = "tasks"
)]
#[instrument(skip(state))]
pub async fn get_task(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ServerError> {
	let task = state
		.tasks
		.get_task(&id)
		.await?
		.ok_or_else(|| ServerError::not_found("Task", id.as_str()))?;
	Ok(Json(task.into()))
}

/// Pull requests opened with this task linked, newest first.
#[utoipa::path(
	get,
	path = "/api/v1/tasks/{id}/pull-requests",
	params(("id" = String, Path, description = "Task id")),
	responses(
		(status = 200, description = "Linked pull requests", body = [TaskPullRequestApi]),
		(status = 404, description = "Task not found", body = codepilot_server_api::ErrorResponse)
	),
	tag = "tasks"
)]
#[instrument(skip(state))]
pub async fn list_task_pull_requests(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<Vec<TaskPullRequestApi>>, ServerError> {
	if state.tasks.get_task(&id).await?.is_none() {
		return Err(ServerError::not_found("Task", id.as_str()));
	}
	let records = state.pull_requests.list_pull_requests_for_task(&id).await?;
	Ok(Json(
		records.into_iter().map(TaskPullRequestApi::from).collect(),
	))
}

#[utoipa::path(
	put,
	path = "/api/v1/tasks/{id}",
	params(("id" = String, Path, description = "Task id")),
	request_body = UpdateTaskRequest,
	responses(
		(status = 200, description = "Task updated", body = TaskResponse),
		(status = 404, description = "Task not found", body = codepilot_server_api::ErrorResponse),
		(status = 422, description = "Invalid status", body = codepilot_server_api::ErrorResponse)
	),
	tag = "tasks"
)]
#[instrument(skip(state, request))]
pub async fn update_task(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ServerError> {
	if let Some(name) = &request.name {
		validation::validate_task_name(name)?;
	}
	let status = request.status.as_deref().map(parse_status).transpose()?;

	let task = state
		.tasks
		.update_task(
			&id,
			&TaskPatch {
				name: request.name,
				description: request.description,
				repository: request.repository,
				branch: request.branch,
				requirement: request.requirement,
				generated_code: request.generated_code,
				language: request.language,
				status,
				is_archived: request.is_archived,
				metadata: request.metadata,
			},
		)
		.await
		.map_err(task_error(&id))?;
	Ok(Json(task.into()))
}

#[utoipa::path(
	patch,
	path = "/api/v1/tasks/{id}/rename",
	params(("id" = String, Path, description = "Task id"), RenameTaskParams),
	responses(
		(status = 200, description = "Task renamed", body = RenameTaskResponse),
		(status = 404, description = "Task not found", body = codepilot_server_api::ErrorResponse)
	),
	tag = "tasks"
)]
#[instrument(skip(state, params))]
pub async fn rename_task(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Query(params): Query<RenameTaskParams>,
) -> Result<Json<RenameTaskResponse>, ServerError> {
	validation::validate_task_name(&params.name)?;
	let task = state
		.tasks
		.rename_task(&id, &params.name)
		.await
		.map_err(task_error(&id))?;
	Ok(Json(RenameTaskResponse::new(task.name)))
}

#[utoipa::path(
	patch,
	path = "/api/v1/tasks/{id}/archive",
	params(("id" = String, Path, description = "Task id")),
	responses((status = 200, description = "Task archived", body = MessageResponse)),
	tag = "tasks"
)]
#[instrument(skip(state))]
pub async fn archive_task(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
	state
		.tasks
		.set_archived(&id, true)
		.await
		.map_err(task_error(&id))?;
	Ok(Json(MessageResponse::success("Task archived")))
}

#[utoipa::path(
	patch,
	path = "/api/v1/tasks/{id}/unarchive",
	params(("id" = String, Path, description = "Task id")),
	responses((status = 200, description = "Task unarchived", body = MessageResponse)),
	tag = "tasks"
)]
#[instrument(skip(state))]
pub async fn unarchive_task(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
	state
		.tasks
		.set_archived(&id, false)
		.await
		.map_err(task_error(&id))?;
	Ok(Json(MessageResponse::success("Task unarchived")))
}

#[utoipa::path(
	delete,
	path = "/api/v1/tasks/{id}",
	params(("id" = String, Path, description = "Task id")),
	responses(
		(status = 200, description = "Task deleted", body = MessageResponse),
		(status = 404, description = "Task not found", body = codepilot_server_api::ErrorResponse)
	),
	tag = "tasks"
)]
#[instrument(skip(state))]
pub async fn delete_task(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
	if !state.tasks.delete_task(&id).await? {
		return Err(ServerError::not_found("Task", id));
	}
	tracing::info!(task_id = %id, "task deleted");
	Ok(Json(MessageResponse::success("Task deleted")))
}
