// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-request id, echoed as `X-Request-ID` and included in error bodies.

use std::future::Future;

use axum::{
	extract::{Request, State},
	http::HeaderValue,
	middleware::Next,
	response::Response,
};
use tracing::Instrument;

use crate::api::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
	static REQUEST_CONTEXT: RequestContext;
}

/// Request-scoped values that error rendering needs but cannot get from
/// handler state.
#[derive(Debug, Clone)]
pub struct RequestContext {
	pub request_id: String,
	pub expose_internal_errors: bool,
}

/// The request id, also available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Eight lowercase hex characters.
pub fn generate_request_id() -> String {
	let mut id = uuid::Uuid::new_v4().simple().to_string();
	id.truncate(8);
	id
}

/// The context of the request being served on this task, if any.
pub fn current() -> Option<RequestContext> {
	REQUEST_CONTEXT.try_with(|c| c.clone()).ok()
}

pub async fn scope<F: Future>(context: RequestContext, f: F) -> F::Output {
	REQUEST_CONTEXT.scope(context, f).await
}

pub async fn request_id_layer(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Response {
	let request_id = generate_request_id();
	request
		.extensions_mut()
		.insert(RequestId(request_id.clone()));

	let span = tracing::info_span!(
		"request",
		request_id = %request_id,
		method = %request.method(),
		path = %request.uri().path(),
	);

	let context = RequestContext {
		request_id: request_id.clone(),
		expose_internal_errors: state.config.app.debug,
	};

	let mut response = scope(context, next.run(request)).instrument(span).await;
	if let Ok(value) = HeaderValue::from_str(&request_id) {
		response.headers_mut().insert(REQUEST_ID_HEADER, value);
	}
	response
}
