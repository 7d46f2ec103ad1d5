// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixed-window request rate limiting.
//!
//! Requests are counted per signed-in user, or per client IP for anonymous
//! callers. The root, health and docs routes are never limited.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
	extract::{ConnectInfo, Request, State},
	middleware::Next,
	response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{api::AppState, error::ServerError, session::SessionUser};

const EXEMPT_PATHS: &[&str] = &["/", "/health", "/docs"];

#[derive(Debug, Clone, Copy)]
struct Window {
	started: Instant,
	count: u32,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
	enabled: bool,
	max_requests: u32,
	period: Duration,
	windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
	pub fn new(enabled: bool, max_requests: u32, period: Duration) -> Self {
		Self {
			enabled,
			max_requests,
			period,
			windows: Arc::new(Mutex::new(HashMap::new())),
		}
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Count one request for `key`. When the window is full, returns the
	/// whole seconds until it resets (at least 1).
	pub async fn check(&self, key: &str) -> Result<(), u64> {
		if !self.enabled {
			return Ok(());
		}

		let now = Instant::now();
		let mut windows = self.windows.lock().await;
		let window = windows.entry(key.to_string()).or_insert(Window {
			started: now,
			count: 0,
		});

		if now.duration_since(window.started) >= self.period {
			*window = Window {
				started: now,
				count: 0,
			};
		}

		if window.count >= self.max_requests {
			let remaining = self
				.period
				.saturating_sub(now.duration_since(window.started));
			let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
			return Err(secs.max(1));
		}

		window.count += 1;
		Ok(())
	}

	/// Forget windows that have run out.
	pub async fn cleanup_expired(&self) -> usize {
		let now = Instant::now();
		let period = self.period;
		let mut windows = self.windows.lock().await;
		let before = windows.len();
		windows.retain(|_, w| now.duration_since(w.started) < period);
		before - windows.len()
	}
}

pub fn is_exempt(path: &str) -> bool {
	EXEMPT_PATHS.contains(&path) || path.starts_with("/docs/")
}

/// The caller identity used as the rate limit key.
fn client_key(request: &Request) -> String {
	if let Some(user) = request.extensions().get::<SessionUser>() {
		return format!("user:{}", user.user_id);
	}
	if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
		return format!("ip:{}", addr.ip());
	}
	let forwarded = request
		.headers()
		.get("x-forwarded-for")
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.split(',').next())
		.map(str::trim)
		.filter(|v| !v.is_empty());
	match forwarded {
		Some(ip) => format!("ip:{ip}"),
		None => "ip:unknown".to_string(),
	}
}

pub async fn rate_limit_layer(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Response {
	if !state.rate_limiter.is_enabled() || is_exempt(request.uri().path()) {
		return next.run(request).await;
	}

	let key = client_key(&request);
	match state.rate_limiter.check(&key).await {
		Ok(()) => next.run(request).await,
		Err(retry_after_secs) => {
			tracing::debug!(key = %key, retry_after_secs, "rate limit exceeded");
			ServerError::RateLimited { retry_after_secs }.into_response()
		}
	}
}
