// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff for transient HTTP failures.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

/// Errors that know whether another attempt could succeed.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() {
			return true;
		}
		match self.status() {
			Some(status) => {
				status == StatusCode::TOO_MANY_REQUESTS
					|| status == StatusCode::REQUEST_TIMEOUT
					|| status.is_server_error()
			}
			None => self.is_request(),
		}
	}
}

/// Backoff policy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// A policy that makes exactly one attempt.
	pub fn no_retry() -> Self {
		Self {
			max_attempts: 1,
			..Default::default()
		}
	}

	/// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
	pub fn delay_for(&self, attempt: u32) -> Duration {
		let exp = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
		let raw = self.base_delay.as_millis() as f64 * exp;
		let capped = raw.min(self.max_delay.as_millis() as f64);
		let millis = if self.jitter {
			capped * (0.5 + fastrand::f64() * 0.5)
		} else {
			capped
		};
		Duration::from_millis(millis.round() as u64)
	}
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. The last error is returned.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, E>
where
	E: RetryableError + std::fmt::Debug,
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	let max_attempts = config.max_attempts.max(1);
	let mut attempt = 1;
	loop {
		match op().await {
			Ok(value) => return Ok(value),
			Err(err) if attempt < max_attempts && err.is_retryable() => {
				let delay = config.delay_for(attempt);
				warn!(
					attempt,
					max_attempts,
					delay_ms = delay.as_millis() as u64,
					error = ?err,
					"retryable failure, backing off"
				);
				tokio::time::sleep(delay).await;
				attempt += 1;
			}
			Err(err) => {
				debug!(attempt, error = ?err, "giving up");
				return Err(err);
			}
		}
	}
}
