// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic housekeeping for the in-memory stores.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::instrument;

use crate::{api::AppState, oauth_state::OAuthStateStore, rate_limit::RateLimiter};

pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupOutput {
	pub oauth_states_removed: usize,
	pub rate_limit_windows_removed: usize,
}

/// Drops expired OAuth states and finished rate-limit windows.
#[derive(Clone)]
pub struct CleanupJob {
	oauth_states: OAuthStateStore,
	rate_limiter: RateLimiter,
}

impl CleanupJob {
	pub fn new(oauth_states: OAuthStateStore, rate_limiter: RateLimiter) -> Self {
		Self {
			oauth_states,
			rate_limiter,
		}
	}

	pub fn from_state(state: &AppState) -> Self {
		Self::new(state.oauth_states.clone(), state.rate_limiter.clone())
	}

	#[instrument(skip(self), fields(job_id = "memory-cleanup"))]
	pub async fn run(&self) -> CleanupOutput {
		let output = CleanupOutput {
			oauth_states_removed: self.oauth_states.cleanup_expired().await,
			rate_limit_windows_removed: self.rate_limiter.cleanup_expired().await,
		};
		tracing::debug!(
			oauth_states_removed = output.oauth_states_removed,
			rate_limit_windows_removed = output.rate_limit_windows_removed,
			"cleanup completed"
		);
		output
	}

	/// Run every `interval` until the returned handle is aborted. The first
	/// run happens one interval after spawning.
	pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
			ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
			loop {
				ticker.tick().await;
				self.run().await;
			}
		})
	}
}
