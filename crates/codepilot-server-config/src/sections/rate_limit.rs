// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! API rate limiting.

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
	pub enabled: bool,
	/// Requests allowed per client within one window.
	pub requests: u32,
	pub period_secs: u64,
}

impl Default for RateLimitConfig {
	fn default() -> Self {
		RateLimitConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RateLimitConfigLayer {
	pub enabled: Option<bool>,
	pub requests: Option<u32>,
	pub period_secs: Option<u64>,
}

impl RateLimitConfigLayer {
	pub fn merge(&mut self, other: RateLimitConfigLayer) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.requests.is_some() {
			self.requests = other.requests;
		}
		if other.period_secs.is_some() {
			self.period_secs = other.period_secs;
		}
	}

	pub fn finalize(self) -> RateLimitConfig {
		RateLimitConfig {
			enabled: self.enabled.unwrap_or(true),
			requests: self.requests.unwrap_or(100),
			period_secs: self.period_secs.unwrap_or(60),
		}
	}
}
