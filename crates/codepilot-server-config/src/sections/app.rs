// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application identity: name, version, API prefix, debug flag.

use serde::Deserialize;

const DEFAULT_APP_NAME: &str = "GitHub Code Collaboration Platform";
const DEFAULT_API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone)]
pub struct AppConfig {
	pub name: String,
	pub version: String,
	pub api_prefix: String,
	/// Exposes internal error messages in responses when set.
	pub debug: bool,
}

impl Default for AppConfig {
	fn default() -> Self {
		AppConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfigLayer {
	pub name: Option<String>,
	pub api_prefix: Option<String>,
	pub debug: Option<bool>,
}

impl AppConfigLayer {
	pub fn merge(&mut self, other: AppConfigLayer) {
		if other.name.is_some() {
			self.name = other.name;
		}
		if other.api_prefix.is_some() {
			self.api_prefix = other.api_prefix;
		}
		if other.debug.is_some() {
			self.debug = other.debug;
		}
	}

	pub fn finalize(self) -> AppConfig {
		let api_prefix = self
			.api_prefix
			.map(|p| normalize_prefix(&p))
			.unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());
		AppConfig {
			name: self.name.unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
			version: env!("CARGO_PKG_VERSION").to_string(),
			api_prefix,
			debug: self.debug.unwrap_or(false),
		}
	}
}

/// `api/v1/` and `/api/v1` both become `/api/v1`.
fn normalize_prefix(prefix: &str) -> String {
	let trimmed = prefix.trim().trim_matches('/');
	format!("/{trimmed}")
}
