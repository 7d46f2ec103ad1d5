// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The partial configuration produced by each source.

use serde::Deserialize;

use crate::sections::{
	AppConfigLayer, AuthConfigLayer, DatabaseConfigLayer, GitHubConfigLayer, HttpConfigLayer,
	LlmConfigLayer, LoggingConfigLayer, RateLimitConfigLayer,
};

/// One source's view of the configuration. Absent sections stay `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfigLayer {
	pub app: Option<AppConfigLayer>,
	pub http: Option<HttpConfigLayer>,
	pub database: Option<DatabaseConfigLayer>,
	pub auth: Option<AuthConfigLayer>,
	pub github: Option<GitHubConfigLayer>,
	pub llm: Option<LlmConfigLayer>,
	pub rate_limit: Option<RateLimitConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *base = Some(incoming),
		(_, None) => {}
	}
}

impl ServerConfigLayer {
	/// Overlay `other` on top of `self`; fields present in `other` win.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.app, other.app, AppConfigLayer::merge);
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.database, other.database, DatabaseConfigLayer::merge);
		merge_section(&mut self.auth, other.auth, AuthConfigLayer::merge);
		merge_section(&mut self.github, other.github, GitHubConfigLayer::merge);
		merge_section(&mut self.llm, other.llm, LlmConfigLayer::merge);
		merge_section(&mut self.rate_limit, other.rate_limit, RateLimitConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}
