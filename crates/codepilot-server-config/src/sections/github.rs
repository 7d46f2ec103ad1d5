// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub OAuth application and API endpoints.

use codepilot_common_secret::SecretString;
use serde::Deserialize;

const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/api/v1/github/callback";
const DEFAULT_SCOPES: &str = "repo,user";
const DEFAULT_OAUTH_BASE_URL: &str = "https://github.com";
const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

#[derive(Debug, Clone)]
pub struct GitHubConfig {
	pub client_id: Option<String>,
	pub client_secret: Option<SecretString>,
	pub redirect_uri: String,
	pub scopes: Vec<String>,
	pub oauth_base_url: String,
	pub api_base_url: String,
}

impl GitHubConfig {
	/// True when both halves of the OAuth app credentials are present.
	pub fn is_configured(&self) -> bool {
		self.client_id.is_some() && self.client_secret.is_some()
	}
}

impl Default for GitHubConfig {
	fn default() -> Self {
		GitHubConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitHubConfigLayer {
	pub client_id: Option<String>,
	pub client_secret: Option<SecretString>,
	pub redirect_uri: Option<String>,
	/// Comma or space separated, as in `repo,user` or `repo user`.
	pub scopes: Option<String>,
	pub oauth_base_url: Option<String>,
	pub api_base_url: Option<String>,
}

impl GitHubConfigLayer {
	pub fn merge(&mut self, other: GitHubConfigLayer) {
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
		if other.redirect_uri.is_some() {
			self.redirect_uri = other.redirect_uri;
		}
		if other.scopes.is_some() {
			self.scopes = other.scopes;
		}
		if other.oauth_base_url.is_some() {
			self.oauth_base_url = other.oauth_base_url;
		}
		if other.api_base_url.is_some() {
			self.api_base_url = other.api_base_url;
		}
	}

	pub fn finalize(self) -> GitHubConfig {
		GitHubConfig {
			client_id: self.client_id,
			client_secret: self.client_secret,
			redirect_uri: self
				.redirect_uri
				.unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
			scopes: parse_scopes(self.scopes.as_deref().unwrap_or(DEFAULT_SCOPES)),
			oauth_base_url: trim_base(self.oauth_base_url, DEFAULT_OAUTH_BASE_URL),
			api_base_url: trim_base(self.api_base_url, DEFAULT_API_BASE_URL),
		}
	}
}

fn trim_base(value: Option<String>, default: &str) -> String {
	value
		.unwrap_or_else(|| default.to_string())
		.trim_end_matches('/')
		.to_string()
}

/// Split a scope list on commas and whitespace, dropping empties.
pub fn parse_scopes(raw: &str) -> Vec<String> {
	raw.split([',', ' '])
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(String::from)
		.collect()
}
