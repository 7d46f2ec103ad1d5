// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP listener, CORS and frontend settings.

use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
	/// Where the OAuth callback redirects the browser afterwards.
	pub frontend_url: String,
	pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
	fn default() -> Self {
		HttpConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpConfigLayer {
	pub host: Option<String>,
	pub port: Option<u16>,
	pub frontend_url: Option<String>,
	pub cors_origins: Option<Vec<String>>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: HttpConfigLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.frontend_url.is_some() {
			self.frontend_url = other.frontend_url;
		}
		if other.cors_origins.is_some() {
			self.cors_origins = other.cors_origins;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		HttpConfig {
			host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
			port: self.port.unwrap_or(DEFAULT_PORT),
			frontend_url: self
				.frontend_url
				.map(|u| u.trim_end_matches('/').to_string())
				.unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
			cors_origins: self.cors_origins.unwrap_or_else(|| {
				vec![
					"http://localhost:3000".to_string(),
					"http://localhost:8080".to_string(),
				]
			}),
		}
	}
}
