// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub OAuth 2.0 authorization code flow.

use std::time::Duration;

use codepilot_common_secret::SecretString;
use serde::Deserialize;
use url::Url;

use crate::error::GitHubError;

pub const DEFAULT_OAUTH_BASE_URL: &str = "https://github.com";

/// Credentials and endpoints for the OAuth application.
#[derive(Debug, Clone)]
pub struct GitHubOAuthConfig {
	pub client_id: String,
	/// Never logged; `Debug` prints `[REDACTED]`.
	pub client_secret: SecretString,
	/// Must match the callback registered with the OAuth app.
	pub redirect_uri: String,
	pub scopes: Vec<String>,
	/// `https://github.com`, or a GitHub Enterprise host.
	pub oauth_base_url: String,
}

impl GitHubOAuthConfig {
	pub fn validate(&self) -> Result<(), GitHubError> {
		if self.client_id.trim().is_empty() {
			return Err(GitHubError::Config("client_id cannot be empty".to_string()));
		}
		if self.client_secret.expose().trim().is_empty() {
			return Err(GitHubError::Config(
				"client_secret cannot be empty".to_string(),
			));
		}
		if self.redirect_uri.trim().is_empty() {
			return Err(GitHubError::Config(
				"redirect_uri cannot be empty".to_string(),
			));
		}
		Ok(())
	}

	/// Scopes joined the way the authorize endpoint expects them.
	pub fn scopes_string(&self) -> String {
		self.scopes.join(" ")
	}
}

/// Successful response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubTokenResponse {
	pub access_token: SecretString,
	#[serde(default = "default_token_type")]
	pub token_type: String,
	/// Comma-separated scopes actually granted.
	#[serde(default)]
	pub scope: String,
}

fn default_token_type() -> String {
	"bearer".to_string()
}

#[derive(Debug, Deserialize)]
struct GitHubErrorResponse {
	error: String,
	error_description: Option<String>,
}

/// Generates authorize URLs and exchanges callback codes for tokens.
#[derive(Debug, Clone)]
pub struct GitHubOAuthClient {
	config: GitHubOAuthConfig,
	authorize_url: Url,
	token_url: Url,
	http_client: reqwest::Client,
}

impl GitHubOAuthClient {
	#[tracing::instrument(skip_all, name = "GitHubOAuthClient::new")]
	pub fn new(config: GitHubOAuthConfig) -> Result<Self, GitHubError> {
		config.validate()?;

		let base = Url::parse(config.oauth_base_url.trim_end_matches('/'))
			.map_err(|e| GitHubError::Config(format!("invalid oauth_base_url: {e}")))?;
		let authorize_url = base
			.join("/login/oauth/authorize")
			.map_err(|e| GitHubError::Config(format!("invalid authorize URL: {e}")))?;
		let token_url = base
			.join("/login/oauth/access_token")
			.map_err(|e| GitHubError::Config(format!("invalid token URL: {e}")))?;

		let http_client = codepilot_common_http::builder()
			.timeout(Duration::from_secs(30))
			.build()?;

		Ok(Self {
			config,
			authorize_url,
			token_url,
			http_client,
		})
	}

	pub fn config(&self) -> &GitHubOAuthConfig {
		&self.config
	}

	/// Build the URL the browser is sent to. `state` is echoed back on the
	/// callback and must be checked there.
	#[tracing::instrument(skip(self, state), fields(client_id = %self.config.client_id))]
	pub fn authorization_url(&self, state: &str) -> String {
		let mut url = self.authorize_url.clone();

		url
			.query_pairs_mut()
			.append_pair("client_id", &self.config.client_id)
			.append_pair("redirect_uri", &self.config.redirect_uri)
			.append_pair("scope", &self.config.scopes_string())
			.append_pair("state", state)
			.append_pair("allow_signup", "true");

		url.to_string()
	}

	/// Exchange the callback `code` for an access token.
	///
	/// GitHub reports a bad or expired code with a 200 and an `error` field,
	/// so the body is checked for that shape before the token shape.
	#[tracing::instrument(skip(self, code), name = "GitHubOAuthClient::exchange_code")]
	pub async fn exchange_code(&self, code: &str) -> Result<GitHubTokenResponse, GitHubError> {
		tracing::debug!("exchanging authorization code for access token");

		let response = self
			.http_client
			.post(self.token_url.clone())
			.header("Accept", "application/json")
			.form(&[
				("client_id", self.config.client_id.as_str()),
				("client_secret", self.config.client_secret.expose().as_str()),
				("code", code),
				("redirect_uri", self.config.redirect_uri.as_str()),
			])
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(GitHubError::from_response(response).await);
		}

		let body = response.text().await?;

		if let Ok(error_response) = serde_json::from_str::<GitHubErrorResponse>(&body) {
			if !error_response.error.is_empty() {
				let message = error_response
					.error_description
					.unwrap_or(error_response.error);
				tracing::warn!(%message, "GitHub refused the authorization code");
				return Err(GitHubError::OAuth(message));
			}
		}

		serde_json::from_str(&body).map_err(|e| {
			GitHubError::InvalidResponse(format!("failed to parse token response: {e}"))
		})
	}
}
