// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub integration for Codepilot.
//!
//! Two clients live here:
//!
//! - [`GitHubOAuthClient`] runs the OAuth 2.0 authorization code flow that
//!   signs users in and yields their access token.
//! - [`GitHubClient`] calls the REST API with that token to read repositories,
//!   create branches, read and commit files, and manage pull requests.
//!
//! # Example
//!
//! ```rust,no_run
//! use codepilot_server_github::{GitHubClient, GitHubOAuthClient, GitHubOAuthConfig};
//!
//! # async fn example(config: GitHubOAuthConfig) -> Result<(), codepilot_server_github::GitHubError> {
//! let oauth = GitHubOAuthClient::new(config)?;
//! let redirect_to = oauth.authorization_url("random-state");
//!
//! // ... the browser comes back to the callback with `code` ...
//! let token = oauth.exchange_code("code-from-callback").await?;
//!
//! let api = GitHubClient::new(codepilot_server_github::DEFAULT_API_BASE_URL)?;
//! let user = api.get_user(token.access_token.expose()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Access tokens and the client secret are held in
//! [`codepilot_common_secret::SecretString`] and tracing spans skip them.

pub mod client;
pub mod error;
pub mod oauth;
pub mod types;

pub use client::{GitHubClient, DEFAULT_API_BASE_URL};
pub use error::GitHubError;
pub use oauth::{GitHubOAuthClient, GitHubOAuthConfig, GitHubTokenResponse, DEFAULT_OAUTH_BASE_URL};
pub use types::*;

#[cfg(test)]
mod proptests {
	use super::*;
	use codepilot_common_secret::SecretString;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn authorization_url_round_trips_state(state in "[A-Za-z0-9_-]{1,64}") {
			let client = GitHubOAuthClient::new(GitHubOAuthConfig {
				client_id: "id".to_string(),
				client_secret: SecretString::from("secret"),
				redirect_uri: "http://localhost/cb".to_string(),
				scopes: vec!["repo".to_string()],
				oauth_base_url: DEFAULT_OAUTH_BASE_URL.to_string(),
			}).unwrap();
			let url = url::Url::parse(&client.authorization_url(&state)).unwrap();
			let found = url
				.query_pairs()
				.find(|(k, _)| k == "state")
				.map(|(_, v)| v.into_owned());
			prop_assert_eq!(found, Some(state));
		}

		#[test]
		fn secret_never_in_debug(secret in "[a-z0-9]{12,40}") {
			let config = GitHubOAuthConfig {
				client_id: "id".to_string(),
				client_secret: SecretString::from(secret.as_str()),
				redirect_uri: "http://localhost/cb".to_string(),
				scopes: vec![],
				oauth_base_url: DEFAULT_OAUTH_BASE_URL.to_string(),
			};
			let rendered = format!("{:?}", config);
			prop_assert!(!rendered.contains(&secret));
		}
	}
}
