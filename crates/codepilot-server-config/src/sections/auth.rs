// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session token and OAuth state settings.

use codepilot_common_secret::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

/// HMAC algorithms accepted for session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum JwtAlgorithm {
	#[default]
	HS256,
	HS384,
	HS512,
}

impl std::fmt::Display for JwtAlgorithm {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			JwtAlgorithm::HS256 => write!(f, "HS256"),
			JwtAlgorithm::HS384 => write!(f, "HS384"),
			JwtAlgorithm::HS512 => write!(f, "HS512"),
		}
	}
}

impl std::str::FromStr for JwtAlgorithm {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_uppercase().as_str() {
			"HS256" => Ok(JwtAlgorithm::HS256),
			"HS384" => Ok(JwtAlgorithm::HS384),
			"HS512" => Ok(JwtAlgorithm::HS512),
			_ => Err(ConfigError::InvalidValue {
				key: "auth.jwt_algorithm".to_string(),
				message: format!("unsupported algorithm '{s}', expected HS256, HS384 or HS512"),
			}),
		}
	}
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Signing key for session tokens. Required in production.
	pub jwt_secret: Option<SecretString>,
	pub jwt_algorithm: JwtAlgorithm,
	pub jwt_expire_minutes: i64,
	/// Deployment environment name, e.g. `development` or `production`.
	pub environment: String,
	pub oauth_state_ttl_secs: u64,
}

impl AuthConfig {
	pub fn is_production(&self) -> bool {
		self.environment.eq_ignore_ascii_case("production")
	}
}

impl Default for AuthConfig {
	fn default() -> Self {
		AuthConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfigLayer {
	pub jwt_secret: Option<SecretString>,
	pub jwt_algorithm: Option<JwtAlgorithm>,
	pub jwt_expire_minutes: Option<i64>,
	pub environment: Option<String>,
	pub oauth_state_ttl_secs: Option<u64>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.jwt_secret.is_some() {
			self.jwt_secret = other.jwt_secret;
		}
		if other.jwt_algorithm.is_some() {
			self.jwt_algorithm = other.jwt_algorithm;
		}
		if other.jwt_expire_minutes.is_some() {
			self.jwt_expire_minutes = other.jwt_expire_minutes;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
		if other.oauth_state_ttl_secs.is_some() {
			self.oauth_state_ttl_secs = other.oauth_state_ttl_secs;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			jwt_secret: self.jwt_secret,
			jwt_algorithm: self.jwt_algorithm.unwrap_or_default(),
			jwt_expire_minutes: self.jwt_expire_minutes.unwrap_or(1440),
			environment: self
				.environment
				.unwrap_or_else(|| "development".to_string()),
			oauth_state_ttl_secs: self.oauth_state_ttl_secs.unwrap_or(1800),
		}
	}
}
