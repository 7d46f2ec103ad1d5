// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use codepilot_common_secret::{load_secret_env, SecretString};
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AppConfigLayer, AuthConfigLayer, DatabaseConfigLayer, GitHubConfigLayer, HttpConfigLayer,
	LlmConfigLayer, LoggingConfigLayer, ProviderLayer, RateLimitConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/codepilot/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: CODEPILOT_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			app: Some(load_app_from_env()),
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()),
			auth: Some(load_auth_from_env()?),
			github: Some(load_github_from_env()?),
			llm: Some(load_llm_from_env()?),
			rate_limit: Some(load_rate_limit_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|s| {
		s.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	})
}

fn env_secret(name: &str) -> Result<Option<SecretString>, ConfigError> {
	load_secret_env(name).map_err(|e| ConfigError::Secret(e.to_string()))
}

fn load_app_from_env() -> AppConfigLayer {
	AppConfigLayer {
		name: env_var("CODEPILOT_SERVER_APP_NAME"),
		api_prefix: env_var("CODEPILOT_SERVER_API_PREFIX"),
		debug: env_bool("CODEPILOT_SERVER_DEBUG"),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("CODEPILOT_SERVER_HOST"),
		port: env_parse("CODEPILOT_SERVER_PORT", "u16")?,
		frontend_url: env_var("CODEPILOT_SERVER_FRONTEND_URL"),
		cors_origins: env_list("CODEPILOT_SERVER_CORS_ORIGINS"),
	})
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("CODEPILOT_SERVER_DATABASE_URL"),
	}
}

fn load_auth_from_env() -> Result<AuthConfigLayer, ConfigError> {
	let jwt_algorithm = match env_var("CODEPILOT_SERVER_JWT_ALGORITHM") {
		Some(v) => Some(v.parse()?),
		None => None,
	};

	Ok(AuthConfigLayer {
		jwt_secret: env_secret("CODEPILOT_SERVER_JWT_SECRET")?,
		jwt_algorithm,
		jwt_expire_minutes: env_parse("CODEPILOT_SERVER_JWT_EXPIRE_MINUTES", "i64")?,
		environment: env_var("CODEPILOT_SERVER_ENV"),
		oauth_state_ttl_secs: env_parse("CODEPILOT_SERVER_OAUTH_STATE_TTL_SECS", "u64")?,
	})
}

fn load_github_from_env() -> Result<GitHubConfigLayer, ConfigError> {
	Ok(GitHubConfigLayer {
		client_id: env_var("CODEPILOT_SERVER_GITHUB_CLIENT_ID"),
		client_secret: env_secret("CODEPILOT_SERVER_GITHUB_CLIENT_SECRET")?,
		redirect_uri: env_var("CODEPILOT_SERVER_GITHUB_REDIRECT_URI"),
		scopes: env_var("CODEPILOT_SERVER_GITHUB_SCOPES"),
		oauth_base_url: env_var("CODEPILOT_SERVER_GITHUB_OAUTH_BASE_URL"),
		api_base_url: env_var("CODEPILOT_SERVER_GITHUB_API_BASE_URL"),
	})
}

/// Reads `CODEPILOT_SERVER_<PREFIX>_{API_KEY,BASE_URL,MODEL}`.
fn load_provider_from_env(prefix: &str) -> Result<Option<ProviderLayer>, ConfigError> {
	let layer = ProviderLayer {
		api_key: env_secret(&format!("CODEPILOT_SERVER_{prefix}_API_KEY"))?,
		base_url: env_var(&format!("CODEPILOT_SERVER_{prefix}_BASE_URL")),
		model: env_var(&format!("CODEPILOT_SERVER_{prefix}_MODEL")),
	};
	if layer.api_key.is_none() && layer.base_url.is_none() && layer.model.is_none() {
		return Ok(None);
	}
	Ok(Some(layer))
}

fn load_llm_from_env() -> Result<LlmConfigLayer, ConfigError> {
	let default_provider = match env_var("CODEPILOT_SERVER_LLM_PROVIDER") {
		Some(v) => Some(v.parse()?),
		None => None,
	};

	let local = {
		let base_url = env_var("CODEPILOT_SERVER_LOCAL_LLM_URL");
		let model = env_var("CODEPILOT_SERVER_LOCAL_LLM_MODEL");
		if base_url.is_some() || model.is_some() {
			Some(ProviderLayer {
				api_key: None,
				base_url,
				model,
			})
		} else {
			None
		}
	};

	Ok(LlmConfigLayer {
		default_provider,
		max_tokens: env_parse("CODEPILOT_SERVER_LLM_MAX_TOKENS", "u32")?,
		temperature: env_parse("CODEPILOT_SERVER_LLM_TEMPERATURE", "f32")?,
		timeout_secs: env_parse("CODEPILOT_SERVER_LLM_TIMEOUT_SECS", "u64")?,
		openai: load_provider_from_env("OPENAI")?,
		siliconflow: load_provider_from_env("SILICONFLOW")?,
		qwen: load_provider_from_env("QWEN")?,
		zhipu: load_provider_from_env("ZHIPU")?,
		local,
	})
}

fn load_rate_limit_from_env() -> Result<RateLimitConfigLayer, ConfigError> {
	Ok(RateLimitConfigLayer {
		enabled: env_bool("CODEPILOT_SERVER_RATE_LIMIT_ENABLED"),
		requests: env_parse("CODEPILOT_SERVER_RATE_LIMIT_REQUESTS", "u32")?,
		period_secs: env_parse("CODEPILOT_SERVER_RATE_LIMIT_PERIOD_SECS", "u64")?,
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("CODEPILOT_SERVER_LOG_FORMAT") {
		Some(v) => Some(v.parse()?),
		None => None,
	};
	Ok(LoggingConfigLayer {
		level: env_var("CODEPILOT_SERVER_LOG_LEVEL"),
		format,
	})
}
