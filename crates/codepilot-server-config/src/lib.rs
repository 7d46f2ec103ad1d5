// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Codepilot server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`CODEPILOT_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use codepilot_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}:{}", config.http.host, config.http.port);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub app: AppConfig,
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub auth: AuthConfig,
	pub github: GitHubConfig,
	pub llm: LlmConfig,
	pub rate_limit: RateLimitConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`CODEPILOT_SERVER_*`)
/// 2. Config file (`/etc/codepilot/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		app: layer.app.unwrap_or_default().finalize(),
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		auth: layer.auth.unwrap_or_default().finalize(),
		github: layer.github.unwrap_or_default().finalize(),
		llm: layer.llm.unwrap_or_default().finalize(),
		rate_limit: layer.rate_limit.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		environment = %config.auth.environment,
		github_configured = config.github.is_configured(),
		llm_provider = %config.llm.default_provider,
		rate_limit_enabled = config.rate_limit.enabled,
		"Server configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.auth.is_production() && config.auth.jwt_secret.is_none() {
		return Err(ConfigError::Validation(
			"CODEPILOT_SERVER_JWT_SECRET must be set when CODEPILOT_SERVER_ENV=production"
				.to_string(),
		));
	}

	if config.http.port == 0 {
		return Err(ConfigError::Validation(
			"http.port must be non-zero".to_string(),
		));
	}

	if !(0.0..=2.0).contains(&config.llm.temperature) {
		return Err(ConfigError::Validation(format!(
			"llm.temperature must be within 0.0..=2.0, got {}",
			config.llm.temperature
		)));
	}

	if config.auth.jwt_expire_minutes <= 0 {
		return Err(ConfigError::Validation(
			"auth.jwt_expire_minutes must be positive".to_string(),
		));
	}

	if config.rate_limit.enabled && (config.rate_limit.requests == 0 || config.rate_limit.period_secs == 0) {
		return Err(ConfigError::Validation(
			"rate_limit.requests and rate_limit.period_secs must be non-zero".to_string(),
		));
	}

	Ok(())
}
