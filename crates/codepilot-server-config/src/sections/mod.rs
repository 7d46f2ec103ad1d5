// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a runtime type and a `*Layer` used for
//! merging sources.

mod app;
mod auth;
mod database;
mod github;
mod http;
mod llm;
mod logging;
mod rate_limit;

pub use app::{AppConfig, AppConfigLayer};
pub use auth::{AuthConfig, AuthConfigLayer, JwtAlgorithm};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use github::{parse_scopes, GitHubConfig, GitHubConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use llm::{
	LlmConfig, LlmConfigLayer, LlmProvider, LocalEndpoint, ProviderEndpoint, ProviderLayer,
};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use rate_limit::{RateLimitConfig, RateLimitConfigLayer};
