// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Creates a new HTTP client builder with the standard Codepilot User-Agent.
///
/// Use this when you need to customize the client (e.g., set timeout).
///
/// # Example
/// ```ignore
/// let client = codepilot_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client with the standard User-Agent and no timeout.
pub fn new_client() -> Result<Client, reqwest::Error> {
	builder().build()
}

/// Creates a new HTTP client with a custom timeout and the standard User-Agent.
pub fn new_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
	builder().timeout(timeout).build()
}

/// Returns the standard User-Agent string.
///
/// Format: `codepilot/{version}/{os}-{arch}`. GitHub rejects API requests
/// that carry no User-Agent at all.
pub fn user_agent() -> String {
	format!(
		"codepilot/{}/{}-{}",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
