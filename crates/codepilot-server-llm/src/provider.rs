// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolution of a provider name into a usable endpoint.

use codepilot_common_secret::SecretString;
use codepilot_server_config::{LlmConfig, LlmProvider};

use crate::error::LlmError;

/// Values shipped in sample `.env` files that must never reach a provider.
const PLACEHOLDER_KEYS: &[&str] = &["your_openai_api_key", "your_api_key"];

/// A hosted provider that authenticates with a bearer key.
#[derive(Debug, Clone)]
pub struct HostedProvider {
	pub api_key: SecretString,
	pub base_url: String,
	pub model: String,
}

/// Endpoint settings for one provider, ready for a [`crate::ChatClient`].
#[derive(Debug, Clone)]
pub enum ProviderConfig {
	OpenAi(HostedProvider),
	SiliconFlow(HostedProvider),
	Qwen(HostedProvider),
	Zhipu(HostedProvider),
	/// A self-hosted OpenAI-compatible server; no key is sent.
	Local { base_url: String, model: String },
}

impl ProviderConfig {
	/// Pick `provider`'s settings out of `config`, rejecting missing or
	/// placeholder credentials.
	pub fn resolve(config: &LlmConfig, provider: LlmProvider) -> Result<Self, LlmError> {
		let wrap: fn(HostedProvider) -> ProviderConfig = match provider {
			LlmProvider::OpenAi => ProviderConfig::OpenAi,
			LlmProvider::SiliconFlow => ProviderConfig::SiliconFlow,
			LlmProvider::Qwen => ProviderConfig::Qwen,
			LlmProvider::Zhipu => ProviderConfig::Zhipu,
			LlmProvider::Local => return Self::resolve_local(config),
		};

		let not_configured = || {
			LlmError::NotConfigured(format!(
				"API key for provider '{provider}' is not configured. Set CODEPILOT_SERVER_{}_API_KEY to a valid key.",
				provider.as_str().to_uppercase()
			))
		};

		let endpoint = config.hosted(provider).ok_or_else(not_configured)?;
		let api_key = endpoint
			.api_key
			.as_ref()
			.filter(|key| is_usable_key(key.expose()))
			.cloned()
			.ok_or_else(not_configured)?;

		Ok(wrap(HostedProvider {
			api_key,
			base_url: endpoint.base_url.clone(),
			model: endpoint.model.clone(),
		}))
	}

	fn resolve_local(config: &LlmConfig) -> Result<Self, LlmError> {
		let base_url = config.local.base_url.clone().ok_or_else(|| {
			LlmError::NotConfigured(
				"LOCAL_LLM_URL is not configured. Set CODEPILOT_SERVER_LOCAL_LLM_URL or use a different provider."
					.to_string(),
			)
		})?;
		Ok(ProviderConfig::Local {
			base_url,
			model: config.local.model.clone(),
		})
	}

	pub fn provider(&self) -> LlmProvider {
		match self {
			ProviderConfig::OpenAi(_) => LlmProvider::OpenAi,
			ProviderConfig::SiliconFlow(_) => LlmProvider::SiliconFlow,
			ProviderConfig::Qwen(_) => LlmProvider::Qwen,
			ProviderConfig::Zhipu(_) => LlmProvider::Zhipu,
			ProviderConfig::Local { .. } => LlmProvider::Local,
		}
	}

	fn hosted(&self) -> Option<&HostedProvider> {
		match self {
			ProviderConfig::OpenAi(h)
			| ProviderConfig::SiliconFlow(h)
			| ProviderConfig::Qwen(h)
			| ProviderConfig::Zhipu(h) => Some(h),
			ProviderConfig::Local { .. } => None,
		}
	}

	pub fn base_url(&self) -> &str {
		match self {
			ProviderConfig::OpenAi(h)
			| ProviderConfig::SiliconFlow(h)
			| ProviderConfig::Qwen(h)
			| ProviderConfig::Zhipu(h) => &h.base_url,
			ProviderConfig::Local { base_url, .. } => base_url,
		}
	}

	pub fn model(&self) -> &str {
		match self {
			ProviderConfig::OpenAi(h)
			| ProviderConfig::SiliconFlow(h)
			| ProviderConfig::Qwen(h)
			| ProviderConfig::Zhipu(h) => &h.model,
			ProviderConfig::Local { model, .. } => model,
		}
	}

	pub fn api_key(&self) -> Option<&SecretString> {
		self.hosted().map(|h| &h.api_key)
	}
}

fn is_usable_key(key: &str) -> bool {
	let key = key.trim();
	!key.is_empty() && !PLACEHOLDER_KEYS.contains(&key)
}
