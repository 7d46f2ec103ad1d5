// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! LLM configuration section.
//!
//! Every supported provider speaks the OpenAI chat-completions protocol, so a
//! provider is fully described by a base URL, a model and an optional key.

use codepilot_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Available LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
	#[default]
	OpenAi,
	SiliconFlow,
	Qwen,
	Zhipu,
	Local,
}

impl LlmProvider {
	pub const ALL: [LlmProvider; 5] = [
		LlmProvider::OpenAi,
		LlmProvider::SiliconFlow,
		LlmProvider::Qwen,
		LlmProvider::Zhipu,
		LlmProvider::Local,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			LlmProvider::OpenAi => "openai",
			LlmProvider::SiliconFlow => "siliconflow",
			LlmProvider::Qwen => "qwen",
			LlmProvider::Zhipu => "zhipu",
			LlmProvider::Local => "local",
		}
	}
}

impl std::fmt::Display for LlmProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for LlmProvider {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"openai" => Ok(LlmProvider::OpenAi),
			"siliconflow" => Ok(LlmProvider::SiliconFlow),
			"qwen" => Ok(LlmProvider::Qwen),
			"zhipu" => Ok(LlmProvider::Zhipu),
			"local" => Ok(LlmProvider::Local),
			_ => Err(ConfigError::InvalidValue {
				key: "provider".to_string(),
				message: format!(
					"unknown provider '{s}', expected 'openai', 'siliconflow', 'qwen', 'zhipu', or 'local'"
				),
			}),
		}
	}
}

/// A hosted provider endpoint (runtime).
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
	pub api_key: Option<SecretString>,
	pub base_url: String,
	pub model: String,
}

/// A self-hosted, keyless endpoint (runtime). Unusable until `base_url` is set.
#[derive(Debug, Clone)]
pub struct LocalEndpoint {
	pub base_url: Option<String>,
	pub model: String,
}

/// Per-provider layer, shared by all hosted providers and the local one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderLayer {
	pub api_key: Option<SecretString>,
	pub base_url: Option<String>,
	pub model: Option<String>,
}

impl ProviderLayer {
	pub fn merge(&mut self, other: ProviderLayer) {
		if other.api_key.is_some() {
			self.api_key = other.api_key;
		}
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.model.is_some() {
			self.model = other.model;
		}
	}

	fn finalize_hosted(self, base_url: &str, model: &str) -> ProviderEndpoint {
		ProviderEndpoint {
			api_key: self.api_key,
			base_url: self
				.base_url
				.unwrap_or_else(|| base_url.to_string())
				.trim_end_matches('/')
				.to_string(),
			model: self.model.unwrap_or_else(|| model.to_string()),
		}
	}

	fn finalize_local(self) -> LocalEndpoint {
		LocalEndpoint {
			base_url: self.base_url.map(|u| u.trim_end_matches('/').to_string()),
			model: self.model.unwrap_or_else(|| "codellama".to_string()),
		}
	}
}

/// LLM configuration layer (for merging).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmConfigLayer {
	pub default_provider: Option<LlmProvider>,
	pub max_tokens: Option<u32>,
	pub temperature: Option<f32>,
	pub timeout_secs: Option<u64>,
	pub openai: Option<ProviderLayer>,
	pub siliconflow: Option<ProviderLayer>,
	pub qwen: Option<ProviderLayer>,
	pub zhipu: Option<ProviderLayer>,
	pub local: Option<ProviderLayer>,
}

fn merge_provider(base: &mut Option<ProviderLayer>, other: Option<ProviderLayer>) {
	match (base.as_mut(), other) {
		(Some(existing), Some(incoming)) => existing.merge(incoming),
		(None, Some(incoming)) => *base = Some(incoming),
		(_, None) => {}
	}
}

impl LlmConfigLayer {
	/// Merges another layer on top of this one.
	/// Values from `other` take precedence when present.
	pub fn merge(&mut self, other: LlmConfigLayer) {
		if other.default_provider.is_some() {
			self.default_provider = other.default_provider;
		}
		if other.max_tokens.is_some() {
			self.max_tokens = other.max_tokens;
		}
		if other.temperature.is_some() {
			self.temperature = other.temperature;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		merge_provider(&mut self.openai, other.openai);
		merge_provider(&mut self.siliconflow, other.siliconflow);
		merge_provider(&mut self.qwen, other.qwen);
		merge_provider(&mut self.zhipu, other.zhipu);
		merge_provider(&mut self.local, other.local);
	}

	/// Resolves this layer into a runtime configuration.
	pub fn finalize(self) -> LlmConfig {
		LlmConfig {
			default_provider: self.default_provider.unwrap_or_default(),
			max_tokens: self.max_tokens.unwrap_or(4096),
			temperature: self.temperature.unwrap_or(0.7),
			timeout_secs: self.timeout_secs.unwrap_or(120),
			openai: self
				.openai
				.unwrap_or_default()
				.finalize_hosted("https://api.openai.com/v1", "gpt-4o"),
			siliconflow: self
				.siliconflow
				.unwrap_or_default()
				.finalize_hosted("https://api.siliconflow.cn/v1", "deepseek-ai/DeepSeek-V3"),
			qwen: self.qwen.unwrap_or_default().finalize_hosted(
				"https://dashscope.aliyuncs.com/compatible-mode/v1",
				"qwen-plus",
			),
			zhipu: self
				.zhipu
				.unwrap_or_default()
				.finalize_hosted("https://open.bigmodel.cn/api/paas/v4", "glm-4"),
			local: self.local.unwrap_or_default().finalize_local(),
		}
	}
}

/// LLM configuration (runtime).
#[derive(Debug, Clone)]
pub struct LlmConfig {
	pub default_provider: LlmProvider,
	pub max_tokens: u32,
	pub temperature: f32,
	pub timeout_secs: u64,
	pub openai: ProviderEndpoint,
	pub siliconflow: ProviderEndpoint,
	pub qwen: ProviderEndpoint,
	pub zhipu: ProviderEndpoint,
	pub local: LocalEndpoint,
}

impl Default for LlmConfig {
	fn default() -> Self {
		LlmConfigLayer::default().finalize()
	}
}

impl LlmConfig {
	/// The hosted endpoint for `provider`, or `None` for the local provider.
	pub fn hosted(&self, provider: LlmProvider) -> Option<&ProviderEndpoint> {
		match provider {
			LlmProvider::OpenAi => Some(&self.openai),
			LlmProvider::SiliconFlow => Some(&self.siliconflow),
			LlmProvider::Qwen => Some(&self.qwen),
			LlmProvider::Zhipu => Some(&self.zhipu),
			LlmProvider::Local => None,
		}
	}
}
