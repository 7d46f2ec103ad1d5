// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! LLM access for Codepilot.
//!
//! All supported providers (OpenAI, SiliconFlow, Qwen, Zhipu and a local
//! server) expose the OpenAI chat completions API, so a single
//! [`ChatClient`] serves them. [`LlmService`] layers the code assistant
//! operations on top: generation, modification, review, bug fixing,
//! documentation, PR descriptions, commit messages and free chat.

pub mod client;
pub mod error;
pub mod prompts;
pub mod provider;
pub mod service;
pub mod types;

pub use client::{ChatClient, LlmClient};
pub use codepilot_server_config::LlmProvider;
pub use error::LlmError;
pub use provider::{HostedProvider, ProviderConfig};
pub use service::{strip_code_fence, LlmService, ProviderChoice};
pub use types::{ChatMessage, Completion, CompletionRequest, Role};
