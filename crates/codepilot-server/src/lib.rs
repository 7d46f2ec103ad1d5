// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Codepilot HTTP server.
//!
//! Signs users in with GitHub, manages repositories and pull requests on
//! their behalf, runs LLM code assistance, and keeps task records in
//! SQLite.

pub mod api;
pub mod api_docs;
pub mod error;
pub mod jobs;
pub mod oauth_state;
pub mod rate_limit;
pub mod request_id;
pub mod routes;
pub mod session;
pub mod validation;

pub use api::{create_app_state, create_router, AppState};
pub use api_docs::ApiDoc;
pub use codepilot_server_config::ServerConfig;
pub use error::ServerError;
pub use jobs::CleanupJob;
pub use session::{SessionKeys, SessionUser};
