// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JWT sessions minted after a successful GitHub sign-in.
//!
//! Sessions are optional for most routes. The [`session_layer`] middleware
//! reads an `Authorization: Bearer <jwt>` header and, when the token checks
//! out, stores a [`SessionUser`] in the request extensions. Handlers then
//! pick it up with [`RequireSession`] or [`OptionalSession`]. A bad token is
//! logged and the request carries on anonymously.

use axum::{
	extract::{FromRequestParts, Request, State},
	http::{header::AUTHORIZATION, request::Parts, HeaderMap},
	middleware::Next,
	response::Response,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use codepilot_server_config::{AuthConfig, JwtAlgorithm};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{api::AppState, error::ServerError};

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// User id.
	pub sub: String,
	pub username: String,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub scopes: Vec<String>,
	pub iat: i64,
	pub exp: i64,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
	pub user_id: String,
	pub username: String,
	pub email: Option<String>,
	pub scopes: Vec<String>,
}

impl From<Claims> for SessionUser {
	fn from(claims: Claims) -> Self {
		Self {
			user_id: claims.sub,
			username: claims.username,
			email: claims.email,
			scopes: claims.scopes,
		}
	}
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	algorithm: Algorithm,
	ttl: chrono::Duration,
}

impl std::fmt::Debug for SessionKeys {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionKeys")
			.field("keys", &"[REDACTED]")
			.field("algorithm", &self.algorithm)
			.field("ttl", &self.ttl)
			.finish()
	}
}

impl SessionKeys {
	pub fn new(secret: &[u8], algorithm: JwtAlgorithm, expire_minutes: i64) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			algorithm: match algorithm {
				JwtAlgorithm::HS256 => Algorithm::HS256,
				JwtAlgorithm::HS384 => Algorithm::HS384,
				JwtAlgorithm::HS512 => Algorithm::HS512,
			},
			ttl: chrono::Duration::minutes(expire_minutes),
		}
	}

	/// Keys from the configured secret. Without one, a random secret is
	/// generated and sessions do not survive a restart.
	pub fn from_config(auth: &AuthConfig) -> Self {
		match &auth.jwt_secret {
			Some(secret) => Self::new(
				secret.expose().as_bytes(),
				auth.jwt_algorithm,
				auth.jwt_expire_minutes,
			),
			None => {
				tracing::warn!(
					"no JWT secret configured, using an ephemeral one; sessions end on restart"
				);
				let secret = ephemeral_secret();
				Self::new(secret.as_bytes(), auth.jwt_algorithm, auth.jwt_expire_minutes)
			}
		}
	}

	pub fn ttl(&self) -> chrono::Duration {
		self.ttl
	}

	/// Sign a token for `user`, valid for the configured lifetime.
	pub fn mint(&self, user: &SessionUser) -> Result<String, ServerError> {
		let now = Utc::now().timestamp();
		self.encode(&Claims {
			sub: user.user_id.clone(),
			username: user.username.clone(),
			email: user.email.clone(),
			scopes: user.scopes.clone(),
			iat: now,
			exp: now + self.ttl.num_seconds(),
		})
	}

	pub fn encode(&self, claims: &Claims) -> Result<String, ServerError> {
		jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding)
			.map_err(|e| ServerError::Internal(format!("failed to sign session token: {e}")))
	}

	pub fn verify(&self, token: &str) -> Result<Claims, ServerError> {
		let mut validation = Validation::new(self.algorithm);
		validation.leeway = 0;
		validation.set_required_spec_claims(&["exp", "sub"]);

		jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
			.map(|data| data.claims)
			.map_err(|e| match e.kind() {
				ErrorKind::ExpiredSignature => ServerError::TokenExpired,
				_ => ServerError::InvalidToken("Invalid session token".to_string()),
			})
	}
}

fn ephemeral_secret() -> String {
	let mut bytes = [0u8; 32];
	rand::thread_rng().fill_bytes(&mut bytes);
	URL_SAFE_NO_PAD.encode(bytes)
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
	headers
		.get(AUTHORIZATION)?
		.to_str()
		.ok()?
		.strip_prefix("Bearer ")
		.map(str::trim)
		.filter(|t| !t.is_empty())
}

/// Attach a [`SessionUser`] when the request carries a valid session token.
pub async fn session_layer(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Response {
	if let Some(token) = extract_bearer_token(request.headers()) {
		match state.session_keys.verify(token) {
			Ok(claims) => {
				tracing::debug!(user_id = %claims.sub, "session token accepted");
				request.extensions_mut().insert(SessionUser::from(claims));
			}
			Err(e) => {
				tracing::info!(error = %e, "ignoring invalid session token");
			}
		}
	}
	next.run(request).await
}

/// Extractor for routes that need a signed-in user.
pub struct RequireSession(pub SessionUser);

impl<S> FromRequestParts<S> for RequireSession
where
	S: Send + Sync,
{
	type Rejection = ServerError;

	#[instrument(name = "RequireSession::from_request_parts", skip_all)]
	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts
			.extensions
			.get::<SessionUser>()
			.cloned()
			.map(RequireSession)
			.ok_or_else(|| ServerError::AuthenticationFailed("Authentication required".to_string()))
	}
}

/// Extractor for routes that behave differently for signed-in users.
pub struct OptionalSession(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for OptionalSession
where
	S: Send + Sync,
{
	type Rejection = std::convert::Infallible;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(OptionalSession(parts.extensions.get::<SessionUser>().cloned()))
	}
}
