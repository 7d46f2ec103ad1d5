// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User repository.
//!
//! Users are created on first GitHub sign-in and refreshed on every later
//! one. The GitHub access token lives in the same row but is never part of
//! [`User`]; callers that act on GitHub ask for it explicitly.

use async_trait::async_trait;
use codepilot_common_secret::SecretString;
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;
use crate::types::{now_timestamp, parse_optional_timestamp, parse_timestamp, GitHubUserUpsert, User};

#[async_trait]
pub trait UserStore: Send + Sync {
	async fn upsert_github_user(&self, input: &GitHubUserUpsert) -> Result<User, DbError>;
	async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DbError>;
	async fn get_access_token(&self, id: &str) -> Result<Option<SecretString>, DbError>;
}

#[async_trait]
impl UserStore for UserRepository {
	async fn upsert_github_user(&self, input: &GitHubUserUpsert) -> Result<User, DbError> {
		self.upsert_github_user(input).await
	}

	async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
		self.get_user_by_id(id).await
	}

	async fn get_access_token(&self, id: &str) -> Result<Option<SecretString>, DbError> {
		self.get_access_token(id).await
	}
}

#[derive(Clone)]
pub struct UserRepository {
	pool: SqlitePool,
}

const USER_COLUMNS: &str =
	"id, github_id, username, email, name, avatar_url, created_at, updated_at, last_login_at";

impl UserRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert or refresh the account for a GitHub identity.
	///
	/// The internal id and `created_at` survive later sign-ins; profile
	/// fields, token and `last_login_at` are overwritten.
	#[tracing::instrument(skip(self, input), fields(github_id = input.github_id, username = %input.username))]
	pub async fn upsert_github_user(&self, input: &GitHubUserUpsert) -> Result<User, DbError> {
		let id = Uuid::new_v4().to_string();
		let now = now_timestamp();

		sqlx::query(
			r#"
			INSERT INTO users (
				id, github_id, username, email, name, avatar_url,
				github_access_token, created_at, updated_at, last_login_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(github_id) DO UPDATE SET
				username = excluded.username,
				email = excluded.email,
				name = excluded.name,
				avatar_url = excluded.avatar_url,
				github_access_token = excluded.github_access_token,
				updated_at = excluded.updated_at,
				last_login_at = excluded.last_login_at
			"#,
		)
		.bind(&id)
		.bind(input.github_id)
		.bind(&input.username)
		.bind(&input.email)
		.bind(&input.name)
		.bind(&input.avatar_url)
		.bind(input.access_token.expose())
		.bind(&now)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await
		.map_err(DbError::from_write)?;

		let user = self
			.get_user_by_github_id(input.github_id)
			.await?
			.ok_or_else(|| DbError::Internal("user vanished after upsert".to_string()))?;

		tracing::debug!(user_id = %user.id, "GitHub user upserted");
		Ok(user)
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
		let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		row.as_ref().map(parse_user_row).transpose()
	}

	#[tracing::instrument(skip(self))]
	async fn get_user_by_github_id(&self, github_id: i64) -> Result<Option<User>, DbError> {
		let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE github_id = ?"))
			.bind(github_id)
			.fetch_optional(&self.pool)
			.await?;

		row.as_ref().map(parse_user_row).transpose()
	}

	/// The stored GitHub token. `None` when the user is unknown or has none.
	#[tracing::instrument(skip(self))]
	pub async fn get_access_token(&self, id: &str) -> Result<Option<SecretString>, DbError> {
		let row = sqlx::query("SELECT github_access_token FROM users WHERE id = ?")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some(row) => {
				let token: Option<String> = row.try_get("github_access_token")?;
				Ok(token.filter(|t| !t.is_empty()).map(SecretString::new))
			}
			None => Ok(None),
		}
	}
}

fn parse_user_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, DbError> {
	let created_at: String = row.try_get("created_at")?;
	let updated_at: String = row.try_get("updated_at")?;

	Ok(User {
		id: row.try_get("id")?,
		github_id: row.try_get("github_id")?,
		username: row.try_get("username")?,
		email: row.try_get("email")?,
		name: row.try_get("name")?,
		avatar_url: row.try_get("avatar_url")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
		last_login_at: parse_optional_timestamp(row.try_get("last_login_at")?, "last_login_at")?,
	})
}
