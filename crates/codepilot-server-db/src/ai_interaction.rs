// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit log of LLM calls made on behalf of signed-in users.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;
use crate::types::{now_timestamp, parse_timestamp, AiInteraction, NewAiInteraction};

#[async_trait]
pub trait AiInteractionStore: Send + Sync {
	async fn record_interaction(&self, input: &NewAiInteraction) -> Result<String, DbError>;
	async fn list_interactions_for_user(
		&self,
		user_id: &str,
		limit: u32,
	) -> Result<Vec<AiInteraction>, DbError>;
}

#[async_trait]
impl AiInteractionStore for AiInteractionRepository {
	async fn record_interaction(&self, input: &NewAiInteraction) -> Result<String, DbError> {
		self.record_interaction(input).await
	}

	async fn list_interactions_for_user(
		&self,
		user_id: &str,
		limit: u32,
	) -> Result<Vec<AiInteraction>, DbError> {
		self.list_interactions_for_user(user_id, limit).await
	}
}

#[derive(Clone)]
pub struct AiInteractionRepository {
	pool: SqlitePool,
}

impl AiInteractionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Returns the new row id.
	#[tracing::instrument(skip(self, input), fields(provider = %input.provider, context_type = %input.context_type))]
	pub async fn record_interaction(&self, input: &NewAiInteraction) -> Result<String, DbError> {
		let id = Uuid::new_v4().to_string();

		sqlx::query(
			r#"
			INSERT INTO ai_interactions (
				id, user_id, provider, model_name, context_type, prompt, response,
				prompt_tokens, completion_tokens, total_tokens, created_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(&id)
		.bind(&input.user_id)
		.bind(&input.provider)
		.bind(&input.model_name)
		.bind(&input.context_type)
		.bind(&input.prompt)
		.bind(&input.response)
		.bind(input.prompt_tokens)
		.bind(input.completion_tokens)
		.bind(input.total_tokens)
		.bind(now_timestamp())
		.execute(&self.pool)
		.await
		.map_err(DbError::from_write)?;

		tracing::debug!(interaction_id = %id, "AI interaction recorded");
		Ok(id)
	}

	/// Most recent first.
	#[tracing::instrument(skip(self))]
	pub async fn list_interactions_for_user(
		&self,
		user_id: &str,
		limit: u32,
	) -> Result<Vec<AiInteraction>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, user_id, provider, model_name, context_type, prompt, response,
			       prompt_tokens, completion_tokens, total_tokens, created_at
			FROM ai_interactions
			WHERE user_id = ?
			ORDER BY created_at DESC, rowid DESC
			LIMIT ?
			"#,
		)
		.bind(user_id)
		.bind(i64::from(limit))
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(parse_interaction_row).collect()
	}
}

fn parse_interaction_row(row: &sqlx::sqlite::SqliteRow) -> Result<AiInteraction, DbError> {
	let created_at: String = row.try_get("created_at")?;

	Ok(AiInteraction {
		id: row.try_get("id")?,
		user_id: row.try_get("user_id")?,
		provider: row.try_get("provider")?,
		model_name: row.try_get("model_name")?,
		context_type: row.try_get("context_type")?,
		prompt: row.try_get("prompt")?,
		response: row.try_get("response")?,
		prompt_tokens: row.try_get("prompt_tokens")?,
		completion_tokens: row.try_get("completion_tokens")?,
		total_tokens: row.try_get("total_tokens")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use crate::types::GitHubUserUpsert;
	use crate::user::UserRepository;
	use codepilot_common_secret::SecretString;

	fn interaction(user_id: &str, context_type: &str) -> NewAiInteraction {
		NewAiInteraction {
			user_id: Some(user_id.to_string()),
			provider: "openai".to_string(),
			model_name: "gpt-4".to_string(),
			context_type: context_type.to_string(),
			prompt: "write hello world".to_string(),
			response: "print('hello world')".to_string(),
			prompt_tokens: 12,
			completion_tokens: 8,
			total_tokens: 20,
		}
	}

	#[tokio::test]
	async fn records_and_lists_newest_first() {
		let pool = create_test_pool().await;
		let user = UserRepository::new(pool.clone())
			.upsert_github_user(&GitHubUserUpsert {
				github_id: 7,
				username: "dev".to_string(),
				email: None,
				name: None,
				avatar_url: None,
				access_token: SecretString::from("t"),
			})
			.await
			.unwrap();
		let repo = AiInteractionRepository::new(pool);

		repo.record_interaction(&interaction(&user.id, "generate")).await.unwrap();
		repo.record_interaction(&interaction(&user.id, "review")).await.unwrap();
		repo.record_interaction(&interaction(&user.id, "fix")).await.unwrap();

		let latest = repo.list_interactions_for_user(&user.id, 2).await.unwrap();
		assert_eq!(latest.len(), 2);
		assert_eq!(latest[0].context_type, "fix");
		assert_eq!(latest[1].context_type, "review");
		assert_eq!(latest[0].total_tokens, 20);
	}

	#[tokio::test]
	async fn unknown_user_is_rejected() {
		let repo = AiInteractionRepository::new(create_test_pool().await);
		let err = repo
			.record_interaction(&interaction("ghost", "generate"))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
	}
}
