// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl DbError {
	/// Turn constraint violations into [`DbError::Conflict`].
	pub(crate) fn from_write(err: sqlx::Error) -> Self {
		if let sqlx::Error::Database(db) = &err {
			if db.is_unique_violation() || db.is_foreign_key_violation() {
				return DbError::Conflict(db.message().to_string());
			}
		}
		DbError::Sqlx(err)
	}
}

pub type Result<T> = std::result::Result<T, DbError>;
