// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading secrets from the environment.
//!
//! A secret named `FOO` is read from `FOO` directly, or from the file whose
//! path is in `FOO_FILE`. Setting both is an error.

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::SecretString;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("both {name} and {name}_FILE are set; use only one")]
	Ambiguous { name: String },

	#[error("failed to read secret file {path} for {name}: {source}")]
	FileRead {
		name: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Load a secret from `name` or `name_FILE`. Empty values count as unset.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{name}_FILE");
	let direct = std::env::var(name).ok().filter(|v| !v.is_empty());
	let file = std::env::var(&file_var).ok().filter(|v| !v.is_empty());

	match (direct, file) {
		(Some(_), Some(_)) => Err(SecretEnvError::Ambiguous {
			name: name.to_string(),
		}),
		(Some(value), None) => Ok(Some(SecretString::new(value))),
		(None, Some(path)) => {
			let path = PathBuf::from(path);
			debug!(var = %file_var, path = %path.display(), "reading secret from file");
			let content =
				std::fs::read_to_string(&path).map_err(|source| SecretEnvError::FileRead {
					name: name.to_string(),
					path: path.clone(),
					source,
				})?;
			let trimmed = content.trim_end_matches(['\n', '\r']).to_string();
			if trimmed.is_empty() {
				Ok(None)
			} else {
				Ok(Some(SecretString::new(trimmed)))
			}
		}
		(None, None) => Ok(None),
	}
}
