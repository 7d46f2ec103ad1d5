// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OAuth state parameter store for CSRF protection.
//!
//! Each `/github/auth` call stores a random state bound to the OAuth
//! client id. The callback (or `/github/token`) must present it again
//! within the TTL, and it can be consumed only once.
//!
//! Entries are removed on consumption. Abandoned flows are swept by
//! [`OAuthStateStore::cleanup_expired`], which the server runs on a timer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::instrument;

const STATE_BYTES: usize = 16;

#[derive(Debug, Clone)]
struct StateEntry {
	client_id: String,
	created_at: Instant,
}

/// Why a presented state was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRejection {
	Unknown,
	Expired,
	ClientMismatch,
}

#[derive(Debug, Clone)]
pub struct OAuthStateStore {
	states: Arc<Mutex<HashMap<String, StateEntry>>>,
	ttl: Duration,
}

impl OAuthStateStore {
	pub fn new(ttl: Duration) -> Self {
		Self {
			states: Arc::new(Mutex::new(HashMap::new())),
			ttl,
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	#[instrument(skip(self, state))]
	pub async fn store(&self, state: String, client_id: &str) {
		let mut states = self.states.lock().await;
		states.insert(
			state,
			StateEntry {
				client_id: client_id.to_string(),
				created_at: Instant::now(),
			},
		);
		tracing::debug!(pending = states.len(), "stored OAuth state");
	}

	/// Remove `state` and check it was issued for `client_id` within the TTL.
	///
	/// The entry is gone afterwards whatever the outcome, so a state can be
	/// tried only once.
	#[instrument(skip(self, state))]
	pub async fn validate_and_consume(
		&self,
		state: &str,
		client_id: &str,
	) -> Result<(), StateRejection> {
		let entry = self
			.states
			.lock()
			.await
			.remove(state)
			.ok_or(StateRejection::Unknown)?;

		if entry.created_at.elapsed() > self.ttl {
			tracing::debug!("OAuth state expired");
			return Err(StateRejection::Expired);
		}
		if entry.client_id != client_id {
			tracing::warn!("OAuth state presented for a different client");
			return Err(StateRejection::ClientMismatch);
		}
		Ok(())
	}

	/// Drop expired entries, returning how many were removed.
	#[instrument(skip(self))]
	pub async fn cleanup_expired(&self) -> usize {
		let mut states = self.states.lock().await;
		let before = states.len();
		let ttl = self.ttl;
		states.retain(|_, entry| entry.created_at.elapsed() <= ttl);
		let removed = before - states.len();
		if removed > 0 {
			tracing::debug!(removed, "swept expired OAuth states");
		}
		removed
	}

	pub async fn len(&self) -> usize {
		self.states.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}
}

/// 16 random bytes, base64url without padding.
pub fn generate_state() -> String {
	let mut bytes = [0u8; STATE_BYTES];
	rand::thread_rng().fill_bytes(&mut bytes);
	URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn store() -> OAuthStateStore {
		OAuthStateStore::new(Duration::from_secs(1800))
	}

	#[test]
	fn generated_state_shape() {
		let state = generate_state();
		assert_eq!(state.len(), 22);
		assert!(!state.contains('='));
		assert!(state
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
		assert_ne!(generate_state(), state);
	}

	#[tokio::test]
	async fn state_is_single_use() {
		let store = store();
		store.store("abc".to_string(), "client").await;
		assert_eq!(store.validate_and_consume("abc", "client").await, Ok(()));
		assert_eq!(
			store.validate_and_consume("abc", "client").await,
			Err(StateRejection::Unknown)
		);
	}

	#[tokio::test]
	async fn unknown_state_rejected() {
		assert_eq!(
			store().validate_and_consume("nope", "client").await,
			Err(StateRejection::Unknown)
		);
	}

	#[tokio::test]
	async fn client_mismatch_rejected_and_consumed() {
		let store = store();
		store.store("abc".to_string(), "client-a").await;
		assert_eq!(
			store.validate_and_consume("abc", "client-b").await,
			Err(StateRejection::ClientMismatch)
		);
		assert!(store.is_empty().await);
	}

	#[tokio::test(start_paused = true)]
	async fn state_expires_after_ttl() {
		let store = OAuthStateStore::new(Duration::from_secs(60));
		store.store("abc".to_string(), "client").await;
		tokio::time::advance(Duration::from_secs(61)).await;
		assert_eq!(
			store.validate_and_consume("abc", "client").await,
			Err(StateRejection::Expired)
		);
	}

	#[tokio::test(start_paused = true)]
	async fn cleanup_removes_only_expired() {
		let store = OAuthStateStore::new(Duration::from_secs(60));
		store.store("old".to_string(), "client").await;
		tokio::time::advance(Duration::from_secs(45)).await;
		store.store("new".to_string(), "client").await;
		tokio::time::advance(Duration::from_secs(30)).await;

		assert_eq!(store.cleanup_expired().await, 1);
		assert_eq!(store.len().await, 1);
		assert_eq!(store.validate_and_consume("new", "client").await, Ok(()));
	}

	proptest! {
		#[test]
		fn generated_states_decode_to_sixteen_bytes(_ in 0u8..32) {
			let decoded = URL_SAFE_NO_PAD.decode(generate_state()).unwrap();
			prop_assert_eq!(decoded.len(), STATE_BYTES);
		}
	}
}
