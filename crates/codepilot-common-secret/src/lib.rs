// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret wrapper type that keeps sensitive values out of logs.
//!
//! - [`Secret<T>`]: prints `[REDACTED]` for both `Debug` and `Display`, and
//!   zeroizes its contents on drop
//! - [`load_secret_env`]: reads a secret from `NAME` or from the file named by
//!   `NAME_FILE`

pub mod env;

use std::fmt;

use zeroize::Zeroize;

pub use env::{load_secret_env, SecretEnvError};

/// Placeholder printed in place of secret values.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must never be logged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T: Zeroize> {
	inner: T,
}

/// The common case: a secret string such as a token or API key.
pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Borrow the secret value. Call sites should be easy to audit.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl<T: Zeroize> Drop for Secret<T> {
	fn drop(&mut self) {
		self.inner.zeroize();
	}
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T: Zeroize> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Secret::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Secret::new(value.to_string())
	}
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Secret<T>
where
	T: Zeroize + serde::Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		T::deserialize(deserializer).map(Secret::new)
	}
}

#[cfg(feature = "serde")]
impl<T> serde::Serialize for Secret<T>
where
	T: Zeroize + serde::Serialize,
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		self.inner.serialize(serializer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_is_redacted() {
		let secret = SecretString::new("ghp_supersecret".to_string());
		assert_eq!(format!("{secret:?}"), REDACTED);
		assert!(!format!("{secret:?}").contains("ghp_"));
	}

	#[test]
	fn display_is_redacted() {
		let secret = SecretString::from("sk-abc");
		assert_eq!(secret.to_string(), REDACTED);
	}

	#[test]
	fn expose_returns_inner() {
		let secret = SecretString::from("value");
		assert_eq!(secret.expose(), "value");
	}

	#[test]
	fn serde_is_transparent() {
		let secret: SecretString = serde_json::from_str("\"abc\"").unwrap();
		assert_eq!(secret.expose(), "abc");
		assert_eq!(serde_json::to_string(&secret).unwrap(), "\"abc\"");
	}

	#[derive(Debug)]
	struct Holder {
		#[allow(dead_code)]
		token: SecretString,
	}

	#[test]
	fn nested_debug_is_redacted() {
		let holder = Holder {
			token: SecretString::from("hunter2"),
		};
		let out = format!("{holder:?}");
		assert!(out.contains(REDACTED));
		assert!(!out.contains("hunter2"));
	}

	proptest! {
		#[test]
		fn never_leaks_through_debug(s in "[a-zA-Z0-9]{4,64}") {
			let secret = SecretString::new(s.clone());
			let rendered = format!("{:?}", secret);
			prop_assert!(!rendered.contains(&s));
			prop_assert_eq!(secret.expose(), &s);
		}
	}
}
