// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared validation utilities for API handlers.
//!
//! Every check returns [`ServerError::Validation`] naming the offending
//! field, which renders as a 422.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ServerError;

static REPO_PART_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-\.]+$").unwrap());

static BRANCH_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-./]+$").unwrap());

static FILE_PATH_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[\w\-. /@+]+$").unwrap());

static REVIEWER_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-]+$").unwrap());

pub const MAX_BRANCH_LEN: usize = 255;
pub const MAX_TITLE_LEN: usize = 256;
pub const MAX_BODY_LEN: usize = 65_535;
pub const MAX_REVIEWERS: usize = 20;
pub const MAX_REVIEWER_LEN: usize = 39;
pub const MAX_LABELS: usize = 50;
pub const MAX_TASK_NAME_LEN: usize = 255;
pub const MAX_PER_PAGE: u32 = 100;
pub const MAX_FILE_PATH_LEN: usize = 1024;
/// The contents API refuses larger files.
pub const MAX_FILE_BYTES: usize = 1024 * 1024;

pub const MERGE_METHODS: &[&str] = &["merge", "squash", "rebase"];
pub const REVIEW_EVENTS: &[&str] = &["APPROVE", "REQUEST_CHANGES", "COMMENT"];
pub const LIST_PR_STATES: &[&str] = &["open", "closed", "all"];
pub const UPDATE_PR_STATES: &[&str] = &["open", "closed"];

/// Owner or repository name.
pub fn validate_repo_part(field: &str, value: &str) -> Result<(), ServerError> {
	if !REPO_PART_REGEX.is_match(value) {
		return Err(ServerError::validation(
			field,
			format!("{field} may only contain letters, digits, '_', '-' and '.'"),
		));
	}
	Ok(())
}

pub fn validate_branch(field: &str, value: &str) -> Result<(), ServerError> {
	if value.is_empty() || value.len() > MAX_BRANCH_LEN {
		return Err(ServerError::validation(
			field,
			format!("{field} must be 1 to {MAX_BRANCH_LEN} characters"),
		));
	}
	if value.contains("..") {
		return Err(ServerError::validation(
			field,
			format!("{field} must not contain '..'"),
		));
	}
	if !BRANCH_REGEX.is_match(value) {
		return Err(ServerError::validation(
			field,
			format!("{field} contains invalid characters"),
		));
	}
	Ok(())
}

/// Repository-relative file or directory path.
pub fn validate_file_path(field: &str, value: &str) -> Result<(), ServerError> {
	if value.is_empty() || value.len() > MAX_FILE_PATH_LEN {
		return Err(ServerError::validation(
			field,
			format!("{field} must be 1 to {MAX_FILE_PATH_LEN} characters"),
		));
	}
	if value
		.split('/')
		.any(|segment| segment.is_empty() || segment == "." || segment == "..")
	{
		return Err(ServerError::validation(
			field,
			format!("{field} must be a relative path without empty, '.' or '..' segments"),
		));
	}
	if !FILE_PATH_REGEX.is_match(value) {
		return Err(ServerError::validation(
			field,
			format!("{field} contains invalid characters"),
		));
	}
	Ok(())
}

pub fn validate_commit_message(value: &str) -> Result<(), ServerError> {
	if value.trim().is_empty() || value.len() > MAX_BODY_LEN {
		return Err(ServerError::validation(
			"message",
			format!("message must be 1 to {MAX_BODY_LEN} characters"),
		));
	}
	Ok(())
}

pub fn validate_file_content(value: &str) -> Result<(), ServerError> {
	if value.len() > MAX_FILE_BYTES {
		return Err(ServerError::validation(
			"content",
			format!("content must be at most {MAX_FILE_BYTES} bytes"),
		));
	}
	Ok(())
}

pub fn validate_title(value: &str) -> Result<(), ServerError> {
	let len = value.chars().count();
	if len == 0 || len > MAX_TITLE_LEN {
		return Err(ServerError::validation(
			"title",
			format!("title must be 1 to {MAX_TITLE_LEN} characters"),
		));
	}
	Ok(())
}

pub fn validate_body(value: &str) -> Result<(), ServerError> {
	if value.chars().count() > MAX_BODY_LEN {
		return Err(ServerError::validation(
			"body",
			format!("body must be at most {MAX_BODY_LEN} characters"),
		));
	}
	Ok(())
}

pub fn validate_reviewers(reviewers: &[String]) -> Result<(), ServerError> {
	if reviewers.len() > MAX_REVIEWERS {
		return Err(ServerError::validation(
			"reviewers",
			format!("at most {MAX_REVIEWERS} reviewers are allowed"),
		));
	}
	for reviewer in reviewers {
		if reviewer.len() > MAX_REVIEWER_LEN || !REVIEWER_REGEX.is_match(reviewer) {
			return Err(ServerError::validation(
				"reviewers",
				format!("invalid reviewer username '{reviewer}'"),
			));
		}
	}
	Ok(())
}

pub fn validate_labels(labels: &[String]) -> Result<(), ServerError> {
	if labels.len() > MAX_LABELS {
		return Err(ServerError::validation(
			"labels",
			format!("at most {MAX_LABELS} labels are allowed"),
		));
	}
	Ok(())
}

pub fn validate_issue_number(value: Option<i64>) -> Result<(), ServerError> {
	match value {
		Some(n) if n < 1 => Err(ServerError::validation(
			"issue_number",
			"issue_number must be at least 1",
		)),
		_ => Ok(()),
	}
}

pub fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ServerError> {
	if !allowed.contains(&value) {
		return Err(ServerError::validation(
			field,
			format!("{field} must be one of: {}", allowed.join(", ")),
		));
	}
	Ok(())
}

pub fn validate_per_page(value: u32) -> Result<(), ServerError> {
	if !(1..=MAX_PER_PAGE).contains(&value) {
		return Err(ServerError::validation(
			"per_page",
			format!("per_page must be between 1 and {MAX_PER_PAGE}"),
		));
	}
	Ok(())
}

pub fn validate_limit(value: u32) -> Result<(), ServerError> {
	if !(1..=MAX_PER_PAGE).contains(&value) {
		return Err(ServerError::validation(
			"limit",
			format!("limit must be between 1 and {MAX_PER_PAGE}"),
		));
	}
	Ok(())
}

pub fn validate_page(value: u32) -> Result<(), ServerError> {
	if value < 1 {
		return Err(ServerError::validation("page", "page must be at least 1"));
	}
	Ok(())
}

pub fn validate_task_name(value: &str) -> Result<(), ServerError> {
	let len = value.chars().count();
	if len == 0 || len > MAX_TASK_NAME_LEN {
		return Err(ServerError::validation(
			"name",
			format!("name must be 1 to {MAX_TASK_NAME_LEN} characters"),
		));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn file_paths() {
		assert!(validate_file_path("path", "src/lib.rs").is_ok());
		assert!(validate_file_path("path", "docs/Getting Started.md").is_ok());
		assert!(validate_file_path("path", ".github/workflows/ci.yml").is_ok());
		assert!(validate_file_path("path", "").is_err());
		assert!(validate_file_path("path", "/etc/passwd").is_err());
		assert!(validate_file_path("path", "src//lib.rs").is_err());
		assert!(validate_file_path("path", "src/../secrets").is_err());
		assert!(validate_file_path("path", "src/").is_err());
		assert!(validate_file_path("path", "a?b").is_err());
		assert!(validate_file_path("path", "a#b").is_err());
	}

	#[test]
	fn commit_message_and_content() {
		assert!(validate_commit_message("Add parser").is_ok());
		assert!(validate_commit_message("  ").is_err());
		assert!(validate_file_content("").is_ok());
		assert!(validate_file_content(&"x".repeat(MAX_FILE_BYTES + 1)).is_err());
	}

	#[test]
	fn repo_parts() {
		assert!(validate_repo_part("repo_owner", "octo-org").is_ok());
		assert!(validate_repo_part("repo_name", "my.repo_1").is_ok());
		assert!(validate_repo_part("repo_name", "").is_err());
		assert!(validate_repo_part("repo_name", "a/b").is_err());
		assert!(validate_repo_part("repo_name", "a b").is_err());
	}

	#[test]
	fn branches() {
		assert!(validate_branch("head_branch", "feature/login-page").is_ok());
		assert!(validate_branch("head_branch", "release/1.2").is_ok());
		assert!(validate_branch("head_branch", "a..b").is_err());
		assert!(validate_branch("head_branch", "").is_err());
		assert!(validate_branch("head_branch", "has space").is_err());
		assert!(validate_branch("head_branch", &"a".repeat(256)).is_err());
		assert!(validate_branch("head_branch", &"a".repeat(255)).is_ok());
	}

	#[test]
	fn titles_and_bodies() {
		assert!(validate_title("Add login").is_ok());
		assert!(validate_title("").is_err());
		assert!(validate_title(&"x".repeat(257)).is_err());
		assert!(validate_body("").is_ok());
		assert!(validate_body(&"x".repeat(65_536)).is_err());
	}

	#[test]
	fn reviewers_and_labels() {
		assert!(validate_reviewers(&["octocat".to_string(), "hubot".to_string()]).is_ok());
		assert!(validate_reviewers(&["bad name".to_string()]).is_err());
		assert!(validate_reviewers(&["a".repeat(40)]).is_err());
		let many: Vec<String> = (0..21).map(|i| format!("user{i}")).collect();
		assert!(validate_reviewers(&many).is_err());
		let labels: Vec<String> = (0..51).map(|i| format!("l{i}")).collect();
		assert!(validate_labels(&labels).is_err());
		assert!(validate_labels(&labels[..50]).is_ok());
	}

	#[test]
	fn enumerations() {
		assert!(validate_one_of("merge_method", "squash", MERGE_METHODS).is_ok());
		assert!(validate_one_of("merge_method", "octopus", MERGE_METHODS).is_err());
		assert!(validate_one_of("event", "APPROVE", REVIEW_EVENTS).is_ok());
		assert!(validate_one_of("event", "approve", REVIEW_EVENTS).is_err());
		assert!(validate_one_of("state", "all", LIST_PR_STATES).is_ok());
		assert!(validate_one_of("state", "all", UPDATE_PR_STATES).is_err());
	}

	#[test]
	fn issue_numbers() {
		assert!(validate_issue_number(None).is_ok());
		assert!(validate_issue_number(Some(1)).is_ok());
		assert!(validate_issue_number(Some(0)).is_err());
	}

	#[test]
	fn error_names_field() {
		match validate_per_page(0) {
			Err(ServerError::Validation { field, .. }) => {
				assert_eq!(field.as_deref(), Some("per_page"))
			}
			other => panic!("unexpected: {other:?}"),
		}
	}

	proptest! {
		#[test]
		fn valid_branch_names_accepted(name in "[a-zA-Z0-9_-]{1,20}(/[a-zA-Z0-9_-]{1,20}){0,3}") {
			prop_assert!(validate_branch("branch", &name).is_ok());
		}

		#[test]
		fn branch_with_dotdot_rejected(prefix in "[a-z]{0,10}", suffix in "[a-z]{0,10}") {
			let name = format!("{prefix}..{suffix}");
			prop_assert!(validate_branch("branch", &name).is_err());
		}

		#[test]
		fn per_page_bounds(value in 0u32..300) {
			prop_assert_eq!(validate_per_page(value).is_ok(), (1..=100).contains(&value));
		}

		#[test]
		fn task_name_length(name in "\\PC{0,300}") {
			let len = name.chars().count();
			prop_assert_eq!(validate_task_name(&name).is_ok(), (1..=255).contains(&len));
		}
	}
}
