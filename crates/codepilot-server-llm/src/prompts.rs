// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Prompt templates for the code assistant operations.

pub const SYSTEM_DEVELOPER: &str = "You are an expert software developer.";
pub const SYSTEM_REVIEWER: &str = "You are an expert code reviewer.";
pub const SYSTEM_DEBUGGER: &str = "You are an expert debugger.";
pub const SYSTEM_TECH_WRITER: &str = "You are a technical writer.";
pub const SYSTEM_PR_WRITER: &str = "You are an expert at writing clear, concise PR descriptions.";
pub const SYSTEM_COMMIT_WRITER: &str = "You write clear, conventional commit messages.";

pub const CODE_GENERATION: &str = r#"You are an expert software developer. Generate high-quality, production-ready code based on the following requirements.

Requirements:
{requirements}

Context (existing code structure):
{context}

Language: {language}

Please generate code that:
1. Follows best practices and coding standards for {language}
2. Is well-documented with appropriate comments
3. Handles edge cases and errors appropriately
4. Is efficient and maintainable

Generate ONLY the code, without explanations unless specifically asked."#;

pub const CODE_MODIFICATION: &str = r#"You are an expert software developer. Modify the following code according to the requirements.

Original Code:
```{language}
{original_code}
```

Modification Requirements:
{requirements}

Code Structure Context:
{context}

Please provide the modified code that:
1. Implements the requested changes
2. Maintains existing functionality unless explicitly asked to change it
3. Follows the existing code style and conventions
4. Includes appropriate comments explaining significant changes

Return ONLY the complete modified code."#;

pub const CODE_REVIEW: &str = r#"You are an expert code reviewer. Review the following code and provide constructive feedback.

Code to Review:
```{language}
{code}
```

Focus on:
1. Code quality and readability
2. Potential bugs or issues
3. Performance considerations
4. Security concerns
5. Best practices and coding standards

Provide your review in the following format:
- Summary: Brief overview of the code quality
- Issues: List of identified issues (severity: high/medium/low)
- Suggestions: Recommended improvements
- Positive Aspects: What's done well"#;

pub const BUG_FIX: &str = r#"You are an expert debugger. Analyze the following code and fix any bugs.

Buggy Code:
```{language}
{code}
```

Error/Issue Description:
{error_description}

Stack Trace (if available):
{stack_trace}

Please:
1. Identify the root cause of the bug
2. Provide the fixed code
3. Explain what was wrong and how you fixed it

Return the fixed code with comments explaining the fix."#;

pub const DOCUMENTATION_GENERATION: &str = r#"You are a technical writer. Generate comprehensive documentation for the following code.

Code:
```{language}
{code}
```

Generate documentation that includes:
1. Overview/Purpose
2. Function/Class descriptions
3. Parameter descriptions
4. Return value descriptions
5. Usage examples
6. Any important notes or warnings

Use appropriate documentation format for {language} (docstrings, JSDoc, etc.)."#;

pub const PR_DESCRIPTION: &str = r#"Generate a professional Pull Request description based on the following changes.

Changed Files:
{changed_files}

Commit Messages:
{commit_messages}

Generate a PR description with:
1. Summary of changes (2-3 sentences)
2. Detailed list of changes
3. Testing instructions (if applicable)
4. Any breaking changes or migration notes

Format the description in Markdown."#;

pub const COMMIT_MESSAGE: &str = r#"Generate a professional commit message for the following changes.

Changed Files:
{changed_files}

Diff Summary:
{diff_summary}

Generate a commit message following conventional commits format:
<type>(<scope>): <subject>

<body>

Types: feat, fix, docs, style, refactor, test, chore
Keep the subject line under 50 characters.
Explain what and why in the body if needed."#;

/// Substitute `{name}` placeholders in one pass, so braces inside the
/// substituted values are never expanded. Unknown placeholders are kept.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
	let mut out = String::with_capacity(template.len());
	let mut rest = template;

	while let Some(open) = rest.find('{') {
		out.push_str(&rest[..open]);
		let after = &rest[open + 1..];
		let value = after.find('}').and_then(|close| {
			let name = &after[..close];
			vars
				.iter()
				.find(|(key, _)| *key == name)
				.map(|(_, value)| (*value, close))
		});
		match value {
			Some((value, close)) => {
				out.push_str(value);
				rest = &after[close + 1..];
			}
			None => {
				out.push('{');
				rest = after;
			}
		}
	}

	out.push_str(rest);
	out
}

/// Render a list as markdown bullets, one `- item` per line.
pub fn bullet_list<S: AsRef<str>>(items: &[S]) -> String {
	items
		.iter()
		.map(|item| format!("- {}", item.as_ref()))
		.collect::<Vec<_>>()
		.join("\n")
}

pub fn code_generation(requirements: &str, language: &str, context: Option<&str>) -> String {
	render(
		CODE_GENERATION,
		&[
			("requirements", requirements),
			("context", context.unwrap_or("No existing context provided")),
			("language", language),
		],
	)
}

pub fn code_modification(
	original_code: &str,
	requirements: &str,
	language: &str,
	context: Option<&str>,
) -> String {
	render(
		CODE_MODIFICATION,
		&[
			("original_code", original_code),
			("requirements", requirements),
			("language", language),
			("context", context.unwrap_or("No additional context")),
		],
	)
}

pub fn code_review(code: &str, language: &str) -> String {
	render(CODE_REVIEW, &[("code", code), ("language", language)])
}

pub fn bug_fix(
	code: &str,
	error_description: &str,
	language: &str,
	stack_trace: Option<&str>,
) -> String {
	render(
		BUG_FIX,
		&[
			("code", code),
			("error_description", error_description),
			("language", language),
			("stack_trace", stack_trace.unwrap_or("Not provided")),
		],
	)
}

pub fn documentation(code: &str, language: &str) -> String {
	render(
		DOCUMENTATION_GENERATION,
		&[("code", code), ("language", language)],
	)
}

pub fn pr_description<S: AsRef<str>>(changed_files: &[S], commit_messages: &[S]) -> String {
	let files = bullet_list(changed_files);
	let commits = bullet_list(commit_messages);
	render(
		PR_DESCRIPTION,
		&[("changed_files", files.as_str()), ("commit_messages", commits.as_str())],
	)
}

pub fn commit_message<S: AsRef<str>>(changed_files: &[S], diff_summary: &str) -> String {
	let files = bullet_list(changed_files);
	render(
		COMMIT_MESSAGE,
		&[("changed_files", files.as_str()), ("diff_summary", diff_summary)],
	)
}
