// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod github;
mod llm;
mod middleware;
mod pr;
mod support;
mod tasks;
