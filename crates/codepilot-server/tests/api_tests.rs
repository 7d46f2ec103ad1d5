// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP-level tests driving the full router with `tower::ServiceExt::oneshot`.

mod api;
