// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod auth;
pub mod common;
pub mod github;
pub mod llm;
pub mod pr;
pub mod tasks;

pub use auth::{AiInteractionApi, CurrentUserResponse, InteractionsParams};
pub use common::{
	ErrorBody, ErrorResponse, HealthResponse, MessageResponse, RootResponse, STATUS_SUCCESS,
};
pub use github::{
	AccessTokenQuery, AuthUrlResponse, BranchApi, CallbackQuery, CreateBranchRequest,
	CreateBranchResponse, FileContentResponse, FileQuery, GitHubUserApi, GitHubUserResponse,
	ListBranchesResponse, ListFilesParams, ListFilesResponse, ListReposParams, ListReposResponse,
	RepoFileApi, RepositoryApi, RepositoryDetailApi, RepositoryResponse, TokenRequest,
	TokenResponse, WriteFileRequest, WriteFileResponse,
};
pub use llm::{
	ChatMessageApi, ChatRequest, CommitMessageRequest, FixBugRequest, GenerateCodeRequest,
	GenerateDocsRequest, LlmOutput, LlmResponse, ModifyCodeRequest, PrDescriptionRequest,
	ReviewCodeRequest, TokenUsageApi,
};
pub use pr::{
	AddCommentRequest, AddCommentResponse, CreatePrRequest, CreatePrResponse, CreateReviewRequest,
	CreateReviewResponse, ListPrsParams, ListPrsResponse, MergePrRequest, MergePrResponse,
	PrDetailApi, PrDetailResponse, PrFileApi, PrFilesResponse, PrSummaryApi, ReviewCommentApi,
	UpdatePrRequest, UpdatePrResponse,
};
pub use tasks::{
	CreateTaskRequest, ListTasksParams, RenameTaskParams, RenameTaskResponse, TaskPullRequestApi,
	TaskResponse, TaskStatusApi, UpdateTaskRequest,
};
