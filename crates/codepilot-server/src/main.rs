// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Codepilot server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use codepilot_server::{create_app_state, create_router, jobs, CleanupJob};
use codepilot_server_config::{LogFormat, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Codepilot server - GitHub code collaboration with LLM assistance.
#[derive(Parser, Debug)]
#[command(name = "codepilot-server", about = "Codepilot HTTP server", version)]
struct Args {
	/// TOML config file. Defaults to the system config location.
	#[arg(long, env = "CODEPILOT_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
	/// Run the HTTP server (default)
	#[default]
	Serve,
	/// Apply database migrations and exit
	Migrate,
	/// Show version information
	Version,
}

fn init_tracing(config: &ServerConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
	let registry = tracing_subscriber::registry().with(filter);
	match config.logging.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json().with_current_span(true))
			.init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	let command = args.command.unwrap_or_default();

	if let Command::Version = command {
		println!("codepilot-server {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => codepilot_server_config::load_config_with_file(path)?,
		None => codepilot_server_config::load_config()?,
	};

	init_tracing(&config);

	let pool = codepilot_server_db::create_pool(&config.database.url).await?;
	codepilot_server_db::run_migrations(&pool).await?;

	if let Command::Migrate = command {
		tracing::info!("migrations applied");
		return Ok(());
	}

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting codepilot-server"
	);

	let state = create_app_state(pool, &config)?;
	let cleanup = CleanupJob::from_state(&state).spawn(jobs::DEFAULT_CLEANUP_INTERVAL);
	let app = create_router(state);

	let addr = config.socket_addr();
	let listener = tokio::net::TcpListener::bind(&addr).await?;
	tracing::info!(%addr, "listening");

	tokio::select! {
		result = axum::serve(
			listener,
			app.into_make_service_with_connect_info::<SocketAddr>(),
		) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("received shutdown signal");
		}
	}

	cleanup.abort();
	tracing::info!("server shutdown complete");
	Ok(())
}
