// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Headless pagebeat runner.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pagebeat::DEFAULT_PREFIX;
use pagebeat_config::{LogFormat, LoggingConfig, PagebeatConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod runner;
mod version;

use runner::{PageOptions, Trigger};

/// pagebeat - page-view heartbeat beacon, run against a local page.
#[derive(Parser, Debug)]
#[command(name = "pagebeat", about = "Page-view heartbeat beacon runner", version)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Load a page and report heartbeats until interrupted
	Run(RunArgs),
	/// List the event bindings declared in a page
	Bindings {
		/// HTML file to scan
		#[arg(long)]
		page: PathBuf,
		/// Directive prefix
		#[arg(long, default_value = DEFAULT_PREFIX)]
		prefix: String,
	},
	/// Print the collector endpoints for the resolved configuration
	Endpoints {
		/// Config file overriding the system and user files
		#[arg(long, env = "PAGEBEAT_CONFIG")]
		config: Option<PathBuf>,
	},
	/// Show version and build information
	Version,
}

#[derive(Args, Debug)]
struct RunArgs {
	/// HTML file of the page
	#[arg(long)]
	page: PathBuf,
	/// URL the page is served at
	#[arg(long)]
	location: String,
	/// Referrer URL
	#[arg(long)]
	referrer: Option<String>,
	/// Milliseconds from navigation start to DOM content loaded
	#[arg(long, default_value_t = 0)]
	load_time_ms: i64,
	/// Hit metadata as a JSON object
	#[arg(long)]
	hit_metadata: Option<String>,
	/// Session metadata as a JSON object
	#[arg(long)]
	session_metadata: Option<String>,
	/// Simulate a browser do-not-track signal
	#[arg(long)]
	do_not_track: bool,
	/// Interaction to fire after load, as `<event>:<listener>`
	#[arg(long = "trigger")]
	triggers: Vec<Trigger>,
	/// Stop after this many seconds instead of waiting for Ctrl-C
	#[arg(long)]
	duration_secs: Option<u64>,
	/// Config file overriding the system and user files
	#[arg(long, env = "PAGEBEAT_CONFIG")]
	config: Option<PathBuf>,
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<PagebeatConfig> {
	let config = match path {
		Some(path) => pagebeat_config::load_config_with_file(path),
		None => pagebeat_config::load_config(),
	};
	config.context("failed to load configuration")
}

fn init_tracing(logging: &LoggingConfig) {
	let (json, pretty) = match logging.format {
		LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
		LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| logging.level.clone().into()),
		)
		.with(json)
		.with(pretty)
		.init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	match cli.command {
		Command::Version => {
			println!("{}", version::format_version_info());
		}
		Command::Bindings { page, prefix } => {
			init_tracing(&LoggingConfig::default());
			let scan = runner::scan_page(&page, &prefix)?;
			print!("{}", runner::format_bindings(&scan));
		}
		Command::Endpoints { config } => {
			let config = load_config(config)?;
			init_tracing(&config.logging);
			let heartbeat = config.beacon.heartbeat_url()?;
			println!("heartbeat  {heartbeat}");
			println!("event      {heartbeat}/event/<listener>");
			if let Some(pixel) = config.beacon.pixel_url() {
				println!("pixel      {pixel}");
			}
		}
		Command::Run(args) => {
			let config = load_config(args.config.clone())?;
			init_tracing(&config.logging);

			let options = PageOptions {
				page: args.page,
				location: args.location,
				referrer: args.referrer,
				load_time_ms: args.load_time_ms,
				hit_metadata: args.hit_metadata,
				session_metadata: args.session_metadata,
				do_not_track: args.do_not_track,
				triggers: args.triggers,
				duration: args.duration_secs.map(Duration::from_secs),
			};
			runner::run(options, config).await?;
		}
	}

	Ok(())
}
