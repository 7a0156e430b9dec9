// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Headless page session driven from the command line.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pagebeat::{
	scan_markup, Beacon, DirectiveParser, HttpTransportConfig, Metadata, ScanResult, StaticPage,
};
use pagebeat_config::PagebeatConfig;
use tracing::{info, warn};

/// An interaction to fire once the page has loaded, written `event:listener`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
	pub event_type: String,
	pub listener: String,
}

impl FromStr for Trigger {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.split_once(':') {
			Some((event_type, listener)) if !event_type.is_empty() && !listener.is_empty() => {
				Ok(Self {
					event_type: event_type.to_string(),
					listener: listener.to_string(),
				})
			}
			_ => Err(format!("expected <event>:<listener>, got '{s}'")),
		}
	}
}

/// Page inputs for a headless session.
#[derive(Debug, Clone)]
pub struct PageOptions {
	pub page: PathBuf,
	pub location: String,
	pub referrer: Option<String>,
	pub load_time_ms: i64,
	pub hit_metadata: Option<String>,
	pub session_metadata: Option<String>,
	pub do_not_track: bool,
	pub triggers: Vec<Trigger>,
	pub duration: Option<Duration>,
}

/// Parses a JSON object given on the command line.
pub fn parse_metadata(raw: &str) -> Result<Metadata> {
	serde_json::from_str(raw).with_context(|| format!("metadata must be a JSON object: {raw}"))
}

fn read_page(path: &Path) -> Result<String> {
	std::fs::read_to_string(path).with_context(|| format!("failed to read page {}", path.display()))
}

/// Builds the page the beacon observes.
pub fn build_page(options: &PageOptions) -> Result<StaticPage> {
	let mut page = StaticPage::new(options.location.clone())
		.with_referrer(options.referrer.clone().unwrap_or_default())
		.with_load_time_ms(options.load_time_ms)
		.with_do_not_track(options.do_not_track);

	if let Some(raw) = &options.hit_metadata {
		page = page.with_hit_metadata(parse_metadata(raw)?);
	}
	if let Some(raw) = &options.session_metadata {
		page = page.with_session_metadata(parse_metadata(raw)?);
	}
	Ok(page)
}

/// Runs a page session until Ctrl-C or the optional duration elapses.
pub async fn run(options: PageOptions, config: PagebeatConfig) -> Result<()> {
	let markup = read_page(&options.page)?;
	let host = Arc::new(build_page(&options)?);

	let mut beacon = Beacon::builder()
		.config(config.beacon)
		.host(host)
		.http_config(HttpTransportConfig {
			request_timeout: config.http.request_timeout(),
			user_agent: config.http.user_agent,
		})
		.build()
		.context("failed to start beacon")?;

	let rejected = beacon.initialize(&markup);
	if !rejected.is_empty() {
		warn!(count = rejected.len(), "Page contains malformed event directives");
	}

	match beacon.on_page_load() {
		Some(token) => info!(
			idempotency = %token,
			bindings = beacon.bindings().len(),
			"Page loaded"
		),
		None => info!("Tracking disabled for this page"),
	}

	for trigger in &options.triggers {
		let fired = beacon.trigger(&trigger.event_type, &trigger.listener);
		if fired == 0 && beacon.is_enabled() {
			warn!(
				event_type = %trigger.event_type,
				listener = %trigger.listener,
				"No element is bound to this interaction"
			);
		}
	}

	match options.duration {
		Some(duration) => {
			tokio::select! {
				result = tokio::signal::ctrl_c() => result.context("failed to listen for Ctrl-C")?,
				_ = tokio::time::sleep(duration) => {}
			}
		}
		None => tokio::signal::ctrl_c()
			.await
			.context("failed to listen for Ctrl-C")?,
	}

	beacon.shutdown();
	info!("Page session ended");
	Ok(())
}

/// Scans a page file for directives.
pub fn scan_page(page: &Path, prefix: &str) -> Result<ScanResult> {
	let markup = read_page(page)?;
	Ok(scan_markup(&markup, &DirectiveParser::new(prefix)))
}

/// Renders a scan as one line per binding.
pub fn format_bindings(scan: &ScanResult) -> String {
	let mut out = String::new();
	for binding in &scan.bindings {
		let element = &binding.element;
		let id = element
			.id
			.as_deref()
			.map(|id| format!("#{id}"))
			.unwrap_or_default();
		out.push_str(&format!(
			"{:>4}  {}{}  {}  {}\n",
			element.index, element.tag, id, binding.directive.event_type, binding.directive.listener
		));
	}
	for error in &scan.rejected {
		out.push_str(&format!("rejected  {error}\n"));
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_trigger_parse() {
		let trigger: Trigger = "click:signup-button".parse().unwrap();
		assert_eq!(trigger.event_type, "click");
		assert_eq!(trigger.listener, "signup-button");

		assert!("click".parse::<Trigger>().is_err());
		assert!(":x".parse::<Trigger>().is_err());
		assert!("click:".parse::<Trigger>().is_err());
	}

	#[test]
	fn test_parse_metadata() {
		let meta = parse_metadata(r#"{"plan": "pro", "seats": 3}"#).unwrap();
		assert_eq!(meta["plan"], json!("pro"));
		assert!(parse_metadata("[1, 2]").is_err());
		assert!(parse_metadata("not json").is_err());
	}

	#[test]
	fn test_build_page() {
		use pagebeat::PageHost;

		let options = PageOptions {
			page: PathBuf::from("unused.html"),
			location: "https://site.example/".to_string(),
			referrer: Some("https://search.example/".to_string()),
			load_time_ms: 120,
			hit_metadata: Some(r#"{"variant": "b"}"#.to_string()),
			session_metadata: None,
			do_not_track: true,
			triggers: Vec::new(),
			duration: None,
		};
		let page = build_page(&options).unwrap();
		assert_eq!(page.referrer(), "https://search.example/");
		assert_eq!(page.load_time_ms(), 120);
		assert!(page.do_not_track_requested());
		assert_eq!(page.hit_metadata().unwrap()["variant"], json!("b"));
	}

	#[test]
	fn test_scan_and_format_page() {
		let mut file = NamedTempFile::new().unwrap();
		write!(
			file,
			"<button id=\"go\" class=\"x-event--click--signup-button\"></button><p class=\"x-event--1--bad\"></p>"
		)
		.unwrap();

		let scan = scan_page(file.path(), "x-event").unwrap();
		assert_eq!(scan.bindings.len(), 1);
		assert_eq!(scan.rejected.len(), 1);

		let rendered = format_bindings(&scan);
		assert!(rendered.contains("button#go  click  signup-button"));
		assert!(rendered.contains("rejected"));
	}

	#[test]
	fn test_missing_page_is_error() {
		assert!(scan_page(Path::new("/nonexistent/page.html"), "x-event").is_err());
	}
}
