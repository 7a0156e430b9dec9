// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the pagebeat beacon.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML files, environment)
//! - Collector route derivation from a service id and optional visitor identifier
//! - Consistent environment variable naming (`PAGEBEAT_*`)
//!
//! # Usage
//!
//! ```ignore
//! use pagebeat_config::load_config;
//!
//! let config = load_config()?;
//! println!("Reporting to {}", config.beacon.heartbeat_url()?);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::PagebeatConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;

use pagebeat_core::BeaconConfig;
use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PagebeatConfig {
	pub beacon: BeaconConfig,
	pub logging: LoggingConfig,
	pub http: HttpConfig,
}

/// Load configuration from all standard sources.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`PAGEBEAT_*`)
/// 2. User config file (`~/.config/pagebeat/config.toml`)
/// 3. System config file (`/etc/pagebeat/config.toml`)
/// 4. Built-in defaults
pub fn load_config() -> Result<PagebeatConfig, ConfigError> {
	load_from_sources(standard_sources(None))
}

/// Load configuration with an additional config file that overrides the
/// system and user files.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<PagebeatConfig, ConfigError> {
	load_from_sources(standard_sources(Some(config_path.into())))
}

/// Load configuration from an explicit set of sources, applied in precedence
/// order.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<PagebeatConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = PagebeatConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

fn standard_sources(explicit: Option<PathBuf>) -> Vec<Box<dyn ConfigSource>> {
	let mut sources: Vec<Box<dyn ConfigSource>> =
		vec![Box::new(DefaultsSource), Box::new(TomlSource::system())];
	if let Some(user) = TomlSource::user() {
		sources.push(Box::new(user));
	}
	if let Some(path) = explicit {
		sources.push(Box::new(TomlSource::new(path)));
	}
	sources.push(Box::new(EnvSource::new()));
	sources
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: PagebeatConfigLayer) -> Result<PagebeatConfig, ConfigError> {
	let beacon = layer.beacon.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();
	let http = layer.http.unwrap_or_default().finalize();

	info!(
		scheme = %beacon.scheme,
		host = %beacon.host,
		path = %beacon.path,
		interval_ms = beacon.heartbeat_interval.as_millis() as u64,
		do_not_track = beacon.do_not_track,
		respect_dnt = beacon.respect_dnt,
		injected_script = beacon.injected_script.is_some(),
		"Beacon configuration loaded"
	);

	Ok(PagebeatConfig {
		beacon,
		logging,
		http,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use pagebeat_core::Scheme;
	use proptest::prelude::*;
	use std::io::Write;
	use std::time::Duration;
	use tempfile::NamedTempFile;

	fn toml_file(content: &str) -> NamedTempFile {
		let mut file = NamedTempFile::new().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[test]
	fn test_environment_overrides_file() {
		let file = toml_file(
			r#"
			[beacon]
			host = "stats.example.com"
			service_id = "3f1c"
			heartbeat_frequency = 5000

			[http]
			request_timeout_secs = 4
			"#,
		);

		let config = load_from_sources(vec![
			Box::new(EnvSource::from_vars([
				("PAGEBEAT_BEACON_HEARTBEAT_FREQUENCY", "1000"),
				("PAGEBEAT_BEACON_USE_HTTPS", "false"),
			])),
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap();

		assert_eq!(config.beacon.scheme, Scheme::Http);
		assert_eq!(config.beacon.heartbeat_interval, Duration::from_millis(1000));
		assert_eq!(
			config.beacon.heartbeat_url().unwrap().as_str(),
			"http://stats.example.com/ingress/3f1c/script.js"
		);
		assert_eq!(config.http.request_timeout_secs, 4);
		assert_eq!(config.logging, LoggingConfig::default());
	}

	#[test]
	fn test_missing_host_is_error() {
		let result = load_from_sources(vec![Box::new(DefaultsSource)]);
		assert!(matches!(result, Err(ConfigError::MissingField(_))));
	}

	#[test]
	fn test_injected_script_and_dnt_from_file() {
		let file = toml_file(
			r#"
			[beacon]
			host = "stats.example.com"
			path = "/collect"
			do_not_track = true
			injected_script = "window.ready = true;"
			"#,
		);

		let config = load_from_sources(vec![Box::new(TomlSource::new(file.path()))]).unwrap();
		assert!(config.beacon.do_not_track);
		assert_eq!(
			config.beacon.injected_script.as_deref(),
			Some("window.ready = true;")
		);
		assert!(config.beacon.pixel_url().is_none());
	}

	proptest! {
		#[test]
		fn textual_and_numeric_intervals_agree(ms in 1u32..=600_000) {
			let numeric = toml_file(&format!(
				"[beacon]\nhost = \"a.example\"\npath = \"/c\"\nheartbeat_frequency = {ms}\n"
			));
			let textual = toml_file(&format!(
				"[beacon]\nhost = \"a.example\"\npath = \"/c\"\nheartbeat_frequency = \"{ms}\"\n"
			));

			let a = load_from_sources(vec![Box::new(TomlSource::new(numeric.path()))]).unwrap();
			let b = load_from_sources(vec![Box::new(TomlSource::new(textual.path()))]).unwrap();
			prop_assert_eq!(a.beacon.heartbeat_interval, b.beacon.heartbeat_interval);
			prop_assert_eq!(a.beacon.heartbeat_interval, Duration::from_millis(ms as u64));
		}
	}
}
