// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::PagebeatConfigLayer;
use crate::sections::{
	BeaconConfigLayer, HttpConfigLayer, IntervalValue, LogFormat, LoggingConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	SystemFile = 20,
	UserFile = 30,
	ExplicitFile = 40,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<PagebeatConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<PagebeatConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(PagebeatConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
	precedence: Precedence,
}

impl TomlSource {
	/// A file passed explicitly, e.g. with `--config`.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			precedence: Precedence::ExplicitFile,
		}
	}

	pub fn system() -> Self {
		Self {
			path: PathBuf::from("/etc/pagebeat/config.toml"),
			precedence: Precedence::SystemFile,
		}
	}

	/// `$XDG_CONFIG_HOME/pagebeat/config.toml`, when a config directory exists.
	pub fn user() -> Option<Self> {
		let dir = dirs::config_dir()?;
		Some(Self {
			path: dir.join("pagebeat").join("config.toml"),
			precedence: Precedence::UserFile,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<PagebeatConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(PagebeatConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: PagebeatConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: PAGEBEAT_<SECTION>_<FIELD>
#[derive(Default)]
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Reads the process environment.
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads from a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars
					.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		let value = match &self.vars {
			Some(vars) => vars.get(name).cloned(),
			None => std::env::var(name).ok(),
		};
		value.filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
		match self.var(name) {
			Some(v) => match v.to_ascii_lowercase().as_str() {
				"1" | "true" | "yes" | "on" => Ok(Some(true)),
				"0" | "false" | "no" | "off" => Ok(Some(false)),
				_ => Err(ConfigError::invalid_value(
					name,
					format!("invalid boolean value '{v}'"),
				)),
			},
			None => Ok(None),
		}
	}

	fn u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| {
				ConfigError::invalid_value(name, format!("invalid u64 value '{v}'"))
			}),
			None => Ok(None),
		}
	}

	fn load_beacon(&self) -> Result<BeaconConfigLayer, ConfigError> {
		Ok(BeaconConfigLayer {
			use_https: self.bool("PAGEBEAT_BEACON_USE_HTTPS")?,
			host: self.var("PAGEBEAT_BEACON_HOST"),
			path: self.var("PAGEBEAT_BEACON_PATH"),
			service_id: self.var("PAGEBEAT_BEACON_SERVICE_ID"),
			identifier: self.var("PAGEBEAT_BEACON_IDENTIFIER"),
			heartbeat_frequency: self
				.var("PAGEBEAT_BEACON_HEARTBEAT_FREQUENCY")
				.map(IntervalValue::Text),
			do_not_track: self.bool("PAGEBEAT_BEACON_DO_NOT_TRACK")?,
			respect_dnt: self.bool("PAGEBEAT_BEACON_RESPECT_DNT")?,
			injected_script: self.var("PAGEBEAT_BEACON_INJECTED_SCRIPT"),
			directive_prefix: self.var("PAGEBEAT_BEACON_DIRECTIVE_PREFIX"),
		})
	}

	fn load_logging(&self) -> Result<LoggingConfigLayer, ConfigError> {
		let format = match self.var("PAGEBEAT_LOGGING_FORMAT") {
			Some(v) => Some(
				v.parse::<LogFormat>()
					.map_err(|message| ConfigError::invalid_value("PAGEBEAT_LOGGING_FORMAT", message))?,
			),
			None => None,
		};
		Ok(LoggingConfigLayer {
			level: self.var("PAGEBEAT_LOGGING_LEVEL"),
			format,
		})
	}

	fn load_http(&self) -> Result<HttpConfigLayer, ConfigError> {
		Ok(HttpConfigLayer {
			request_timeout_secs: self.u64("PAGEBEAT_HTTP_REQUEST_TIMEOUT_SECS")?,
			user_agent: self.var("PAGEBEAT_HTTP_USER_AGENT"),
		})
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<PagebeatConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(PagebeatConfigLayer {
			beacon: Some(self.load_beacon()?),
			logging: Some(self.load_logging()?),
			http: Some(self.load_http()?),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_precedence_order() {
		assert!(Precedence::Defaults < Precedence::SystemFile);
		assert!(Precedence::SystemFile < Precedence::UserFile);
		assert!(Precedence::UserFile < Precedence::ExplicitFile);
		assert!(Precedence::ExplicitFile < Precedence::Environment);
	}

	#[test]
	fn test_missing_toml_file_is_empty() {
		let source = TomlSource::new("/nonexistent/pagebeat.toml");
		assert_eq!(source.load().unwrap(), PagebeatConfigLayer::default());
	}

	#[test]
	fn test_toml_file_loads() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(
			file,
			"[beacon]\nhost = \"stats.example.com\"\nservice_id = \"3f1c\"\n\n[logging]\nformat = \"json\""
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		let beacon = layer.beacon.unwrap();
		assert_eq!(beacon.host.as_deref(), Some("stats.example.com"));
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
	}

	#[test]
	fn test_toml_parse_error_names_file() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[beacon\nhost = ").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		match err {
			ConfigError::TomlParse { path, .. } => assert_eq!(path, file.path()),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_env_source_reads_vars() {
		let source = EnvSource::from_vars([
			("PAGEBEAT_BEACON_HOST", "stats.example.com"),
			("PAGEBEAT_BEACON_USE_HTTPS", "false"),
			("PAGEBEAT_BEACON_HEARTBEAT_FREQUENCY", "2500"),
			("PAGEBEAT_BEACON_RESPECT_DNT", "1"),
			("PAGEBEAT_LOGGING_LEVEL", "debug"),
			("PAGEBEAT_HTTP_REQUEST_TIMEOUT_SECS", "3"),
			("PAGEBEAT_BEACON_PATH", ""),
		]);
		let layer = source.load().unwrap();

		let beacon = layer.beacon.unwrap();
		assert_eq!(beacon.host.as_deref(), Some("stats.example.com"));
		assert_eq!(beacon.use_https, Some(false));
		assert_eq!(
			beacon.heartbeat_frequency,
			Some(IntervalValue::Text("2500".to_string()))
		);
		assert_eq!(beacon.respect_dnt, Some(true));
		assert!(beacon.path.is_none());
		assert_eq!(layer.logging.unwrap().level.as_deref(), Some("debug"));
		assert_eq!(layer.http.unwrap().request_timeout_secs, Some(3));
	}

	#[test]
	fn test_env_source_rejects_bad_bool() {
		let source = EnvSource::from_vars([("PAGEBEAT_BEACON_DO_NOT_TRACK", "maybe")]);
		assert!(matches!(
			source.load(),
			Err(ConfigError::InvalidValue { field, .. }) if field == "PAGEBEAT_BEACON_DO_NOT_TRACK"
		));
	}

	#[test]
	fn test_env_source_rejects_bad_timeout() {
		let source = EnvSource::from_vars([("PAGEBEAT_HTTP_REQUEST_TIMEOUT_SECS", "soon")]);
		assert!(source.load().is_err());
	}

	#[test]
	fn test_env_source_rejects_bad_format() {
		let source = EnvSource::from_vars([("PAGEBEAT_LOGGING_FORMAT", "xml")]);
		assert!(source.load().is_err());
	}
}
