// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Beacon configuration section.

use std::fmt;

use pagebeat_core::{resolve_interval, BeaconConfig, IngressRoute, Scheme, DEFAULT_PREFIX};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Heartbeat frequency as written by the operator.
///
/// Templates historically rendered this value as text, so both `5000` and
/// `"5000"` are accepted and coerced the same way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum IntervalValue {
	Millis(i64),
	Fractional(f64),
	Text(String),
}

impl fmt::Display for IntervalValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			IntervalValue::Millis(ms) => write!(f, "{ms}"),
			IntervalValue::Fractional(ms) => write!(f, "{ms}"),
			IntervalValue::Text(raw) => f.write_str(raw),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BeaconConfigLayer {
	pub use_https: Option<bool>,
	pub host: Option<String>,
	/// Explicit collection path. Takes precedence over `service_id`.
	pub path: Option<String>,
	pub service_id: Option<String>,
	pub identifier: Option<String>,
	pub heartbeat_frequency: Option<IntervalValue>,
	pub do_not_track: Option<bool>,
	pub respect_dnt: Option<bool>,
	pub injected_script: Option<String>,
	pub directive_prefix: Option<String>,
}

impl BeaconConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.use_https.is_some() {
			self.use_https = other.use_https;
		}
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.path.is_some() {
			self.path = other.path;
		}
		if other.service_id.is_some() {
			self.service_id = other.service_id;
		}
		if other.identifier.is_some() {
			self.identifier = other.identifier;
		}
		if other.heartbeat_frequency.is_some() {
			self.heartbeat_frequency = other.heartbeat_frequency;
		}
		if other.do_not_track.is_some() {
			self.do_not_track = other.do_not_track;
		}
		if other.respect_dnt.is_some() {
			self.respect_dnt = other.respect_dnt;
		}
		if other.injected_script.is_some() {
			self.injected_script = other.injected_script;
		}
		if other.directive_prefix.is_some() {
			self.directive_prefix = other.directive_prefix;
		}
	}

	pub fn finalize(self) -> Result<BeaconConfig, ConfigError> {
		let host = self
			.host
			.filter(|h| !h.trim().is_empty())
			.ok_or_else(|| ConfigError::missing_field("beacon.host"))?;

		let path = match (self.path, self.service_id) {
			(Some(path), _) => path,
			(None, Some(service_id)) => {
				let route = IngressRoute::new(service_id);
				let route = match self.identifier {
					Some(identifier) => route.with_identifier(identifier),
					None => route,
				};
				route.script_path()
			}
			(None, None) => return Err(ConfigError::missing_field("beacon.path or beacon.service_id")),
		};

		let prefix = self
			.directive_prefix
			.unwrap_or_else(|| DEFAULT_PREFIX.to_string());
		if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
			return Err(ConfigError::invalid_value(
				"beacon.directive_prefix",
				format!("'{prefix}' must be a single non-empty class-name token"),
			));
		}

		let mut config = BeaconConfig::new(
			Scheme::from_use_https(self.use_https.unwrap_or(true)),
			host,
			path,
		)
		.with_do_not_track(self.do_not_track.unwrap_or(false))
		.with_respect_dnt(self.respect_dnt.unwrap_or(false))
		.with_directive_prefix(prefix);

		if let Some(frequency) = self.heartbeat_frequency {
			config = config.with_heartbeat_interval(resolve_interval(&frequency.to_string()));
		}
		if let Some(script) = self.injected_script.filter(|s| !s.is_empty()) {
			config = config.with_injected_script(script);
		}

		config.heartbeat_url()?;
		Ok(config)
	}
}
