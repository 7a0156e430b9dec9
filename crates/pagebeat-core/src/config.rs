// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolved beacon configuration.
//!
//! Values here are fixed before the beacon starts; the core never re-reads
//! them. Layered loading lives in `pagebeat-config`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::directive::{is_valid_listener, DEFAULT_PREFIX};
use crate::error::EndpointError;

/// Heartbeat interval used when the configured value is unusable.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(5000);

/// Longest accepted interval; larger values are clamped.
pub const MAX_HEARTBEAT_INTERVAL_MS: u64 = i32::MAX as u64;

const SCRIPT_SUFFIX: &str = "/script.js";
const PIXEL_SUFFIX: &str = "/pixel.gif";

/// Transport scheme of the collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
	Http,
	#[default]
	Https,
}

impl Scheme {
	pub fn from_use_https(use_https: bool) -> Self {
		if use_https {
			Scheme::Https
		} else {
			Scheme::Http
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Scheme::Http => "http",
			Scheme::Https => "https",
		}
	}
}

impl fmt::Display for Scheme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Collector routes for a monitored service.
///
/// Hits for an identified visitor carry the identifier as an extra path
/// segment so the collector can attach them to that visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRoute {
	pub service_id: String,
	pub identifier: Option<String>,
}

impl IngressRoute {
	pub fn new(service_id: impl Into<String>) -> Self {
		Self {
			service_id: service_id.into(),
			identifier: None,
		}
	}

	pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
		self.identifier = Some(identifier.into());
		self
	}

	fn base(&self) -> String {
		match &self.identifier {
			Some(id) => format!("/ingress/{}/{}", self.service_id, id),
			None => format!("/ingress/{}", self.service_id),
		}
	}

	/// Path the script posts heartbeats to.
	pub fn script_path(&self) -> String {
		format!("{}{SCRIPT_SUFFIX}", self.base())
	}

	/// Path of the tracking pixel served to clients without scripting.
	pub fn pixel_path(&self) -> String {
		format!("{}{PIXEL_SUFFIX}", self.base())
	}
}

/// Immutable configuration consumed by the beacon.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconConfig {
	pub scheme: Scheme,
	pub host: String,
	/// Collection path, beginning with `/`.
	pub path: String,
	pub heartbeat_interval: Duration,
	/// Disables all beacon activity when set.
	pub do_not_track: bool,
	/// Also disable the beacon when the host reports a browser-level
	/// do-not-track signal.
	pub respect_dnt: bool,
	/// Site-owner script handed to the host after initialization.
	pub injected_script: Option<String>,
	pub directive_prefix: String,
}

impl BeaconConfig {
	pub fn new(scheme: Scheme, host: impl Into<String>, path: impl Into<String>) -> Self {
		let path = path.into();
		let path = if path.starts_with('/') {
			path
		} else {
			format!("/{path}")
		};
		Self {
			scheme,
			host: host.into(),
			path,
			heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
			do_not_track: false,
			respect_dnt: false,
			injected_script: None,
			directive_prefix: DEFAULT_PREFIX.to_string(),
		}
	}

	pub fn for_route(scheme: Scheme, host: impl Into<String>, route: &IngressRoute) -> Self {
		Self::new(scheme, host, route.script_path())
	}

	pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
		self.heartbeat_interval = interval;
		self
	}

	pub fn with_do_not_track(mut self, do_not_track: bool) -> Self {
		self.do_not_track = do_not_track;
		self
	}

	pub fn with_respect_dnt(mut self, respect_dnt: bool) -> Self {
		self.respect_dnt = respect_dnt;
		self
	}

	pub fn with_injected_script(mut self, script: impl Into<String>) -> Self {
		self.injected_script = Some(script.into());
		self
	}

	pub fn with_directive_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.directive_prefix = prefix.into();
		self
	}

	/// URL heartbeats are posted to.
	pub fn heartbeat_url(&self) -> Result<Url, EndpointError> {
		let host = self.host.trim().trim_end_matches('/');
		if host.is_empty() {
			return Err(EndpointError::EmptyHost);
		}
		parse_url(format!("{}://{}{}", self.scheme, host, self.path))
	}

	/// URL event reports for `listener` are posted to.
	pub fn event_url(&self, listener: &str) -> Result<Url, EndpointError> {
		if !is_valid_listener(listener) {
			return Err(EndpointError::InvalidListener(listener.to_string()));
		}
		let base = self.heartbeat_url()?;
		parse_url(format!(
			"{}/event/{}",
			base.as_str().trim_end_matches('/'),
			listener
		))
	}

	/// Pixel fallback URL, available when the path is a standard script route.
	pub fn pixel_url(&self) -> Option<Url> {
		let prefix = self.path.strip_suffix(SCRIPT_SUFFIX)?;
		let mut url = self.heartbeat_url().ok()?;
		url.set_path(&format!("{prefix}{PIXEL_SUFFIX}"));
		Some(url)
	}
}

fn parse_url(url: String) -> Result<Url, EndpointError> {
	Url::parse(&url).map_err(|source| EndpointError::InvalidUrl { url, source })
}

/// Leading-integer coercion of a heartbeat interval in milliseconds.
///
/// Leading whitespace is skipped and trailing garbage ignored (`"5000ms"` is
/// 5000). Returns `None` when no digits lead the value or the result is not
/// a positive number of milliseconds. Values above
/// [`MAX_HEARTBEAT_INTERVAL_MS`] are clamped.
pub fn coerce_interval_ms(raw: &str) -> Option<u64> {
	let trimmed = raw.trim_start();
	let (negative, digits) = match trimmed.as_bytes().first() {
		Some(b'-') => (true, &trimmed[1..]),
		Some(b'+') => (false, &trimmed[1..]),
		_ => (false, trimmed),
	};
	let end = digits
		.find(|c: char| !c.is_ascii_digit())
		.unwrap_or(digits.len());
	if end == 0 || negative {
		return None;
	}
	match digits[..end].parse::<u64>() {
		Ok(0) => None,
		Ok(ms) => Some(ms.min(MAX_HEARTBEAT_INTERVAL_MS)),
		Err(_) => Some(MAX_HEARTBEAT_INTERVAL_MS),
	}
}

/// Resolves a raw interval, falling back to [`DEFAULT_HEARTBEAT_INTERVAL`].
pub fn resolve_interval(raw: &str) -> Duration {
	match coerce_interval_ms(raw) {
		Some(ms) => Duration::from_millis(ms),
		None => {
			warn!(
				raw = %raw,
				default_ms = DEFAULT_HEARTBEAT_INTERVAL.as_millis() as u64,
				"Unusable heartbeat interval, using default"
			);
			DEFAULT_HEARTBEAT_INTERVAL
		}
	}
}
