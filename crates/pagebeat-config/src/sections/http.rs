// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HttpConfigLayer {
	pub request_timeout_secs: Option<u64>,
	pub user_agent: Option<String>,
}

impl HttpConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.user_agent.is_some() {
			self.user_agent = other.user_agent;
		}
	}

	pub fn finalize(self) -> HttpConfig {
		HttpConfig {
			request_timeout_secs: self
				.request_timeout_secs
				.filter(|secs| *secs > 0)
				.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
			user_agent: self.user_agent.filter(|ua| !ua.is_empty()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
	pub request_timeout_secs: u64,
	/// Overrides the default `pagebeat/<version>` agent.
	pub user_agent: Option<String>,
}

impl HttpConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
			user_agent: None,
		}
	}
}
