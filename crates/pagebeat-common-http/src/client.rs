// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::ClientBuilder;
use std::time::Duration;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a new HTTP client builder with the standard pagebeat User-Agent.
///
/// # Example
/// ```ignore
/// let client = pagebeat_common_http::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	builder_with_user_agent(user_agent())
}

/// Creates a new HTTP client builder with a custom User-Agent header.
///
/// Embedders that relay hits on behalf of a real browser pass that
/// browser's User-Agent so the collector classifies the device correctly.
pub fn builder_with_user_agent(user_agent: impl Into<String>) -> ClientBuilder {
	reqwest::Client::builder().user_agent(user_agent.into())
}

/// Standard builder with a request timeout applied.
pub fn builder_with_timeout(timeout: Duration) -> ClientBuilder {
	builder().timeout(timeout)
}

/// Returns the standard pagebeat User-Agent string.
///
/// Format: `pagebeat/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"pagebeat/{} ({}-{})",
		VERSION,
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
