// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delivery of reports to the collector.

use std::time::Duration;

use pagebeat_core::{BeaconConfig, EventReport, HeartbeatReport};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{BeaconError, Result};

/// Sends reports to the collector.
///
/// A call resolves once the collector has answered or the request failed.
/// Callers treat every outcome the same way; nothing is retried.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
	/// Posts a heartbeat to the collection endpoint.
	async fn send_heartbeat(&self, report: &HeartbeatReport) -> Result<()>;

	/// Posts an event report to `<endpoint>/event/<listener>`.
	async fn send_event(&self, report: &EventReport) -> Result<()>;
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
	/// Timeout for a single request.
	pub request_timeout: Duration,
	/// User-Agent override; defaults to the standard pagebeat agent.
	pub user_agent: Option<String>,
}

impl Default for HttpTransportConfig {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(10),
			user_agent: None,
		}
	}
}

/// Builder for [`HttpTransport`].
pub struct HttpTransportBuilder {
	beacon: BeaconConfig,
	config: HttpTransportConfig,
}

impl HttpTransportBuilder {
	/// Sets the HTTP request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	/// Sets the User-Agent sent with every report.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.config.user_agent = Some(user_agent.into());
		self
	}

	/// Builds the transport, resolving the collector URL up front.
	pub fn build(self) -> Result<HttpTransport> {
		let heartbeat_url = self.beacon.heartbeat_url()?;

		let timeout = self.config.request_timeout;
		let builder = match &self.config.user_agent {
			Some(ua) => pagebeat_common_http::builder_with_user_agent(ua.clone()).timeout(timeout),
			None => pagebeat_common_http::builder_with_timeout(timeout),
		};
		let http_client = builder
			.build()
			.map_err(BeaconError::RequestFailed)?;

		debug!(url = %heartbeat_url, "HTTP transport ready");

		Ok(HttpTransport {
			beacon: self.beacon,
			heartbeat_url,
			http_client,
		})
	}
}

/// JSON-over-HTTP transport.
pub struct HttpTransport {
	beacon: BeaconConfig,
	heartbeat_url: Url,
	http_client: Client,
}

impl HttpTransport {
	pub fn builder(beacon: &BeaconConfig) -> HttpTransportBuilder {
		HttpTransportBuilder {
			beacon: beacon.clone(),
			config: HttpTransportConfig::default(),
		}
	}

	pub fn with_config(beacon: &BeaconConfig, config: HttpTransportConfig) -> Result<Self> {
		HttpTransportBuilder {
			beacon: beacon.clone(),
			config,
		}
		.build()
	}

	pub fn heartbeat_url(&self) -> &Url {
		&self.heartbeat_url
	}

	async fn post<T: Serialize + Sync>(&self, url: Url, body: &T) -> Result<()> {
		let response = self.http_client.post(url.clone()).json(body).send().await?;

		let status = response.status();
		if !status.is_success() {
			return Err(BeaconError::ServerError {
				status: status.as_u16(),
			});
		}

		debug!(url = %url, status = status.as_u16(), "Report delivered");
		Ok(())
	}
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
	async fn send_heartbeat(&self, report: &HeartbeatReport) -> Result<()> {
		self.post(self.heartbeat_url.clone(), report).await
	}

	async fn send_event(&self, report: &EventReport) -> Result<()> {
		let url = self.beacon.event_url(&report.listener)?;
		self.post(url, report).await
	}
}
