// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The beacon facade embedded in a page.

use std::sync::Arc;

use pagebeat_core::{BeaconConfig, DirectiveError, DirectiveParser, SessionToken};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::error::{BeaconError, Result};
use crate::events::{scan_markup, DomEvent, EventBinding, EventReporter};
use crate::host::PageHost;
use crate::scheduler::{HeartbeatScheduler, SchedulerState, SendOutcome};
use crate::transport::{HttpTransport, HttpTransportConfig, Transport};

/// Builder for constructing a [`Beacon`].
pub struct BeaconBuilder {
	config: Option<BeaconConfig>,
	host: Option<Arc<dyn PageHost>>,
	transport: Option<Arc<dyn Transport>>,
	runtime: Option<Handle>,
	http: HttpTransportConfig,
}

impl BeaconBuilder {
	pub fn new() -> Self {
		Self {
			config: None,
			host: None,
			transport: None,
			runtime: None,
			http: HttpTransportConfig::default(),
		}
	}

	/// Sets the resolved beacon configuration.
	pub fn config(mut self, config: BeaconConfig) -> Self {
		self.config = Some(config);
		self
	}

	/// Sets the page the beacon reads from.
	pub fn host(mut self, host: Arc<dyn PageHost>) -> Self {
		self.host = Some(host);
		self
	}

	/// Replaces the default HTTP transport.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Sets the runtime sends are spawned on. Defaults to the current one.
	pub fn runtime(mut self, runtime: Handle) -> Self {
		self.runtime = Some(runtime);
		self
	}

	/// Sets options for the default HTTP transport.
	pub fn http_config(mut self, http: HttpTransportConfig) -> Self {
		self.http = http;
		self
	}

	/// Builds the beacon.
	///
	/// When do-not-track applies, no transport is created and the beacon
	/// never touches the network.
	pub fn build(self) -> Result<Beacon> {
		let config = self.config.ok_or(BeaconError::MissingConfig)?;
		let host = self.host.ok_or(BeaconError::MissingHost)?;
		let runtime = match self.runtime {
			Some(runtime) => runtime,
			None => Handle::try_current().map_err(|_| BeaconError::NoRuntime)?,
		};

		let tracking_disabled =
			config.do_not_track || (config.respect_dnt && host.do_not_track_requested());

		let transport = if tracking_disabled {
			info!("Do-not-track in effect, beacon disabled");
			None
		} else {
			Some(match self.transport {
				Some(transport) => transport,
				None => Arc::new(HttpTransport::with_config(&config, self.http)?) as Arc<dyn Transport>,
			})
		};

		let scheduler = transport.as_ref().map(|transport| {
			HeartbeatScheduler::new(
				config.heartbeat_interval,
				Arc::clone(&host),
				Arc::clone(transport),
				runtime.clone(),
			)
		});

		Ok(Beacon {
			config,
			host,
			runtime,
			transport,
			scheduler,
			reporter: None,
		})
	}
}

impl Default for BeaconBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Telemetry beacon for one page.
///
/// The host calls [`initialize`](Self::initialize) once with the page markup,
/// [`on_page_load`](Self::on_page_load) on each load signal, and forwards
/// interactions through [`handle_event`](Self::handle_event). None of these
/// report errors; delivery failures are logged and dropped.
pub struct Beacon {
	config: BeaconConfig,
	host: Arc<dyn PageHost>,
	runtime: Handle,
	transport: Option<Arc<dyn Transport>>,
	scheduler: Option<HeartbeatScheduler>,
	reporter: Option<EventReporter>,
}

impl Beacon {
	pub fn builder() -> BeaconBuilder {
		BeaconBuilder::new()
	}

	/// Whether the beacon reports anything at all.
	pub fn is_enabled(&self) -> bool {
		self.transport.is_some()
	}

	pub fn config(&self) -> &BeaconConfig {
		&self.config
	}

	/// Scans `markup` for event directives and then hands the injected script
	/// to the host.
	///
	/// Returns the directives that were rejected as malformed. When the beacon
	/// is disabled the markup is not scanned, but the injected script still
	/// runs.
	pub fn initialize(&mut self, markup: &str) -> Vec<DirectiveError> {
		let mut rejected = Vec::new();

		if let Some(transport) = &self.transport {
			let parser = DirectiveParser::new(self.config.directive_prefix.clone());
			let scan = scan_markup(markup, &parser);
			rejected = scan.rejected;
			self.reporter = Some(EventReporter::new(
				scan.bindings,
				Arc::clone(&self.host),
				Arc::clone(transport),
				self.runtime.clone(),
			));
		}

		if let Some(script) = &self.config.injected_script {
			debug!(bytes = script.len(), "Running injected script");
			self.host.run_injected_script(script);
		}

		rejected
	}

	/// Handles a page-load signal. Returns the new session token, or `None`
	/// when the beacon is disabled.
	pub fn on_page_load(&self) -> Option<SessionToken> {
		self.scheduler.as_ref().map(HeartbeatScheduler::start)
	}

	/// Attempts a heartbeat outside the timer cadence.
	pub fn send_heartbeat(&self) -> SendOutcome {
		self.scheduler
			.as_ref()
			.map_or(SendOutcome::Idle, HeartbeatScheduler::send_now)
	}

	/// Forwards an interaction. Returns the number of event reports sent.
	pub fn handle_event(&self, event: &DomEvent) -> usize {
		self.reporter
			.as_ref()
			.map_or(0, |reporter| reporter.handle(event))
	}

	/// Fires the bindings declared for `event_type` and `listener`.
	pub fn trigger(&self, event_type: &str, listener: &str) -> usize {
		self.reporter
			.as_ref()
			.map_or(0, |reporter| reporter.trigger(event_type, listener))
	}

	pub fn bindings(&self) -> &[EventBinding] {
		match &self.reporter {
			Some(reporter) => reporter.bindings(),
			None => &[],
		}
	}

	pub fn state(&self) -> SchedulerState {
		self.scheduler
			.as_ref()
			.map_or(SchedulerState::Idle, HeartbeatScheduler::state)
	}

	pub fn session_token(&self) -> Option<SessionToken> {
		self.scheduler.as_ref().and_then(HeartbeatScheduler::token)
	}

	/// Stops the heartbeat timer. Events keep being reported.
	pub fn shutdown(&self) {
		if let Some(scheduler) = &self.scheduler {
			scheduler.stop();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::StaticPage;
	use pagebeat_core::{EventReport, HeartbeatReport, Scheme};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	#[derive(Default)]
	struct CountingTransport {
		heartbeats: AtomicUsize,
		events: AtomicUsize,
	}

	#[async_trait::async_trait]
	impl Transport for CountingTransport {
		async fn send_heartbeat(&self, _report: &HeartbeatReport) -> Result<()> {
			self.heartbeats.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}

		async fn send_event(&self, _report: &EventReport) -> Result<()> {
			self.events.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
	}

	fn config() -> BeaconConfig {
		BeaconConfig::new(Scheme::Https, "stats.example.com", "/ingress/svc/script.js")
	}

	#[tokio::test]
	async fn test_builder_requires_config_and_host() {
		let missing_config = Beacon::builder()
			.host(Arc::new(StaticPage::new("https://site.example/")))
			.build();
		assert!(matches!(missing_config, Err(BeaconError::MissingConfig)));

		let missing_host = Beacon::builder().config(config()).build();
		assert!(matches!(missing_host, Err(BeaconError::MissingHost)));
	}

	#[test]
	fn test_builder_outside_runtime_fails() {
		let result = Beacon::builder()
			.config(config())
			.host(Arc::new(StaticPage::new("https://site.example/")))
			.build();
		assert!(matches!(result, Err(BeaconError::NoRuntime)));
	}

	#[tokio::test]
	async fn test_default_transport_validates_endpoint() {
		let result = Beacon::builder()
			.config(BeaconConfig::new(Scheme::Https, "", "/collect"))
			.host(Arc::new(StaticPage::new("https://site.example/")))
			.build();
		assert!(matches!(result, Err(BeaconError::Endpoint(_))));
	}

	#[tokio::test]
	async fn test_disabled_beacon_skips_endpoint_validation() {
		let beacon = Beacon::builder()
			.config(BeaconConfig::new(Scheme::Https, "", "/collect").with_do_not_track(true))
			.host(Arc::new(StaticPage::new("https://site.example/")))
			.build()
			.unwrap();
		assert!(!beacon.is_enabled());
	}

	#[tokio::test(start_paused = true)]
	async fn test_browser_dnt_only_counts_when_respected() {
		let transport = Arc::new(CountingTransport::default());
		let page = Arc::new(StaticPage::new("https://site.example/").with_do_not_track(true));

		let ignoring = Beacon::builder()
			.config(config())
			.host(page.clone())
			.transport(transport.clone())
			.build()
			.unwrap();
		assert!(ignoring.is_enabled());

		let respecting = Beacon::builder()
			.config(config().with_respect_dnt(true))
			.host(page)
			.transport(transport)
			.build()
			.unwrap();
		assert!(!respecting.is_enabled());
		assert!(respecting.on_page_load().is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn test_injected_script_runs_after_scan() {
		let page = Arc::new(StaticPage::new("https://site.example/"));
		let mut beacon = Beacon::builder()
			.config(config().with_injected_script("window.hello = 1;"))
			.host(page.clone())
			.transport(Arc::new(CountingTransport::default()))
			.build()
			.unwrap();

		let rejected = beacon.initialize("<button class=\"x-event--click--go\"></button>");
		assert!(rejected.is_empty());
		assert_eq!(beacon.bindings().len(), 1);
		assert_eq!(page.injected_scripts(), vec!["window.hello = 1;".to_string()]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_injected_script_runs_under_dnt() {
		let page = Arc::new(StaticPage::new("https://site.example/"));
		let mut beacon = Beacon::builder()
			.config(
				config()
					.with_do_not_track(true)
					.with_injected_script("track()"),
			)
			.host(page.clone())
			.build()
			.unwrap();

		beacon.initialize("<button class=\"x-event--click--go\"></button>");
		assert!(beacon.bindings().is_empty());
		assert_eq!(page.injected_scripts(), vec!["track()".to_string()]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_lifecycle() {
		let transport = Arc::new(CountingTransport::default());
		let mut beacon = Beacon::builder()
			.config(config().with_heartbeat_interval(Duration::from_millis(1000)))
			.host(Arc::new(StaticPage::new("https://site.example/")))
			.transport(transport.clone())
			.build()
			.unwrap();
		beacon.initialize("<a class=\"x-event--click--nav\"></a>");

		assert_eq!(beacon.state(), SchedulerState::Idle);
		assert!(beacon.session_token().is_none());

		let token = beacon.on_page_load().unwrap();
		assert_eq!(beacon.session_token(), Some(token));

		tokio::time::sleep(Duration::from_millis(2500)).await;
		assert_eq!(transport.heartbeats.load(Ordering::SeqCst), 3);

		assert_eq!(beacon.trigger("click", "nav"), 1);
		tokio::time::sleep(Duration::from_millis(1)).await;
		assert_eq!(transport.events.load(Ordering::SeqCst), 1);

		beacon.shutdown();
		assert_eq!(beacon.state(), SchedulerState::Idle);
		tokio::time::sleep(Duration::from_millis(5000)).await;
		assert_eq!(transport.heartbeats.load(Ordering::SeqCst), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_send_heartbeat_before_load_is_idle() {
		let beacon = Beacon::builder()
			.config(config())
			.host(Arc::new(StaticPage::new("https://site.example/")))
			.transport(Arc::new(CountingTransport::default()))
			.build()
			.unwrap();
		assert_eq!(beacon.send_heartbeat(), SendOutcome::Idle);
	}
}
