// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Page-view telemetry beacon.
//!
//! The beacon reports page views and liveness to a collector while the page
//! is open, and reports interactions declared in the page markup.
//!
//! # Features
//!
//! - **Idempotent heartbeats**: every report from one page load carries the
//!   same random token, so the collector can fold them into one hit
//! - **Visibility gating**: nothing is sent while the page is hidden
//! - **Single outstanding send**: ticks that arrive mid-send are dropped
//! - **Markup-declared events**: `x-event--click--signup-button` on an element
//!   reports clicks on it
//! - **Do-not-track**: a disabled beacon makes no network calls
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pagebeat::{Beacon, BeaconConfig, Scheme, StaticPage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let page = Arc::new(StaticPage::new("https://site.example/pricing"));
//!     let config = BeaconConfig::new(Scheme::Https, "stats.example.com", "/ingress/3f1c/script.js");
//!
//!     let mut beacon = Beacon::builder().config(config).host(page).build()?;
//!     beacon.initialize(include_str!("pricing.html"));
//!     beacon.on_page_load();
//!
//!     tokio::signal::ctrl_c().await?;
//!     beacon.shutdown();
//!     Ok(())
//! }
//! ```

mod beacon;
mod error;
mod events;
mod host;
mod scheduler;
mod transport;

pub use beacon::{Beacon, BeaconBuilder};
pub use error::{BeaconError, Result};
pub use events::{scan_markup, DomEvent, EventBinding, EventReporter, ScanResult};
pub use host::{capture_heartbeat, PageHost, StaticPage};
pub use scheduler::{HeartbeatScheduler, SchedulerState, SendOutcome};
pub use transport::{HttpTransport, HttpTransportBuilder, HttpTransportConfig, Transport};

// Re-export core types for convenience
pub use pagebeat_core::{
	BeaconConfig, DirectiveError, DirectiveParser, ElementDescriptor, EndpointError, EventDirective,
	EventReport, HeartbeatReport, IngressRoute, Metadata, Scheme, SessionToken,
	DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_PREFIX,
};
