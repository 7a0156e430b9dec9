// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the pagebeat telemetry beacon.
//!
//! This crate holds everything that does not need a runtime or network:
//!
//! - [`SessionToken`]: per-load idempotency token
//! - [`HeartbeatReport`] / [`EventReport`]: collector payloads
//! - [`DirectiveParser`]: class-name event-capture directives
//! - [`BeaconConfig`]: resolved configuration and collector URLs

pub mod config;
pub mod directive;
pub mod error;
pub mod report;
pub mod token;

pub use config::{
	coerce_interval_ms, resolve_interval, BeaconConfig, IngressRoute, Scheme,
	DEFAULT_HEARTBEAT_INTERVAL, MAX_HEARTBEAT_INTERVAL_MS,
};
pub use directive::{DirectiveParser, EventDirective, DEFAULT_PREFIX};
pub use error::{DirectiveError, EndpointError};
pub use report::{ElementDescriptor, EventReport, HeartbeatReport, Metadata};
pub use token::SessionToken;
