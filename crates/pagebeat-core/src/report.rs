// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire payloads sent to the collector.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::directive::EventDirective;
use crate::token::SessionToken;

/// Site-supplied key/value metadata attached verbatim to heartbeats.
pub type Metadata = Map<String, Value>;

/// Point-in-time snapshot of the current page view.
///
/// Built fresh for every send attempt and dropped after transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatReport {
	pub idempotency: SessionToken,
	pub referrer: String,
	pub location: String,
	/// Milliseconds from navigation start to DOM content loaded.
	pub load_time: i64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hit_metadata: Option<Metadata>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub session_metadata: Option<Metadata>,
}

/// Identity of a scanned element, serialized as the `element` field of an
/// event report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementDescriptor {
	/// Position of the element in document order at scan time.
	pub index: usize,
	pub tag: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub classes: Vec<String>,
}

/// A single captured interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
	pub event_type: String,
	pub location: String,
	pub element: ElementDescriptor,
	/// Carried in the URL path, not the body.
	#[serde(skip)]
	pub listener: String,
}

impl EventReport {
	pub fn new(directive: &EventDirective, location: impl Into<String>, element: ElementDescriptor) -> Self {
		Self {
			event_type: directive.event_type.clone(),
			location: location.into(),
			element,
			listener: directive.listener.clone(),
		}
	}
}
