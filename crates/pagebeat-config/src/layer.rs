// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by a single source.

use serde::{Deserialize, Serialize};

use crate::sections::{BeaconConfigLayer, HttpConfigLayer, LoggingConfigLayer};

/// One source's view of the configuration. Unset fields defer to
/// lower-precedence sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PagebeatConfigLayer {
	pub beacon: Option<BeaconConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
	pub http: Option<HttpConfigLayer>,
}

impl PagebeatConfigLayer {
	/// Overlays `other` onto `self`; fields set in `other` win.
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.beacon, other.beacon, BeaconConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(existing), Some(overlay)) => merge(existing, overlay),
		(None, Some(overlay)) => *base = Some(overlay),
		(_, None) => {}
	}
}
