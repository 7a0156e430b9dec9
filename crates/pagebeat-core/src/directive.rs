// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event-capture directives encoded in element class names.
//!
//! Page authors opt an element into event capture by giving it a class of the
//! form `<prefix>--<event-type>--<listener-name>`, e.g.
//! `x-event--click--signup-button`. Parsing turns such a token into an
//! [`EventDirective`]; tokens that carry the prefix but are malformed are
//! reported as [`DirectiveError`]s instead of being dropped.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DirectiveError;

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "x-event";

const SEPARATOR: &str = "--";

static EVENT_TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]+$").unwrap());
static LISTENER_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Whether `listener` is a usable listener name: ASCII letters, digits,
/// underscores and hyphens.
pub(crate) fn is_valid_listener(listener: &str) -> bool {
	LISTENER_REGEX.is_match(listener)
}

/// A parsed `{event type, listener name}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventDirective {
	pub event_type: String,
	pub listener: String,
}

impl EventDirective {
	pub fn new(event_type: impl Into<String>, listener: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
			listener: listener.into(),
		}
	}
}

/// Parses class tokens against a fixed prefix.
#[derive(Debug, Clone)]
pub struct DirectiveParser {
	marker: String,
}

impl DirectiveParser {
	pub fn new(prefix: impl AsRef<str>) -> Self {
		Self {
			marker: format!("{}{SEPARATOR}", prefix.as_ref()),
		}
	}

	/// The prefix this parser matches, without the trailing separator.
	pub fn prefix(&self) -> &str {
		&self.marker[..self.marker.len() - SEPARATOR.len()]
	}

	/// Parses a single class token.
	///
	/// Returns `Ok(None)` for tokens that are not directives at all.
	pub fn parse_token(&self, token: &str) -> Result<Option<EventDirective>, DirectiveError> {
		let Some(rest) = token.strip_prefix(&self.marker) else {
			return Ok(None);
		};

		let Some((event_type, listener)) = rest.split_once(SEPARATOR) else {
			return Err(if rest.is_empty() {
				DirectiveError::MissingEventType {
					token: token.to_string(),
				}
			} else {
				DirectiveError::MissingListener {
					token: token.to_string(),
				}
			});
		};

		if event_type.is_empty() {
			return Err(DirectiveError::MissingEventType {
				token: token.to_string(),
			});
		}
		if !EVENT_TYPE_REGEX.is_match(event_type) {
			return Err(DirectiveError::InvalidEventType {
				token: token.to_string(),
				event_type: event_type.to_string(),
			});
		}
		if listener.is_empty() {
			return Err(DirectiveError::MissingListener {
				token: token.to_string(),
			});
		}
		if !is_valid_listener(listener) {
			return Err(DirectiveError::InvalidListener {
				token: token.to_string(),
				listener: listener.to_string(),
			});
		}

		Ok(Some(EventDirective::new(event_type, listener)))
	}

	/// Parses every whitespace-separated token of a `class` attribute.
	pub fn parse_class_attr(&self, class_attr: &str) -> Vec<Result<EventDirective, DirectiveError>> {
		class_attr
			.split_ascii_whitespace()
			.filter_map(|token| self.parse_token(token).transpose())
			.collect()
	}
}

impl Default for DirectiveParser {
	fn default() -> Self {
		Self::new(DEFAULT_PREFIX)
	}
}
