// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for beacon core types.

use thiserror::Error;

/// A class token that claims the directive prefix but does not follow
/// `<prefix>--<event-type>--<listener-name>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
	#[error("directive '{token}' is missing the event type segment")]
	MissingEventType { token: String },

	#[error("directive '{token}' is missing the listener name segment")]
	MissingListener { token: String },

	#[error("directive '{token}' has invalid event type '{event_type}' (expected lowercase letters)")]
	InvalidEventType { token: String, event_type: String },

	#[error("directive '{token}' has invalid listener name '{listener}' (expected word characters or '-')")]
	InvalidListener { token: String, listener: String },
}

impl DirectiveError {
	/// The offending class token.
	pub fn token(&self) -> &str {
		match self {
			DirectiveError::MissingEventType { token }
			| DirectiveError::MissingListener { token }
			| DirectiveError::InvalidEventType { token, .. }
			| DirectiveError::InvalidListener { token, .. } => token,
		}
	}
}

/// Errors resolving collector URLs.
#[derive(Debug, Error)]
pub enum EndpointError {
	#[error("collector host is empty")]
	EmptyHost,

	#[error("invalid collector URL '{url}': {source}")]
	InvalidUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},

	#[error("listener name '{0}' cannot be used in an event URL")]
	InvalidListener(String),
}
