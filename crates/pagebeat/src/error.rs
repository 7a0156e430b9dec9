// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the beacon.

use pagebeat_core::EndpointError;
use thiserror::Error;

/// Beacon errors.
///
/// Runtime send failures never leave the beacon; these surface only from
/// construction and from [`Transport`](crate::Transport) implementations.
#[derive(Debug, Error)]
pub enum BeaconError {
	/// Configuration was not provided to the builder.
	#[error("beacon configuration is required")]
	MissingConfig,

	/// Page host was not provided to the builder.
	#[error("page host is required")]
	MissingHost,

	/// No Tokio runtime to dispatch sends on.
	#[error("no Tokio runtime available to run the beacon")]
	NoRuntime,

	/// Collector URL could not be built.
	#[error("invalid collector endpoint: {0}")]
	Endpoint(#[from] EndpointError),

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Collector answered with a non-success status.
	#[error("collector returned status {status}")]
	ServerError { status: u16 },

	/// Custom transport failure.
	#[error("transport error: {0}")]
	Transport(String),
}

/// Result type alias for beacon operations.
pub type Result<T> = std::result::Result<T, BeaconError>;
