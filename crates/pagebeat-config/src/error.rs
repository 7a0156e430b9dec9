// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

use pagebeat_core::EndpointError;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// Config file exists but could not be read
	#[error("failed to read {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// Missing required field
	#[error("Missing required field: {0}")]
	MissingField(String),

	/// Invalid value
	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	/// Collector endpoint could not be built from the resolved values
	#[error("Invalid collector endpoint: {0}")]
	Endpoint(#[from] EndpointError),
}

impl ConfigError {
	/// Create a missing field error
	pub fn missing_field(field: impl Into<String>) -> Self {
		Self::MissingField(field.into())
	}

	/// Create an invalid value error
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display() {
		assert_eq!(
			ConfigError::missing_field("beacon.host").to_string(),
			"Missing required field: beacon.host"
		);
		assert_eq!(
			ConfigError::invalid_value("PAGEBEAT_BEACON_DO_NOT_TRACK", "expected a boolean").to_string(),
			"Invalid value for PAGEBEAT_BEACON_DO_NOT_TRACK: expected a boolean"
		);
	}

	#[test]
	fn test_endpoint_error_converts() {
		let err: ConfigError = EndpointError::EmptyHost.into();
		assert!(matches!(err, ConfigError::Endpoint(EndpointError::EmptyHost)));
	}
}
