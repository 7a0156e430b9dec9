// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-load session tokens.
//!
//! A token groups every heartbeat from one page load so the collector can
//! merge them into a single hit. It is generated locally with no server
//! round-trip and is never persisted.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of each random substring in a token.
pub const SEGMENT_LEN: usize = 13;

/// Total token length.
pub const TOKEN_LEN: usize = SEGMENT_LEN * 2;

/// Opaque idempotency token for one page load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
	/// Generates a fresh token from two independently drawn base-36 segments.
	pub fn generate() -> Self {
		let mut rng = rand::thread_rng();
		let mut token = String::with_capacity(TOKEN_LEN);
		token.push_str(&segment(&mut rng));
		token.push_str(&segment(&mut rng));
		Self(token)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_inner(self) -> String {
		self.0
	}
}

impl fmt::Display for SessionToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for SessionToken {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

fn segment<R: Rng>(rng: &mut R) -> String {
	(0..SEGMENT_LEN)
		.map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::collections::HashSet;

	#[test]
	fn test_token_length() {
		let token = SessionToken::generate();
		assert_eq!(token.as_str().len(), TOKEN_LEN);
	}

	#[test]
	fn test_token_is_base36() {
		let token = SessionToken::generate();
		assert!(token
			.as_str()
			.chars()
			.all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
	}

	#[test]
	fn test_tokens_do_not_collide() {
		let tokens: HashSet<SessionToken> = (0..10_000).map(|_| SessionToken::generate()).collect();
		assert_eq!(tokens.len(), 10_000);
	}

	#[test]
	fn test_serializes_as_plain_string() {
		let token = SessionToken("abc".to_string());
		assert_eq!(serde_json::to_string(&token).unwrap(), "\"abc\"");
	}

	proptest! {
		#[test]
		fn test_display_matches_inner(_seed in 0u32..64) {
			let token = SessionToken::generate();
			prop_assert_eq!(token.to_string(), token.as_str().to_string());
			prop_assert_eq!(token.clone().into_inner().len(), TOKEN_LEN);
		}
	}
}
