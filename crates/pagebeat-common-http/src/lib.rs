// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for pagebeat.
//!
//! This crate provides a pre-configured HTTP client builder with a consistent
//! User-Agent header. Requests are never retried; a lost beacon hit is
//! replaced by the next heartbeat.

mod client;

pub use client::{builder, builder_with_timeout, builder_with_user_agent, user_agent};
