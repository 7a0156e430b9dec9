// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The page the beacon is embedded in.
//!
//! The beacon never touches a document directly. Everything it reads about
//! the page (visibility, URLs, timing, site metadata) comes through
//! [`PageHost`], so the same state machine runs under a browser shim, a
//! headless runner, or a test double.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use pagebeat_core::{HeartbeatReport, Metadata, SessionToken};
use tracing::debug;

/// Host environment seam.
pub trait PageHost: Send + Sync {
	/// Whether the document is currently visible (not backgrounded or minimized).
	fn is_visible(&self) -> bool;

	/// Current page URL.
	fn location(&self) -> String;

	/// Referrer URL, empty when there is none.
	fn referrer(&self) -> String;

	/// Milliseconds from navigation start to DOM content loaded.
	fn load_time_ms(&self) -> i64;

	/// Hit-scoped metadata defined by the page before the beacon ran.
	fn hit_metadata(&self) -> Option<Metadata> {
		None
	}

	/// Session-scoped metadata defined by the page before the beacon ran.
	fn session_metadata(&self) -> Option<Metadata> {
		None
	}

	/// Browser-level do-not-track signal.
	fn do_not_track_requested(&self) -> bool {
		false
	}

	/// Executes the site owner's injected script. The beacon hands the text
	/// over verbatim and makes no assumptions about what it does.
	fn run_injected_script(&self, _script: &str) {}
}

/// Captures a heartbeat snapshot of the page for `token`.
pub fn capture_heartbeat(host: &dyn PageHost, token: &SessionToken) -> HeartbeatReport {
	HeartbeatReport {
		idempotency: token.clone(),
		referrer: host.referrer(),
		location: host.location(),
		load_time: host.load_time_ms(),
		hit_metadata: host.hit_metadata(),
		session_metadata: host.session_metadata(),
	}
}

/// An in-memory page whose state is set by the embedder.
///
/// Visibility and location can change after construction, mirroring tab
/// switches and in-page navigation.
#[derive(Debug)]
pub struct StaticPage {
	location: RwLock<String>,
	referrer: String,
	load_time_ms: AtomicI64,
	visible: AtomicBool,
	do_not_track: bool,
	hit_metadata: Option<Metadata>,
	session_metadata: Option<Metadata>,
	injected: Mutex<Vec<String>>,
}

impl StaticPage {
	pub fn new(location: impl Into<String>) -> Self {
		Self {
			location: RwLock::new(location.into()),
			referrer: String::new(),
			load_time_ms: AtomicI64::new(0),
			visible: AtomicBool::new(true),
			do_not_track: false,
			hit_metadata: None,
			session_metadata: None,
			injected: Mutex::new(Vec::new()),
		}
	}

	pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
		self.referrer = referrer.into();
		self
	}

	pub fn with_load_time_ms(self, load_time_ms: i64) -> Self {
		self.load_time_ms.store(load_time_ms, Ordering::SeqCst);
		self
	}

	pub fn with_do_not_track(mut self, do_not_track: bool) -> Self {
		self.do_not_track = do_not_track;
		self
	}

	pub fn with_hit_metadata(mut self, metadata: Metadata) -> Self {
		self.hit_metadata = Some(metadata);
		self
	}

	pub fn with_session_metadata(mut self, metadata: Metadata) -> Self {
		self.session_metadata = Some(metadata);
		self
	}

	pub fn set_visible(&self, visible: bool) {
		debug!(visible, "Page visibility changed");
		self.visible.store(visible, Ordering::SeqCst);
	}

	pub fn navigate(&self, location: impl Into<String>) {
		*self.location.write().unwrap_or_else(PoisonError::into_inner) = location.into();
	}

	/// Scripts handed to [`PageHost::run_injected_script`], in order.
	pub fn injected_scripts(&self) -> Vec<String> {
		self.injected
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}
}

impl PageHost for StaticPage {
	fn is_visible(&self) -> bool {
		self.visible.load(Ordering::SeqCst)
	}

	fn location(&self) -> String {
		self.location
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	fn referrer(&self) -> String {
		self.referrer.clone()
	}

	fn load_time_ms(&self) -> i64 {
		self.load_time_ms.load(Ordering::SeqCst)
	}

	fn hit_metadata(&self) -> Option<Metadata> {
		self.hit_metadata.clone()
	}

	fn session_metadata(&self) -> Option<Metadata> {
		self.session_metadata.clone()
	}

	fn do_not_track_requested(&self) -> bool {
		self.do_not_track
	}

	fn run_injected_script(&self, script: &str) {
		debug!(bytes = script.len(), "Injected script handed to page");
		self.injected
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(script.to_string());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_static_page_defaults() {
		let page = StaticPage::new("https://site.example/");
		assert!(page.is_visible());
		assert_eq!(page.referrer(), "");
		assert_eq!(page.load_time_ms(), 0);
		assert!(page.hit_metadata().is_none());
		assert!(!page.do_not_track_requested());
	}

	#[test]
	fn test_visibility_and_navigation_are_live() {
		let page = StaticPage::new("https://site.example/a");
		page.set_visible(false);
		page.navigate("https://site.example/b");
		assert!(!page.is_visible());
		assert_eq!(page.location(), "https://site.example/b");
	}

	#[test]
	fn test_capture_heartbeat_reads_host() {
		let mut meta = Metadata::new();
		meta.insert("ab".to_string(), json!("variant-b"));
		let page = StaticPage::new("https://site.example/pricing")
			.with_referrer("https://search.example/")
			.with_load_time_ms(321)
			.with_session_metadata(meta.clone());
		let token = SessionToken::generate();

		let report = capture_heartbeat(&page, &token);

		assert_eq!(report.idempotency, token);
		assert_eq!(report.location, "https://site.example/pricing");
		assert_eq!(report.referrer, "https://search.example/");
		assert_eq!(report.load_time, 321);
		assert!(report.hit_metadata.is_none());
		assert_eq!(report.session_metadata, Some(meta));
	}

	#[test]
	fn test_injected_scripts_recorded() {
		let page = StaticPage::new("https://site.example/");
		page.run_injected_script("console.log(1)");
		assert_eq!(page.injected_scripts(), vec!["console.log(1)".to_string()]);
	}
}
