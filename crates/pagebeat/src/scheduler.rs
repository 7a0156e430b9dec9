// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Heartbeat scheduling.
//!
//! The scheduler owns one logical session per page-load signal:
//!
//! - **Idle**: no timer.
//! - **Scheduled**: periodic timer running, nothing in flight.
//! - **Sending**: a heartbeat is outstanding.
//!
//! Each tick attempts a send only while the page is visible and no other
//! heartbeat of the session is outstanding. Ticks that lose either check are
//! dropped, never queued. Completion clears the in-flight flag whatever the
//! outcome; the next tick is the only retry. A host that panics while a
//! report is being built costs that attempt only; the timer keeps running.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pagebeat_core::{SessionToken, DEFAULT_HEARTBEAT_INTERVAL, MAX_HEARTBEAT_INTERVAL_MS};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::host::{capture_heartbeat, PageHost};
use crate::transport::Transport;

const MAX_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(MAX_HEARTBEAT_INTERVAL_MS);

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
	Idle,
	Scheduled,
	Sending,
}

/// Result of a single send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
	/// A heartbeat was handed to the transport.
	Dispatched,
	/// The page is hidden.
	Hidden,
	/// A previous heartbeat is still outstanding.
	InFlight,
	/// No session has been started.
	Idle,
	/// The host panicked while the report was being built.
	Failed,
}

/// Token and in-flight flag of one page load.
#[derive(Debug)]
struct SessionState {
	token: SessionToken,
	in_flight: AtomicBool,
}

impl SessionState {
	fn new() -> Self {
		Self {
			token: SessionToken::generate(),
			in_flight: AtomicBool::new(false),
		}
	}

	fn is_in_flight(&self) -> bool {
		self.in_flight.load(Ordering::SeqCst)
	}
}

/// Clears the in-flight flag when the send task ends, including when the
/// transport panics or the task is cancelled.
struct InFlightGuard {
	session: Arc<SessionState>,
}

impl Drop for InFlightGuard {
	fn drop(&mut self) {
		self.session.in_flight.store(false, Ordering::SeqCst);
	}
}

struct HeartbeatSender {
	host: Arc<dyn PageHost>,
	transport: Arc<dyn Transport>,
	runtime: Handle,
}

impl HeartbeatSender {
	fn try_send(&self, session: &Arc<SessionState>) -> SendOutcome {
		// Unwinding drops the in-flight guard, so the flag never stays set.
		match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(session))) {
			Ok(outcome) => outcome,
			Err(_) => {
				debug!(idempotency = %session.token, "Heartbeat report could not be built");
				SendOutcome::Failed
			}
		}
	}

	fn dispatch(&self, session: &Arc<SessionState>) -> SendOutcome {
		if !self.host.is_visible() {
			debug!("Page hidden, skipping heartbeat");
			return SendOutcome::Hidden;
		}

		if session
			.in_flight
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			debug!("Heartbeat still in flight, skipping tick");
			return SendOutcome::InFlight;
		}

		let guard = InFlightGuard {
			session: Arc::clone(session),
		};
		let report = capture_heartbeat(self.host.as_ref(), &session.token);
		let transport = Arc::clone(&self.transport);

		self.runtime.spawn(async move {
			let _guard = guard;
			match transport.send_heartbeat(&report).await {
				Ok(()) => debug!(idempotency = %report.idempotency, "Heartbeat sent"),
				Err(e) => debug!(error = %e, "Heartbeat not delivered"),
			}
		});

		SendOutcome::Dispatched
	}
}

struct ActiveSession {
	session: Arc<SessionState>,
	timer: JoinHandle<()>,
}

/// Periodic heartbeat driver for one page.
pub struct HeartbeatScheduler {
	interval: Duration,
	sender: Arc<HeartbeatSender>,
	active: Mutex<Option<ActiveSession>>,
}

impl HeartbeatScheduler {
	/// Creates an idle scheduler. Sends and the timer run on `runtime`.
	///
	/// A zero interval falls back to [`DEFAULT_HEARTBEAT_INTERVAL`]; longer
	/// intervals are capped at [`MAX_HEARTBEAT_INTERVAL_MS`].
	pub fn new(
		interval: Duration,
		host: Arc<dyn PageHost>,
		transport: Arc<dyn Transport>,
		runtime: Handle,
	) -> Self {
		let interval = if interval.is_zero() {
			warn!("Zero heartbeat interval, using default");
			DEFAULT_HEARTBEAT_INTERVAL
		} else if interval > MAX_HEARTBEAT_INTERVAL {
			warn!(
				requested_ms = interval.as_millis() as u64,
				max_ms = MAX_HEARTBEAT_INTERVAL_MS,
				"Heartbeat interval too long, clamping"
			);
			MAX_HEARTBEAT_INTERVAL
		} else {
			interval
		};

		Self {
			interval,
			sender: Arc::new(HeartbeatSender {
				host,
				transport,
				runtime,
			}),
			active: Mutex::new(None),
		}
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Handles a page-load signal.
	///
	/// Cancels any running timer, starts a new session with a fresh token and
	/// a cleared in-flight flag, sends once immediately and schedules the
	/// periodic timer. Returns the new session's token.
	pub fn start(&self) -> SessionToken {
		let mut active = self.lock_active();

		if let Some(previous) = active.take() {
			previous.timer.abort();
			info!(
				previous = %previous.session.token,
				"Page load signalled again, replacing heartbeat session"
			);
		}

		let session = Arc::new(SessionState::new());
		let token = session.token.clone();

		self.sender.try_send(&session);

		let timer = self.spawn_timer(Arc::clone(&session));
		*active = Some(ActiveSession { session, timer });

		info!(
			idempotency = %token,
			interval_ms = self.interval.as_millis() as u64,
			"Heartbeat session started"
		);

		token
	}

	/// Attempts a heartbeat outside the timer cadence.
	pub fn send_now(&self) -> SendOutcome {
		let session = match self.lock_active().as_ref() {
			Some(active) => Arc::clone(&active.session),
			None => return SendOutcome::Idle,
		};
		self.sender.try_send(&session)
	}

	/// Cancels the timer. A heartbeat already in flight completes on its own.
	pub fn stop(&self) {
		if let Some(active) = self.lock_active().take() {
			active.timer.abort();
			info!(idempotency = %active.session.token, "Heartbeat session stopped");
		}
	}

	pub fn state(&self) -> SchedulerState {
		match self.lock_active().as_ref() {
			None => SchedulerState::Idle,
			Some(active) if active.session.is_in_flight() => SchedulerState::Sending,
			Some(_) => SchedulerState::Scheduled,
		}
	}

	/// Token of the current session, if one is running.
	pub fn token(&self) -> Option<SessionToken> {
		self.lock_active()
			.as_ref()
			.map(|active| active.session.token.clone())
	}

	fn spawn_timer(&self, session: Arc<SessionState>) -> JoinHandle<()> {
		let sender = Arc::clone(&self.sender);
		let period = self.interval;

		self.sender.runtime.spawn(async move {
			let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				ticker.tick().await;
				sender.try_send(&session);
			}
		})
	}

	fn lock_active(&self) -> MutexGuard<'_, Option<ActiveSession>> {
		self.active.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl Drop for HeartbeatScheduler {
	fn drop(&mut self) {
		if let Some(active) = self.lock_active().take() {
			active.timer.abort();
		}
	}
}
