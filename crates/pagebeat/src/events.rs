// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Interaction capture declared in page markup.
//!
//! The markup is scanned once at initialization. Every class token of the
//! form `<prefix>--<event-type>--<listener-name>` becomes an
//! [`EventBinding`]. The host forwards interactions as [`DomEvent`]s during
//! the capture phase, so a binding fires before page handlers can stop
//! propagation and regardless of whether the element is removed afterwards.
//! Event reports are independent of heartbeats and of each other. A host that
//! panics while a report is being built loses that report only.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use pagebeat_core::{DirectiveError, DirectiveParser, ElementDescriptor, EventDirective, EventReport};
use scraper::{ElementRef, Html};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::host::PageHost;
use crate::transport::Transport;

/// A directive attached to a concrete element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
	pub element: ElementDescriptor,
	pub directive: EventDirective,
}

/// Outcome of scanning page markup.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
	pub bindings: Vec<EventBinding>,
	/// Tokens that claimed the directive prefix but were malformed.
	pub rejected: Vec<DirectiveError>,
}

/// An interaction delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
	pub event_type: String,
	/// Document-order index of the target element, as in
	/// [`ElementDescriptor::index`].
	pub target: usize,
}

impl DomEvent {
	pub fn new(event_type: impl Into<String>, target: usize) -> Self {
		Self {
			event_type: event_type.into(),
			target,
		}
	}
}

/// Scans `markup` for event-capture directives.
///
/// Elements are indexed in document order, starting with the root element.
/// Malformed directives are logged and returned in
/// [`ScanResult::rejected`]; they never abort the scan.
pub fn scan_markup(markup: &str, parser: &DirectiveParser) -> ScanResult {
	let document = Html::parse_document(markup);
	let mut result = ScanResult::default();

	let elements = document
		.root_element()
		.descendants()
		.filter_map(ElementRef::wrap)
		.enumerate();

	for (index, element) in elements {
		let Some(class_attr) = element.value().attr("class") else {
			continue;
		};

		let mut descriptor = None;
		for parsed in parser.parse_class_attr(class_attr) {
			match parsed {
				Ok(directive) => {
					let bound = descriptor
						.get_or_insert_with(|| describe(index, element))
						.clone();
					result.bindings.push(EventBinding {
						element: bound,
						directive,
					});
				}
				Err(e) => {
					warn!(error = %e, element_index = index, "Ignoring malformed event directive");
					result.rejected.push(e);
				}
			}
		}
	}

	debug!(
		bindings = result.bindings.len(),
		rejected = result.rejected.len(),
		prefix = parser.prefix(),
		"Scanned markup for event directives"
	);

	result
}

fn describe(index: usize, element: ElementRef<'_>) -> ElementDescriptor {
	let value = element.value();
	ElementDescriptor {
		index,
		tag: value.name().to_string(),
		id: value.id().map(str::to_string),
		classes: value.classes().map(str::to_string).collect(),
	}
}

/// Reports interactions on bound elements.
pub struct EventReporter {
	bindings: Vec<EventBinding>,
	host: Arc<dyn PageHost>,
	transport: Arc<dyn Transport>,
	runtime: Handle,
}

impl EventReporter {
	pub fn new(
		bindings: Vec<EventBinding>,
		host: Arc<dyn PageHost>,
		transport: Arc<dyn Transport>,
		runtime: Handle,
	) -> Self {
		Self {
			bindings,
			host,
			transport,
			runtime,
		}
	}

	pub fn bindings(&self) -> &[EventBinding] {
		&self.bindings
	}

	/// Reports `event` once for every binding on its target with a matching
	/// event type. Returns the number of reports dispatched.
	///
	/// Never panics on behalf of the host; a report the host fails to
	/// describe is skipped and not counted.
	pub fn handle(&self, event: &DomEvent) -> usize {
		let matching = self.bindings.iter().filter(|binding| {
			binding.element.index == event.target && binding.directive.event_type == event.event_type
		});
		self.dispatch_all(matching)
	}

	/// Fires every binding declared as `<event_type>--<listener>`, as if each
	/// bound element had received the interaction.
	pub fn trigger(&self, event_type: &str, listener: &str) -> usize {
		let matching = self.bindings.iter().filter(|binding| {
			binding.directive.event_type == event_type && binding.directive.listener == listener
		});
		self.dispatch_all(matching)
	}

	fn dispatch_all<'a>(&self, bindings: impl Iterator<Item = &'a EventBinding>) -> usize {
		bindings.filter(|binding| self.dispatch(binding)).count()
	}

	fn dispatch(&self, binding: &EventBinding) -> bool {
		let built = panic::catch_unwind(AssertUnwindSafe(|| {
			EventReport::new(&binding.directive, self.host.location(), binding.element.clone())
		}));
		let Ok(report) = built else {
			debug!(
				listener = %binding.directive.listener,
				"Event report could not be built"
			);
			return false;
		};
		let transport = Arc::clone(&self.transport);

		self.runtime.spawn(async move {
			match transport.send_event(&report).await {
				Ok(()) => debug!(
					event_type = %report.event_type,
					listener = %report.listener,
					"Event reported"
				),
				Err(e) => debug!(error = %e, listener = %report.listener, "Event report not delivered"),
			}
		});
		true
	}
}
