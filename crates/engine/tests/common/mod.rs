#![allow(dead_code)]

// Library dependencies linked into every test crate but exercised only
// through the public API.
use reqwest as _;
use rustc_hash as _;
use thiserror as _;

use std::sync::{Arc, Once};

use parking_lot::Mutex;
use weft_engine::{FetchCallback, FetchError, TemplateFetcher};
use weft_registry::{
	Component, ComponentDef, OnDestroy, OnInject, OnReady, OnResize, Service,
};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn log() -> Log {
	Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
	log.lock().clone()
}

pub fn init_tracing() {
	static INIT: Once = Once::new();
	INIT.call_once(|| {
		let _ = tracing_subscriber::fmt()
			.with_test_writer()
			.with_max_level(tracing::Level::TRACE)
			.try_init();
	});
}

/// Component recording every hook invocation into a shared log.
pub struct Probe {
	name: String,
	log: Log,
}

impl Probe {
	/// A definition whose instances are probes named after the selector.
	pub fn def(selector: &str, log: &Log) -> ComponentDef {
		let name = selector.to_string();
		let log = log.clone();
		ComponentDef::new(selector, move || {
			Box::new(Probe {
				name: name.clone(),
				log: log.clone(),
			})
		})
	}
}

impl OnInject for Probe {
	fn on_inject(&mut self, services: Vec<Option<Service>>) {
		let summary: Vec<String> = services
			.iter()
			.map(|service| match service {
				Some(value) => value
					.downcast_ref::<String>()
					.cloned()
					.unwrap_or_else(|| "<opaque>".to_string()),
				None => "<none>".to_string(),
			})
			.collect();
		self.log.lock().push(format!("{}:inject[{}]", self.name, summary.join(",")));
	}
}

impl OnReady for Probe {
	fn on_ready(&mut self) {
		self.log.lock().push(format!("{}:ready", self.name));
	}
}

impl OnResize for Probe {
	fn on_resize(&mut self) {
		self.log.lock().push(format!("{}:resize", self.name));
	}
}

impl OnDestroy for Probe {
	fn on_destroy(&mut self) {
		self.log.lock().push(format!("{}:destroy", self.name));
	}
}

impl Component for Probe {
	fn as_inject(&mut self) -> Option<&mut dyn OnInject> {
		Some(self)
	}

	fn as_ready(&mut self) -> Option<&mut dyn OnReady> {
		Some(self)
	}

	fn as_resize(&mut self) -> Option<&mut dyn OnResize> {
		Some(self)
	}

	fn as_destroy(&mut self) -> Option<&mut dyn OnDestroy> {
		Some(self)
	}
}

/// Component with no capabilities at all.
pub struct Inert;

impl Component for Inert {}

/// Fetcher that records requests and completes them only when told to,
/// letting tests drive the asynchronous half of the pipeline by hand.
#[derive(Default)]
pub struct ManualFetcher {
	pending: Mutex<Vec<(String, FetchCallback)>>,
	requests: Mutex<Vec<String>>,
}

impl ManualFetcher {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn request_count(&self) -> usize {
		self.requests.lock().len()
	}

	pub fn requests(&self) -> Vec<String> {
		self.requests.lock().clone()
	}

	/// Completes the oldest pending request. Panics if none is pending.
	pub fn complete_next(&self, result: Result<&str, FetchError>) {
		let (_, done) = self.pending.lock().remove(0);
		done(result.map(str::to_string));
	}

	pub fn pending_count(&self) -> usize {
		self.pending.lock().len()
	}
}

impl TemplateFetcher for ManualFetcher {
	fn fetch(&self, url: &str, done: FetchCallback) {
		self.requests.lock().push(url.to_string());
		self.pending.lock().push((url.to_string(), done));
	}
}
