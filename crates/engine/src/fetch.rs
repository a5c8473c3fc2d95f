//! Remote template fetching.
//!
//! One attempt per call, no timeout, no cancellation token; staleness is
//! handled by the orchestrator's liveness check when the continuation runs.

use std::thread;

/// Why a template fetch yielded no content.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
	/// The request completed with a non-200 status.
	#[error("template request returned status {0}")]
	Status(u16),
	/// The request never completed.
	#[error("template request failed: {0}")]
	Transport(String),
}

/// Continuation resuming the creation pipeline for one instance.
pub type FetchCallback = Box<dyn FnOnce(Result<String, FetchError>) + Send>;

/// Issues a single GET for a template URL and hands the outcome to `done`.
///
/// Implementations may invoke `done` from any thread, synchronously or
/// later; the engine only requires that it is invoked exactly once.
pub trait TemplateFetcher: Send + Sync {
	fn fetch(&self, url: &str, done: FetchCallback);
}

/// Production fetcher: a blocking HTTP GET on a spawned thread per request.
pub struct HttpTemplateFetcher {
	client: reqwest::blocking::Client,
}

impl HttpTemplateFetcher {
	pub fn new() -> Self {
		Self {
			client: reqwest::blocking::Client::new(),
		}
	}
}

impl Default for HttpTemplateFetcher {
	fn default() -> Self {
		Self::new()
	}
}

impl TemplateFetcher for HttpTemplateFetcher {
	fn fetch(&self, url: &str, done: FetchCallback) {
		let client = self.client.clone();
		let url = url.to_string();
		thread::spawn(move || {
			let result = match client.get(&url).send() {
				Ok(response) if response.status() == reqwest::StatusCode::OK => {
					response.text().map_err(|err| FetchError::Transport(err.to_string()))
				}
				Ok(response) => Err(FetchError::Status(response.status().as_u16())),
				Err(err) => Err(FetchError::Transport(err.to_string())),
			};
			done(result);
		});
	}
}
