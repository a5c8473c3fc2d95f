//! Route overlay contract.
//!
//! The declarative path-routing layer is an external collaborator; the
//! engine only needs its active rule's injection spots. On every newly added
//! subtree the mutation watcher clones each spot's template fragment into the
//! descendants matching the spot's parent selector, before component
//! discovery runs, so injected markup participates in the same scan.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use weft_dom::{Document, NodeId};

/// Named path parameters extracted by the routing layer.
pub type PathArgs = FxHashMap<String, String>;

/// Places one cloned template node relative to its matched parent. The
/// callback owns placement (append, prepend, replace) and may consult the
/// path arguments.
pub type ManualInject = Arc<dyn Fn(&Document, NodeId, NodeId, &PathArgs) + Send + Sync>;

/// One declarative injection location.
#[derive(Clone)]
pub struct InjectionSpot {
	/// Simple selector matched against descendants of the added subtree.
	pub parent_selector: String,
	/// Template markup; its first top-level node is cloned per match.
	pub template: String,
	pub inject: ManualInject,
}

impl InjectionSpot {
	pub fn new(
		parent_selector: impl Into<String>,
		template: impl Into<String>,
		inject: impl Fn(&Document, NodeId, NodeId, &PathArgs) + Send + Sync + 'static,
	) -> Self {
		Self {
			parent_selector: parent_selector.into(),
			template: template.into(),
			inject: Arc::new(inject),
		}
	}
}

/// The rule currently matching the host location, if any.
#[derive(Clone, Default)]
pub struct ActiveRule {
	pub args: PathArgs,
	pub spots: Vec<InjectionSpot>,
}

/// Narrow view of the routing layer consulted by the mutation watcher.
pub trait RouteOverlay: Send + Sync {
	fn active_rule(&self) -> Option<ActiveRule>;
}
