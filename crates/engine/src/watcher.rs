//! Incremental discovery and teardown, driven by subtree change records.
//!
//! Records are processed strictly in delivery order; within a record, added
//! roots before removed roots. Added subtrees first receive any route-overlay
//! template injection, then component discovery for every registered
//! selector. Removed subtrees are torn down root-first, then every marked
//! descendant.

use std::sync::Arc;

use weft_dom::{Mutation, NodeId};
use weft_registry::LINKED_ATTR;

use crate::engine::Core;
use crate::orchestrator;

pub(crate) fn process(core: &Arc<Core>, batch: &[Mutation]) {
	for record in batch {
		for &node in &record.added {
			handle_added(core, node);
		}
		for &node in &record.removed {
			handle_removed(core, node);
		}
	}
}

fn handle_added(core: &Arc<Core>, node: NodeId) {
	if !core.doc.is_element(node) {
		return;
	}
	if core.doc.has_attr(node, LINKED_ATTR) {
		return;
	}

	apply_overlay(core, node);

	for selector in core.defs.selectors() {
		let Some(def) = core.defs.get(&selector) else {
			continue;
		};
		// The added root itself may carry the selector; otherwise search its
		// descendants for unbound matches.
		if core.doc.has_selector(node, &selector, None) {
			orchestrator::create_for_element(core, &def, node);
			continue;
		}
		for element in core.doc.query_all_by_attr(node, &selector, None) {
			if core.doc.has_attr(element, LINKED_ATTR) {
				continue;
			}
			orchestrator::create_for_element(core, &def, element);
		}
	}
}

/// Clones the active rule's template fragments into matching locations so
/// the discovery pass below can bind anything they declare.
fn apply_overlay(core: &Arc<Core>, node: NodeId) {
	let overlay = core.overlay.read().clone();
	let Some(rule) = overlay.and_then(|o| o.active_rule()) else {
		return;
	};
	for spot in &rule.spots {
		let mut parents = core.doc.query_all_matching(node, &spot.parent_selector);
		if core.doc.matches(node, &spot.parent_selector) {
			parents.insert(0, node);
		}
		if parents.is_empty() {
			continue;
		}
		let fragment = core.doc.create_fragment(&spot.template);
		let Some(first) = fragment.first().copied() else {
			continue;
		};
		for parent in parents {
			let clone = core.doc.clone_subtree(first);
			(spot.inject)(&core.doc, parent, clone, &rule.args);
		}
	}
}

fn handle_removed(core: &Arc<Core>, node: NodeId) {
	if !core.doc.is_element(node) {
		return;
	}
	orchestrator::destroy_element(core, node);
	for descendant in core.doc.query_all_by_attr(node, LINKED_ATTR, None) {
		orchestrator::destroy_element(core, descendant);
	}
}
