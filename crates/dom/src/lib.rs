//! Synthetic host-document model.
//!
//! This crate provides the document tree the lifecycle engine operates on: a
//! thread-safe arena of element and text nodes with attribute queries, a
//! forgiving markup parser/serializer, a simple-selector matcher, and the
//! three host event sources the engine consumes:
//!
//! - subtree change notification ([`Document::observe`], delivering
//!   [`Mutation`] batches after structural edits),
//! - document readiness ([`Document::on_ready`] / [`Document::set_ready`]),
//! - window resize ([`Document::add_resize_listener`] /
//!   [`Document::emit_resize`]).
//!
//! Nodes are addressed by [`NodeId`], a non-owning `Copy` handle. Removed
//! subtrees stay readable (attributes, descendants) so teardown logic can
//! inspect them after detachment.

mod document;
mod markup;
mod node;
mod select;

pub use document::{Document, Mutation};
pub use node::NodeId;
