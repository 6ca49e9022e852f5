//! The tree-manipulation capability the [`Reconciler`](`crate::Reconciler`) is written against.
//!
//! Implementations: [`arena::Document`](`crate::arena::Document`) (in-memory) and,
//! with the `web` feature on `wasm32`, `web::WebTree` (browser DOM).

use crate::descriptor::CreationOptions;
use core::{fmt::Debug, hash::Hash};
use thiserror::Error;

/// The three node kinds the reconciler distinguishes.
///
/// [`NodeKind::Other`] covers anything a foreign tree may contain (processing instructions, doctypes…),
/// which is never matched against a descriptor and is pruned like any unclaimed child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
	Element,
	Text,
	Comment,
	Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
	#[error("invalid name: {0:?}")]
	InvalidName(String),
	#[error("{node} is not a child of {parent}")]
	NotFound { parent: String, node: String },
	#[error("can't insert {node} into {parent}")]
	HierarchyRequest { parent: String, node: String },
	#[error("{0} is not an element")]
	NotAnElement(String),
	#[error("host error: {0}")]
	Host(String),
}

/// A live, mutable node tree addressed through copyable handles.
///
/// Element-only accessors may return defaults (empty [`String`], [`None`], no attributes) for other node kinds.
pub trait Tree {
	/// Stable handle to one node. Side tables are keyed by it, so it must stay valid (and unique) while the node exists.
	type Node: Copy + Eq + Hash + Debug + 'static;
	/// Identity of a registered custom element definition.
	type CustomElement: PartialEq;

	fn create_element(&mut self, tag_name: &str, namespace_uri: Option<&str>, options: &CreationOptions<'_>) -> Result<Self::Node, TreeError>;
	fn create_text_node(&mut self, data: &str) -> Result<Self::Node, TreeError>;
	fn create_comment(&mut self, data: &str) -> Result<Self::Node, TreeError>;

	/// Inserts `node` into `parent` before `reference`, or appends it if `reference` is [`None`].
	///
	/// `node` is moved if it already has a parent.
	fn insert_before(&mut self, parent: Self::Node, node: Self::Node, reference: Option<Self::Node>) -> Result<(), TreeError>;
	fn replace_child(&mut self, parent: Self::Node, new_child: Self::Node, old_child: Self::Node) -> Result<(), TreeError>;
	fn remove_child(&mut self, parent: Self::Node, child: Self::Node) -> Result<(), TreeError>;

	fn child_count(&self, parent: Self::Node) -> usize;
	fn child_at(&self, parent: Self::Node, index: usize) -> Option<Self::Node>;

	fn node_kind(&self, node: Self::Node) -> NodeKind;
	fn tag_name(&self, element: Self::Node) -> String;
	fn namespace_uri(&self, element: Self::Node) -> Option<String>;
	/// The custom element designator the element was created with, if any.
	fn is_value(&self, element: Self::Node) -> Option<String>;

	/// Data of a text or comment node.
	fn character_data(&self, node: Self::Node) -> String;
	fn set_character_data(&mut self, node: Self::Node, data: &str) -> Result<(), TreeError>;

	/// Qualified names of all attributes currently present on `element`.
	fn attribute_names(&self, element: Self::Node) -> Vec<String>;
	fn get_attribute(&self, element: Self::Node, namespace_uri: Option<&str>, name: &str) -> Option<String>;
	fn set_attribute(&mut self, element: Self::Node, namespace_uri: Option<&str>, name: &str, value: &str) -> Result<(), TreeError>;
	fn remove_attribute(&mut self, element: Self::Node, namespace_uri: Option<&str>, name: &str) -> Result<(), TreeError>;

	/// Replaces all children of `element` with parsed `markup`.
	fn set_inner_markup(&mut self, element: Self::Node, markup: &str) -> Result<(), TreeError>;

	fn custom_element(&self, name: &str) -> Option<Self::CustomElement>;

	/// Called once for each node of a subtree the reconciler removed, after it was detached.
	/// The reconciler won't pass `node` to this tree again, so its handle may be released or reused.
	fn forget(&mut self, node: Self::Node) {
		let _ = node;
	}
}

/// The local part of a possibly prefixed attribute name.
#[must_use]
pub fn local_name(qualified_name: &str) -> &str {
	qualified_name.rsplit(':').next().unwrap_or(qualified_name)
}
