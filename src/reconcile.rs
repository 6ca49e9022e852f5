//! The live-tree backend.

use crate::{
	context::Context,
	descriptor::{is_html_namespace, normalize_attribute_name, AttrDescriptor, AttrValue, CommentDescriptor, Content, CreationOptions, ElementContent, ElementDescriptor, TextDescriptor},
	error::RenderError,
	keys::{Key, KeyOrder},
	lifecycle::{run_hooks, Created, Hook, Linking, Teardown, Updated},
	redact::Redacted,
	tree::{NodeKind, Tree},
};
use core::fmt::{self, Debug};
use hashbrown::{HashMap, HashSet};
use std::{borrow::Cow, rc::Rc};
use tracing::{error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// Default limit for nested render passes, see [`Reconciler::with_depth_limit`].
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// A root render function, captured so that [`Reconciler::rerender`] can replay it.
pub type RenderFn<N> = dyn Fn(&mut dyn Context<N>, N) -> Result<(), RenderError>;

/// Per-node bookkeeping, keyed by node handle and evicted when the reconciler removes the node.
struct SideTables<N> {
	keys: HashMap<N, Key>,
	cleanup: HashMap<N, Vec<Hook<N>>>,
	/// Presence means the node's created callbacks already ran.
	removed: HashMap<N, Vec<Hook<N>>>,
	markup: HashMap<N, String>,
	renderers: HashMap<N, Rc<RenderFn<N>>>,
}

impl<N: Copy + Eq + core::hash::Hash + Debug> SideTables<N> {
	fn new() -> Self {
		Self {
			keys: HashMap::new(),
			cleanup: HashMap::new(),
			removed: HashMap::new(),
			markup: HashMap::new(),
			renderers: HashMap::new(),
		}
	}

	fn run_cleanup(&mut self, node: N) {
		if let Some(hooks) = self.cleanup.remove(&node) {
			let span = trace_span!("Running cleanup callbacks", ?node, count = hooks.len());
			let _enter = span.enter();
			run_hooks("Cleanup", node, hooks);
		}
	}

	fn add_cleanup(&mut self, node: N, hook: Hook<N>) {
		self.cleanup.entry(node).or_insert_with(Vec::new).push(hook);
	}
}

/// Fires removal bookkeeping for `node` and its whole subtree, depth first, without detaching `node` itself.
///
/// Descendants are [forgotten](`Tree::forget`) here. `node` must be forgotten by the caller once it's detached.
fn unbind<T: Tree>(tree: &mut T, side_tables: &mut SideTables<T::Node>, node: T::Node) {
	let span = trace_span!("Unbinding", ?node);
	let _enter = span.enter();

	side_tables.keys.remove(&node);
	side_tables.run_cleanup(node);
	if let Some(removed) = side_tables.removed.remove(&node) {
		run_hooks("Removed", node, removed);
	}
	side_tables.markup.remove(&node);
	side_tables.renderers.remove(&node);

	for child in children(tree, node) {
		unbind(tree, side_tables, child);
		tree.forget(child);
	}
}

fn children<T: Tree>(tree: &T, parent: T::Node) -> Vec<T::Node> {
	(0..tree.child_count(parent)).filter_map(|i| tree.child_at(parent, i)).collect()
}

/// Keyed reconciler over a [`Tree`].
///
/// Render passes are synchronous. Nested element content runs as nested passes, each with its own [`Context`].
pub struct Reconciler<T: Tree> {
	tree: T,
	side_tables: SideTables<T::Node>,
	depth_limit: usize,
}

impl<T: Tree + Debug> Debug for Reconciler<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Reconciler")
			.field("tree", &self.tree)
			.field("keyed_nodes", &self.side_tables.keys.len())
			.field("rendered_nodes", &self.side_tables.removed.len())
			.field("depth_limit", &self.depth_limit)
			.finish()
	}
}

impl<T: Tree> Reconciler<T> {
	#[must_use]
	pub fn new(tree: T) -> Self {
		Self {
			tree,
			side_tables: SideTables::new(),
			depth_limit: DEFAULT_DEPTH_LIMIT,
		}
	}

	/// Limits how many render passes may nest. Exceeding it fails the pass with [`RenderError::DepthLimitReached`].
	#[must_use]
	pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}

	pub fn tree(&self) -> &T {
		&self.tree
	}

	/// Direct access to the tree. Changes made here are picked up (by position) on the next pass.
	pub fn tree_mut(&mut self) -> &mut T {
		&mut self.tree
	}

	pub fn into_tree(self) -> T {
		self.tree
	}

	/// The key `node` was last matched under, if it's a child the reconciler knows.
	pub fn key_of(&self, node: T::Node) -> Option<&Key> {
		self.side_tables.keys.get(&node)
	}

	/// Renders `render` into the children and attributes of `target`, and records it for [`Reconciler::rerender`].
	///
	/// # Errors
	///
	/// Tree errors, errors raised by the render code and failing created or linking callbacks are returned.
	/// Cleanup, removed and updated callback failures are only logged.
	#[instrument(skip(self, render))]
	pub fn render(&mut self, target: T::Node, render: impl 'static + Fn(&mut dyn Context<T::Node>, T::Node) -> Result<(), RenderError>) -> Result<(), RenderError> {
		let render: Rc<RenderFn<T::Node>> = Rc::new(render);
		self.side_tables.renderers.insert(target, Rc::clone(&render));
		self.run(target, &render)
	}

	/// Runs the render function last passed to [`Reconciler::render`] for `target` again.
	///
	/// # Errors
	///
	/// [`RenderError::NotRendered`] if there is none, otherwise as [`Reconciler::render`].
	#[instrument(skip(self))]
	pub fn rerender(&mut self, target: T::Node) -> Result<(), RenderError> {
		let render = match self.side_tables.renderers.get(&target) {
			Some(render) => Rc::clone(render),
			None => return Err(RenderError::NotRendered(format!("{:?}", target))),
		};
		self.run(target, &render)
	}

	fn run(&mut self, target: T::Node, render: &Rc<RenderFn<T::Node>>) -> Result<(), RenderError> {
		let render = Rc::clone(render);
		let content: Content<'_, T::Node> = Box::new(move |context: &mut dyn Context<T::Node>, _: Option<T::Node>| render(context, target));
		RenderContext::new(&mut self.tree, &mut self.side_tables, target, 0, self.depth_limit)?.render(content)
	}
}

/// One render pass over the children and attributes of `target`.
struct RenderContext<'r, T: Tree> {
	tree: &'r mut T,
	side_tables: &'r mut SideTables<T::Node>,
	target: T::Node,
	html: bool,
	is_update: bool,
	keys: KeyOrder,
	pending_attributes: HashSet<String>,
	created: Vec<Created<T::Node>>,
	updated: Vec<Updated<T::Node>>,
	/// Owned so that the compared allocations stay alive (and distinct) for the whole pass.
	linked: Vec<Linking<T::Node>>,
	depth: usize,
	depth_limit: usize,
}

impl<'r, T: Tree> RenderContext<'r, T> {
	fn new(tree: &'r mut T, side_tables: &'r mut SideTables<T::Node>, target: T::Node, depth: usize, depth_limit: usize) -> Result<Self, RenderError> {
		if depth > depth_limit {
			error!("Depth limit reached at {:?}", target);
			return Err(RenderError::DepthLimitReached { limit: depth_limit });
		}

		let is_update = side_tables.removed.contains_key(&target);
		side_tables.run_cleanup(target);

		let html = is_html_namespace(tree.namespace_uri(target).as_deref());
		let pending_attributes = tree
			.attribute_names(target)
			.iter()
			.filter_map(|name| normalize_attribute_name(name, html).map(Cow::into_owned))
			.collect();

		Ok(Self {
			tree,
			side_tables,
			target,
			html,
			is_update,
			keys: KeyOrder::new(),
			pending_attributes,
			created: Vec::new(),
			updated: Vec::new(),
			linked: Vec::new(),
			depth,
			depth_limit,
		})
	}

	#[instrument(skip(self, content), fields(target = ?self.target, depth = self.depth, is_update = self.is_update))]
	fn render(mut self, content: Content<'_, T::Node>) -> Result<(), RenderError> {
		let target = self.target;
		content(&mut self as &mut dyn Context<T::Node>, Some(target))?;
		self.finalize()
	}

	fn finalize(mut self) -> Result<(), RenderError> {
		for name in self.pending_attributes.drain() {
			trace!("Removing attribute {:?}", name);
			self.tree.remove_attribute(self.target, None, &name)?;
		}

		let claimed = self.keys.len();
		while let Some(child) = self.tree.child_at(self.target, claimed) {
			trace!("Removing unclaimed child {:?}", child);
			self.remove_child_node(child)?;
		}

		if self.is_update {
			for callback in self.updated.drain(..) {
				match callback(self.target) {
					Ok(Teardown::Nothing) => (),
					Ok(Teardown::Run(cleanup)) => self.side_tables.add_cleanup(self.target, cleanup),
					Err(error) => error!("Updated callback failed for {:?}: {}", self.target, error),
				}
			}
		} else {
			let mut removed = Vec::new();
			for callback in self.created.drain(..) {
				if let Teardown::Run(hook) = callback(self.target).map_err(RenderError::Created)? {
					removed.push(hook);
				}
			}
			self.side_tables.removed.insert(self.target, removed);
		}
		Ok(())
	}

	fn remove_child_node(&mut self, child: T::Node) -> Result<(), RenderError> {
		unbind(&mut *self.tree, self.side_tables, child);
		self.tree.remove_child(self.target, child)?;
		self.tree.forget(child);
		Ok(())
	}

	/// Finds the child to reuse for `key`, scanning circularly from `offset`.
	///
	/// Falls back to adopting the first child of the right kind that has no key yet,
	/// which is how foreign (for example server-rendered) markup is absorbed by position.
	fn find_node(&mut self, key: &Key, kind: NodeKind, offset: usize) -> Option<T::Node> {
		let len = self.tree.child_count(self.target);
		let mut fallback = None;
		for i in 0..len {
			let child = match self.tree.child_at(self.target, (offset + i) % len) {
				Some(child) => child,
				None => continue,
			};
			if self.tree.node_kind(child) != kind {
				continue;
			}
			match self.side_tables.keys.get(&child) {
				Some(existing) if existing == key => return Some(child),
				Some(_) => (),
				None => {
					if fallback.is_none() {
						fallback = Some(child);
					}
				}
			}
		}

		if let Some(adopted) = fallback {
			trace!("Adopting unkeyed {:?} as {}", adopted, key);
			self.side_tables.keys.insert(adopted, key.clone());
		}
		fallback
	}

	/// Moves `node` to `order` unless it's already there.
	fn place(&mut self, node: T::Node, order: usize) -> Result<(), RenderError> {
		let current = self.tree.child_at(self.target, order);
		if current != Some(node) {
			trace!("Moving {:?} to {}", node, order);
			self.tree.insert_before(self.target, node, current)?;
		}
		Ok(())
	}

	fn insert_at(&mut self, node: T::Node, order: usize) -> Result<(), RenderError> {
		let reference = self.tree.child_at(self.target, order);
		self.tree.insert_before(self.target, node, reference)?;
		Ok(())
	}

	fn same_element(&self, node: T::Node, tag_name: &str, namespace_uri: Option<&str>, options: &CreationOptions<'_>) -> bool {
		let html = is_html_namespace(namespace_uri);
		let existing_namespace = self.tree.namespace_uri(node);
		if html != is_html_namespace(existing_namespace.as_deref()) || (!html && existing_namespace.as_deref() != namespace_uri) {
			return false;
		}

		let existing_tag = self.tree.tag_name(node);
		let tag_matches = if html { existing_tag.eq_ignore_ascii_case(tag_name) } else { existing_tag == tag_name };
		if !tag_matches {
			if STATIC_MAX_LEVEL >= Level::WARN && existing_tag.eq_ignore_ascii_case(tag_name) {
				warn!("Recreating element due to different tag name casing: {:?} -> {:?}", existing_tag, tag_name);
			}
			return false;
		}

		let existing_is = self.tree.is_value(node);
		if existing_is.as_deref() != options.is.as_deref() {
			return false;
		}

		let lookup = |tag: &str, is: Option<&str>| {
			let name = is.unwrap_or(tag);
			if html {
				self.tree.custom_element(&name.to_ascii_lowercase())
			} else {
				self.tree.custom_element(name)
			}
		};
		lookup(&existing_tag, existing_is.as_deref()) == lookup(tag_name, options.is.as_deref())
	}

	fn create_element(&mut self, tag_name: &str, namespace_uri: Option<&str>, options: &CreationOptions<'_>, content: Option<ElementContent<'_, T::Node>>) -> Result<T::Node, RenderError> {
		let node = self.tree.create_element(tag_name, namespace_uri, options)?;
		trace!("Created {:?}", node);
		self.render_content(node, content)?;
		Ok(node)
	}

	fn render_content(&mut self, node: T::Node, content: Option<ElementContent<'_, T::Node>>) -> Result<(), RenderError> {
		match content {
			None => Ok(()),
			Some(ElementContent::Render(content)) => {
				if self.side_tables.markup.remove(&node).is_some() {
					trace!("Dropping assigned markup");
					self.tree.set_inner_markup(node, "")?;
				}
				RenderContext::new(&mut *self.tree, &mut *self.side_tables, node, self.depth + 1, self.depth_limit)?.render(content)
			}
			Some(ElementContent::Markup(markup)) => {
				if self.side_tables.markup.get(&node).map(String::as_str) == Some(&*markup) {
					trace!("Markup unchanged");
					return Ok(());
				}
				let replaced = children(&*self.tree, node);
				for &child in &replaced {
					unbind(&mut *self.tree, self.side_tables, child);
				}
				self.tree.set_inner_markup(node, &markup)?;
				for child in replaced {
					self.tree.forget(child);
				}
				self.side_tables.markup.insert(node, markup.into_owned());
				Ok(())
			}
		}
	}

	fn push_character_data(&mut self, kind: NodeKind, key: Option<Key>, content: &str) -> Result<Option<T::Node>, RenderError> {
		if content.is_empty() {
			return Ok(None);
		}
		let (key, order) = self.keys.assign(key);
		let span = trace_span!("Diffing character data", ?kind, %key, order, content = ?Redacted(content));
		let _enter = span.enter();

		let node = match self.find_node(&key, kind, order) {
			Some(node) => {
				if self.tree.character_data(node) != content {
					self.tree.set_character_data(node, content)?;
				}
				self.place(node, order)?;
				node
			}
			None => {
				let node = match kind {
					NodeKind::Comment => self.tree.create_comment(content)?,
					_ => self.tree.create_text_node(content)?,
				};
				trace!("Created {:?}", node);
				self.insert_at(node, order)?;
				self.side_tables.keys.insert(node, key);
				node
			}
		};
		Ok(Some(node))
	}
}

impl<'r, T: Tree> Context<T::Node> for RenderContext<'r, T> {
	fn push_element(&mut self, descriptor: ElementDescriptor<'_, T::Node>) -> Result<Option<T::Node>, RenderError> {
		let ElementDescriptor {
			key,
			tag_name,
			namespace_uri,
			options,
			content,
		} = descriptor;
		let namespace_uri = namespace_uri.as_deref();
		let (key, order) = self.keys.assign(key);
		let span = trace_span!("Diffing element", tag = %tag_name, %key, order);
		let _enter = span.enter();

		let node = match self.find_node(&key, NodeKind::Element, order) {
			Some(node) if self.same_element(node, &tag_name, namespace_uri, &options) => {
				self.side_tables.run_cleanup(node);
				self.render_content(node, content)?;
				self.place(node, order)?;
				node
			}
			Some(old) => {
				trace!("Replacing mismatching {:?}", old);
				unbind(&mut *self.tree, self.side_tables, old);
				let new = self.create_element(&tag_name, namespace_uri, &options, content)?;
				if self.tree.child_at(self.target, order) == Some(old) {
					self.tree.replace_child(self.target, new, old)?;
				} else {
					self.tree.remove_child(self.target, old)?;
					self.insert_at(new, order)?;
				}
				self.tree.forget(old);
				self.side_tables.keys.insert(new, key);
				new
			}
			None => {
				let node = self.create_element(&tag_name, namespace_uri, &options, content)?;
				self.insert_at(node, order)?;
				self.side_tables.keys.insert(node, key);
				node
			}
		};
		Ok(Some(node))
	}

	fn push_text(&mut self, TextDescriptor { key, content }: TextDescriptor<'_>) -> Result<Option<T::Node>, RenderError> {
		self.push_character_data(NodeKind::Text, key, &content)
	}

	fn push_comment(&mut self, CommentDescriptor { key, content }: CommentDescriptor<'_>) -> Result<Option<T::Node>, RenderError> {
		self.push_character_data(NodeKind::Comment, key, &content)
	}

	fn push_element_attr(&mut self, AttrDescriptor { name, value, namespace_uri }: AttrDescriptor<'_>) -> Result<(), RenderError> {
		let normalized = match normalize_attribute_name(&name, self.html) {
			Some(normalized) => normalized,
			None => return Ok(()),
		};
		let namespace_uri = namespace_uri.as_deref();
		self.pending_attributes.remove(&*normalized);

		let current = self.tree.get_attribute(self.target, namespace_uri, &normalized);
		match value {
			AttrValue::Remove => {
				if current.is_some() {
					trace!("Removing attribute {:?}", normalized);
					self.tree.remove_attribute(self.target, namespace_uri, &normalized)?;
				}
			}
			AttrValue::Set(value) => {
				if current.as_deref() != Some(&*value) {
					trace!("Setting attribute {:?} = {:?}", normalized, Redacted(&value));
					self.tree.set_attribute(self.target, namespace_uri, &normalized, &value)?;
				}
			}
		}
		Ok(())
	}

	fn push_element_created_callback(&mut self, callback: Created<T::Node>) {
		self.created.push(callback);
	}

	fn push_element_updated_callback(&mut self, callback: Updated<T::Node>) {
		self.updated.push(callback);
	}

	fn push_element_removed_callback(&mut self, callback: Hook<T::Node>) {
		self.created.push(Box::new(move |_| Ok(Teardown::Run(callback))));
	}

	fn push_element_cleanup_callback(&mut self, callback: Hook<T::Node>) {
		self.side_tables.add_cleanup(self.target, callback);
	}

	fn push_element_linking_callback(&mut self, callback: &Linking<T::Node>) -> Result<(), RenderError> {
		if self.linked.iter().any(|linked| linked.ptr_eq(callback)) {
			trace!("Linking callback already registered this pass");
			return Ok(());
		}
		self.linked.push(callback.clone());
		if let Teardown::Run(cleanup) = callback.call(self.target).map_err(RenderError::Linking)? {
			self.side_tables.add_cleanup(self.target, cleanup);
		}
		Ok(())
	}
}
