//! An in-memory [`Tree`], addressed by [`NodeId`].
//!
//! Behaves like a browser document where it matters to the reconciler:
//! HTML tag names read back upper-cased, non-namespaced attribute names on HTML elements are lower-cased,
//! and inserting an attached node moves it.
//!
//! Every mutation is recorded (see [`Document::take_mutations`]), so a pass that should be a no-op can be checked for it.
//! Detached nodes stay allocated for inspection until the [`Document`] is dropped, even once [released](`Document::is_released`).

use crate::{
	descriptor::{is_html_namespace, CreationOptions},
	tree::{local_name, NodeKind, Tree, TreeError},
	write::{push_comment, push_element, push_escaped},
};
use core::fmt;
use hashbrown::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomElementId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	Create(NodeId),
	Insert { parent: NodeId, node: NodeId },
	Replace { parent: NodeId, new_child: NodeId, old_child: NodeId },
	Remove { parent: NodeId, node: NodeId },
	SetAttribute { element: NodeId, name: String },
	RemoveAttribute { element: NodeId, name: String },
	SetData(NodeId),
	SetMarkup(NodeId),
}

#[derive(Debug)]
struct Attribute {
	namespace_uri: Option<String>,
	name: String,
	value: String,
}

#[derive(Debug)]
struct Element {
	tag_name: String,
	namespace_uri: Option<String>,
	is: Option<String>,
	attributes: Vec<Attribute>,
	children: Vec<NodeId>,
	/// Unparsed content assigned via [`Tree::set_inner_markup`]. Cleared by the next insertion.
	markup: Option<String>,
}

impl Element {
	fn html(&self) -> bool {
		is_html_namespace(self.namespace_uri.as_deref())
	}

	fn attribute_position(&self, namespace_uri: Option<&str>, name: &str) -> Option<usize> {
		self.attributes.iter().position(|attribute| match namespace_uri {
			None => attribute.name == name,
			Some(namespace_uri) => attribute.namespace_uri.as_deref() == Some(namespace_uri) && local_name(&attribute.name) == local_name(name),
		})
	}
}

#[derive(Debug)]
enum NodeData {
	Element(Element),
	Text(String),
	Comment(String),
}

#[derive(Debug)]
struct Slot {
	parent: Option<NodeId>,
	/// Set by [`Tree::forget`]. The slot is kept for inspection but never reused.
	released: bool,
	data: NodeData,
}

#[derive(Debug, Default)]
pub struct Document {
	nodes: Vec<Slot>,
	custom_elements: HashMap<String, CustomElementId>,
	mutations: Vec<Mutation>,
}

impl Document {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached element without recording a mutation. Meant for render targets.
	pub fn create_root(&mut self, tag_name: &str) -> NodeId {
		self.allocate(NodeData::Element(Element {
			tag_name: tag_name.to_ascii_uppercase(),
			namespace_uri: None,
			is: None,
			attributes: Vec::new(),
			children: Vec::new(),
			markup: None,
		}))
	}

	/// Registers a custom element name. Returns the existing definition if there is one.
	pub fn define_custom_element(&mut self, name: &str) -> CustomElementId {
		let next = CustomElementId(self.custom_elements.len());
		*self.custom_elements.entry(name.to_owned()).or_insert(next)
	}

	/// Drains the mutation log.
	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		core::mem::take(&mut self.mutations)
	}

	/// Whether the reconciler has let go of `node`.
	#[must_use]
	pub fn is_released(&self, node: NodeId) -> bool {
		self.nodes.get(node.0).map_or(false, |slot| slot.released)
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes.get(node.0).and_then(|slot| slot.parent)
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		self.element(node).map_or(&[][..], |element| element.children.as_slice())
	}

	/// Text of a text or comment node.
	#[must_use]
	pub fn data(&self, node: NodeId) -> Option<&str> {
		match self.nodes.get(node.0).map(|slot| &slot.data) {
			Some(NodeData::Text(data) | NodeData::Comment(data)) => Some(data),
			_ => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
		let element = self.element(element)?;
		let position = element.attribute_position(None, name)?;
		Some(&element.attributes[position].value)
	}

	/// Serializes the children of `node`, in the same format as [`write`](`crate::write::write`).
	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut output = String::new();
		if let Some(element) = self.element(node) {
			match &element.markup {
				Some(markup) => output.push_str(markup),
				None => {
					for &child in &element.children {
						self.push_html(&mut output, child);
					}
				}
			}
		}
		output
	}

	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut output = String::new();
		self.push_html(&mut output, node);
		output
	}

	fn push_html(&self, output: &mut String, node: NodeId) {
		match &self.nodes[node.0].data {
			NodeData::Text(data) => push_escaped(output, data),
			NodeData::Comment(data) => push_comment(output, data),
			NodeData::Element(element) => {
				let html = element.html();
				let tag_name = if html { element.tag_name.to_ascii_lowercase() } else { element.tag_name.clone() };
				let inner = self.inner_html(node);
				push_element(
					output,
					&tag_name,
					html,
					element.is.as_deref(),
					element.attributes.iter().map(|attribute| (attribute.name.as_str(), attribute.value.as_str())),
					&inner,
				);
			}
		}
	}

	fn allocate(&mut self, data: NodeData) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(Slot { parent: None, released: false, data });
		id
	}

	fn element(&self, node: NodeId) -> Option<&Element> {
		match self.nodes.get(node.0).map(|slot| &slot.data) {
			Some(NodeData::Element(element)) => Some(element),
			_ => None,
		}
	}

	fn element_mut(&mut self, node: NodeId) -> Result<&mut Element, TreeError> {
		match self.nodes.get_mut(node.0).map(|slot| &mut slot.data) {
			Some(NodeData::Element(element)) => Ok(element),
			_ => Err(TreeError::NotAnElement(node.to_string())),
		}
	}

	fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
		loop {
			if node == ancestor {
				return true;
			}
			match self.parent(node) {
				Some(parent) => node = parent,
				None => return false,
			}
		}
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.nodes[node.0].parent.take() {
			if let Ok(parent) = self.element_mut(parent) {
				parent.children.retain(|&child| child != node);
			}
		}
	}

	fn check_insertable(&self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
		if node.0 >= self.nodes.len() || self.is_inclusive_ancestor(node, parent) {
			return Err(TreeError::HierarchyRequest {
				parent: parent.to_string(),
				node: node.to_string(),
			});
		}
		Ok(())
	}

	fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
		self.children(parent).iter().position(|&c| c == child).ok_or_else(|| TreeError::NotFound {
			parent: parent.to_string(),
			node: child.to_string(),
		})
	}
}

impl Tree for Document {
	type Node = NodeId;
	type CustomElement = CustomElementId;

	fn create_element(&mut self, tag_name: &str, namespace_uri: Option<&str>, options: &CreationOptions<'_>) -> Result<NodeId, TreeError> {
		if tag_name.is_empty() || tag_name.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '/' | '"' | '\'' | '=')) {
			return Err(TreeError::InvalidName(tag_name.to_owned()));
		}
		let html = is_html_namespace(namespace_uri);
		let node = self.allocate(NodeData::Element(Element {
			tag_name: if html { tag_name.to_ascii_uppercase() } else { tag_name.to_owned() },
			namespace_uri: namespace_uri.map(ToOwned::to_owned),
			is: options.is.as_deref().map(ToOwned::to_owned),
			attributes: Vec::new(),
			children: Vec::new(),
			markup: None,
		}));
		self.mutations.push(Mutation::Create(node));
		Ok(node)
	}

	fn create_text_node(&mut self, data: &str) -> Result<NodeId, TreeError> {
		let node = self.allocate(NodeData::Text(data.to_owned()));
		self.mutations.push(Mutation::Create(node));
		Ok(node)
	}

	fn create_comment(&mut self, data: &str) -> Result<NodeId, TreeError> {
		let node = self.allocate(NodeData::Comment(data.to_owned()));
		self.mutations.push(Mutation::Create(node));
		Ok(node)
	}

	fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) -> Result<(), TreeError> {
		self.check_insertable(parent, node)?;
		self.element_mut(parent)?;
		if reference == Some(node) {
			return Ok(());
		}
		if let Some(reference) = reference {
			self.child_index(parent, reference)?;
		}

		self.detach(node);
		let index = match reference {
			Some(reference) => self.child_index(parent, reference)?,
			None => self.children(parent).len(),
		};
		let element = self.element_mut(parent)?;
		element.markup = None;
		element.children.insert(index, node);
		self.nodes[node.0].parent = Some(parent);
		self.mutations.push(Mutation::Insert { parent, node });
		Ok(())
	}

	fn replace_child(&mut self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> Result<(), TreeError> {
		if new_child == old_child {
			return self.child_index(parent, old_child).map(drop);
		}
		self.check_insertable(parent, new_child)?;
		self.child_index(parent, old_child)?;

		self.detach(new_child);
		let index = self.child_index(parent, old_child)?;
		self.element_mut(parent)?.children[index] = new_child;
		self.nodes[new_child.0].parent = Some(parent);
		self.nodes[old_child.0].parent = None;
		self.mutations.push(Mutation::Replace { parent, new_child, old_child });
		Ok(())
	}

	fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
		let index = self.child_index(parent, child)?;
		self.element_mut(parent)?.children.remove(index);
		self.nodes[child.0].parent = None;
		self.mutations.push(Mutation::Remove { parent, node: child });
		Ok(())
	}

	fn child_count(&self, parent: NodeId) -> usize {
		self.children(parent).len()
	}

	fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
		self.children(parent).get(index).copied()
	}

	fn node_kind(&self, node: NodeId) -> NodeKind {
		match self.nodes.get(node.0).map(|slot| &slot.data) {
			Some(NodeData::Element(_)) => NodeKind::Element,
			Some(NodeData::Text(_)) => NodeKind::Text,
			Some(NodeData::Comment(_)) => NodeKind::Comment,
			None => NodeKind::Other,
		}
	}

	fn tag_name(&self, element: NodeId) -> String {
		self.element(element).map(|element| element.tag_name.clone()).unwrap_or_default()
	}

	fn namespace_uri(&self, element: NodeId) -> Option<String> {
		self.element(element).and_then(|element| element.namespace_uri.clone())
	}

	fn is_value(&self, element: NodeId) -> Option<String> {
		self.element(element).and_then(|element| element.is.clone())
	}

	fn character_data(&self, node: NodeId) -> String {
		self.data(node).map(ToOwned::to_owned).unwrap_or_default()
	}

	fn set_character_data(&mut self, node: NodeId, data: &str) -> Result<(), TreeError> {
		match self.nodes.get_mut(node.0).map(|slot| &mut slot.data) {
			Some(NodeData::Text(existing) | NodeData::Comment(existing)) => {
				*existing = data.to_owned();
				self.mutations.push(Mutation::SetData(node));
				Ok(())
			}
			_ => Err(TreeError::HierarchyRequest {
				parent: node.to_string(),
				node: "character data".to_owned(),
			}),
		}
	}

	fn attribute_names(&self, element: NodeId) -> Vec<String> {
		self.element(element)
			.map(|element| element.attributes.iter().map(|attribute| attribute.name.clone()).collect())
			.unwrap_or_default()
	}

	fn get_attribute(&self, element: NodeId, namespace_uri: Option<&str>, name: &str) -> Option<String> {
		let element = self.element(element)?;
		let name = if namespace_uri.is_none() && element.html() { name.to_ascii_lowercase() } else { name.to_owned() };
		let position = element.attribute_position(namespace_uri, &name)?;
		Some(element.attributes[position].value.clone())
	}

	fn set_attribute(&mut self, element: NodeId, namespace_uri: Option<&str>, name: &str, value: &str) -> Result<(), TreeError> {
		if name.is_empty() || name.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '/' | '"' | '\'' | '=')) {
			return Err(TreeError::InvalidName(name.to_owned()));
		}
		let node = element;
		let element = self.element_mut(node)?;
		let name = if namespace_uri.is_none() && element.html() { name.to_ascii_lowercase() } else { name.to_owned() };
		match element.attribute_position(namespace_uri, &name) {
			Some(position) => element.attributes[position].value = value.to_owned(),
			None => element.attributes.push(Attribute {
				namespace_uri: namespace_uri.map(ToOwned::to_owned),
				name: name.clone(),
				value: value.to_owned(),
			}),
		}
		self.mutations.push(Mutation::SetAttribute { element: node, name });
		Ok(())
	}

	fn remove_attribute(&mut self, element: NodeId, namespace_uri: Option<&str>, name: &str) -> Result<(), TreeError> {
		let node = element;
		let element = self.element_mut(node)?;
		let name = if namespace_uri.is_none() && element.html() { name.to_ascii_lowercase() } else { name.to_owned() };
		if let Some(position) = element.attribute_position(namespace_uri, &name) {
			element.attributes.remove(position);
			self.mutations.push(Mutation::RemoveAttribute { element: node, name });
		}
		Ok(())
	}

	fn set_inner_markup(&mut self, element: NodeId, markup: &str) -> Result<(), TreeError> {
		let children = core::mem::take(&mut self.element_mut(element)?.children);
		for child in children {
			self.nodes[child.0].parent = None;
		}
		self.element_mut(element)?.markup = Some(markup.to_owned());
		self.mutations.push(Mutation::SetMarkup(element));
		Ok(())
	}

	fn custom_element(&self, name: &str) -> Option<CustomElementId> {
		self.custom_elements.get(name).copied()
	}

	fn forget(&mut self, node: NodeId) {
		if let Some(slot) = self.nodes.get_mut(node.0) {
			slot.released = true;
		}
	}
}
