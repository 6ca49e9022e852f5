//! A [`Tree`] over the browser DOM.
//!
//! DOM nodes aren't hashable from Rust, so each node the reconciler sees is assigned a [`WebNode`] index,
//! which is also recorded on the JavaScript object so that it's found again when enumerating children.
//! Indices are released through [`Tree::forget`] and reused afterwards, so the table only holds nodes the reconciler still knows.

use crate::{
	descriptor::CreationOptions,
	tree::{local_name, NodeKind, Tree, TreeError},
};
use core::cell::RefCell;
use hashbrown::HashMap;
use js_sys::Reflect;
use tracing::{instrument, trace};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Node};

const HANDLE_PROPERTY: &str = "__keyedDomHandle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WebNode(u32);

#[derive(Debug, Default)]
struct Handles {
	slots: Vec<Option<Node>>,
	free: Vec<u32>,
}

#[derive(Debug)]
pub struct WebTree {
	document: Document,
	handles: RefCell<Handles>,
	is_values: HashMap<WebNode, String>,
	property: JsValue,
}

fn host(error: &JsValue) -> TreeError {
	TreeError::Host(format!("{:?}", error))
}

fn stale(handle: WebNode) -> TreeError {
	TreeError::Host(format!("{:?} was released", handle))
}

impl WebTree {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			handles: RefCell::default(),
			is_values: HashMap::new(),
			property: JsValue::from_str(HANDLE_PROPERTY),
		}
	}

	/// Uses the current window's document.
	///
	/// # Errors
	///
	/// Iff there's no window or it has no document.
	pub fn from_window() -> Result<Self, TreeError> {
		web_sys::window()
			.and_then(|window| window.document())
			.map(Self::new)
			.ok_or_else(|| TreeError::Host("no document".to_owned()))
	}

	/// Returns the handle for an existing DOM node (for example a render target), assigning one if needed.
	pub fn attach(&self, node: &Node) -> WebNode {
		if let Some(index) = Reflect::get(node, &self.property).ok().and_then(|value| value.as_f64()) {
			#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
			let handle = WebNode(index as u32);
			if self.node(handle).map_or(false, |known| &known == node) {
				return handle;
			}
		}

		let mut handles = self.handles.borrow_mut();
		let handle = match handles.free.pop() {
			Some(index) => {
				handles.slots[index as usize] = Some(node.clone());
				WebNode(index)
			}
			None => {
				#[allow(clippy::cast_possible_truncation)]
				let handle = WebNode(handles.slots.len() as u32);
				handles.slots.push(Some(node.clone()));
				handle
			}
		};
		if Reflect::set(node, &self.property, &JsValue::from_f64(f64::from(handle.0))).is_err() {
			trace!("Couldn't record handle on {:?}", node);
		}
		handle
	}

	/// The DOM node behind `handle`, unless it was released.
	#[must_use]
	pub fn node(&self, handle: WebNode) -> Option<Node> {
		self.handles.borrow().slots.get(handle.0 as usize).cloned().flatten()
	}

	/// How many DOM nodes are currently held.
	#[must_use]
	pub fn live_handles(&self) -> usize {
		let handles = self.handles.borrow();
		handles.slots.len() - handles.free.len()
	}

	fn live(&self, handle: WebNode) -> Result<Node, TreeError> {
		self.node(handle).ok_or_else(|| stale(handle))
	}

	fn element(&self, handle: WebNode) -> Result<Element, TreeError> {
		self.live(handle)?.dyn_into::<Element>().map_err(|_| TreeError::NotAnElement(format!("{:?}", handle)))
	}
}

impl Tree for WebTree {
	type Node = WebNode;
	type CustomElement = JsValue;

	#[instrument(skip(self))]
	fn create_element(&mut self, tag_name: &str, namespace_uri: Option<&str>, options: &CreationOptions<'_>) -> Result<WebNode, TreeError> {
		let element = match (namespace_uri, options.is.as_deref()) {
			(None, None) => self.document.create_element(tag_name),
			(None, Some(is)) => self.document.create_element_with_str(tag_name, is),
			(Some(namespace_uri), None) => self.document.create_element_ns(Some(namespace_uri), tag_name),
			(Some(namespace_uri), Some(is)) => self.document.create_element_ns_with_str(Some(namespace_uri), tag_name, is),
		}
		.map_err(|_| TreeError::InvalidName(tag_name.to_owned()))?;
		let handle = self.attach(&element);
		if let Some(is) = &options.is {
			self.is_values.insert(handle, is.clone().into_owned());
		}
		Ok(handle)
	}

	fn create_text_node(&mut self, data: &str) -> Result<WebNode, TreeError> {
		let text = self.document.create_text_node(data);
		Ok(self.attach(&text))
	}

	fn create_comment(&mut self, data: &str) -> Result<WebNode, TreeError> {
		let comment = self.document.create_comment(data);
		Ok(self.attach(&comment))
	}

	fn insert_before(&mut self, parent: WebNode, node: WebNode, reference: Option<WebNode>) -> Result<(), TreeError> {
		let reference = reference.map(|reference| self.live(reference)).transpose()?;
		self.live(parent)?
			.insert_before(&self.live(node)?, reference.as_ref())
			.map_err(|error| host(&error))?;
		Ok(())
	}

	fn replace_child(&mut self, parent: WebNode, new_child: WebNode, old_child: WebNode) -> Result<(), TreeError> {
		self.live(parent)?
			.replace_child(&self.live(new_child)?, &self.live(old_child)?)
			.map_err(|error| host(&error))?;
		Ok(())
	}

	fn remove_child(&mut self, parent: WebNode, child: WebNode) -> Result<(), TreeError> {
		self.live(parent)?.remove_child(&self.live(child)?).map_err(|_| TreeError::NotFound {
			parent: format!("{:?}", parent),
			node: format!("{:?}", child),
		})?;
		Ok(())
	}

	fn child_count(&self, parent: WebNode) -> usize {
		self.node(parent).map_or(0, |parent| parent.child_nodes().length() as usize)
	}

	fn child_at(&self, parent: WebNode, index: usize) -> Option<WebNode> {
		let index = u32::try_from(index).ok()?;
		self.node(parent)?.child_nodes().item(index).map(|child| self.attach(&child))
	}

	fn node_kind(&self, node: WebNode) -> NodeKind {
		match self.node(node).map(|node| node.node_type()) {
			Some(Node::ELEMENT_NODE) => NodeKind::Element,
			Some(Node::TEXT_NODE) => NodeKind::Text,
			Some(Node::COMMENT_NODE) => NodeKind::Comment,
			_ => NodeKind::Other,
		}
	}

	fn tag_name(&self, element: WebNode) -> String {
		self.element(element).map(|element| element.tag_name()).unwrap_or_default()
	}

	fn namespace_uri(&self, element: WebNode) -> Option<String> {
		self.element(element).ok().and_then(|element| element.namespace_uri())
	}

	fn is_value(&self, element: WebNode) -> Option<String> {
		self.is_values
			.get(&element)
			.cloned()
			.or_else(|| self.element(element).ok().and_then(|element| element.get_attribute("is")))
	}

	fn character_data(&self, node: WebNode) -> String {
		self.node(node).and_then(|node| node.node_value()).unwrap_or_default()
	}

	fn set_character_data(&mut self, node: WebNode, data: &str) -> Result<(), TreeError> {
		self.live(node)?.set_node_value(Some(data));
		Ok(())
	}

	fn attribute_names(&self, element: WebNode) -> Vec<String> {
		self.element(element)
			.map(|element| element.get_attribute_names().iter().filter_map(|name| name.as_string()).collect())
			.unwrap_or_default()
	}

	fn get_attribute(&self, element: WebNode, namespace_uri: Option<&str>, name: &str) -> Option<String> {
		let element = self.element(element).ok()?;
		match namespace_uri {
			None => element.get_attribute(name),
			Some(namespace_uri) => element.get_attribute_ns(Some(namespace_uri), local_name(name)),
		}
	}

	fn set_attribute(&mut self, element: WebNode, namespace_uri: Option<&str>, name: &str, value: &str) -> Result<(), TreeError> {
		let element = self.element(element)?;
		match namespace_uri {
			None => element.set_attribute(name, value),
			Some(namespace_uri) => element.set_attribute_ns(Some(namespace_uri), name, value),
		}
		.map_err(|_| TreeError::InvalidName(name.to_owned()))
	}

	fn remove_attribute(&mut self, element: WebNode, namespace_uri: Option<&str>, name: &str) -> Result<(), TreeError> {
		let element = self.element(element)?;
		match namespace_uri {
			None => element.remove_attribute(name),
			Some(namespace_uri) => element.remove_attribute_ns(Some(namespace_uri), local_name(name)),
		}
		.map_err(|error| host(&error))
	}

	fn set_inner_markup(&mut self, element: WebNode, markup: &str) -> Result<(), TreeError> {
		self.element(element)?.set_inner_html(markup);
		Ok(())
	}

	fn custom_element(&self, name: &str) -> Option<JsValue> {
		let definition = web_sys::window()?.custom_elements().get(name);
		if definition.is_undefined() {
			None
		} else {
			Some(definition)
		}
	}

	fn forget(&mut self, node: WebNode) {
		self.is_values.remove(&node);
		let mut handles = self.handles.borrow_mut();
		if let Some(released) = handles.slots.get_mut(node.0 as usize).and_then(Option::take) {
			if Reflect::delete_property(released.unchecked_ref(), &self.property).is_err() {
				trace!("Couldn't clear handle on {:?}", released);
			}
			handles.free.push(node.0);
		}
	}
}
