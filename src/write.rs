//! The string backend: runs the same render functions without a live tree and concatenates HTML.

use crate::{
	context::Context,
	descriptor::{normalize_attribute_name, AttrDescriptor, AttrValue, CommentDescriptor, ElementContent, ElementDescriptor, TextDescriptor},
	error::RenderError,
	keys::KeyOrder,
	lifecycle::{Created, Hook, Linking, Updated},
	redact::Redacted,
};
use hashbrown::HashMap;
use indexmap::IndexMap;
use tracing::{instrument, trace_span};

/// Elements that are self-closed when they have no content.
pub const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link", "menuitem", "meta", "param", "source", "track", "wbr",
];

#[must_use]
pub fn is_void_element(tag_name: &str, html: bool) -> bool {
	if html {
		VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag_name))
	} else {
		VOID_ELEMENTS.contains(&tag_name)
	}
}

/// Escapes `&`, `<`, `>` and `"`. Applied exactly once; there's no unescaping anywhere.
#[must_use]
pub fn escape_html(input: &str) -> String {
	let mut escaped = String::with_capacity(input.len());
	push_escaped(&mut escaped, input);
	escaped
}

pub(crate) fn push_escaped(output: &mut String, input: &str) {
	for c in input.chars() {
		match c {
			'&' => output.push_str("&amp;"),
			'<' => output.push_str("&lt;"),
			'>' => output.push_str("&gt;"),
			'"' => output.push_str("&quot;"),
			c => output.push(c),
		}
	}
}

pub(crate) fn push_comment(output: &mut String, content: &str) {
	output.push_str("<!-- ");
	push_escaped(output, content);
	output.push_str(" -->");
}

/// Writes one element. `attributes` must already be normalized.
pub(crate) fn push_element<'a>(output: &mut String, tag_name: &str, html: bool, is: Option<&str>, attributes: impl IntoIterator<Item = (&'a str, &'a str)>, inner: &str) {
	output.push('<');
	output.push_str(tag_name);
	if let Some(is) = is {
		output.push_str(" is=\"");
		push_escaped(output, is);
		output.push('"');
	}
	for (name, value) in attributes {
		output.push(' ');
		output.push_str(name);
		if !value.is_empty() {
			output.push_str("=\"");
			push_escaped(output, value);
			output.push('"');
		}
	}
	if inner.is_empty() && is_void_element(tag_name, html) {
		output.push_str(" />");
	} else {
		output.push('>');
		output.push_str(inner);
		output.push_str("</");
		output.push_str(tag_name);
		output.push('>');
	}
}

/// Renders `content` to an HTML string.
///
/// `N` is the node handle type the render code is written against; it's never instantiated here,
/// so the same render functions can drive a [`Reconciler`](`crate::Reconciler`) and this.
///
/// # Errors
///
/// Errors raised by the render code are returned unchanged.
#[instrument(skip(content))]
pub fn write<N>(content: impl FnOnce(&mut dyn Context<N>) -> Result<(), RenderError>) -> Result<String, RenderError> {
	let mut context = WriteContext::new();
	content(&mut context as &mut dyn Context<N>)?;
	Ok(context.into_string())
}

struct ElementFrame {
	html: bool,
	attributes: IndexMap<String, String>,
}

/// A string backend context.
///
/// At the root (see [`write`]) there's no element, so attributes pushed there are ignored.
pub struct WriteContext {
	keys: KeyOrder,
	children: HashMap<usize, String>,
	element: Option<ElementFrame>,
}

impl Default for WriteContext {
	fn default() -> Self {
		Self::new()
	}
}

impl WriteContext {
	#[must_use]
	pub fn new() -> Self {
		Self {
			keys: KeyOrder::new(),
			children: HashMap::new(),
			element: None,
		}
	}

	fn for_element(html: bool) -> Self {
		Self {
			element: Some(ElementFrame { html, attributes: IndexMap::new() }),
			..Self::new()
		}
	}

	/// Concatenates the children pushed so far, sorted by assigned position.
	#[must_use]
	pub fn into_string(mut self) -> String {
		self.take_children()
	}

	fn take_children(&mut self) -> String {
		let mut children: Vec<_> = self.children.drain().collect();
		children.sort_unstable_by_key(|&(order, _)| order);
		children.into_iter().map(|(_, child)| child).collect()
	}

	fn write_element<N>(descriptor: ElementDescriptor<'_, N>) -> Result<String, RenderError> {
		let html = descriptor.is_html();
		let ElementDescriptor { tag_name, options, content, .. } = descriptor;

		let mut context = Self::for_element(html);
		let inner = match content {
			None => String::new(),
			Some(ElementContent::Markup(markup)) => markup.into_owned(),
			Some(ElementContent::Render(content)) => {
				content(&mut context as &mut dyn Context<N>, None)?;
				context.take_children()
			}
		};
		let attributes = context.element.map(|frame| frame.attributes).unwrap_or_default();

		let mut output = String::new();
		push_element(
			&mut output,
			&tag_name,
			html,
			options.is.as_deref(),
			attributes.iter().map(|(name, value)| (name.as_str(), value.as_str())),
			&inner,
		);
		Ok(output)
	}
}

impl<N> Context<N> for WriteContext {
	fn push_element(&mut self, descriptor: ElementDescriptor<'_, N>) -> Result<Option<N>, RenderError> {
		let (key, order) = self.keys.assign(descriptor.key.clone());
		let span = trace_span!("Writing element", tag = %descriptor.tag_name, %key, order);
		let _enter = span.enter();
		let element = Self::write_element(descriptor)?;
		self.children.insert(order, element);
		Ok(None)
	}

	fn push_text(&mut self, TextDescriptor { key, content }: TextDescriptor<'_>) -> Result<Option<N>, RenderError> {
		if content.is_empty() {
			return Ok(None);
		}
		let (key, order) = self.keys.assign(key);
		let span = trace_span!("Writing text", %key, order, content = ?Redacted(&content));
		let _enter = span.enter();
		self.children.insert(order, escape_html(&content));
		Ok(None)
	}

	fn push_comment(&mut self, CommentDescriptor { key, content }: CommentDescriptor<'_>) -> Result<Option<N>, RenderError> {
		if content.is_empty() {
			return Ok(None);
		}
		let (key, order) = self.keys.assign(key);
		let span = trace_span!("Writing comment", %key, order, content = ?Redacted(&content));
		let _enter = span.enter();
		let mut comment = String::new();
		push_comment(&mut comment, &content);
		self.children.insert(order, comment);
		Ok(None)
	}

	fn push_element_attr(&mut self, AttrDescriptor { name, value, .. }: AttrDescriptor<'_>) -> Result<(), RenderError> {
		let frame = match &mut self.element {
			Some(frame) => frame,
			None => return Ok(()),
		};
		let name = match normalize_attribute_name(&name, frame.html) {
			Some(name) => name,
			None => return Ok(()),
		};
		match value {
			AttrValue::Remove => {
				frame.attributes.shift_remove(&*name);
			}
			AttrValue::Set(value) => {
				// Overwriting keeps the first-set position.
				frame.attributes.insert(name.into_owned(), value.into_owned());
			}
		}
		Ok(())
	}

	fn push_element_created_callback(&mut self, _: Created<N>) {}
	fn push_element_updated_callback(&mut self, _: Updated<N>) {}
	fn push_element_removed_callback(&mut self, _: Hook<N>) {}
	fn push_element_cleanup_callback(&mut self, _: Hook<N>) {}

	fn push_element_linking_callback(&mut self, _: &Linking<N>) -> Result<(), RenderError> {
		Ok(())
	}
}
