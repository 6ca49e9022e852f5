//! Plain data describing what to render.

use crate::{context::Context, error::RenderError, keys::Key};
use std::{borrow::Cow, fmt};

pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Whether names in `namespace_uri` are ASCII case-insensitive (no namespace or XHTML).
#[must_use]
pub fn is_html_namespace(namespace_uri: Option<&str>) -> bool {
	matches!(namespace_uri, None | Some(XHTML_NAMESPACE))
}

/// Renders an element's children into the context it's handed.
///
/// The second parameter is the element being rendered, or [`None`] for the string backend.
pub type Content<'a, N> = Box<dyn 'a + FnOnce(&mut dyn Context<N>, Option<N>) -> Result<(), RenderError>>;

pub enum ElementContent<'a, N> {
	Render(Content<'a, N>),
	/// Raw markup, assigned wholesale. Bypasses child reconciliation.
	Markup(Cow<'a, str>),
}

impl<'a, N> fmt::Debug for ElementContent<'a, N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ElementContent::Render(_) => f.write_str("Render(..)"),
			ElementContent::Markup(markup) => f.debug_tuple("Markup").field(markup).finish(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationOptions<'a> {
	/// Customized built-in element designator.
	pub is: Option<Cow<'a, str>>,
}

impl<'a> CreationOptions<'a> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_is(is: impl Into<Cow<'a, str>>) -> Self {
		Self { is: Some(is.into()) }
	}
}

#[derive(Debug)]
pub struct ElementDescriptor<'a, N> {
	pub key: Option<Key>,
	pub tag_name: Cow<'a, str>,
	pub namespace_uri: Option<Cow<'a, str>>,
	pub options: CreationOptions<'a>,
	pub content: Option<ElementContent<'a, N>>,
}

impl<'a, N> ElementDescriptor<'a, N> {
	pub fn new(tag_name: impl Into<Cow<'a, str>>) -> Self {
		Self {
			key: None,
			tag_name: tag_name.into(),
			namespace_uri: None,
			options: CreationOptions::new(),
			content: None,
		}
	}

	#[must_use]
	pub fn with_key(mut self, key: Option<Key>) -> Self {
		self.key = key;
		self
	}

	#[must_use]
	pub fn with_namespace(mut self, namespace_uri: impl Into<Cow<'a, str>>) -> Self {
		self.namespace_uri = Some(namespace_uri.into());
		self
	}

	#[must_use]
	pub fn with_is(mut self, is: impl Into<Cow<'a, str>>) -> Self {
		self.options.is = Some(is.into());
		self
	}

	#[must_use]
	pub fn with_content(mut self, content: impl 'a + FnOnce(&mut dyn Context<N>, Option<N>) -> Result<(), RenderError>) -> Self {
		self.content = Some(ElementContent::Render(Box::new(content)));
		self
	}

	#[must_use]
	pub fn with_markup(mut self, markup: impl Into<Cow<'a, str>>) -> Self {
		self.content = Some(ElementContent::Markup(markup.into()));
		self
	}

	/// Whether this element's names are compared ASCII case-insensitively.
	#[must_use]
	pub fn is_html(&self) -> bool {
		is_html_namespace(self.namespace_uri.as_deref())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDescriptor<'a> {
	pub key: Option<Key>,
	pub content: Cow<'a, str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDescriptor<'a> {
	pub key: Option<Key>,
	pub content: Cow<'a, str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue<'a> {
	/// An empty value is serialized as a bare attribute name.
	Set(Cow<'a, str>),
	Remove,
}

impl<'a> From<&'a str> for AttrValue<'a> {
	fn from(value: &'a str) -> Self {
		Self::Set(value.into())
	}
}

impl From<String> for AttrValue<'_> {
	fn from(value: String) -> Self {
		Self::Set(value.into())
	}
}

impl<'a> From<Cow<'a, str>> for AttrValue<'a> {
	fn from(value: Cow<'a, str>) -> Self {
		Self::Set(value)
	}
}

/// `false` removes the attribute, `true` sets it as a bare name.
impl From<bool> for AttrValue<'_> {
	fn from(value: bool) -> Self {
		if value {
			Self::Set(Cow::Borrowed(""))
		} else {
			Self::Remove
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrDescriptor<'a> {
	pub name: Cow<'a, str>,
	pub value: AttrValue<'a>,
	pub namespace_uri: Option<Cow<'a, str>>,
}

/// Serialization-relevant name normalization shared by both backends.
///
/// Returns [`None`] for names that are never written as plain attributes (blank or `is`).
pub(crate) fn normalize_attribute_name(name: &str, html: bool) -> Option<Cow<'_, str>> {
	let trimmed = name.trim();
	if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("is") {
		return None;
	}
	Some(if html && trimmed.bytes().any(|b| b.is_ascii_uppercase()) {
		Cow::Owned(trimmed.to_ascii_lowercase())
	} else {
		Cow::Borrowed(trimmed)
	})
}
