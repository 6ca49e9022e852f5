//! Builder functions. Each pushes one descriptor or registration into the context it's handed.
//!
//! ```
//! use keyed_dom::{build, write, RenderError};
//!
//! let html = write::<()>(|context| {
//! 	build::element(context, (), "ul", |context, _| {
//! 		build::attr(context, "class", "items")?;
//! 		for (id, label) in [(7, "seven"), (3, "three")] {
//! 			build::element(context, id, "li", |context, _| build::text(context, (), label).map(drop))?;
//! 		}
//! 		Ok(())
//! 	})?;
//! 	Ok::<_, RenderError>(())
//! })?;
//! assert_eq!(html, r#"<ul class="items"><li>seven</li><li>three</li></ul>"#);
//! # Ok::<_, RenderError>(())
//! ```

use crate::{
	context::Context,
	descriptor::{AttrDescriptor, AttrValue, CommentDescriptor, ElementDescriptor, TextDescriptor},
	error::{BoxError, RenderError},
	keys::IntoKey,
	lifecycle::{Linking, Teardown},
};
use core::fmt::Display;
use num_traits::Float;
use std::borrow::Cow;
use tracing::warn;

/// Pushes an element whose children and attributes are rendered by `content`.
///
/// # Errors
///
/// Whatever the backend or `content` returns.
pub fn element<'a, N>(
	context: &mut dyn Context<N>,
	key: impl IntoKey,
	tag_name: impl Into<Cow<'a, str>>,
	content: impl 'a + FnOnce(&mut dyn Context<N>, Option<N>) -> Result<(), RenderError>,
) -> Result<Option<N>, RenderError> {
	context.push_element(ElementDescriptor::new(tag_name).with_key(key.into_key()).with_content(content))
}

/// Like [`element`], in the given namespace.
///
/// # Errors
///
/// Whatever the backend or `content` returns.
pub fn element_ns<'a, N>(
	context: &mut dyn Context<N>,
	key: impl IntoKey,
	namespace_uri: impl Into<Cow<'a, str>>,
	tag_name: impl Into<Cow<'a, str>>,
	content: impl 'a + FnOnce(&mut dyn Context<N>, Option<N>) -> Result<(), RenderError>,
) -> Result<Option<N>, RenderError> {
	context.push_element(
		ElementDescriptor::new(tag_name)
			.with_key(key.into_key())
			.with_namespace(namespace_uri)
			.with_content(content),
	)
}

/// Pushes an element whose content is raw, unescaped `markup`.
///
/// # Errors
///
/// Tree errors.
pub fn markup_element<'a, N>(context: &mut dyn Context<N>, key: impl IntoKey, tag_name: impl Into<Cow<'a, str>>, markup: impl Into<Cow<'a, str>>) -> Result<Option<N>, RenderError> {
	context.push_element(ElementDescriptor::new(tag_name).with_key(key.into_key()).with_markup(markup))
}

/// Pushes a text node. Empty `content` is skipped.
///
/// # Errors
///
/// Tree errors.
pub fn text<'a, N>(context: &mut dyn Context<N>, key: impl IntoKey, content: impl Into<Cow<'a, str>>) -> Result<Option<N>, RenderError> {
	context.push_text(TextDescriptor {
		key: key.into_key(),
		content: content.into(),
	})
}

/// Pushes a comment node. Empty `content` is skipped.
///
/// # Errors
///
/// Tree errors.
pub fn comment<'a, N>(context: &mut dyn Context<N>, key: impl IntoKey, content: impl Into<Cow<'a, str>>) -> Result<Option<N>, RenderError> {
	context.push_comment(CommentDescriptor {
		key: key.into_key(),
		content: content.into(),
	})
}

/// Pushes `value` as text. NaN is rendered as-is, but logged.
///
/// # Errors
///
/// Tree errors.
pub fn number<N, F: Float + Display>(context: &mut dyn Context<N>, key: impl IntoKey, value: F) -> Result<Option<N>, RenderError> {
	if value.is_nan() {
		warn!("Rendering NaN as text");
	}
	text(context, key, value.to_string())
}

/// Sets (or with `false`/[`AttrValue::Remove`], removes) an attribute on the current element.
///
/// # Errors
///
/// Tree errors.
pub fn attr<'a, N>(context: &mut dyn Context<N>, name: impl Into<Cow<'a, str>>, value: impl Into<AttrValue<'a>>) -> Result<(), RenderError> {
	context.push_element_attr(AttrDescriptor {
		name: name.into(),
		value: value.into(),
		namespace_uri: None,
	})
}

/// # Errors
///
/// Tree errors.
pub fn attr_ns<'a, N>(
	context: &mut dyn Context<N>,
	namespace_uri: impl Into<Cow<'a, str>>,
	name: impl Into<Cow<'a, str>>,
	value: impl Into<AttrValue<'a>>,
) -> Result<(), RenderError> {
	context.push_element_attr(AttrDescriptor {
		name: name.into(),
		value: value.into(),
		namespace_uri: Some(namespace_uri.into()),
	})
}

/// # Errors
///
/// Tree errors.
pub fn remove_attr<'a, N>(context: &mut dyn Context<N>, name: impl Into<Cow<'a, str>>) -> Result<(), RenderError> {
	attr(context, name, AttrValue::Remove)
}

/// Pushes each `(name, value)` pair in order, as [`attr`].
///
/// # Errors
///
/// The first tree error.
pub fn attrs<'a, N, K, V>(context: &mut dyn Context<N>, attributes: impl IntoIterator<Item = (K, V)>) -> Result<(), RenderError>
where
	K: Into<Cow<'a, str>>,
	V: Into<AttrValue<'a>>,
{
	for (name, value) in attributes {
		attr(context, name, value)?;
	}
	Ok(())
}

/// Runs `callback` once after the current element's first render.
/// Returning [`Teardown::Run`] schedules a hook for when the element is removed.
pub fn created<N>(context: &mut dyn Context<N>, callback: impl 'static + FnOnce(N) -> Result<Teardown<N>, BoxError>) {
	context.push_element_created_callback(Box::new(callback));
}

/// Runs `callback` after each later render of the current element.
/// Returning [`Teardown::Run`] schedules a hook for the start of the next pass.
pub fn updated<N>(context: &mut dyn Context<N>, callback: impl 'static + FnOnce(N) -> Result<Teardown<N>, BoxError>) {
	context.push_element_updated_callback(Box::new(callback));
}

/// Runs `callback` when the current element is removed.
/// Only takes effect on the element's first render.
pub fn removed<N>(context: &mut dyn Context<N>, callback: impl 'static + FnOnce(N) -> Result<(), BoxError>) {
	context.push_element_removed_callback(Box::new(callback));
}

/// Runs `callback` at the start of the current element's next pass, or when it's removed.
pub fn cleanup<N>(context: &mut dyn Context<N>, callback: impl 'static + FnOnce(N) -> Result<(), BoxError>) {
	context.push_element_cleanup_callback(Box::new(callback));
}

/// Invokes `callback` right away (once per element and pass).
///
/// # Errors
///
/// [`RenderError::Linking`] if `callback` fails.
pub fn linking<N>(context: &mut dyn Context<N>, callback: &Linking<N>) -> Result<(), RenderError> {
	context.push_element_linking_callback(callback)
}
