use crate::{
	descriptor::{AttrDescriptor, CommentDescriptor, ElementDescriptor, TextDescriptor},
	error::RenderError,
	lifecycle::{Created, Hook, Linking, Updated},
};

/// The push protocol both backends implement.
///
/// A context is scoped to one target and one render pass. Builder code only ever sees the innermost one:
/// element content callbacks are handed the nested context of their element.
pub trait Context<N> {
	/// Registers the next child element. Returns the (possibly reused) live node, if the backend has any.
	fn push_element(&mut self, descriptor: ElementDescriptor<'_, N>) -> Result<Option<N>, RenderError>;
	/// Registers the next text child. Empty content yields [`None`] and claims no key.
	fn push_text(&mut self, descriptor: TextDescriptor<'_>) -> Result<Option<N>, RenderError>;
	/// Registers the next comment child. Empty content yields [`None`] and claims no key.
	fn push_comment(&mut self, descriptor: CommentDescriptor<'_>) -> Result<Option<N>, RenderError>;

	/// Sets, updates or removes an attribute on the element whose content is currently rendering.
	fn push_element_attr(&mut self, descriptor: AttrDescriptor<'_>) -> Result<(), RenderError>;

	fn push_element_created_callback(&mut self, callback: Created<N>);
	fn push_element_updated_callback(&mut self, callback: Updated<N>);
	fn push_element_removed_callback(&mut self, callback: Hook<N>);
	fn push_element_cleanup_callback(&mut self, callback: Hook<N>);
	fn push_element_linking_callback(&mut self, callback: &Linking<N>) -> Result<(), RenderError>;
}

/// The context used while no render pass is active. Every operation is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl<N> Context<N> for Detached {
	fn push_element(&mut self, _: ElementDescriptor<'_, N>) -> Result<Option<N>, RenderError> {
		Ok(None)
	}

	fn push_text(&mut self, _: TextDescriptor<'_>) -> Result<Option<N>, RenderError> {
		Ok(None)
	}

	fn push_comment(&mut self, _: CommentDescriptor<'_>) -> Result<Option<N>, RenderError> {
		Ok(None)
	}

	fn push_element_attr(&mut self, _: AttrDescriptor<'_>) -> Result<(), RenderError> {
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
