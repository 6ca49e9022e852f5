//! Lifecycle callback types.
//!
//! Callbacks that may schedule a follow-up return a [`Teardown`] instead of another closure,
//! so every deferred hook is an owned [`FnOnce`] and can only ever fire once.

use crate::error::BoxError;
use core::fmt::{self, Debug};
use std::rc::Rc;
use tracing::error;

/// A deferred hook: removed or cleanup callback.
pub type Hook<N> = Box<dyn FnOnce(N) -> Result<(), BoxError>>;

/// Runs once after an element's first render pass. A [`Teardown::Run`] result becomes a removed hook.
pub type Created<N> = Box<dyn FnOnce(N) -> Result<Teardown<N>, BoxError>>;

/// Runs after each subsequent render pass. A [`Teardown::Run`] result becomes a cleanup hook.
pub type Updated<N> = Box<dyn FnOnce(N) -> Result<Teardown<N>, BoxError>>;

/// What a created, updated or linking callback leaves behind.
pub enum Teardown<N> {
	Nothing,
	Run(Hook<N>),
}

impl<N> Teardown<N> {
	pub fn run(hook: impl 'static + FnOnce(N) -> Result<(), BoxError>) -> Self {
		Self::Run(Box::new(hook))
	}
}

impl<N> Debug for Teardown<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Teardown::Nothing => f.write_str("Nothing"),
			Teardown::Run(_) => f.write_str("Run(..)"),
		}
	}
}

/// A linking callback, invoked immediately when registered.
///
/// Identity is that of the shared closure: pushing clones of the same [`Linking`]
/// against one element within one pass invokes it only once.
/// Separately constructed callbacks are always distinct, even if one was dropped before the other was created.
pub struct Linking<N>(Rc<dyn Fn(N) -> Result<Teardown<N>, BoxError>>);

impl<N> Linking<N> {
	pub fn new(callback: impl 'static + Fn(N) -> Result<Teardown<N>, BoxError>) -> Self {
		Self(Rc::new(callback))
	}

	pub(crate) fn id(&self) -> *const () {
		Rc::as_ptr(&self.0).cast::<()>()
	}

	/// Whether both are clones of the same callback.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	pub(crate) fn call(&self, node: N) -> Result<Teardown<N>, BoxError> {
		(self.0)(node)
	}
}

impl<N> Clone for Linking<N> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<N> Debug for Linking<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Linking").field(&self.id()).finish()
	}
}

/// Runs each hook once, logging (not propagating) failures.
pub(crate) fn run_hooks<N: Copy + Debug>(kind: &str, node: N, hooks: Vec<Hook<N>>) {
	for hook in hooks {
		if let Err(error) = hook(node) {
			error!("{} callback failed for {:?}: {}", kind, node, error);
		}
	}
}
