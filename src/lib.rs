#![doc(html_root_url = "https://docs.rs/keyed-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Keyed reconciliation of render functions against a live node tree, plus a string backend for the same render functions.
//!
//! Render code is written against [`Context`] (usually through the [`build`] functions) and doesn't know which backend runs it:
//!
//! - [`Reconciler`] diffs it against a [`Tree`], reusing nodes by [`Key`] and firing lifecycle callbacks.
//! - [`write()`] concatenates it into HTML.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod arena;
pub mod build;
mod context;
mod descriptor;
mod error;
mod keys;
mod lifecycle;
mod reconcile;
mod redact;
mod tree;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;
pub mod write;

pub use context::{Context, Detached};
pub use descriptor::{
	is_html_namespace, AttrDescriptor, AttrValue, CommentDescriptor, Content, CreationOptions, ElementContent, ElementDescriptor, TextDescriptor, MATHML_NAMESPACE,
	SVG_NAMESPACE, XHTML_NAMESPACE,
};
pub use error::{BoxError, RenderError};
pub use keys::{IntoKey, Key};
pub use lifecycle::{Created, Hook, Linking, Teardown, Updated};
pub use reconcile::{Reconciler, RenderFn, DEFAULT_DEPTH_LIMIT};
pub use tree::{local_name, NodeKind, Tree, TreeError};
pub use write::{write, WriteContext};
