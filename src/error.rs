use crate::tree::TreeError;
use thiserror::Error;

/// Error type returned by lifecycle callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a render pass.
///
/// The target tree is left in whatever state the pass had reached. There is no rollback.
#[derive(Debug, Error)]
pub enum RenderError {
	#[error("tree operation failed")]
	Tree(#[from] TreeError),
	/// Raised by user render logic via [`RenderError::content`].
	#[error("content callback failed")]
	Content(#[source] BoxError),
	#[error("created callback failed")]
	Created(#[source] BoxError),
	#[error("linking callback failed")]
	Linking(#[source] BoxError),
	#[error("no render function was recorded for {0}")]
	NotRendered(String),
	#[error("depth limit reached ({limit} nested render passes)")]
	DepthLimitReached { limit: usize },
}

impl RenderError {
	/// Wraps an error raised by a content or render callback.
	pub fn content(error: impl Into<BoxError>) -> Self {
		Self::Content(error.into())
	}
}
