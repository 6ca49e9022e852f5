use core::fmt::{self, Debug};

/// Rendered content as it appears in log output.
///
/// Without the `dangerous-logging` feature only the length is logged.
pub(crate) struct Redacted<'a>(pub &'a str);

impl Debug for Redacted<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if cfg!(feature = "dangerous-logging") {
			Debug::fmt(self.0, f)
		} else {
			write!(f, "<{} bytes>", self.0.len())
		}
	}
}
