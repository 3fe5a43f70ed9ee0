use core::fmt::Debug;
use thiserror::Error;
use tracing::error;

/// How many [`View::el`](`crate::View::el`) hops are followed before giving up on resolving a [`Mountable`](`crate::Mountable`).
pub const RESOLVE_LIMIT: usize = 64;

#[derive(Debug, Error)]
pub enum Error {
	/// A view's `el` chain didn't end in a node, most likely because it is cyclic.
	#[error("could not resolve a view to a DOM node within {limit} `el` hops")]
	Unresolved { limit: usize },

	/// The host document rejected an operation.
	#[error("DOM operation `{operation}` failed: {message}")]
	Dom { operation: &'static str, message: String },
}

impl Error {
	pub(crate) fn dom(operation: &'static str, error: impl Debug) -> Self {
		let message = format!("{:?}", error);
		error!("Failed to {}: {}", operation, message);
		Self::Dom { operation, message }
	}

	/// An operation the engine refuses up front because the host would reject it.
	pub(crate) fn rejected(operation: &'static str, reason: &str) -> Self {
		error!("Refusing to {}: {}", operation, reason);
		Self::Dom {
			operation,
			message: reason.to_owned(),
		}
	}
}

/// Shorthand for mapping a host result into this crate's [`Error`].
pub(crate) trait DomResultExt<T> {
	fn during(self, operation: &'static str) -> Result<T, Error>;
}

impl<T, E: Debug> DomResultExt<T> for Result<T, E> {
	fn during(self, operation: &'static str) -> Result<T, Error> {
		self.map_err(|error| Error::dom(operation, error))
	}
}
