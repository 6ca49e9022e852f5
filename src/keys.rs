use core::fmt;
use hashbrown::HashMap;

/// Stable logical identity of a child within one parent's child list.
///
/// Keys compare by value. Positional (unkeyed) children receive
/// [`Key::Int`] of their distinct-key position, so an explicit integer key equal
/// to a position addresses the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	Int(i64),
	Str(String),
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Key::Int(int) => write!(f, "{}", int),
			Key::Str(string) => write!(f, "{:?}", string),
		}
	}
}

impl From<i64> for Key {
	fn from(int: i64) -> Self {
		Key::Int(int)
	}
}

impl From<i32> for Key {
	fn from(int: i32) -> Self {
		Key::Int(int.into())
	}
}

impl From<u32> for Key {
	fn from(int: u32) -> Self {
		Key::Int(int.into())
	}
}

impl From<usize> for Key {
	fn from(int: usize) -> Self {
		Key::Int(i64::try_from(int).unwrap_or(i64::MAX))
	}
}

impl From<&str> for Key {
	fn from(string: &str) -> Self {
		Key::Str(string.to_owned())
	}
}

impl From<String> for Key {
	fn from(string: String) -> Self {
		Key::Str(string)
	}
}

/// Anything that can be passed as a descriptor key to the [`build`](`crate::build`) functions.
///
/// `()` means "no key", i.e. the child is identified by its position.
pub trait IntoKey {
	fn into_key(self) -> Option<Key>;
}

impl IntoKey for () {
	fn into_key(self) -> Option<Key> {
		None
	}
}

impl IntoKey for Option<Key> {
	fn into_key(self) -> Option<Key> {
		self
	}
}

macro_rules! into_key {
	($($ty:ty),*$(,)?) => {$(
		impl IntoKey for $ty {
			fn into_key(self) -> Option<Key> {
				Some(self.into())
			}
		}
	)*};
}
into_key!(Key, i64, i32, u32, usize, &str, String);

/// Assigns render order to keys as descriptors are pushed into one context.
///
/// The Nth distinct key seen is assigned position N-1. Revisiting a key returns its memoized position.
#[derive(Debug, Default)]
pub(crate) struct KeyOrder {
	orders: HashMap<Key, usize>,
}

impl KeyOrder {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Count of distinct keys seen so far.
	pub(crate) fn len(&self) -> usize {
		self.orders.len()
	}

	/// Resolves a descriptor's key, defaulting to the current distinct-key count.
	pub(crate) fn descriptor_key(&self, key: Option<Key>) -> Key {
		key.unwrap_or_else(|| self.len().into())
	}

	pub(crate) fn key_order(&mut self, key: &Key) -> usize {
		if let Some(&order) = self.orders.get(key) {
			return order;
		}
		let order = self.orders.len();
		self.orders.insert(key.clone(), order);
		order
	}

	pub(crate) fn assign(&mut self, key: Option<Key>) -> (Key, usize) {
		let key = self.descriptor_key(key);
		let order = self.key_order(&key);
		(key, order)
	}
}
