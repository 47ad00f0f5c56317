//! Deterministic query-string handling shared by the client and authenticators.

// crates.io
use url::form_urlencoded;
// self
use crate::_prelude::*;

/// Multi-valued query arguments encoded with sorted keys.
///
/// Values keep their insertion order under each key, so `encode` output is stable for
/// equal inputs. This matters because the encoded URL participates in cache keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryArgs(BTreeMap<String, Vec<String>>);
impl QueryArgs {
	/// Creates an empty argument set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses the existing query of `url`.
	pub fn from_url(url: &Url) -> Self {
		url.query_pairs().collect()
	}

	/// Builder-style [`QueryArgs::append`].
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.append(key, value);

		self
	}

	/// Adds `value` under `key`, keeping existing values.
	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.entry(key.into()).or_default().push(value.into());
	}

	/// Replaces every value under `key` with `value`.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.insert(key.into(), vec![value.into()]);
	}

	/// Returns the first value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(|values| values.first()).map(String::as_str)
	}

	/// Returns `true` when no arguments are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Encodes the arguments as `application/x-www-form-urlencoded`, sorted by key.
	pub fn encode(&self) -> String {
		let mut serializer = form_urlencoded::Serializer::new(String::new());

		for (key, values) in &self.0 {
			for value in values {
				serializer.append_pair(key, value);
			}
		}

		serializer.finish()
	}

	/// Replaces the query of `url` with the encoded arguments (or clears it when empty).
	pub fn apply_to(&self, url: &mut Url) {
		if self.is_empty() {
			url.set_query(None);
		} else {
			url.set_query(Some(&self.encode()));
		}
	}
}
impl<K, V> FromIterator<(K, V)> for QueryArgs
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		let mut args = Self::new();

		for (key, value) in iter {
			args.append(key, value);
		}

		args
	}
}
impl<K, V, const N: usize> From<[(K, V); N]> for QueryArgs
where
	K: Into<String>,
	V: Into<String>,
{
	fn from(pairs: [(K, V); N]) -> Self {
		pairs.into_iter().collect()
	}
}
