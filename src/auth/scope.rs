//! Ordered scope lists joined with a provider-specific delimiter.

// std
use std::slice::Iter;
// self
use crate::_prelude::*;

/// Scope value accepted by a provider.
///
/// Providers usually model their closed scope set as an enum; `String` is supported for
/// providers whose scopes are open-ended.
pub trait ProviderScope
where
	Self: 'static + Clone + Debug + PartialEq + Send + Sync,
{
	/// Wire representation placed in the `scope` parameter.
	fn as_scope_str(&self) -> &str;
}
impl ProviderScope for String {
	fn as_scope_str(&self) -> &str {
		self
	}
}

/// Scopes requested during a redirect, kept in caller order without duplicates.
///
/// Unlike a set, the list keeps the order callers supplied so the authorize URL reads the
/// same way the configuration does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeList<S> {
	scopes: Vec<S>,
}
impl<S> ScopeList<S>
where
	S: ProviderScope,
{
	/// Builds a list from any iterator, dropping repeated scopes.
	pub fn new<I>(scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
	{
		let mut list = Self { scopes: Vec::new() };

		list.extend(scopes);

		list
	}

	/// Appends a scope unless it is already present.
	pub fn push(&mut self, scope: S) {
		if !self.scopes.contains(&scope) {
			self.scopes.push(scope);
		}
	}

	/// Appends every scope that is not already present.
	pub fn extend<I>(&mut self, scopes: I)
	where
		I: IntoIterator<Item = S>,
	{
		for scope in scopes {
			self.push(scope);
		}
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are requested.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the list contains the provided scope.
	pub fn contains(&self, scope: &S) -> bool {
		self.scopes.contains(scope)
	}

	/// Iterator over the scopes in request order.
	pub fn iter(&self) -> Iter<'_, S> {
		self.scopes.iter()
	}

	/// Joins the scopes with `delimiter`, or returns `None` for an empty list.
	pub fn join(&self, delimiter: char) -> Option<String> {
		if self.scopes.is_empty() {
			return None;
		}

		let mut buf = String::new();

		for (idx, scope) in self.scopes.iter().enumerate() {
			if idx > 0 {
				buf.push(delimiter);
			}

			buf.push_str(scope.as_scope_str());
		}

		Some(buf)
	}
}
impl<S> Default for ScopeList<S> {
	fn default() -> Self {
		Self { scopes: Vec::new() }
	}
}
impl<S> FromIterator<S> for ScopeList<S>
where
	S: ProviderScope,
{
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::new(iter)
	}
}
impl<'a, S> IntoIterator for &'a ScopeList<S> {
	type IntoIter = Iter<'a, S>;
	type Item = &'a S;

	fn into_iter(self) -> Self::IntoIter {
		self.scopes.iter()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn list(values: &[&str]) -> ScopeList<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn join_keeps_order_and_drops_duplicates() {
		let scopes = list(&["read", "activity:read", "read"]);

		assert_eq!(scopes.len(), 2);
		assert_eq!(scopes.join(','), Some("read,activity:read".into()));
		assert_eq!(scopes.join(' '), Some("read activity:read".into()));
	}

	#[test]
	fn empty_list_has_no_scope_value() {
		assert_eq!(ScopeList::<String>::default().join(','), None);
	}

	#[test]
	fn extend_appends_new_scopes_only() {
		let mut scopes = list(&["read"]);

		scopes.extend(["read".to_string(), "profile:write".to_string()]);

		assert!(scopes.contains(&"profile:write".to_string()));
		assert_eq!(scopes.iter().map(String::as_str).collect::<Vec<_>>(), ["read", "profile:write"]);
	}
}
