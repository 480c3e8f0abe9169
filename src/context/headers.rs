//! Immutable snapshot of inbound request headers.

use axum::http::{header::GetAll, HeaderMap, HeaderName, HeaderValue};

/// Headers of the inbound request, captured once when the request enters
/// the service. Lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    headers: HeaderMap,
}

impl HeaderSet {
    /// Capture a snapshot of the given headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            headers: headers.clone(),
        }
    }

    /// First value of `name` as text. Opaque (non-visible-ASCII) values yield `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// First value of `name`, trimmed, if it has any text.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// All values recorded under `name`.
    pub fn get_all(&self, name: &HeaderName) -> GetAll<'_, HeaderValue> {
        self.headers.get_all(name)
    }

    /// Distinct header names whose lowercase form starts with `prefix`.
    pub fn names_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a HeaderName> + 'a {
        self.headers
            .keys()
            .filter(move |name| name.as_str().starts_with(prefix))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl From<HeaderMap> for HeaderSet {
    fn from(headers: HeaderMap) -> Self {
        Self { headers }
    }
}
