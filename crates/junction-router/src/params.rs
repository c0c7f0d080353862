//! Captured path parameters.
//!
//! A compiled pattern yields its captures in template order. Most routes
//! capture one or two symbols, so values are kept inline until more than
//! four are present.

use smallvec::SmallVec;

const INLINE_PARAMS: usize = 4;

/// Raw symbol values captured by a successful match, in template order.
///
/// Values are already percent-decoded because matching runs against the
/// normalized path. Symbols inside an optional section that did not
/// participate in the match are absent.
///
/// # Example
///
/// ```rust
/// use junction_router::Params;
///
/// let mut params = Params::new();
/// params.push("author", "ada");
/// params.push("title", "notes");
///
/// assert_eq!(params.get("author"), Some("ada"));
/// assert_eq!(params.names().collect::<Vec<_>>(), vec!["author", "title"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the raw value captured for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if `name` was captured.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(n, _)| n == name)
    }

    /// Returns the number of captured symbols.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over the captured symbol names in template order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|(n, _)| n.as_str())
    }

    /// Iterates over `(name, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
