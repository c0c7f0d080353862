//! Request path normalization.
//!
//! Compiled patterns only ever see normalized paths: query string and
//! fragment removed, deployment base prefix and entry-file stub stripped,
//! surrounding slashes trimmed, percent-escapes decoded.

use url::Url;

use crate::error::{RouteError, RouteResult};

/// Normalizes raw request paths before lookup.
///
/// The whole path is percent-decoded before any pattern sees it, so an
/// encoded slash (`%2F`) becomes a segment separator. `/files/a%2Fb` does
/// not match `files/:name`; a template that should accept it must allow
/// slashes in that position, for example `files/:name@.+` or `files/*`.
///
/// # Example
///
/// ```rust
/// use junction_router::PathNormalizer;
///
/// let normalizer = PathNormalizer::new()
///     .with_base_url("https://example.com/app/")
///     .unwrap()
///     .with_entry_stub("index.php");
///
/// assert_eq!(normalizer.normalize("/app/INDEX.php/users/a%20b?x=1"), "users/a b");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathNormalizer {
    base_path: String,
    entry_stub: Option<String>,
}

impl PathNormalizer {
    /// Creates a normalizer with no base prefix and no entry stub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strips the path component of `base_url` from incoming paths.
    ///
    /// Accepts either an absolute URL or a bare path.
    pub fn with_base_url(mut self, base_url: &str) -> RouteResult<Self> {
        let path = match Url::parse(base_url) {
            Ok(url) => {
                if url.cannot_be_a_base() {
                    return Err(RouteError::InvalidBaseUrl {
                        url: base_url.to_string(),
                        reason: "url has no hierarchical path".to_string(),
                    });
                }
                url.path().to_string()
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => base_url.to_string(),
            Err(e) => {
                return Err(RouteError::InvalidBaseUrl {
                    url: base_url.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        self.base_path = path.trim_matches('/').to_string();
        Ok(self)
    }

    /// Strips an entry-file segment such as `index.php`, compared without
    /// regard to case, when it directly follows the base prefix.
    pub fn with_entry_stub(mut self, stub: impl Into<String>) -> Self {
        let stub = stub.into();
        let stub = stub.trim_matches('/');
        self.entry_stub = (!stub.is_empty()).then(|| stub.to_string());
        self
    }

    /// Returns the base path prefix, without surrounding slashes.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Returns the entry stub, if configured.
    pub fn entry_stub(&self) -> Option<&str> {
        self.entry_stub.as_deref()
    }

    /// Normalizes a raw request path or request target.
    pub fn normalize(&self, raw: &str) -> String {
        let end = raw.find(&['?', '#'][..]).unwrap_or(raw.len());
        let mut path = raw[..end].trim_matches('/');

        if !self.base_path.is_empty() {
            path = strip_segment_prefix(path, &self.base_path, false).unwrap_or(path);
        }
        if let Some(stub) = &self.entry_stub {
            path = strip_segment_prefix(path, stub, true).unwrap_or(path);
        }

        let decoded = urlencoding::decode_binary(path.trim_matches('/').as_bytes());
        String::from_utf8_lossy(&decoded).into_owned()
    }
}

/// Removes `prefix` from the front of `path` when it ends on a segment
/// boundary.
fn strip_segment_prefix<'a>(path: &'a str, prefix: &str, ignore_case: bool) -> Option<&'a str> {
    let head = path.get(..prefix.len())?;
    let equal = if ignore_case {
        head.eq_ignore_ascii_case(prefix)
    } else {
        head == prefix
    };
    if !equal {
        return None;
    }

    let rest = &path[prefix.len()..];
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest.trim_start_matches('/'))
    } else {
        None
    }
}
