//! Verb selection and effective-method resolution.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use http::header::HeaderName;
use http::{HeaderMap, Method};

use crate::error::{RouteError, RouteResult};

/// Methods accepted by the router.
pub const SUPPORTED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
];

/// Default header consulted for POST method overrides.
pub const DEFAULT_OVERRIDE_HEADER: &str = "x-http-method-override";

/// Default form field consulted for POST method overrides.
pub const DEFAULT_OVERRIDE_FIELD: &str = "_method";

/// Parses a verb and rejects anything outside [`SUPPORTED_METHODS`].
///
/// Parsing is case-insensitive.
pub fn parse_method(raw: &str) -> RouteResult<Method> {
    let upper = raw.trim().to_ascii_uppercase();
    SUPPORTED_METHODS
        .iter()
        .find(|m| m.as_str() == upper)
        .cloned()
        .ok_or_else(|| RouteError::unsupported_method(upper))
}

/// The verbs a route is registered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbSelector {
    /// Every supported verb. Routes land in the wildcard bucket.
    Any,
    /// An explicit set of verbs.
    Methods(Vec<Method>),
}

impl VerbSelector {
    /// Returns true if the selector admits `method`.
    pub fn admits(&self, method: &Method) -> bool {
        match self {
            Self::Any => SUPPORTED_METHODS.contains(method),
            Self::Methods(methods) => methods.contains(method),
        }
    }
}

impl FromStr for VerbSelector {
    type Err = RouteError;

    /// Parses `*`, a single verb, or a comma-separated verb list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "*" {
            return Ok(Self::Any);
        }
        if s.is_empty() {
            return Err(RouteError::invalid_selector(s, "no verb given"));
        }

        let mut methods = Vec::new();
        for part in s.split(',') {
            let method = parse_method(part)?;
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        Ok(Self::Methods(methods))
    }
}

impl From<Method> for VerbSelector {
    fn from(method: Method) -> Self {
        Self::Methods(vec![method])
    }
}

impl From<Vec<Method>> for VerbSelector {
    fn from(methods: Vec<Method>) -> Self {
        Self::Methods(methods)
    }
}

impl fmt::Display for VerbSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Methods(methods) => {
                let names: Vec<&str> = methods.iter().map(Method::as_str).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

/// Splits a combined route string such as `"GET /users/:id"` or
/// `"GET,POST /login"` into its selector and template.
pub fn split_route(route: &str) -> RouteResult<(VerbSelector, &str)> {
    let route = route.trim();
    let (verbs, template) = route
        .split_once(char::is_whitespace)
        .ok_or_else(|| RouteError::invalid_selector(route, "expected '<VERBS> <path>'"))?;
    Ok((verbs.parse()?, template.trim()))
}

/// Determines the effective verb of a request.
///
/// Only POST requests may be overridden. The override header wins over the
/// override field, and an empty value is treated as absent.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use http::{HeaderMap, Method};
/// use junction_router::MethodResolver;
///
/// let resolver = MethodResolver::new();
/// let mut fields = HashMap::new();
/// fields.insert("_method".to_string(), "put".to_string());
///
/// let method = resolver.resolve("POST", &HeaderMap::new(), &fields).unwrap();
/// assert_eq!(method, Method::PUT);
/// ```
#[derive(Debug, Clone)]
pub struct MethodResolver {
    override_header: HeaderName,
    override_field: String,
}

impl Default for MethodResolver {
    fn default() -> Self {
        Self {
            override_header: HeaderName::from_static(DEFAULT_OVERRIDE_HEADER),
            override_field: DEFAULT_OVERRIDE_FIELD.to_string(),
        }
    }
}

impl MethodResolver {
    /// Creates a resolver with the default override header and field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the override header name.
    pub fn with_override_header(mut self, header: &str) -> RouteResult<Self> {
        self.override_header = HeaderName::from_bytes(header.trim().as_bytes()).map_err(|_| {
            RouteError::InvalidOverrideHeader {
                header: header.to_string(),
            }
        })?;
        Ok(self)
    }

    /// Replaces the override field name.
    pub fn with_override_field(mut self, field: impl Into<String>) -> Self {
        self.override_field = field.into();
        self
    }

    /// Returns the override header name.
    pub fn override_header(&self) -> &HeaderName {
        &self.override_header
    }

    /// Returns the override field name.
    pub fn override_field(&self) -> &str {
        &self.override_field
    }

    /// Resolves the effective verb.
    ///
    /// Fails with [`RouteError::UnsupportedMethod`] when the resulting verb
    /// is outside [`SUPPORTED_METHODS`].
    pub fn resolve(
        &self,
        raw: &str,
        headers: &HeaderMap,
        fields: &HashMap<String, String>,
    ) -> RouteResult<Method> {
        let method = parse_method(raw)?;
        if method != Method::POST {
            return Ok(method);
        }

        let header = headers
            .get(&self.override_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(verb) = header {
            return parse_method(verb);
        }

        match fields
            .get(&self.override_field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
        {
            Some(verb) => parse_method(verb),
            None => Ok(method),
        }
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn no_fields() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_parse_method_uppercases() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method(" Patch ").unwrap(), Method::PATCH);
    }

    #[test]
    fn test_parse_method_rejects_unsupported() {
        let err = parse_method("options").unwrap_err();
        assert_eq!(err, RouteError::unsupported_method("OPTIONS"));
    }

    #[test]
    fn test_non_post_is_not_overridden() {
        let resolver = MethodResolver::new();
        let mut headers = HeaderMap::new();
        headers.insert(DEFAULT_OVERRIDE_HEADER, HeaderValue::from_static("DELETE"));

        let method = resolver.resolve("get", &headers, &no_fields()).unwrap();
        assert_eq!(method, Method::GET);
    }

    #[test]
    fn test_header_override_wins_over_field() {
        let resolver = MethodResolver::new();
        let mut headers = HeaderMap::new();
        headers.insert(DEFAULT_OVERRIDE_HEADER, HeaderValue::from_static("put"));
        let mut fields = no_fields();
        fields.insert("_method".to_string(), "DELETE".to_string());

        let method = resolver.resolve("POST", &headers, &fields).unwrap();
        assert_eq!(method, Method::PUT);
    }

    #[test]
    fn test_field_override() {
        let resolver = MethodResolver::new();
        let mut fields = no_fields();
        fields.insert("_method".to_string(), "patch".to_string());

        let method = resolver.resolve("post", &HeaderMap::new(), &fields).unwrap();
        assert_eq!(method, Method::PATCH);
    }

    #[test]
    fn test_blank_override_keeps_post() {
        let resolver = MethodResolver::new();
        let mut fields = no_fields();
        fields.insert("_method".to_string(), "  ".to_string());

        let method = resolver.resolve("POST", &HeaderMap::new(), &fields).unwrap();
        assert_eq!(method, Method::POST);
    }

    #[test]
    fn test_unsupported_override_rejected() {
        let resolver = MethodResolver::new();
        let mut fields = no_fields();
        fields.insert("_method".to_string(), "TRACE".to_string());

        assert!(resolver.resolve("POST", &HeaderMap::new(), &fields).is_err());
    }

    #[test]
    fn test_custom_override_names() {
        let resolver = MethodResolver::new()
            .with_override_header("X-Verb")
            .unwrap()
            .with_override_field("verb");
        let mut headers = HeaderMap::new();
        headers.insert("x-verb", HeaderValue::from_static("DELETE"));

        let method = resolver.resolve("POST", &headers, &no_fields()).unwrap();
        assert_eq!(method, Method::DELETE);
        assert_eq!(resolver.override_field(), "verb");
    }

    #[test]
    fn test_invalid_override_header_rejected() {
        assert!(MethodResolver::new().with_override_header("bad header").is_err());
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("*".parse::<VerbSelector>().unwrap(), VerbSelector::Any);
        assert_eq!(
            "get, post,GET".parse::<VerbSelector>().unwrap(),
            VerbSelector::Methods(vec![Method::GET, Method::POST])
        );
        assert!("".parse::<VerbSelector>().is_err());
        assert!("GET,BREW".parse::<VerbSelector>().is_err());
    }

    #[test]
    fn test_selector_admits() {
        assert!(VerbSelector::Any.admits(&Method::DELETE));
        assert!(!VerbSelector::Any.admits(&Method::OPTIONS));
        assert!(VerbSelector::from(Method::GET).admits(&Method::GET));
        assert!(!VerbSelector::from(Method::GET).admits(&Method::POST));
    }

    #[test]
    fn test_split_route() {
        let (selector, template) = split_route("GET,POST  /login").unwrap();
        assert_eq!(selector.to_string(), "GET,POST");
        assert_eq!(template, "/login");

        let (selector, template) = split_route("* /ping").unwrap();
        assert_eq!(selector, VerbSelector::Any);
        assert_eq!(template, "/ping");

        assert!(split_route("/no-verb").is_err());
    }
}
