//! Ordered route storage and lookup.
//!
//! Routes are kept per verb in registration order, plus a wildcard bucket
//! for routes registered against every verb. Lookup is a linear scan: the
//! first pattern that matches wins, there is no ranking by specificity.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use tracing::{debug, warn};

use crate::error::{RouteError, RouteResult};
use crate::method::{VerbSelector, SUPPORTED_METHODS};
use crate::params::Params;
use crate::pattern::{CompiledPattern, PatternCompiler};

/// A registered route.
#[derive(Debug)]
pub struct Route<T> {
    pattern: Arc<CompiledPattern>,
    payload: Arc<T>,
}

impl<T> Route<T> {
    /// Returns the compiled pattern.
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Returns the value stored with the route.
    pub fn payload(&self) -> &T {
        &self.payload
    }
}

impl<T> Clone for Route<T> {
    fn clone(&self) -> Self {
        Self {
            pattern: Arc::clone(&self.pattern),
            payload: Arc::clone(&self.payload),
        }
    }
}

/// The outcome of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    route: &'a Route<T>,
    params: Params,
    wildcard: bool,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Returns the matched template.
    pub fn template(&self) -> &'a str {
        self.route.pattern.template()
    }

    /// Returns the matched pattern.
    pub fn pattern(&self) -> &'a CompiledPattern {
        &self.route.pattern
    }

    /// Returns the value stored with the route.
    pub fn payload(&self) -> &'a T {
        &self.route.payload
    }

    /// Returns the captured parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Consumes the match and returns the captured parameters.
    pub fn into_params(self) -> Params {
        self.params
    }

    /// Returns true if the route came from the wildcard bucket.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }
}

/// Verb-bucketed route table.
///
/// Populated during setup and read-only afterwards. A duplicate
/// `(verb, template)` registration is ignored: the first route registered
/// keeps the slot. Templates are compared without regard to case unless the
/// compiler is case sensitive.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use junction_router::{RouteTable, VerbSelector};
///
/// let mut table = RouteTable::new();
/// table.insert(Method::GET.into(), "/users/:id", "show").unwrap();
/// table.insert(VerbSelector::Any, "/ping", "ping").unwrap();
///
/// let m = table.lookup(&Method::GET, "users/7").unwrap();
/// assert_eq!(*m.payload(), "show");
/// assert_eq!(m.params().get("id"), Some("7"));
///
/// let m = table.lookup(&Method::DELETE, "ping").unwrap();
/// assert!(m.is_wildcard());
/// ```
#[derive(Debug)]
pub struct RouteTable<T> {
    buckets: HashMap<Method, Vec<Route<T>>>,
    wildcard: Vec<Route<T>>,
    compiler: PatternCompiler,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::with_compiler(PatternCompiler::new())
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty, case-insensitive table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table that compiles templates with `compiler`.
    pub fn with_compiler(compiler: PatternCompiler) -> Self {
        Self {
            buckets: HashMap::new(),
            wildcard: Vec::new(),
            compiler,
        }
    }

    /// Returns the compiler used for templates.
    pub fn compiler(&self) -> &PatternCompiler {
        &self.compiler
    }

    /// Registers `payload` under `template` for the selected verbs.
    ///
    /// Returns the number of buckets the route was added to. Zero means
    /// every target bucket already held the same template. An empty verb
    /// list or a verb outside [`SUPPORTED_METHODS`] is rejected.
    pub fn insert(&mut self, selector: VerbSelector, template: &str, payload: T) -> RouteResult<usize> {
        if let VerbSelector::Methods(methods) = &selector {
            if methods.is_empty() {
                return Err(RouteError::invalid_selector(template, "no verb given"));
            }
            if let Some(method) = methods.iter().find(|m| !SUPPORTED_METHODS.contains(m)) {
                return Err(RouteError::unsupported_method(method.as_str()));
            }
        }

        let pattern = Arc::new(self.compiler.compile(template)?);
        let payload = Arc::new(payload);
        let route = Route { pattern, payload };
        let ignore_case = !self.compiler.is_case_sensitive();

        let mut inserted = 0;
        match &selector {
            VerbSelector::Any => {
                inserted += usize::from(push_unique(&mut self.wildcard, route, "*", ignore_case));
            }
            VerbSelector::Methods(methods) => {
                for method in methods {
                    let bucket = self.buckets.entry(method.clone()).or_default();
                    inserted +=
                        usize::from(push_unique(bucket, route.clone(), method.as_str(), ignore_case));
                }
            }
        }

        if inserted > 0 {
            debug!(verbs = %selector, template = %template, "route registered");
        }
        Ok(inserted)
    }

    /// Finds the first route matching a normalized path.
    ///
    /// The verb's own bucket is scanned first, then the wildcard bucket.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let specific = self
            .buckets
            .get(method)
            .into_iter()
            .flatten()
            .find_map(|route| {
                route.pattern.captures(path).map(|params| RouteMatch {
                    route,
                    params,
                    wildcard: false,
                })
            });

        specific.or_else(|| {
            self.wildcard.iter().find_map(|route| {
                route.pattern.captures(path).map(|params| RouteMatch {
                    route,
                    params,
                    wildcard: true,
                })
            })
        })
    }

    /// Returns the templates registered for a verb, in registration order.
    pub fn templates_for(&self, method: &Method) -> Vec<&str> {
        self.buckets
            .get(method)
            .map(|routes| routes.iter().map(|r| r.pattern.template()).collect())
            .unwrap_or_default()
    }

    /// Returns the templates in the wildcard bucket.
    pub fn wildcard_templates(&self) -> Vec<&str> {
        self.wildcard.iter().map(|r| r.pattern.template()).collect()
    }

    /// Returns the total number of bucket entries.
    pub fn len(&self) -> usize {
        self.wildcard.len() + self.buckets.values().map(Vec::len).sum::<usize>()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Templates that differ only in letter case are duplicates when matching
/// ignores case.
fn push_unique<T>(bucket: &mut Vec<Route<T>>, route: Route<T>, verb: &str, ignore_case: bool) -> bool {
    let template = route.pattern.template();
    let same = |other: &str| {
        if ignore_case {
            other.eq_ignore_ascii_case(template)
        } else {
            other == template
        }
    };
    if bucket.iter().any(|r| same(r.pattern.template())) {
        warn!(verb = %verb, template = %template, "duplicate route ignored");
        return false;
    }
    bucket.push(route);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins_in_registration_order() {
        let mut table = RouteTable::new();
        table.insert(Method::GET.into(), "users/:id", 1).unwrap();
        table.insert(Method::GET.into(), "users/me", 2).unwrap();

        let m = table.lookup(&Method::GET, "users/me").unwrap();
        assert_eq!(*m.payload(), 1);
        assert_eq!(m.params().get("id"), Some("me"));
    }

    #[test]
    fn test_specific_bucket_before_wildcard() {
        let mut table = RouteTable::new();
        table.insert(VerbSelector::Any, "ping", "any").unwrap();
        table.insert(Method::GET.into(), "ping", "get").unwrap();

        assert_eq!(*table.lookup(&Method::GET, "ping").unwrap().payload(), "get");
        assert_eq!(*table.lookup(&Method::POST, "ping").unwrap().payload(), "any");
    }

    #[test]
    fn test_no_match() {
        let mut table = RouteTable::new();
        table.insert(Method::GET.into(), "users", ()).unwrap();

        assert!(table.lookup(&Method::POST, "users").is_none());
        assert!(table.lookup(&Method::GET, "posts").is_none());
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let mut table = RouteTable::new();
        assert_eq!(table.insert(Method::GET.into(), "/a", "first").unwrap(), 1);
        assert_eq!(table.insert(Method::GET.into(), "a/", "second").unwrap(), 0);

        assert_eq!(*table.lookup(&Method::GET, "a").unwrap().payload(), "first");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_ignores_case_unless_case_sensitive() {
        let mut table = RouteTable::new();
        assert_eq!(table.insert(Method::GET.into(), "Users", "first").unwrap(), 1);
        assert_eq!(table.insert(Method::GET.into(), "users", "second").unwrap(), 0);
        assert_eq!(*table.lookup(&Method::GET, "users").unwrap().payload(), "first");

        let mut table = RouteTable::with_compiler(PatternCompiler::new().case_sensitive(true));
        assert_eq!(table.insert(Method::GET.into(), "Users", "upper").unwrap(), 1);
        assert_eq!(table.insert(Method::GET.into(), "users", "lower").unwrap(), 1);
        assert_eq!(*table.lookup(&Method::GET, "users").unwrap().payload(), "lower");
    }

    #[test]
    fn test_multi_verb_partial_duplicate() {
        let mut table = RouteTable::new();
        table.insert(Method::GET.into(), "login", "get").unwrap();
        let added = table
            .insert(vec![Method::GET, Method::POST].into(), "login", "form")
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(*table.lookup(&Method::GET, "login").unwrap().payload(), "get");
        assert_eq!(*table.lookup(&Method::POST, "login").unwrap().payload(), "form");
    }

    #[test]
    fn test_templates_listing() {
        let mut table = RouteTable::new();
        table.insert(Method::GET.into(), "/b", ()).unwrap();
        table.insert(Method::GET.into(), "/a", ()).unwrap();
        table.insert(VerbSelector::Any, "/c", ()).unwrap();

        assert_eq!(table.templates_for(&Method::GET), vec!["b", "a"]);
        assert!(table.templates_for(&Method::PUT).is_empty());
        assert_eq!(table.wildcard_templates(), vec!["c"]);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_rejects_unsupported_or_missing_verbs() {
        let mut table = RouteTable::new();

        let err = table.insert(Method::OPTIONS.into(), "x", ()).unwrap_err();
        assert_eq!(err, RouteError::unsupported_method("OPTIONS"));

        let err = table
            .insert(vec![Method::GET, Method::TRACE].into(), "x", ())
            .unwrap_err();
        assert_eq!(err, RouteError::unsupported_method("TRACE"));

        let err = table.insert(Vec::new().into(), "x", ()).unwrap_err();
        assert!(matches!(err, RouteError::InvalidSelector { .. }));

        assert!(table.is_empty());
    }

    #[test]
    fn test_invalid_template_not_inserted() {
        let mut table: RouteTable<()> = RouteTable::new();
        assert!(table.insert(Method::GET.into(), "a(", ()).is_err());
        assert!(table.is_empty());
    }
}
