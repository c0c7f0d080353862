//! Path-scoped middleware registrations.

use junction_router::CompiledPattern;

use crate::chain::BoxedMiddleware;

/// Middleware associated with path templates through `apply`.
///
/// At dispatch time every registration whose pattern matches the
/// normalized request path contributes its middleware, in registration
/// order, outside the route's own middleware.
pub struct ApplyRegistry<S> {
    entries: Vec<(CompiledPattern, Vec<BoxedMiddleware<S>>)>,
}

impl<S: 'static> Default for ApplyRegistry<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: 'static> ApplyRegistry<S> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `middleware` with `pattern`.
    pub fn register(&mut self, pattern: CompiledPattern, middleware: Vec<BoxedMiddleware<S>>) {
        tracing::debug!(
            template = %pattern.template(),
            count = middleware.len(),
            "middleware applied"
        );
        self.entries.push((pattern, middleware));
    }

    /// Collects the middleware that apply to `path`, outermost first.
    pub fn collect_for(&self, path: &str) -> Vec<BoxedMiddleware<S>> {
        self.entries
            .iter()
            .filter(|(pattern, _)| pattern.is_match(path))
            .flat_map(|(_, middleware)| middleware.iter().cloned())
            .collect()
    }

    /// Returns the number of registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been applied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
