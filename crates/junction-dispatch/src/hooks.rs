//! Before and after hooks.

use std::sync::Arc;

use junction_core::{DispatchContext, Fault, Response};
use regex::Regex;

/// Runs before the handler chain. An abort stops the request.
pub type BeforeHook<S> = Arc<dyn Fn(&mut DispatchContext<S>) -> Result<(), Fault> + Send + Sync>;

/// Runs after the handler chain and may adjust the response.
pub type AfterHook<S> =
    Arc<dyn Fn(&mut DispatchContext<S>, &mut Response) -> Result<(), Fault> + Send + Sync>;

/// Hooks split into path-scoped and unconditional groups.
///
/// Scoped hooks whose expression matches the path run first, then every
/// unconditional hook. Each group keeps registration order.
pub struct HookList<H> {
    scoped: Vec<(Regex, H)>,
    global: Vec<H>,
}

impl<H> Default for HookList<H> {
    fn default() -> Self {
        Self {
            scoped: Vec::new(),
            global: Vec::new(),
        }
    }
}

impl<H> HookList<H> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unconditional hook.
    pub fn push(&mut self, hook: H) {
        self.global.push(hook);
    }

    /// Adds a hook that runs only when `expression` matches the path.
    pub fn push_scoped(&mut self, expression: Regex, hook: H) {
        self.scoped.push((expression, hook));
    }

    /// Yields the hooks that apply to `path`, in execution order.
    pub fn matching<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a H> + 'a {
        self.scoped
            .iter()
            .filter(move |(expression, _)| expression.is_match(path))
            .map(|(_, hook)| hook)
            .chain(self.global.iter())
    }

    /// Returns the total number of hooks.
    pub fn len(&self) -> usize {
        self.scoped.len() + self.global.len()
    }

    /// Returns true if there are no hooks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
