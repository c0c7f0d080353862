//! Route handler chains.
//!
//! A route is registered with an ordered list of [`Link`]s: every link but
//! the last is a middleware, the last is the terminal handler. The list is
//! validated once into a [`Chain`], which folds the middleware right-to-left
//! around the handler on each invocation.

use std::fmt;
use std::sync::Arc;

use junction_core::{BoxedHandler, DispatchContext, HandlerResult};
use junction_router::{RouteError, RouteResult};

use crate::middleware::{Middleware, Next};

/// A type-erased middleware.
pub type BoxedMiddleware<S> = Arc<dyn Middleware<S>>;

/// One element of a route's handler list.
pub enum Link<S> {
    /// A wrapper that receives a continuation.
    Middleware(BoxedMiddleware<S>),
    /// The action that produces the response.
    Terminal(BoxedHandler<S>),
}

impl<S: 'static> Link<S> {
    /// Creates a middleware link.
    pub fn middleware<M: Middleware<S>>(middleware: M) -> Self {
        Self::Middleware(Arc::new(middleware))
    }

    /// Creates a terminal link from a closure.
    pub fn terminal<F>(handler: F) -> Self
    where
        F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Terminal(Arc::new(handler))
    }

    /// Returns true for terminal links.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

impl<S: 'static> Clone for Link<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Middleware(m) => Self::Middleware(Arc::clone(m)),
            Self::Terminal(h) => Self::Terminal(Arc::clone(h)),
        }
    }
}

impl<S: 'static> fmt::Debug for Link<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Middleware(m) => f.debug_tuple("Middleware").field(&m.name()).finish(),
            Self::Terminal(_) => f.write_str("Terminal"),
        }
    }
}

/// A validated handler chain: zero or more middleware and one terminal.
pub struct Chain<S> {
    middleware: Vec<BoxedMiddleware<S>>,
    terminal: BoxedHandler<S>,
}

impl<S: 'static> Chain<S> {
    /// Creates a chain with only a terminal handler.
    pub fn new(terminal: BoxedHandler<S>) -> Self {
        Self {
            middleware: Vec::new(),
            terminal,
        }
    }

    /// Validates a link list registered for `template`.
    ///
    /// The list must be non-empty, end with a terminal link, and contain no
    /// other terminal link.
    pub fn from_links(template: &str, links: Vec<Link<S>>) -> RouteResult<Self> {
        let mut links = links;
        let last = links.pop().ok_or_else(|| RouteError::EmptyChain {
            template: template.to_string(),
        })?;

        let terminal = match last {
            Link::Terminal(handler) => handler,
            Link::Middleware(m) => {
                return Err(RouteError::malformed_chain(
                    template,
                    format!("last link '{}' is a middleware, not a handler", m.name()),
                ))
            }
        };

        let mut middleware = Vec::with_capacity(links.len());
        for (index, link) in links.into_iter().enumerate() {
            match link {
                Link::Middleware(m) => middleware.push(m),
                Link::Terminal(_) => {
                    return Err(RouteError::malformed_chain(
                        template,
                        format!("terminal handler at position {index} is not last"),
                    ))
                }
            }
        }

        Ok(Self {
            middleware,
            terminal,
        })
    }

    /// Appends a middleware as the new innermost wrapper.
    pub fn with(mut self, middleware: BoxedMiddleware<S>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Returns the names of the route's own middleware, outermost first.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Runs the chain.
    ///
    /// `outer` middleware, typically collected from `apply` registrations,
    /// wrap the route's own middleware. Both lists are outermost first.
    pub fn invoke(&self, outer: &[BoxedMiddleware<S>], ctx: &mut DispatchContext<S>) -> HandlerResult {
        let mut next = Next::handler(self.terminal.as_ref());

        for middleware in self.middleware.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        for middleware in outer.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }

        next.run(ctx)
    }
}

impl<S: 'static> Clone for Chain<S> {
    fn clone(&self) -> Self {
        Self {
            middleware: self.middleware.clone(),
            terminal: Arc::clone(&self.terminal),
        }
    }
}

impl<S: 'static> fmt::Debug for Chain<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("middleware", &self.middleware_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use junction_core::{handler, response};

    use super::*;
    use crate::middleware::from_fn;

    type Trail = Vec<String>;

    fn tag(name: &'static str) -> Link<Trail> {
        Link::middleware(from_fn(
            name,
            move |ctx: &mut DispatchContext<Trail>, next: Next<'_, Trail>| {
                ctx.args_mut().push(name.to_string());
                next.run(ctx)
            },
        ))
    }

    fn done() -> Link<Trail> {
        Link::terminal(|ctx: &mut DispatchContext<Trail>| {
            ctx.args_mut().push("handler".to_string());
            Ok(response::text("ok"))
        })
    }

    #[test]
    fn test_empty_chain_rejected() {
        let err = Chain::<Trail>::from_links("a", Vec::new()).unwrap_err();
        assert!(matches!(err, RouteError::EmptyChain { .. }));
    }

    #[test]
    fn test_trailing_middleware_rejected() {
        let err = Chain::from_links("a", vec![done(), tag("m")]).unwrap_err();
        assert!(matches!(err, RouteError::MalformedChain { .. }));
    }

    #[test]
    fn test_early_terminal_rejected() {
        let err = Chain::from_links("a", vec![tag("m"), done(), done()]).unwrap_err();
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn test_invoke_order_with_outer() {
        let chain = Chain::from_links("a", vec![tag("route1"), tag("route2"), done()]).unwrap();
        let outer: Vec<BoxedMiddleware<Trail>> = match tag("applied") {
            Link::Middleware(m) => vec![m],
            Link::Terminal(_) => unreachable!(),
        };

        let mut ctx = DispatchContext::new(Method::GET, "a", Trail::new());
        chain.invoke(&outer, &mut ctx).unwrap();

        assert_eq!(ctx.args(), &vec!["applied", "route1", "route2", "handler"]);
        assert_eq!(chain.middleware_names(), vec!["route1", "route2"]);
    }

    #[test]
    fn test_chain_reusable_across_requests() {
        let chain = Chain::new(handler(|ctx: &mut DispatchContext<Trail>| {
            Ok(response::text(ctx.path().to_string()))
        }));

        for path in ["one", "two"] {
            let mut ctx = DispatchContext::new(Method::GET, path, Trail::new());
            let response = chain.invoke(&[], &mut ctx).unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.body().as_ref(), path.as_bytes());
        }
    }

    #[test]
    fn test_generic_args_through_gate_and_debug() {
        let gate = Link::middleware(crate::gate::Gate::new(
            "non-empty",
            |ctx: &DispatchContext<Trail>| !ctx.args().is_empty(),
        ));
        let links = vec![tag("first"), gate, done()];
        assert_eq!(format!("{:?}", links[1]), "Middleware(\"non-empty\")");

        let chain = Chain::from_links("a", links.clone()).unwrap();
        let copy = chain.clone();
        assert_eq!(
            format!("{copy:?}"),
            "Chain { middleware: [\"first\", \"non-empty\"], .. }"
        );

        let mut ctx = DispatchContext::new(Method::GET, "a", Trail::new());
        copy.invoke(&[], &mut ctx).unwrap();
        assert_eq!(ctx.args(), &vec!["first", "handler"]);
    }

    #[test]
    fn test_with_appends_innermost() {
        let chain = Chain::from_links("a", vec![tag("first"), done()]).unwrap();
        let extra = match tag("second") {
            Link::Middleware(m) => m,
            Link::Terminal(_) => unreachable!(),
        };
        let chain = chain.with(extra);

        let mut ctx = DispatchContext::new(Method::GET, "a", Trail::new());
        chain.invoke(&[], &mut ctx).unwrap();
        assert_eq!(ctx.args(), &vec!["first", "second", "handler"]);
    }
}
