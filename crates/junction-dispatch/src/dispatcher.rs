//! The dispatcher: registration API and the per-request pipeline.
//!
//! A dispatch walks these stages, stopping at the first abort:
//!
//! ```text
//! resolve verb -> normalize path -> lookup -> filters -> binders
//!   -> before hooks -> middleware chain -> after hooks -> response
//! ```
//!
//! No match, an unsupported verb and any [`Fault::Abort`] go to the
//! [`ErrorResponder`] and end the request; after hooks do not run.
//! Registries are filled during setup and only read while dispatching, so
//! a populated dispatcher can be shared across threads behind an `Arc`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{Method, StatusCode};
use junction_config::DispatchConfig;
use junction_core::{DispatchContext, DispatchError, Fault, HandlerResult, Response};
use junction_middleware::{ApplyRegistry, BoxedMiddleware, Chain, Link};
use junction_router::{
    split_route, MethodResolver, PathNormalizer, PatternCompiler, RouteResult, RouteTable,
    VerbSelector,
};
use junction_telemetry::metrics::{record_dispatch, record_failure, UNSUPPORTED_METHOD};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn};

use crate::binder::ParamBinder;
use crate::hooks::{AfterHook, BeforeHook, HookList};
use crate::request::DispatchRequest;
use crate::resource::Resource;
use crate::responder::{ErrorContext, ErrorResponder};

/// Why a dispatch stopped before producing a response.
enum Halt {
    Fault(Fault),
    Stopped(DispatchError),
}

impl From<Fault> for Halt {
    fn from(fault: Fault) -> Self {
        Self::Fault(fault)
    }
}

/// Routes requests to handler chains.
///
/// `S` is the type of the caller arguments forwarded to every hook,
/// middleware and handler of a dispatch through
/// [`DispatchContext::args`].
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use junction_core::{response, DispatchContext, Fault};
/// use junction_dispatch::{DispatchRequest, Dispatcher};
///
/// let mut dispatcher = Dispatcher::new();
/// dispatcher
///     .bind("id", |raw, _| raw.parse::<u64>().map_err(|_| Fault::not_found()))
///     .get("users/:id", |ctx: &mut DispatchContext| {
///         let id = ctx.params().get_i64("id").unwrap_or_default();
///         Ok(response::text(format!("user {id}")))
///     })
///     .unwrap();
///
/// let response = dispatcher
///     .dispatch(DispatchRequest::new("GET", "/users/7"), ())
///     .unwrap();
/// assert_eq!(response.body().as_ref(), b"user 7");
///
/// let response = dispatcher
///     .dispatch(DispatchRequest::new("GET", "/users/x"), ())
///     .unwrap();
/// assert_eq!(response.status(), StatusCode::NOT_FOUND);
/// ```
pub struct Dispatcher<S = ()> {
    routes: RouteTable<Chain<S>>,
    resolver: MethodResolver,
    normalizer: PathNormalizer,
    binder: ParamBinder<S>,
    before: HookList<BeforeHook<S>>,
    after: HookList<AfterHook<S>>,
    responder: ErrorResponder,
    applied: ApplyRegistry<S>,
    prefixes: Vec<String>,
    request_timeout: Option<Duration>,
}

impl<S: 'static> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::with_compiler(PatternCompiler::default())
    }
}

impl<S: 'static> Dispatcher<S> {
    /// Creates a dispatcher with case-insensitive matching and no base path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher whose templates are compiled by `compiler`.
    pub fn with_compiler(compiler: PatternCompiler) -> Self {
        Self {
            routes: RouteTable::with_compiler(compiler),
            resolver: MethodResolver::default(),
            normalizer: PathNormalizer::default(),
            binder: ParamBinder::new(),
            before: HookList::new(),
            after: HookList::new(),
            responder: ErrorResponder::new(),
            applied: ApplyRegistry::new(),
            prefixes: Vec::new(),
            request_timeout: None,
        }
    }

    /// Creates a dispatcher from validated configuration.
    pub fn from_config(config: &DispatchConfig) -> RouteResult<Self> {
        let routing = &config.routing;
        let compiler = PatternCompiler::new().case_sensitive(routing.case_sensitive);

        let mut normalizer = PathNormalizer::new();
        if let Some(base_url) = &routing.base_url {
            normalizer = normalizer.with_base_url(base_url)?;
        }
        if let Some(stub) = &routing.entry_stub {
            normalizer = normalizer.with_entry_stub(stub.clone());
        }

        let resolver = MethodResolver::new()
            .with_override_header(&routing.method_override_header)?
            .with_override_field(routing.method_override_field.clone());

        info!(
            base_path = %normalizer.base_path(),
            case_sensitive = routing.case_sensitive,
            timeout_ms = ?routing.request_timeout_ms,
            "dispatcher configured"
        );

        Ok(Self::with_compiler(compiler)
            .with_normalizer(normalizer)
            .with_resolver(resolver)
            .with_request_timeout(routing.request_timeout()))
    }

    /// Replaces the path normalizer.
    pub fn with_normalizer(mut self, normalizer: PathNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Replaces the verb resolver.
    pub fn with_resolver(mut self, resolver: MethodResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets the deadline applied to requests that carry none.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the route table.
    pub fn routes(&self) -> &RouteTable<Chain<S>> {
        &self.routes
    }

    /// Returns the error responder.
    pub fn responder(&self) -> &ErrorResponder {
        &self.responder
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Registers a handler chain.
    ///
    /// Every link but the last must be a middleware and the last must be
    /// the terminal handler. If the verb already has a route with the same
    /// template, the earlier route is kept and this one is ignored.
    pub fn register(
        &mut self,
        verbs: impl Into<VerbSelector>,
        template: &str,
        links: Vec<Link<S>>,
    ) -> RouteResult<&mut Self> {
        let template = self.scoped(template);
        let chain = Chain::from_links(&template, links)?;
        self.routes.insert(verbs.into(), &template, chain)?;
        Ok(self)
    }

    /// Registers a handler chain under a combined route string such as
    /// `"GET,POST /posts"` or `"* /ping"`.
    pub fn route(&mut self, route: &str, links: Vec<Link<S>>) -> RouteResult<&mut Self> {
        let (verbs, template) = split_route(route)?;
        self.register(verbs, template, links)
    }

    /// Registers a single handler under a combined route string.
    pub fn on<F>(&mut self, route: &str, handler: F) -> RouteResult<&mut Self>
    where
        F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(route, vec![Link::terminal(handler)])
    }

    /// Registers a `GET` handler.
    pub fn get<F>(&mut self, template: &str, handler: F) -> RouteResult<&mut Self>
    where
        F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::GET, template, vec![Link::terminal(handler)])
    }

    /// Registers a `POST` handler.
    pub fn post<F>(&mut self, template: &str, handler: F) -> RouteResult<&mut Self>
    where
        F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::POST, template, vec![Link::terminal(handler)])
    }

    /// Registers a `PUT` handler.
    pub fn put<F>(&mut self, template: &str, handler: F) -> RouteResult<&mut Self>
    where
        F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::PUT, template, vec![Link::terminal(handler)])
    }

    /// Registers a `PATCH` handler.
    pub fn patch<F>(&mut self, template: &str, handler: F) -> RouteResult<&mut Self>
    where
        F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::PATCH, template, vec![Link::terminal(handler)])
    }

    /// Registers a `DELETE` handler.
    pub fn delete<F>(&mut self, template: &str, handler: F) -> RouteResult<&mut Self>
    where
        F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::DELETE, template, vec![Link::terminal(handler)])
    }

    /// Registers a `HEAD` handler.
    pub fn head<F>(&mut self, template: &str, handler: F) -> RouteResult<&mut Self>
    where
        F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::HEAD, template, vec![Link::terminal(handler)])
    }

    /// Registers a handler in the wildcard bucket, matched by every verb
    /// after the verb's own routes.
    pub fn any<F>(&mut self, template: &str, handler: F) -> RouteResult<&mut Self>
    where
        F: Fn(&mut DispatchContext<S>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(VerbSelector::Any, template, vec![Link::terminal(handler)])
    }

    /// Wraps every route matching `template` with `middleware`.
    ///
    /// Applied middleware run outside the route's own middleware, in
    /// registration order.
    pub fn apply(
        &mut self,
        template: &str,
        middleware: Vec<BoxedMiddleware<S>>,
    ) -> RouteResult<&mut Self> {
        let template = self.scoped(template);
        let pattern = self.routes.compiler().compile(&template)?;
        self.applied.register(pattern, middleware);
        Ok(self)
    }

    /// Registers the binder for `symbol`; a later binder replaces it.
    pub fn bind<F, T>(&mut self, symbol: &str, binder: F) -> &mut Self
    where
        F: Fn(&str, &DispatchContext<S>) -> Result<T, Fault> + Send + Sync + 'static,
        T: Serialize,
    {
        self.binder.bind(symbol, binder);
        self
    }

    /// Adds an observer for `symbol`.
    pub fn filter<F>(&mut self, symbol: &str, filter: F) -> &mut Self
    where
        F: Fn(&str, &DispatchContext<S>) + Send + Sync + 'static,
    {
        self.binder.filter(symbol, filter);
        self
    }

    /// Adds an unconditional before hook.
    pub fn before<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut DispatchContext<S>) -> Result<(), Fault> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    /// Adds a before hook that runs when the regular expression
    /// `expression` matches the normalized path.
    pub fn before_matching<F>(&mut self, expression: &str, hook: F) -> RouteResult<&mut Self>
    where
        F: Fn(&mut DispatchContext<S>) -> Result<(), Fault> + Send + Sync + 'static,
    {
        let expression = self.routes.compiler().compile_expression(expression)?;
        self.before.push_scoped(expression, Arc::new(hook));
        Ok(self)
    }

    /// Adds an unconditional after hook.
    pub fn after<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut DispatchContext<S>, &mut Response) -> Result<(), Fault> + Send + Sync + 'static,
    {
        self.after.push(Arc::new(hook));
        self
    }

    /// Adds an after hook scoped like [`before_matching`](Self::before_matching).
    pub fn after_matching<F>(&mut self, expression: &str, hook: F) -> RouteResult<&mut Self>
    where
        F: Fn(&mut DispatchContext<S>, &mut Response) -> Result<(), Fault> + Send + Sync + 'static,
    {
        let expression = self.routes.compiler().compile_expression(expression)?;
        self.after.push_scoped(expression, Arc::new(hook));
        Ok(self)
    }

    /// Adds an error handler for `status`.
    pub fn on_error<F>(&mut self, status: StatusCode, handler: F) -> &mut Self
    where
        F: Fn(&ErrorContext) -> Option<Response> + Send + Sync + 'static,
    {
        self.responder.register(status, handler);
        self
    }

    /// Registers everything added by `group` under `name/`.
    ///
    /// Groups nest. Templates, `apply` registrations and resources are
    /// prefixed; hook expressions are not.
    pub fn prefix<F>(&mut self, name: &str, group: F) -> RouteResult<&mut Self>
    where
        F: FnOnce(&mut Self) -> RouteResult<()>,
    {
        self.prefixes.push(name.trim_matches('/').to_string());
        let result = group(self);
        self.prefixes.pop();
        result?;
        Ok(self)
    }

    /// Publishes the routes of `resource` under `base`.
    pub fn resource<R>(&mut self, base: &str, resource: R) -> RouteResult<&mut Self>
    where
        R: Resource<S>,
    {
        let base = base.trim_matches('/');
        let resource = Arc::new(resource);

        for action in resource.actions() {
            for (method, suffix) in action.routes() {
                let template = if suffix.is_empty() {
                    base.to_string()
                } else if base.is_empty() {
                    suffix.to_string()
                } else {
                    format!("{base}/{suffix}")
                };

                let target = Arc::clone(&resource);
                self.register(
                    method,
                    &template,
                    vec![Link::terminal(move |ctx: &mut DispatchContext<S>| {
                        target.call(action, ctx)
                    })],
                )?;
            }
        }

        debug!(base = %base, "resource registered");
        Ok(self)
    }

    fn scoped(&self, template: &str) -> String {
        self.prefixes
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(template.trim_matches('/')))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Dispatches one request with the caller's `args`.
    ///
    /// Returns a response for every outcome the error responder handles.
    /// Fatal faults, cancellation and deadline expiry are returned as
    /// [`DispatchError`] for the host to report.
    pub fn dispatch(&self, request: DispatchRequest, args: S) -> Result<Response, DispatchError> {
        let parts = request.into_parts();
        let request_id = parts.request_id.unwrap_or_default();
        let path = self.normalizer.normalize(&parts.path);

        let span = info_span!(
            "dispatch",
            request_id = %request_id,
            http.method = %parts.method,
            http.path = %path,
        );
        let _guard = span.enter();
        let started = Instant::now();

        let method = match self.resolver.resolve(&parts.method, &parts.headers, &parts.fields) {
            Ok(method) => method,
            Err(e) => {
                debug!(error = %e, "verb rejected");
                let ctx = ErrorContext::new(
                    StatusCode::BAD_REQUEST,
                    None,
                    parts.method.as_str(),
                    path,
                    request_id,
                );
                let response = self.responder.respond(&ctx);
                record_dispatch(
                    UNSUPPORTED_METHOD,
                    response.status().as_u16(),
                    started.elapsed(),
                );
                return Ok(response);
            }
        };

        let deadline = parts.deadline.or_else(|| {
            parts
                .timeout
                .or(self.request_timeout)
                .map(|timeout| started + timeout)
        });

        let mut ctx = DispatchContext::new(method.clone(), path, args)
            .with_request_id(request_id)
            .with_headers(parts.headers)
            .with_fields(parts.fields)
            .with_body(parts.body)
            .with_deadline(deadline)
            .with_cancellation(parts.cancel.unwrap_or_else(CancellationToken::new));

        let outcome = self.run(&mut ctx);
        let response = match outcome {
            Ok(response) => response,
            Err(Halt::Fault(Fault::Abort { status, message })) => {
                let error_ctx = ErrorContext::new(
                    status,
                    message,
                    method.as_str(),
                    ctx.path(),
                    request_id,
                );
                self.responder.respond(&error_ctx)
            }
            Err(Halt::Fault(Fault::Fatal(e))) => {
                error!(error = %e, route = ?ctx.route(), "handler failed");
                record_failure(method.as_str(), "handler");
                return Err(DispatchError::Handler(e));
            }
            Err(Halt::Stopped(e)) => {
                warn!(error = %e, route = ?ctx.route(), "dispatch stopped");
                let kind = match &e {
                    DispatchError::Cancelled => "cancelled",
                    _ => "deadline",
                };
                record_failure(method.as_str(), kind);
                return Err(e);
            }
        };

        let response = if method == Method::HEAD {
            strip_body(response)
        } else {
            response
        };

        let elapsed = started.elapsed();
        record_dispatch(method.as_str(), response.status().as_u16(), elapsed);
        debug!(
            http.status_code = response.status().as_u16(),
            duration_ms = duration_ms(elapsed),
            "dispatch complete"
        );

        Ok(response)
    }

    fn run(&self, ctx: &mut DispatchContext<S>) -> Result<Response, Halt> {
        checkpoint(ctx)?;

        let path = ctx.path().to_string();
        let Some(found) = self.routes.lookup(ctx.method(), &path) else {
            debug!("no route matched");
            return Err(Halt::Fault(Fault::not_found()));
        };

        let template = found.template();
        let chain = found.payload();
        debug!(route = %template, wildcard = found.is_wildcard(), "route matched");
        ctx.set_match(template, found.into_params());

        self.binder.run_filters(ctx);
        self.binder.apply(ctx)?;
        checkpoint(ctx)?;

        for hook in self.before.matching(&path) {
            hook(ctx)?;
        }

        let outer = self.applied.collect_for(&path);
        let mut response = chain.invoke(&outer, ctx).map_err(|fault| {
            if let Fault::Abort { status, .. } = &fault {
                warn!(status = status.as_u16(), "request aborted");
            }
            fault
        })?;
        checkpoint(ctx)?;

        for hook in self.after.matching(&path) {
            hook(ctx, &mut response)?;
        }

        Ok(response)
    }
}

fn checkpoint<S>(ctx: &DispatchContext<S>) -> Result<(), Halt> {
    if ctx.is_cancelled() {
        return Err(Halt::Stopped(DispatchError::Cancelled));
    }
    if ctx.is_expired() {
        return Err(Halt::Stopped(DispatchError::DeadlineExceeded {
            elapsed: ctx.elapsed(),
        }));
    }
    Ok(())
}

fn strip_body(response: Response) -> Response {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Bytes::new())
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

impl<S: 'static> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .field("before_hooks", &self.before.len())
            .field("after_hooks", &self.after.len())
            .field("applied", &self.applied.len())
            .field("responder", &self.responder)
            .field("base_path", &self.normalizer.base_path())
            .finish_non_exhaustive()
    }
}
