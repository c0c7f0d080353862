//! End-to-end dispatch behavior.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use http::StatusCode;
use junction_core::{response, DispatchContext, DispatchError, Fault, HandlerResult, Response};
use junction_dispatch::{DispatchRequest, Dispatcher, Resource, ResourceAction};
use junction_middleware::{from_fn, BoxedMiddleware, Gate, Link, Next};
use tokio_util::sync::CancellationToken;

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(ctx: &DispatchContext<Log>, event: impl Into<String>) {
    ctx.args().lock().unwrap().push(event.into());
}

fn events(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn text(body: &'static str) -> impl Fn(&mut DispatchContext<Log>) -> HandlerResult {
    move |ctx| {
        record(ctx, "handler");
        Ok(response::text(body))
    }
}

fn send(dispatcher: &Dispatcher<Log>, method: &str, path: &str, log: &Log) -> Response {
    dispatcher
        .dispatch(DispatchRequest::new(method, path), Arc::clone(log))
        .unwrap()
}

#[test]
fn routes_by_verb_then_wildcard() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .get("users/:id", |ctx: &mut DispatchContext<Log>| {
            Ok(response::text(format!(
                "H1 {}",
                ctx.params().get_str("id").unwrap_or_default()
            )))
        })
        .unwrap()
        .any("ping", |_: &mut DispatchContext<Log>| Ok(response::text("H2")))
        .unwrap();

    let log = log();
    assert_eq!(send(&dispatcher, "GET", "/users/7", &log).body().as_ref(), b"H1 7");
    assert_eq!(send(&dispatcher, "DELETE", "/ping", &log).body().as_ref(), b"H2");
    assert_eq!(
        send(&dispatcher, "POST", "/users/7", &log).status(),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn verb_bucket_wins_over_wildcard() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.any("item", text("any")).unwrap();
    dispatcher.put("item", text("put")).unwrap();

    let log = log();
    assert_eq!(send(&dispatcher, "PUT", "item", &log).body().as_ref(), b"put");
    assert_eq!(send(&dispatcher, "PATCH", "item", &log).body().as_ref(), b"any");
}

#[test]
fn first_matching_route_wins() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.get("posts/:slug", text("slug")).unwrap();
    dispatcher.get("posts/new", text("new")).unwrap();

    let log = log();
    assert_eq!(send(&dispatcher, "GET", "posts/new", &log).body().as_ref(), b"slug");
}

#[test]
fn duplicate_registration_keeps_first() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.get("about", text("first")).unwrap();
    dispatcher.get("about", text("second")).unwrap();

    let log = log();
    assert_eq!(dispatcher.routes().len(), 1);
    assert_eq!(send(&dispatcher, "GET", "about", &log).body().as_ref(), b"first");
}

#[test]
fn combined_route_strings() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.on("GET,POST /form", text("form")).unwrap();
    dispatcher.on("* /health", text("ok")).unwrap();

    let log = log();
    assert_eq!(send(&dispatcher, "POST", "form", &log).status(), StatusCode::OK);
    assert_eq!(send(&dispatcher, "PUT", "form", &log).status(), StatusCode::NOT_FOUND);
    assert_eq!(send(&dispatcher, "HEAD", "health", &log).status(), StatusCode::OK);
    assert!(dispatcher.on("BREW /coffee", text("no")).is_err());
}

#[test]
fn binder_delivers_number() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .bind("id", |raw, _| raw.parse::<i64>().map_err(|_| Fault::not_found()))
        .get("item/:id", |ctx: &mut DispatchContext<Log>| {
            let id = ctx.param("id").cloned().unwrap_or_default();
            assert!(id.is_number());
            Ok(response::text(format!("{}", id.as_i64().unwrap_or(-1) + 1)))
        })
        .unwrap();

    let log = log();
    assert_eq!(send(&dispatcher, "GET", "/item/42", &log).body().as_ref(), b"43");
    assert_eq!(
        send(&dispatcher, "GET", "/item/forty-two", &log).status(),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn derived_binding_reads_earlier_symbol() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .bind("author", |raw, _| Ok(raw.to_uppercase()))
        .bind("title", |raw, ctx| {
            Ok(format!(
                "{raw} by {}",
                ctx.params().get_str("author").unwrap_or_default()
            ))
        })
        .get(":author/:title", |ctx: &mut DispatchContext<Log>| {
            Ok(response::text(
                ctx.params().get_str("title").unwrap_or_default().to_string(),
            ))
        })
        .unwrap();

    let log = log();
    assert_eq!(
        send(&dispatcher, "GET", "ada/notes", &log).body().as_ref(),
        b"notes by ADA"
    );
}

#[test]
fn filters_observe_in_order_without_side_effects_on_values() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .filter("slug", |raw, ctx: &DispatchContext<Log>| record(ctx, format!("f1:{raw}")))
        .filter("slug", |raw, ctx: &DispatchContext<Log>| record(ctx, format!("f2:{raw}")))
        .get("blog/:slug", |ctx: &mut DispatchContext<Log>| {
            let slug = ctx.params().get_str("slug").unwrap_or_default().to_string();
            record(ctx, format!("handler:{slug}"));
            Ok(response::text(slug))
        })
        .unwrap();

    let log = log();
    let response = send(&dispatcher, "GET", "blog/hello", &log);
    assert_eq!(response.body().as_ref(), b"hello");
    assert_eq!(events(&log), vec!["f1:hello", "f2:hello", "handler:hello"]);
}

#[test]
fn captured_values_are_percent_decoded() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .get("tag/:name", |ctx: &mut DispatchContext<Log>| {
            Ok(response::text(
                ctx.params().get_str("name").unwrap_or_default().to_string(),
            ))
        })
        .unwrap();

    let log = log();
    assert_eq!(
        send(&dispatcher, "GET", "/tag/rust%20lang?sort=asc", &log).body().as_ref(),
        b"rust lang"
    );
}

#[test]
fn post_override_header_and_field() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.put("posts/:id", text("updated")).unwrap();
    dispatcher.post("posts/:id", text("posted")).unwrap();

    let by_header = dispatcher
        .dispatch(
            DispatchRequest::new("POST", "posts/1").header("X-HTTP-Method-Override", "put"),
            log(),
        )
        .unwrap();
    assert_eq!(by_header.body().as_ref(), b"updated");

    let by_field = dispatcher
        .dispatch(
            DispatchRequest::new("POST", "posts/1").form_field("_method", "PUT"),
            log(),
        )
        .unwrap();
    assert_eq!(by_field.body().as_ref(), b"updated");

    let plain = dispatcher
        .dispatch(DispatchRequest::new("POST", "posts/1"), log())
        .unwrap();
    assert_eq!(plain.body().as_ref(), b"posted");

    let ignored_on_get = dispatcher
        .dispatch(
            DispatchRequest::new("GET", "posts/1").form_field("_method", "PUT"),
            log(),
        )
        .unwrap();
    assert_eq!(ignored_on_get.status(), StatusCode::NOT_FOUND);
}

#[test]
fn bad_override_is_bad_request() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.post("posts", text("posted")).unwrap();

    let response = dispatcher
        .dispatch(
            DispatchRequest::new("POST", "posts").form_field("_method", "OPTIONS"),
            log(),
        )
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn not_found_uses_registered_handlers() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .on_error(StatusCode::NOT_FOUND, |_| Some(response::text("first")))
        .on_error(StatusCode::NOT_FOUND, |ctx| {
            Some(response::html(format!("<p>{} missing</p>", ctx.path())))
        });

    let log = log();
    let response = send(&dispatcher, "GET", "/nowhere", &log);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.body().as_ref(), b"<p>nowhere missing</p>");
}

#[test]
fn not_found_default_body() {
    let dispatcher: Dispatcher<Log> = Dispatcher::new();
    let log = log();
    let response = send(&dispatcher, "GET", "/nowhere", &log);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.body().starts_with(b"404 "));
}

#[test]
fn not_found_skips_hooks() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .before(|ctx: &mut DispatchContext<Log>| {
            record(ctx, "before");
            Ok(())
        })
        .after(|ctx: &mut DispatchContext<Log>, _| {
            record(ctx, "after");
            Ok(())
        });

    let log = log();
    send(&dispatcher, "GET", "/nowhere", &log);
    assert!(events(&log).is_empty());
}

#[test]
fn hooks_run_scoped_then_global() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .before(|ctx: &mut DispatchContext<Log>| {
            record(ctx, "before:global");
            Ok(())
        })
        .before_matching("^admin", |ctx: &mut DispatchContext<Log>| {
            record(ctx, "before:admin");
            Ok(())
        })
        .unwrap()
        .after(|ctx: &mut DispatchContext<Log>, _| {
            record(ctx, "after:global");
            Ok(())
        })
        .after_matching("^admin", |ctx: &mut DispatchContext<Log>, response| {
            record(ctx, "after:admin");
            response
                .headers_mut()
                .insert("x-admin", http::HeaderValue::from_static("1"));
            Ok(())
        })
        .unwrap()
        .get("admin/panel", text("panel"))
        .unwrap()
        .get("home", text("home"))
        .unwrap();

    let log = log();
    let response = send(&dispatcher, "GET", "admin/panel", &log);
    assert_eq!(response.headers().get("x-admin").unwrap(), "1");
    assert_eq!(
        events(&log),
        vec![
            "before:admin",
            "before:global",
            "handler",
            "after:admin",
            "after:global"
        ]
    );

    let log = self::log();
    send(&dispatcher, "GET", "home", &log);
    assert_eq!(events(&log), vec!["before:global", "handler", "after:global"]);
}

#[test]
fn before_hook_abort_is_terminal() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .before(|_: &mut DispatchContext<Log>| Err(Fault::abort_with(StatusCode::UNAUTHORIZED, "login first")))
        .after(|ctx: &mut DispatchContext<Log>, _| {
            record(ctx, "after");
            Ok(())
        })
        .get("secret", text("secret"))
        .unwrap();

    let log = log();
    let response = send(&dispatcher, "GET", "secret", &log);
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.body().as_ref(), b"401 login first");
    assert!(events(&log).is_empty());
}

#[test]
fn middleware_short_circuit_skips_handler() {
    let refuse = from_fn("refuse", |_: &mut DispatchContext<Log>, _: Next<'_, Log>| {
        Ok(response::text_with_status(StatusCode::IM_A_TEAPOT, "M"))
    });

    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(
            http::Method::GET,
            "secure",
            vec![Link::middleware(refuse), Link::terminal(text("T"))],
        )
        .unwrap();

    let log = log();
    let response = send(&dispatcher, "GET", "secure", &log);
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.body().as_ref(), b"M");
    assert!(events(&log).is_empty());
}

#[test]
fn applied_middleware_wrap_route_middleware() {
    fn tag(name: &'static str) -> impl junction_middleware::Middleware<Log> {
        from_fn(name, move |ctx: &mut DispatchContext<Log>, next: Next<'_, Log>| {
            record(ctx, format!("{name}:in"));
            let response = next.run(ctx);
            record(ctx, format!("{name}:out"));
            response
        })
    }

    let outer: BoxedMiddleware<Log> = Arc::new(tag("applied"));
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .apply("account/*", vec![outer])
        .unwrap()
        .register(
            http::Method::GET,
            "account/settings",
            vec![Link::middleware(tag("route")), Link::terminal(text("settings"))],
        )
        .unwrap()
        .get("other", text("other"))
        .unwrap();

    let log = log();
    send(&dispatcher, "GET", "account/settings", &log);
    assert_eq!(
        events(&log),
        vec!["applied:in", "route:in", "handler", "route:out", "applied:out"]
    );

    let log = self::log();
    send(&dispatcher, "GET", "other", &log);
    assert_eq!(events(&log), vec!["handler"]);
}

#[test]
fn gate_abort_goes_to_error_responder() {
    let gate = Gate::new("admins", |ctx: &DispatchContext<Log>| {
        ctx.header_str("x-role") == Some("admin")
    });

    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(
            http::Method::GET,
            "admin",
            vec![Link::middleware(gate), Link::terminal(text("welcome"))],
        )
        .unwrap()
        .on_error(StatusCode::FORBIDDEN, |_| Some(response::text("go away")));

    let refused = dispatcher
        .dispatch(DispatchRequest::new("GET", "admin"), log())
        .unwrap();
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);
    assert_eq!(refused.body().as_ref(), b"go away");

    let allowed = dispatcher
        .dispatch(
            DispatchRequest::new("GET", "admin").header("x-role", "admin"),
            log(),
        )
        .unwrap();
    assert_eq!(allowed.body().as_ref(), b"welcome");
}

#[test]
fn malformed_chains_are_rejected() {
    let mw = from_fn("noop", |ctx: &mut DispatchContext<Log>, next: Next<'_, Log>| next.run(ctx));

    let mut dispatcher = Dispatcher::new();
    assert!(dispatcher
        .register(http::Method::GET, "a", Vec::new())
        .is_err());
    assert!(dispatcher
        .register(http::Method::GET, "b", vec![Link::middleware(mw)])
        .is_err());
    assert!(dispatcher
        .register(
            http::Method::GET,
            "c",
            vec![Link::terminal(text("x")), Link::terminal(text("y"))]
        )
        .is_err());
    assert!(dispatcher.routes().is_empty());
}

#[test]
fn fatal_faults_reach_the_host() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .get("broken", |_: &mut DispatchContext<Log>| {
            Err(Fault::fatal(anyhow::anyhow!("database unavailable")))
        })
        .unwrap()
        .after(|ctx: &mut DispatchContext<Log>, _| {
            record(ctx, "after");
            Ok(())
        });

    let log = log();
    let err = dispatcher
        .dispatch(DispatchRequest::new("GET", "broken"), Arc::clone(&log))
        .unwrap_err();
    assert!(matches!(err, DispatchError::Handler(_)));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(events(&log).is_empty());
}

#[test]
fn head_requests_drop_the_body() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.any("doc", text("content")).unwrap();

    let log = log();
    let response = send(&dispatcher, "HEAD", "doc", &log);
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.body().is_empty());
}

#[test]
fn deadline_is_enforced_between_stages() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .get("slow", |ctx: &mut DispatchContext<Log>| {
            thread::sleep(Duration::from_millis(30));
            record(ctx, "handler");
            Ok(response::text("late"))
        })
        .unwrap();

    let err = dispatcher
        .dispatch(
            DispatchRequest::new("GET", "slow").timeout(Duration::from_millis(5)),
            log(),
        )
        .unwrap_err();
    assert!(matches!(err, DispatchError::DeadlineExceeded { .. }));

    let err = dispatcher
        .dispatch(
            DispatchRequest::new("GET", "slow").deadline(Instant::now()),
            log(),
        )
        .unwrap_err();
    assert!(matches!(err, DispatchError::DeadlineExceeded { .. }));
}

#[test]
fn default_timeout_applies() {
    let mut dispatcher = Dispatcher::new().with_request_timeout(Some(Duration::from_millis(5)));
    dispatcher
        .get("slow", |_: &mut DispatchContext<Log>| {
            thread::sleep(Duration::from_millis(30));
            Ok(response::text("late"))
        })
        .unwrap();

    let err = dispatcher
        .dispatch(DispatchRequest::new("GET", "slow"), log())
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
}

#[test]
fn cancellation_stops_dispatch() {
    let token = CancellationToken::new();
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .get("job", |ctx: &mut DispatchContext<Log>| {
            ctx.cancellation_token().cancel();
            Ok(response::text("done"))
        })
        .unwrap();

    let err = dispatcher
        .dispatch(
            DispatchRequest::new("GET", "job").cancellation(token.clone()),
            log(),
        )
        .unwrap_err();
    assert!(matches!(err, DispatchError::Cancelled));
    assert!(token.is_cancelled());

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let err = dispatcher
        .dispatch(DispatchRequest::new("GET", "job").cancellation(cancelled), log())
        .unwrap_err();
    assert!(matches!(err, DispatchError::Cancelled));
}

#[test]
fn request_state_does_not_leak_between_dispatches() {
    #[derive(Clone, Debug, PartialEq)]
    struct Seen(String);

    let mut dispatcher = Dispatcher::new();
    dispatcher
        .before(|ctx: &mut DispatchContext<Log>| {
            if ctx.extensions().get::<Seen>().is_some() {
                return Err(Fault::fatal(anyhow::anyhow!("stale extension")));
            }
            let path = ctx.path().to_string();
            ctx.extensions_mut().insert(Seen(path));
            Ok(())
        })
        .get(":page", |ctx: &mut DispatchContext<Log>| {
            let seen = ctx.extensions().get::<Seen>().cloned();
            Ok(response::text(seen.map(|s| s.0).unwrap_or_default()))
        })
        .unwrap();

    let log = log();
    assert_eq!(send(&dispatcher, "GET", "one", &log).body().as_ref(), b"one");
    assert_eq!(send(&dispatcher, "GET", "two", &log).body().as_ref(), b"two");
}

#[test]
fn shared_across_threads() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .bind("n", |raw, _| raw.parse::<u32>().map_err(|_| Fault::not_found()))
        .get("double/:n", |ctx: &mut DispatchContext<Log>| {
            let n = ctx.params().get_i64("n").unwrap_or_default();
            Ok(response::text((n * 2).to_string()))
        })
        .unwrap();
    let dispatcher = Arc::new(dispatcher);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                let response = dispatcher
                    .dispatch(DispatchRequest::new("GET", format!("double/{i}")), log())
                    .unwrap();
                String::from_utf8(response.body().to_vec()).unwrap()
            })
        })
        .collect();

    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let expected: Vec<String> = (0..8).map(|i| (i * 2).to_string()).collect();
    assert_eq!(results, expected);
}

struct Posts;

impl Resource<Log> for Posts {
    fn actions(&self) -> Vec<ResourceAction> {
        vec![
            ResourceAction::Index,
            ResourceAction::New,
            ResourceAction::Show,
            ResourceAction::Update,
        ]
    }

    fn index(&self, _ctx: &mut DispatchContext<Log>) -> HandlerResult {
        Ok(response::text("index"))
    }

    fn new(&self, _ctx: &mut DispatchContext<Log>) -> HandlerResult {
        Ok(response::text("new"))
    }

    fn show(&self, ctx: &mut DispatchContext<Log>) -> HandlerResult {
        Ok(response::text(format!(
            "show {}",
            ctx.params().get_str("id").unwrap_or_default()
        )))
    }

    fn update(&self, ctx: &mut DispatchContext<Log>) -> HandlerResult {
        Ok(response::text(format!(
            "update {}",
            ctx.params().get_str("id").unwrap_or_default()
        )))
    }
}

#[test]
fn resource_publishes_selected_actions() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .prefix("api", |d| {
            d.resource("posts", Posts)?;
            Ok(())
        })
        .unwrap();

    let log = log();
    assert_eq!(send(&dispatcher, "GET", "api/posts", &log).body().as_ref(), b"index");
    assert_eq!(send(&dispatcher, "GET", "api/posts/index", &log).body().as_ref(), b"index");
    assert_eq!(send(&dispatcher, "GET", "api/posts/new", &log).body().as_ref(), b"new");
    assert_eq!(send(&dispatcher, "GET", "api/posts/5", &log).body().as_ref(), b"show 5");
    assert_eq!(send(&dispatcher, "PUT", "api/posts/5", &log).body().as_ref(), b"update 5");
    assert_eq!(
        send(&dispatcher, "DELETE", "api/posts/5", &log).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        send(&dispatcher, "POST", "api/posts", &log).status(),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn handler_abort_with_message() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .get("quota", |_: &mut DispatchContext<Log>| {
            Err(Fault::abort_with(StatusCode::TOO_MANY_REQUESTS, "slow down"))
        })
        .unwrap()
        .on_error(StatusCode::TOO_MANY_REQUESTS, |ctx| {
            Some(response::text(format!("custom: {}", ctx.message().unwrap_or(""))))
        });

    let log = log();
    let response = send(&dispatcher, "GET", "quota", &log);
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.body().as_ref(), b"custom: slow down");
}

#[test]
fn redirect_helper_through_dispatch() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .get("old", |_: &mut DispatchContext<Log>| {
            response::redirect("/new", StatusCode::FOUND)
        })
        .unwrap();

    let log = log();
    let response = send(&dispatcher, "GET", "old", &log);
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get("location").unwrap(), "/new");
}
