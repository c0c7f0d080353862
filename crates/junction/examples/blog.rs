//! A small blog router driven through the in-memory test client.
//!
//! Run with `cargo run -p junction --example blog`.

use http::StatusCode;
use junction::prelude::*;
use junction_test::TestClient;

struct Posts;

impl Resource for Posts {
    fn actions(&self) -> Vec<ResourceAction> {
        vec![ResourceAction::Index, ResourceAction::Show]
    }

    fn index(&self, _ctx: &mut DispatchContext) -> HandlerResult {
        response::json(&["hello-world", "second-post"])
    }

    fn show(&self, ctx: &mut DispatchContext) -> HandlerResult {
        match ctx.params().get_str("id") {
            Some(slug @ ("hello-world" | "second-post")) => {
                Ok(response::html(format!("<h1>{slug}</h1>")))
            }
            _ => Err(Fault::abort_with(StatusCode::NOT_FOUND, "no such post")),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::new()
        .with_development()
        .with_env_prefix("JUNCTION")
        .load()?;
    init_logging(&config.logging)?;

    let mut dispatcher = Dispatcher::from_config(&config)?;
    dispatcher
        .resource("posts", Posts)?
        .before_matching("^admin", |ctx: &mut DispatchContext| {
            if ctx.header_str("x-role") == Some("admin") {
                Ok(())
            } else {
                Err(Fault::abort(StatusCode::FORBIDDEN))
            }
        })?
        .get("admin", |_: &mut DispatchContext| Ok(response::text("dashboard")))?
        .on_error(StatusCode::NOT_FOUND, |ctx| {
            Some(response::html(format!(
                "<p>{}: {}</p>",
                ctx.path(),
                ctx.reason()
            )))
        });

    let client = TestClient::new(dispatcher);
    for path in ["/posts", "/posts/hello-world", "/posts/missing", "/admin"] {
        let response = client.get(path).send()?;
        println!("GET {path} -> {} {}", response.status(), response.text()?);
    }

    Ok(())
}
