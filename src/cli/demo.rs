use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::app::App;
use crate::config::AppConfig;
use crate::handler::{Handler, NativeHandler, SharedError};
use crate::operation::{description, summary};
use crate::server::Context;
use crate::Bind;

/// Input of the `ping` operation: parameters plus a JSON body.
#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
pub struct PingInput {
    #[bind(header = "X-Header-1")]
    pub header1: String,
    #[bind(path = "path1")]
    pub path1: String,
    #[bind(query = "query1")]
    pub query1: String,
    #[bind(validate = "required")]
    pub body_string: String,
    pub body_number: Option<serde_json::Number>,
    pub body_nested: HashMap<String, Value>,
}

/// Echo of everything bound into [`PingInput`].
#[derive(Debug, Serialize)]
pub struct PingOutput {
    #[serde(rename = "X-Header-1")]
    pub header1: String,
    pub path1: String,
    pub query1: String,
    pub body_string: String,
    pub body_number: Option<serde_json::Number>,
    pub body_nested: HashMap<String, Value>,
}

fn ping_pong(_ctx: &mut Context, input: PingInput) -> anyhow::Result<PingOutput> {
    Ok(PingOutput {
        header1: input.header1,
        path1: input.path1,
        query1: input.query1,
        body_string: input.body_string,
        body_number: input.body_number,
        body_nested: input.body_nested,
    })
}

/// The demo application: `POST /api/ping/:path1`, `GET /hello` and the
/// document route from `config`.
///
/// # Errors
///
/// Fails if a route cannot be registered.
pub fn demo_app(config: &AppConfig) -> anyhow::Result<App> {
    let mut app = App::from_config(config);
    app.group("api", "api", "API routes").post(
        "ping/:path1",
        Handler::new(
            ping_pong,
            200,
            vec![summary("this is a summary"), description("ping pong")],
        ),
    )?;

    let docs = app.openapi(config.openapi.clone(), config.docs.format);
    let hello: NativeHandler = Arc::new(|ctx: &mut Context| -> Result<(), SharedError> {
        ctx.text(200, "hello");
        Ok(())
    });
    app.root()
        .handle_raw(&config.docs.path, Method::GET, vec![docs])
        .handle_raw("hello", Method::GET, vec![hello]);
    Ok(app)
}
