mod common;

use bindery::hooks::{
    default_bind_body, default_bind_header, default_bind_path, default_bind_query, InputTarget,
};
use bindery::operation::{operation_from_context, summary};
use bindery::{
    register_validation, App, Bind, BindError, Context, Handler, Hooks, NativeHandler, SharedError,
};
use common::requests::{get, json_body, request};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct EchoInput {
    #[serde(skip)]
    #[bind(path = "p1")]
    p1: String,
    #[serde(skip)]
    #[bind(query = "q1")]
    q1: String,
}

#[derive(Debug, Serialize)]
struct EchoOutput {
    p1: String,
    q1: String,
}

fn echo(_ctx: &mut Context, input: EchoInput) -> anyhow::Result<EchoOutput> {
    Ok(EchoOutput {
        p1: input.p1,
        q1: input.q1,
    })
}

#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct StrictInput {
    #[serde(skip)]
    #[bind(query = "q1,required")]
    q1: String,
}

fn strict(_ctx: &mut Context, input: StrictInput) -> anyhow::Result<String> {
    Ok(input.q1)
}

#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct Signup {
    #[bind(validate = "required,email")]
    email: String,
    #[bind(validate = "min=3,max=8")]
    name: String,
}

fn signup(_ctx: &mut Context, input: Signup) -> anyhow::Result<String> {
    Ok(input.name)
}

fn failing(_ctx: &mut Context) -> anyhow::Result<()> {
    anyhow::bail!("storage offline")
}

#[test]
fn test_typed_handler_renders_output() {
    let mut app = App::new();
    app.root()
        .get("/echo/:p1", Handler::new(echo, 200, vec![summary("echo")]))
        .unwrap();

    let ctx = app.dispatch(get("/echo/abc?q1=xyz"));
    assert_eq!(ctx.response_status(), 200);
    assert_eq!(json_body(&ctx), json!({"p1": "abc", "q1": "xyz"}));
    assert!(ctx.errors().is_empty());
}

#[test]
fn test_missing_required_query_uses_error_status() {
    let mut app = App::with_hooks(Hooks::default().with_error_status(422));
    app.root()
        .get("/strict", Handler::new(strict, 200, vec![]))
        .unwrap();

    let ctx = app.dispatch(get("/strict"));
    assert_eq!(ctx.response_status(), 422);
    let body = json_body(&ctx);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("missing query parameter: q1"));
    assert_eq!(ctx.errors().len(), 1);
    assert!(ctx.errors()[0].downcast_ref::<BindError>().is_some());
}

#[test]
fn test_handler_error_is_recorded_and_rendered() {
    let mut app = App::new();
    app.root()
        .delete("/things", Handler::new(failing, 204, vec![]))
        .unwrap();

    let ctx = app.dispatch(request(Method::DELETE, "/things", &[], ""));
    assert_eq!(ctx.response_status(), 400);
    assert_eq!(json_body(&ctx), json!({"error": "storage offline"}));
    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(ctx.errors()[0].to_string(), "storage offline");
}

#[test]
fn test_unit_output_renders_empty_body() {
    fn ok(_ctx: &mut Context) -> anyhow::Result<()> {
        Ok(())
    }
    let mut app = App::new();
    app.root().put("/noop", Handler::new(ok, 204, vec![])).unwrap();

    let ctx = app.dispatch(request(Method::PUT, "/noop", &[], ""));
    assert_eq!(ctx.response_status(), 204);
    assert!(ctx.response_body().is_empty());
}

#[test]
fn test_validation_errors_are_exposed() {
    let mut app = App::new();
    app.root()
        .post("/signup", Handler::new(signup, 201, vec![]))
        .unwrap();

    let ctx = app.dispatch(request(
        Method::POST,
        "/signup",
        &[],
        r#"{"email": "not-an-email", "name": "ab"}"#,
    ));
    assert_eq!(ctx.response_status(), 400);
    let err = ctx.errors()[0].downcast_ref::<BindError>().unwrap();
    let failures = err.validation_errors().unwrap();
    let tags: Vec<&str> = failures.iter().map(|f| f.tag.as_str()).collect();
    assert_eq!(tags, ["email", "min"]);
    assert_eq!(failures.errors()[1].namespace, "Signup.name");

    let ctx = app.dispatch(request(
        Method::POST,
        "/signup",
        &[],
        r#"{"email": "a@b.io", "name": "alice"}"#,
    ));
    assert_eq!(ctx.response_status(), 201);
    assert_eq!(json_body(&ctx), json!("alice"));
}

#[test]
fn test_malformed_body_is_a_bind_error() {
    let mut app = App::new();
    app.root()
        .post("/signup", Handler::new(signup, 201, vec![]))
        .unwrap();

    let ctx = app.dispatch(request(Method::POST, "/signup", &[], "{"));
    assert_eq!(ctx.response_status(), 400);
    let err = ctx.errors()[0].downcast_ref::<BindError>().unwrap();
    assert_eq!(err.type_name(), Some("Signup"));
    assert!(err.to_string().contains("error parsing request body"));
}

#[test]
fn test_custom_hooks_replace_stages() {
    let executed = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&executed);
    let hooks = Hooks::default()
        .with_exec(move |ctx, handler, name| {
            seen.lock().unwrap().push(name.to_string());
            handler(ctx)
        })
        .with_render(|ctx, status, payload| {
            let body = json!({ "data": payload });
            ctx.json(status, &body).unwrap();
        })
        .with_error(|_ctx, err| (503, json!({ "message": err.to_string() })));

    let mut app = App::with_hooks(hooks);
    app.root()
        .get("/echo/:p1", Handler::new(echo, 200, vec![]))
        .unwrap()
        .get("/fail", Handler::new(failing, 200, vec![]))
        .unwrap();

    let ctx = app.dispatch(get("/echo/a?q1=b"));
    assert_eq!(json_body(&ctx), json!({"data": {"p1": "a", "q1": "b"}}));

    let ctx = app.dispatch(get("/fail"));
    assert_eq!(ctx.response_status(), 503);
    assert_eq!(
        json_body(&ctx),
        json!({"data": {"message": "storage offline"}})
    );
    assert_eq!(*executed.lock().unwrap(), ["echo", "failing"]);
}

#[test]
fn test_custom_query_hook() {
    let hooks = Hooks::default().with_bind_query(|_ctx, _input| Ok(()));
    let mut app = App::with_hooks(hooks);
    app.root()
        .get("/echo/:p1", Handler::new(echo, 200, vec![]))
        .unwrap();

    let ctx = app.dispatch(get("/echo/a?q1=ignored"));
    assert_eq!(json_body(&ctx), json!({"p1": "a", "q1": ""}));
}

#[test]
fn test_operation_is_available_to_handlers() {
    fn whoami(ctx: &mut Context) -> anyhow::Result<String> {
        Ok(operation_from_context(ctx)?.id.clone())
    }
    let mut app = App::new();
    app.group("users", "users", "")
        .get("me", Handler::new(whoami, 200, vec![bindery::operation::id("whoami")]))
        .unwrap();

    let ctx = app.dispatch(get("/users/me"));
    assert_eq!(json_body(&ctx), json!("whoami"));

    let ctx = Context::new(get("/"));
    assert_eq!(
        operation_from_context(&ctx).unwrap_err().to_string(),
        "operation not found"
    );
}

#[test]
fn test_middleware_short_circuits() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let guard: NativeHandler = Arc::new(move |ctx: &mut Context| -> Result<(), SharedError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if ctx.headers().get("X-Token").is_none() {
            ctx.text(401, "unauthorized");
        }
        Ok(())
    });

    let mut app = App::new();
    let mut api = app.group("api", "api", "");
    api.use_middleware(guard);
    api.get("/echo/:p1", Handler::new(echo, 200, vec![])).unwrap();

    let ctx = app.dispatch(get("/api/echo/x"));
    assert_eq!(ctx.response_status(), 401);
    assert_eq!(ctx.response_body(), b"unauthorized");

    let ctx = app.dispatch(request(Method::GET, "/api/echo/x", &[("X-Token", "t")], ""));
    assert_eq!(ctx.response_status(), 200);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_middleware_error_stops_chain() {
    let failing_mw: NativeHandler = Arc::new(|_ctx: &mut Context| -> Result<(), SharedError> {
        Err(Arc::new(anyhow::anyhow!("denied")))
    });
    let mut app = App::new();
    app.root()
        .handle(
            "/echo/:p1",
            Method::GET,
            Handler::new(echo, 200, vec![]),
            vec![failing_mw],
        )
        .unwrap();

    let ctx = app.dispatch(get("/echo/x"));
    assert_eq!(ctx.response_status(), 500);
    assert_eq!(json_body(&ctx), json!({"error": "denied"}));
}

#[test]
fn test_closure_handlers() {
    let prefix = String::from("hi ");
    let greet = move |_ctx: &mut Context, input: EchoInput| -> anyhow::Result<String> {
        Ok(format!("{}{}", prefix, input.p1))
    };
    let mut app = App::new();
    app.root()
        .get("/greet/:p1", Handler::new(greet, 200, vec![]))
        .unwrap();

    let ctx = app.dispatch(get("/greet/bob"));
    assert_eq!(json_body(&ctx), json!("hi bob"));
}

type StageLog = Arc<Mutex<Vec<&'static str>>>;
type BindFn = fn(&mut Context, &mut dyn InputTarget) -> anyhow::Result<()>;

fn recording(
    log: &StageLog,
    stage: &'static str,
    hook: BindFn,
) -> impl Fn(&mut Context, &mut dyn InputTarget) -> anyhow::Result<()> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |ctx: &mut Context, input: &mut dyn InputTarget| {
        log.lock().unwrap().push(stage);
        hook(ctx, input)
    }
}

#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct Staged {
    #[bind(query = "name", validate = "stage_order")]
    name: String,
    #[serde(skip)]
    #[bind(path = "id")]
    id: String,
    #[serde(skip)]
    #[bind(header = "X-Trace")]
    trace: String,
}

#[test]
fn test_stages_run_in_order() {
    let log: StageLog = Arc::new(Mutex::new(Vec::new()));
    let validated = Arc::clone(&log);
    register_validation("stage_order", move |_fl| {
        validated.lock().unwrap().push("validate");
        true
    })
    .unwrap();

    let hooks = Hooks::default()
        .with_bind_body(recording(&log, "body", default_bind_body))
        .with_bind_query(recording(&log, "query", default_bind_query))
        .with_bind_path(recording(&log, "path", default_bind_path))
        .with_bind_header(recording(&log, "header", default_bind_header));
    let invoked = Arc::clone(&log);
    let handler = move |_ctx: &mut Context, input: Staged| -> anyhow::Result<EchoOutput> {
        invoked.lock().unwrap().push("invoke");
        Ok(EchoOutput {
            p1: format!("{}/{}", input.id, input.trace),
            q1: input.name,
        })
    };

    let mut app = App::with_hooks(hooks);
    app.root()
        .post("/staged/:id", Handler::new(handler, 200, vec![]))
        .unwrap();

    let ctx = app.dispatch(request(
        Method::POST,
        "/staged/7?name=from-query",
        &[("X-Trace", "t1")],
        r#"{"name": "from-body"}"#,
    ));
    assert_eq!(ctx.response_status(), 200);
    assert_eq!(json_body(&ctx), json!({"p1": "7/t1", "q1": "from-query"}));
    assert_eq!(
        *log.lock().unwrap(),
        ["body", "query", "path", "header", "validate", "invoke"]
    );
}

#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct Guarded {
    #[serde(skip)]
    #[bind(path = "id", validate = "stage_stop")]
    id: String,
}

#[test]
fn test_failing_stage_skips_later_stages() {
    let log: StageLog = Arc::new(Mutex::new(Vec::new()));
    let validated = Arc::clone(&log);
    register_validation("stage_stop", move |_fl| {
        validated.lock().unwrap().push("validate");
        true
    })
    .unwrap();

    let rejected = Arc::clone(&log);
    let hooks = Hooks::default()
        .with_bind_body(recording(&log, "body", default_bind_body))
        .with_bind_query(recording(&log, "query", default_bind_query))
        .with_bind_path(move |_ctx, _input| {
            rejected.lock().unwrap().push("path");
            anyhow::bail!("path rejected")
        })
        .with_bind_header(recording(&log, "header", default_bind_header));
    let invoked = Arc::clone(&log);
    let handler = move |_ctx: &mut Context, input: Guarded| -> anyhow::Result<String> {
        invoked.lock().unwrap().push("invoke");
        Ok(input.id)
    };

    let mut app = App::with_hooks(hooks);
    app.root()
        .get("/guarded/:id", Handler::new(handler, 200, vec![]))
        .unwrap();

    let ctx = app.dispatch(get("/guarded/9"));
    assert_eq!(ctx.response_status(), 400);
    assert_eq!(json_body(&ctx), json!({"error": "path rejected"}));
    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(*log.lock().unwrap(), ["body", "query", "path"]);
}
