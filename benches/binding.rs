use bindery::operation::summary;
use bindery::{bind, App, Bind, Context, Handler, Hooks, NativeHandler, SharedError};
use criterion::{criterion_group, criterion_main, Criterion};
use http::{Method, Request};
use serde::Deserialize;
use std::hint::black_box;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize, Bind)]
#[serde(default)]
struct Search {
    #[bind(path = "owner")]
    owner: String,
    #[bind(query = "limit", default = "20")]
    limit: u32,
    #[bind(query = "tags", explode = "false")]
    tags: Vec<String>,
    #[bind(header = "X-Tenant", validate = "required")]
    tenant: String,
}

fn noop(_ctx: &mut Context) -> anyhow::Result<()> {
    Ok(())
}

fn search(_ctx: &mut Context, input: Search) -> anyhow::Result<u32> {
    Ok(input.limit)
}

fn request() -> Request<Vec<u8>> {
    Request::builder()
        .method(Method::GET)
        .uri("/owners/alice/pets?limit=5&tags=a,b,c")
        .header("X-Tenant", "t1")
        .body(Vec::new())
        .unwrap()
}

fn bench_handler_construction(c: &mut Criterion) {
    c.bench_function("handler_new", |b| {
        b.iter(|| black_box(Handler::new(noop, 200, vec![summary("noop")])))
    });
}

fn bench_registration(c: &mut Criterion) {
    c.bench_function("group_handle_raw", |b| {
        let mut app = App::new();
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            let mw: NativeHandler = Arc::new(|_ctx: &mut Context| -> Result<(), SharedError> { Ok(()) });
            app.root()
                .handle_raw(&n.to_string(), Method::POST, vec![mw]);
        })
    });

    c.bench_function("group_handle", |b| {
        let mut app = App::new();
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            let h = Handler::new(noop, 200, vec![]);
            let _ = app.root().post(&n.to_string(), h);
        })
    });
}

fn bench_invocation(c: &mut Criterion) {
    let hooks = Arc::new(Hooks::default());

    let native = Handler::new(noop, 200, vec![]).native(Arc::clone(&hooks));
    c.bench_function("call_handler", |b| {
        b.iter(|| {
            let mut ctx = Context::new(Request::new(Vec::new()));
            black_box(native(&mut ctx)).ok();
        })
    });

    c.bench_function("bind_struct", |b| {
        let mut ctx = Context::new(request());
        ctx.set_path_params(smallvec::smallvec![(Arc::from("owner"), "alice".to_string())]);
        b.iter(|| {
            let mut input = Search::default();
            bind(&ctx, &mut input, "query", bindery::binding::extract_query).ok();
            black_box(input)
        })
    });

    let mut app = App::new();
    app.root()
        .get("/owners/:owner/pets", Handler::new(search, 200, vec![]))
        .ok();
    c.bench_function("dispatch_typed_handler", |b| {
        b.iter(|| black_box(app.dispatch(request()).response_status()))
    });
}

criterion_group!(
    benches,
    bench_handler_construction,
    bench_registration,
    bench_invocation
);
criterion_main!(benches);
