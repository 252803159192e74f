//! Replaceable strategies for each stage of the handler pipeline.
//!
//! A [`Hooks`] value is assembled once at startup and shared as
//! `Arc<Hooks>`; it is never mutated while requests are served.
//!
//! ```rust,ignore
//! let hooks = Hooks::default()
//!     .with_error_status(422)
//!     .with_render(|ctx, status, payload| match payload {
//!         Some(body) => { let _ = ctx.json(status, &body); }
//!         None => ctx.empty(status),
//!     });
//! let app = App::with_hooks(hooks);
//! ```

use anyhow::anyhow;
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::binding::{
    bind, extract_header, extract_path, extract_query, Bindable, HEADER_TAG, PATH_TAG, QUERY_TAG,
};
use crate::handler::{NativeHandler, SharedError};
use crate::server::Context;

/// Handler input the body hook can decode into.
pub trait InputTarget: Bindable {
    /// Replace `self` with the JSON document in `body`.
    fn decode_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error>;

    fn as_bindable(&mut self) -> &mut dyn Bindable;
}

impl<T: Bindable + DeserializeOwned> InputTarget for T {
    fn decode_json(&mut self, body: &[u8]) -> Result<(), serde_json::Error> {
        *self = serde_json::from_slice(body)?;
        Ok(())
    }

    fn as_bindable(&mut self) -> &mut dyn Bindable {
        self
    }
}

/// Fills part of a handler input from the request.
pub type BindHook = Arc<dyn Fn(&mut Context, &mut dyn InputTarget) -> anyhow::Result<()> + Send + Sync>;
/// Writes a status and an optional payload to the response.
pub type RenderHook = Arc<dyn Fn(&mut Context, u16, Option<Value>) + Send + Sync>;
/// Maps an error to a status and a payload.
pub type ErrorHook = Arc<dyn Fn(&mut Context, &anyhow::Error) -> (u16, Value) + Send + Sync>;
/// Runs the wrapped handler; receives the handler name.
pub type ExecHook =
    Arc<dyn Fn(&mut Context, &NativeHandler, &str) -> Result<(), SharedError> + Send + Sync>;

/// Status returned by [`default_error`].
pub const DEFAULT_ERROR_STATUS: u16 = 400;

/// Decode a JSON body into the input. GET requests and empty bodies are skipped.
pub fn default_bind_body(ctx: &mut Context, input: &mut dyn InputTarget) -> anyhow::Result<()> {
    if ctx.method() == Method::GET || ctx.body().iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    input
        .decode_json(ctx.body())
        .map_err(|err| anyhow!("error parsing request body: {}", err))
}

pub fn default_bind_query(ctx: &mut Context, input: &mut dyn InputTarget) -> anyhow::Result<()> {
    bind(&*ctx, input.as_bindable(), QUERY_TAG, extract_query)?;
    Ok(())
}

pub fn default_bind_path(ctx: &mut Context, input: &mut dyn InputTarget) -> anyhow::Result<()> {
    bind(&*ctx, input.as_bindable(), PATH_TAG, extract_path)?;
    Ok(())
}

pub fn default_bind_header(ctx: &mut Context, input: &mut dyn InputTarget) -> anyhow::Result<()> {
    bind(&*ctx, input.as_bindable(), HEADER_TAG, extract_header)?;
    Ok(())
}

/// `400` with `{"error": "<message>"}`.
pub fn default_error(_ctx: &mut Context, err: &anyhow::Error) -> (u16, Value) {
    (DEFAULT_ERROR_STATUS, json!({ "error": err.to_string() }))
}

/// JSON body for a payload, empty body otherwise.
pub fn default_render(ctx: &mut Context, status: u16, payload: Option<Value>) {
    match payload {
        Some(payload) => {
            if let Err(err) = ctx.json(status, &payload) {
                warn!(error = %err, "failed to render payload");
                ctx.empty(status);
            }
        }
        None => ctx.empty(status),
    }
}

pub fn default_exec(ctx: &mut Context, handler: &NativeHandler, _name: &str) -> Result<(), SharedError> {
    handler(ctx)
}

/// The seven pipeline strategies.
#[derive(Clone)]
pub struct Hooks {
    bind_body: BindHook,
    bind_query: BindHook,
    bind_path: BindHook,
    bind_header: BindHook,
    error: ErrorHook,
    render: RenderHook,
    exec: ExecHook,
}

impl Default for Hooks {
    fn default() -> Self {
        Hooks {
            bind_body: Arc::new(default_bind_body),
            bind_query: Arc::new(default_bind_query),
            bind_path: Arc::new(default_bind_path),
            bind_header: Arc::new(default_bind_header),
            error: Arc::new(default_error),
            render: Arc::new(default_render),
            exec: Arc::new(default_exec),
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}

impl Hooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bind_body<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context, &mut dyn InputTarget) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bind_body = Arc::new(hook);
        self
    }

    #[must_use]
    pub fn with_bind_query<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context, &mut dyn InputTarget) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bind_query = Arc::new(hook);
        self
    }

    #[must_use]
    pub fn with_bind_path<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context, &mut dyn InputTarget) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bind_path = Arc::new(hook);
        self
    }

    #[must_use]
    pub fn with_bind_header<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context, &mut dyn InputTarget) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bind_header = Arc::new(hook);
        self
    }

    #[must_use]
    pub fn with_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context, &anyhow::Error) -> (u16, Value) + Send + Sync + 'static,
    {
        self.error = Arc::new(hook);
        self
    }

    /// Default error hook answering with `status` instead of `400`.
    #[must_use]
    pub fn with_error_status(self, status: u16) -> Self {
        self.with_error(move |_ctx, err| (status, json!({ "error": err.to_string() })))
    }

    #[must_use]
    pub fn with_render<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context, u16, Option<Value>) + Send + Sync + 'static,
    {
        self.render = Arc::new(hook);
        self
    }

    #[must_use]
    pub fn with_exec<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context, &NativeHandler, &str) -> Result<(), SharedError> + Send + Sync + 'static,
    {
        self.exec = Arc::new(hook);
        self
    }

    #[must_use]
    pub fn bind_body(&self) -> &BindHook {
        &self.bind_body
    }

    #[must_use]
    pub fn bind_query(&self) -> &BindHook {
        &self.bind_query
    }

    #[must_use]
    pub fn bind_path(&self) -> &BindHook {
        &self.bind_path
    }

    #[must_use]
    pub fn bind_header(&self) -> &BindHook {
        &self.bind_header
    }

    #[must_use]
    pub fn error(&self) -> &ErrorHook {
        &self.error
    }

    #[must_use]
    pub fn render(&self) -> &RenderHook {
        &self.render
    }

    #[must_use]
    pub fn exec(&self) -> &ExecHook {
        &self.exec
    }
}
