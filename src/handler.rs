//! # Handler Wrapper
//!
//! Turns a typed handler into a [`NativeHandler`] that binds its input,
//! validates it, calls it and renders the result through [`Hooks`].
//!
//! Two handler shapes are accepted:
//!
//! ```rust,ignore
//! fn health(ctx: &mut Context) -> anyhow::Result<()>;
//! fn get_pet(ctx: &mut Context, input: GetPet) -> anyhow::Result<Pet>;
//! ```
//!
//! The input must derive [`Bind`](crate::Bind), `Deserialize` and `Default`.
//! An output of `()` renders no body; `Option<T>` outputs are documented as
//! `T` and render no body when `None`.
//!
//! Per request the stages run in a fixed order:
//! body → query → path → header → validate → invoke → render. The first
//! failing stage goes to the error hook, is recorded on the [`Context`] and
//! is returned to the caller.

use serde::Serialize;
use serde_json::Value;
use std::any::{type_name, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::binding::BindError;
use crate::hooks::{Hooks, InputTarget};
use crate::openapi::TypeInfo;
use crate::operation::{OperationInfo, OperationOption};
use crate::server::Context;
use crate::validation::validator;

/// Error shared between the error hook, the context log and the caller.
pub type SharedError = Arc<anyhow::Error>;

/// Handler signature the router runs; middlewares share it.
pub type NativeHandler = Arc<dyn Fn(&mut Context) -> Result<(), SharedError> + Send + Sync>;

type Invoker = Arc<dyn Fn(&mut Context, &Hooks) -> Result<(), SharedError> + Send + Sync>;

/// Handler inputs: bindable, JSON-decodable and zero-constructible.
pub trait Input: InputTarget + Default + 'static {}

impl<T: InputTarget + Default + 'static> Input for T {}

/// Typed handlers accepted by [`Handler::new`].
///
/// `M` only disambiguates the blanket implementations.
pub trait IntoHandler<M>: Send + Sync + Sized + 'static {
    fn input_type() -> Option<TypeInfo>;

    fn output_type() -> Option<TypeInfo>;

    #[doc(hidden)]
    fn into_invoker(self, status: u16) -> Invoker;
}

#[doc(hidden)]
pub struct WithoutInput;

#[doc(hidden)]
pub struct WithInput<I>(PhantomData<fn() -> I>);

fn output_type_of<O: 'static>() -> Option<TypeInfo> {
    if TypeId::of::<O>() == TypeId::of::<()>() {
        None
    } else {
        Some(TypeInfo::of::<O>())
    }
}

impl<F, O> IntoHandler<(WithoutInput, O)> for F
where
    F: Fn(&mut Context) -> anyhow::Result<O> + Send + Sync + 'static,
    O: Serialize + 'static,
{
    fn input_type() -> Option<TypeInfo> {
        None
    }

    fn output_type() -> Option<TypeInfo> {
        output_type_of::<O>()
    }

    fn into_invoker(self, status: u16) -> Invoker {
        Arc::new(move |ctx: &mut Context, hooks: &Hooks| {
            let output = (self)(ctx);
            finish(ctx, hooks, status, output)
        })
    }
}

impl<F, I, O> IntoHandler<(WithInput<I>, O)> for F
where
    F: Fn(&mut Context, I) -> anyhow::Result<O> + Send + Sync + 'static,
    I: Input,
    O: Serialize + 'static,
{
    fn input_type() -> Option<TypeInfo> {
        Some(TypeInfo::input::<I>())
    }

    fn output_type() -> Option<TypeInfo> {
        output_type_of::<O>()
    }

    fn into_invoker(self, status: u16) -> Invoker {
        Arc::new(move |ctx: &mut Context, hooks: &Hooks| {
            let mut input = I::default();
            bind_input(ctx, hooks, &mut input)?;
            let output = (self)(ctx, input);
            finish(ctx, hooks, status, output)
        })
    }
}

/// Run the binding stages and validation on a fresh input.
fn bind_input(ctx: &mut Context, hooks: &Hooks, input: &mut dyn InputTarget) -> Result<(), SharedError> {
    let type_name = input.type_name();

    if let Err(err) = (hooks.bind_body())(ctx, input) {
        debug!(input = type_name, error = %err, "body binding failed");
        let err = BindError::message(Some(type_name), err.to_string());
        return Err(handle_error(ctx, hooks, err.into()));
    }

    let stages = [
        ("query", hooks.bind_query()),
        ("path", hooks.bind_path()),
        ("header", hooks.bind_header()),
    ];
    for (stage, hook) in stages {
        if let Err(err) = hook(ctx, input) {
            debug!(input = type_name, stage, error = %err, "parameter binding failed");
            return Err(handle_error(ctx, hooks, err));
        }
    }

    if let Err(errs) = validator().validate_struct(&*input.as_bindable()) {
        debug!(input = type_name, failures = errs.len(), "input validation failed");
        let err = BindError::validation(type_name, errs);
        return Err(handle_error(ctx, hooks, err.into()));
    }
    Ok(())
}

/// Render a handler result, routing errors through the error hook.
fn finish<O: Serialize + 'static>(
    ctx: &mut Context,
    hooks: &Hooks,
    status: u16,
    result: anyhow::Result<O>,
) -> Result<(), SharedError> {
    let output = match result {
        Ok(output) => output,
        Err(err) => return Err(handle_error(ctx, hooks, err)),
    };

    let payload = if TypeId::of::<O>() == TypeId::of::<()>() {
        None
    } else {
        match serde_json::to_value(&output) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(err) => {
                let err = anyhow::Error::new(err).context("error serializing handler output");
                return Err(handle_error(ctx, hooks, err));
            }
        }
    };
    (hooks.render())(ctx, status, payload);
    Ok(())
}

/// Record `err` on the context and render it through the error hook.
fn handle_error(ctx: &mut Context, hooks: &Hooks, err: anyhow::Error) -> SharedError {
    let err = Arc::new(err);
    ctx.push_error(Arc::clone(&err));
    let (status, payload) = (hooks.error())(ctx, &*err);
    warn!(
        request_id = %ctx.request_id(),
        status,
        error = %err,
        "request failed"
    );
    (hooks.render())(ctx, status, Some(payload));
    err
}

/// Registration data of a typed handler.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    default_status: u16,
    handler_name: String,
    input_type: Option<TypeInfo>,
    output_type: Option<TypeInfo>,
}

impl RouteInfo {
    /// Status rendered on success.
    #[must_use]
    pub fn default_status_code(&self) -> u16 {
        self.default_status
    }

    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    #[must_use]
    pub fn input_type(&self) -> Option<&TypeInfo> {
        self.input_type.as_ref()
    }

    #[must_use]
    pub fn output_type(&self) -> Option<&TypeInfo> {
        self.output_type.as_ref()
    }
}

/// Short name of a handler type, e.g. `list_pets` or `routes_closure`.
fn handler_name_of<H>() -> String {
    let full = type_name::<H>().replace("::{{closure}}", "_closure");
    full.rsplit("::").next().unwrap_or(&full).to_string()
}

/// A typed handler with its route and operation metadata.
pub struct Handler {
    route: RouteInfo,
    operation: OperationInfo,
    invoker: Invoker,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("route", &self.route)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

impl Handler {
    /// Wrap `handler`, answering `status` on success.
    ///
    /// # Arguments
    ///
    /// * `handler` - Typed handler function or closure
    /// * `status` - Status code rendered with the handler output
    /// * `options` - Operation metadata builders applied in order
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let h = Handler::new(get_pet, 200, vec![summary("Get a pet"), id("getPet")]);
    /// ```
    pub fn new<M, H: IntoHandler<M>>(handler: H, status: u16, options: Vec<OperationOption>) -> Self {
        let route = RouteInfo {
            default_status: status,
            handler_name: handler_name_of::<H>(),
            input_type: H::input_type(),
            output_type: H::output_type(),
        };
        let mut operation = OperationInfo::default();
        for option in options {
            option(&mut operation);
        }
        debug!(handler_name = %route.handler_name, status, "handler created");
        Handler {
            route,
            operation,
            invoker: handler.into_invoker(status),
        }
    }

    #[must_use]
    pub fn route_info(&self) -> &RouteInfo {
        &self.route
    }

    #[must_use]
    pub fn operation_info(&self) -> &OperationInfo {
        &self.operation
    }

    pub fn operation_info_mut(&mut self) -> &mut OperationInfo {
        &mut self.operation
    }

    /// Native handler running this handler through the exec hook of `hooks`.
    #[must_use]
    pub fn native(&self, hooks: Arc<Hooks>) -> NativeHandler {
        let invoker = Arc::clone(&self.invoker);
        let inner_hooks = Arc::clone(&hooks);
        let inner: NativeHandler = Arc::new(move |ctx: &mut Context| invoker(ctx, &inner_hooks));
        let name = self.route.handler_name.clone();
        Arc::new(move |ctx: &mut Context| (hooks.exec())(ctx, &inner, &name))
    }

    /// Run the handler once against `ctx`.
    pub fn call(&self, ctx: &mut Context, hooks: &Arc<Hooks>) -> Result<(), SharedError> {
        (self.native(Arc::clone(hooks)))(ctx)
    }
}
