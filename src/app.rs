//! # Application and Route Groups
//!
//! [`App`] owns the router, the OpenAPI generator and the shared
//! [`Hooks`]. Routes are registered through [`RouterGroup`]s; every typed
//! handler is documented as it is registered, so a route that cannot be
//! documented is never served.
//!
//! ```rust,ignore
//! let mut app = App::new();
//! app.group("api", "api", "API routes")
//!     .post("ping/:path1", Handler::new(ping, 200, vec![summary("ping")]))?;
//! let docs = app.openapi(Info::default(), DocFormat::Json);
//! app.root().handle_raw("openapi.json", Method::GET, vec![docs]);
//!
//! let ctx = app.dispatch(request);
//! ```
//!
//! ## Middleware chain
//!
//! A route runs its group middlewares, then its own middlewares, then the
//! endpoint. The chain stops at the first handler returning an error or
//! at the first middleware that writes a response. Group middlewares apply
//! to routes registered after [`RouterGroup::use_middleware`].

use http::{Method, Request};
use serde_json::json;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, info_span, warn};

use crate::config::AppConfig;
use crate::handler::{Handler, NativeHandler, SharedError};
use crate::hooks::Hooks;
use crate::openapi::{DocFormat, Generator, GeneratorError, Info, SpecGenConfig};
use crate::router::{Route, Router};
use crate::server::Context;

/// Route registration failure.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// The handler's default status is outside `100..=599`.
    InvalidStatusCode(u16),
    /// The operation could not be documented.
    Generator {
        method: Method,
        path: String,
        source: GeneratorError,
    },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::InvalidStatusCode(code) => {
                write!(f, "invalid default status code {}", code)
            }
            RegistrationError::Generator {
                method,
                path,
                source,
            } => write!(
                f,
                "error while generating OpenAPI spec on operation {} {}: {}",
                method, path, source
            ),
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistrationError::InvalidStatusCode(_) => None,
            RegistrationError::Generator { source, .. } => Some(source),
        }
    }
}

/// Join a group path and a relative route path.
///
/// An empty `rel` returns `abs` unchanged (`/` for the root group).
/// Otherwise segments are cleaned (`.`, `..` and repeated slashes), the
/// result starts with `/` and keeps a trailing slash written in `rel`.
#[must_use]
pub fn join_paths(abs: &str, rel: &str) -> String {
    if rel.is_empty() {
        return if abs.is_empty() {
            "/".to_string()
        } else {
            abs.to_string()
        };
    }
    let mut parts: Vec<&str> = Vec::new();
    for segment in abs.split('/').chain(rel.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            segment => parts.push(segment),
        }
    }
    let mut joined = format!("/{}", parts.join("/"));
    if rel.ends_with('/') && !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}

/// Router, document generator and hooks of one application.
pub struct App {
    router: Router,
    generator: Arc<RwLock<Generator>>,
    hooks: Arc<Hooks>,
}

impl Default for App {
    fn default() -> Self {
        Self::with_hooks(Hooks::default())
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.router.len())
            .finish_non_exhaustive()
    }
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_hooks(hooks: Hooks) -> Self {
        App {
            router: Router::new(),
            generator: Arc::new(RwLock::new(Generator::new(SpecGenConfig::default()))),
            hooks: Arc::new(hooks),
        }
    }

    /// Application using the error status and document info of `config`.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let app = Self::with_hooks(Hooks::default().with_error_status(config.error_status));
        app.generator_mut().set_info(config.openapi.clone());
        app
    }

    #[must_use]
    pub fn hooks(&self) -> &Arc<Hooks> {
        &self.hooks
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Read access to the document generator.
    pub fn generator(&self) -> RwLockReadGuard<'_, Generator> {
        self.generator.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn generator_mut(&self) -> RwLockWriteGuard<'_, Generator> {
        self.generator
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Errors raised while documenting operations.
    #[must_use]
    pub fn errors(&self) -> Vec<GeneratorError> {
        self.generator().errors().to_vec()
    }

    /// The group registering routes at the root, without a tag.
    pub fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup {
            app: self,
            path: String::new(),
            name: String::new(),
            description: String::new(),
            middlewares: Vec::new(),
        }
    }

    /// A group under `path` whose operations carry the tag `name`.
    pub fn group(&mut self, path: &str, name: &str, description: &str) -> RouterGroup<'_> {
        self.generator_mut().add_tag(name, description);
        RouterGroup {
            app: self,
            path: join_paths("", path),
            name: name.to_string(),
            description: description.to_string(),
            middlewares: Vec::new(),
        }
    }

    /// Handler serving the document, as it stands at request time.
    pub fn openapi(&self, info: Info, format: DocFormat) -> NativeHandler {
        self.generator_mut().set_info(info);
        let generator = Arc::clone(&self.generator);
        Arc::new(move |ctx: &mut Context| {
            let generator = generator.read().unwrap_or_else(PoisonError::into_inner);
            match format {
                DocFormat::Json => ctx
                    .json(200, &generator.api())
                    .map_err(|err| SharedError::new(err.into())),
                DocFormat::Yaml => {
                    let yaml = generator
                        .to_yaml()
                        .map_err(|err| SharedError::new(err.into()))?;
                    ctx.send(200, "application/yaml", yaml);
                    Ok(())
                }
            }
        })
    }

    /// Route `request` through the matching chain and return the finished context.
    pub fn dispatch(&self, request: Request<Vec<u8>>) -> Context {
        let mut ctx = Context::new(request);
        let method = ctx.method().clone();
        let path = ctx.path().to_string();
        let span = info_span!(
            "request",
            request_id = %ctx.request_id(),
            method = %method,
            path = %path
        );
        let _entered = span.enter();

        let Some((route, params)) = self.router.route(&method, &path) else {
            debug!("no route matched");
            ctx.send(404, "application/json", br#"{"error":"Not Found"}"#.to_vec());
            return ctx;
        };
        ctx.set_path_params(params);
        if let Some(operation) = &route.operation {
            ctx.locals_mut().insert(Arc::clone(operation));
        }

        let last = route.chain.len().saturating_sub(1);
        for (i, handler) in route.chain.iter().enumerate() {
            if let Err(err) = handler(&mut ctx) {
                if !ctx.is_written() {
                    let body = json!({ "error": err.to_string() });
                    if ctx.json(500, &body).is_err() {
                        ctx.empty(500);
                    }
                }
                warn!(error = %err, status = ctx.response_status(), "handler chain failed");
                break;
            }
            if i < last && ctx.is_written() {
                debug!(index = i, "middleware answered the request");
                break;
            }
        }
        info!(status = ctx.response_status(), "request completed");
        ctx
    }
}

/// Routes sharing a path prefix, a tag and middlewares.
pub struct RouterGroup<'a> {
    app: &'a mut App,
    path: String,
    name: String,
    description: String,
    middlewares: Vec<NativeHandler>,
}

impl fmt::Debug for RouterGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterGroup")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

macro_rules! method_routes {
    ($($(#[$doc:meta])* $fn:ident => $method:ident),* $(,)?) => {$(
        $(#[$doc])*
        pub fn $fn(&mut self, path: &str, handler: Handler) -> Result<&mut Self, RegistrationError> {
            self.handle(path, Method::$method, handler, Vec::new())
        }
    )*};
}

impl<'a> RouterGroup<'a> {
    /// Absolute path prefix of the group.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Nested group; inherits the middlewares added so far.
    pub fn group(&mut self, path: &str, name: &str, description: &str) -> RouterGroup<'_> {
        self.app.generator_mut().add_tag(name, description);
        RouterGroup {
            path: join_paths(&self.path, path),
            name: name.to_string(),
            description: description.to_string(),
            middlewares: self.middlewares.clone(),
            app: &mut *self.app,
        }
    }

    /// Run `middleware` before every route registered afterwards.
    pub fn use_middleware(&mut self, middleware: NativeHandler) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    method_routes! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        options => OPTIONS,
        head => HEAD,
        trace => TRACE,
    }

    /// Document `handler` and route `method path` to it.
    ///
    /// The operation ID defaults to
    /// `<METHOD>-<absolute path with '/' as '-'>-<handler name>`.
    ///
    /// # Errors
    ///
    /// Fails when the default status is invalid or the generator rejects
    /// the operation; nothing is routed in that case.
    pub fn handle(
        &mut self,
        path: &str,
        method: Method,
        handler: Handler,
        middlewares: Vec<NativeHandler>,
    ) -> Result<&mut Self, RegistrationError> {
        let route = handler.route_info();
        let status = route.default_status_code();
        if !(100..=599).contains(&status) {
            return Err(RegistrationError::InvalidStatusCode(status));
        }

        let abs = join_paths(&self.path, path);
        let mut info = handler.operation_info().clone();
        if info.id.is_empty() {
            info.id = format!(
                "{}-{}-{}",
                method,
                abs.replace('/', "-"),
                route.handler_name()
            );
        }
        info.status_code = status;
        let input = info
            .input_model
            .clone()
            .or_else(|| route.input_type().cloned());

        let operation = self
            .app
            .generator_mut()
            .add_operation(
                &abs,
                method.as_str(),
                &self.name,
                input.as_ref(),
                route.output_type(),
                &info,
            )
            .map_err(|source| RegistrationError::Generator {
                method: method.clone(),
                path: abs.clone(),
                source,
            })?;

        let mut chain = self.middlewares.clone();
        chain.extend(middlewares);
        chain.push(handler.native(Arc::clone(&self.app.hooks)));
        debug!(
            method = %method,
            path = %abs,
            operation_id = %operation.id,
            handler_name = route.handler_name(),
            "route registered"
        );
        self.app.router.add_route(Route {
            method,
            pattern: abs,
            chain,
            operation: Some(operation),
        });
        Ok(self)
    }

    /// Route plain native handlers without documenting them.
    pub fn handle_raw(
        &mut self,
        path: &str,
        method: Method,
        handlers: Vec<NativeHandler>,
    ) -> &mut Self {
        let abs = join_paths(&self.path, path);
        let mut chain = self.middlewares.clone();
        chain.extend(handlers);
        debug!(method = %method, path = %abs, "raw route registered");
        self.app.router.add_route(Route {
            method,
            pattern: abs,
            chain,
            operation: None,
        });
        self
    }
}
