//! # bindery
//!
//! **bindery** binds HTTP request data into typed handler inputs, validates
//! them, renders handler outputs and documents every route as an
//! [OpenAPI 3.0](https://spec.openapis.org/oas/v3.0.3) operation from the
//! same field tags.
//!
//! ## Overview
//!
//! A handler is a plain function taking a [`Context`] and, optionally, an
//! input struct deriving [`Bind`]:
//!
//! ```rust,ignore
//! use bindery::{App, Bind, Context, Handler};
//! use bindery::operation::summary;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Deserialize, Bind)]
//! #[serde(default)]
//! struct GetPet {
//!     #[bind(path = "id")]
//!     id: u64,
//!     #[bind(query = "fields", explode = "false")]
//!     fields: Vec<String>,
//!     #[bind(header = "X-Tenant", validate = "required")]
//!     tenant: String,
//! }
//!
//! #[derive(Serialize)]
//! struct Pet {
//!     id: u64,
//! }
//!
//! fn get_pet(_ctx: &mut Context, input: GetPet) -> anyhow::Result<Pet> {
//!     Ok(Pet { id: input.id })
//! }
//!
//! let mut app = App::new();
//! app.group("pets", "pets", "Pet operations")
//!     .get(":id", Handler::new(get_pet, 200, vec![summary("Get a pet")]))?;
//! ```
//!
//! ## Architecture
//!
//! - **[`binding`]** - Tag parsing, extractors, type coercion and the struct binder
//! - **[`validation`]** - Tag-driven field validation with custom rules
//! - **[`hooks`]** - Replaceable body/query/path/header binding, error, render and exec stages
//! - **[`handler`]** - Wraps typed handlers into native handlers
//! - **[`operation`]** - Operation metadata builders
//! - **[`openapi`]** - OpenAPI document generator
//! - **[`app`]** - Application, route groups and in-process dispatch
//! - **[`router`]** - Radix-tree route matching
//! - **[`server`]** - Per-request [`Context`]
//! - **[`config`]** / **[`logging`]** - Configuration files and tracing setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App as App::dispatch
//!     participant MW as Middlewares
//!     participant H as Handler
//!     participant Hooks
//!
//!     App->>App: Router::route(method, path)
//!     App->>MW: run group + route middlewares
//!     MW->>H: native handler (exec hook)
//!     H->>Hooks: bind body, query, path, header
//!     H->>H: validate input
//!     H->>H: call user function
//!     alt success
//!         H->>Hooks: render(status, output)
//!     else error
//!         H->>Hooks: error(err) -> (status, payload)
//!         H->>Hooks: render(status, payload)
//!     end
//! ```
//!
//! ## Logging
//!
//! Binding, registration and dispatch emit `tracing` events; install a
//! subscriber with [`logging::init_logging`].

extern crate self as bindery;

pub mod app;
pub mod binding;
pub mod cli;
pub mod config;
pub mod handler;
pub mod hooks;
pub mod logging;
pub mod openapi;
pub mod operation;
pub mod router;
pub mod server;
pub mod validation;

pub use app::{join_paths, App, RegistrationError, RouterGroup};
pub use bindery_macros::Bind;
pub use binding::{bind, BindError, BindErrorKind, Bindable};
pub use config::AppConfig;
pub use handler::{Handler, IntoHandler, NativeHandler, RouteInfo, SharedError};
pub use hooks::Hooks;
pub use openapi::{DocFormat, Generator, GeneratorError, Info, TypeInfo};
pub use operation::{operation_from_context, OperationInfo, OperationOption};
pub use server::{Context, RequestId};
pub use validation::{register_validation, validator, Validator};
