//! # OpenAPI Module
//!
//! Builds an OpenAPI 3.0 document from the handlers registered on route
//! groups.
//!
//! ## Overview
//!
//! Each documented route hands the [`Generator`] its path, method, group
//! name, input and output [`TypeInfo`] and the collected
//! [`OperationInfo`](crate::operation::OperationInfo). Parameters come from
//! the same field tags the binder reads, so the document and the binding
//! cannot drift apart:
//!
//! - `path`, `query`, `header` tags become parameters (path ones required)
//! - `required` in the location tag or the `validate` rules marks a
//!   parameter required
//! - `default` and `enum` tags become typed `default` and `enum` values
//! - `Vec<T>` and `[T; N]` fields become arrays (`minItems`/`maxItems` for
//!   fixed arrays), with `explode` for query parameters
//!
//! Request bodies are documented for `POST`, `PUT` and `PATCH` operations
//! with an input. Named models become `#/components/schemas/<Name>`
//! references; attach a schema with [`TypeInfo::with_schema`] to describe
//! their properties.
//!
//! ## Validation
//!
//! Registration fails with a [`GeneratorError`] when:
//!
//! - the method and path are already documented
//! - the operation ID is already used
//! - a route parameter is missing from the input or the other way round
//! - a parameter or a response code is declared twice
//! - a location tag is malformed
//!
//! Rejected operations are also listed by [`Generator::errors`].

mod describe;
mod generator;
mod types;

pub use describe::describe_params;
pub use generator::{openapi_path, Generator, GeneratorError, OPENAPI_VERSION};
pub use types::{DocFormat, Info, InvalidDocFormat, Operation, ParamSpec, SpecGenConfig, TypeInfo};
