//! Operation metadata and the option builders that fill it.
//!
//! ```rust,ignore
//! let h = Handler::new(
//!     get_pet,
//!     200,
//!     vec![
//!         summary("Get a pet"),
//!         id("getPet"),
//!         response("404", "Pet not found", None, vec![], None),
//!     ],
//! );
//! ```

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::binding::Bindable;
use crate::openapi::{Operation, TypeInfo};
use crate::server::Context;

/// Descriptive data of one operation, consumed by the generator.
#[derive(Debug, Clone, Default)]
pub struct OperationInfo {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub deprecated: bool,
    /// Success status, set from the handler at registration.
    pub status_code: u16,
    pub status_description: String,
    pub responses: Vec<OperationResponse>,
    pub headers: Vec<ResponseHeader>,
    /// Overrides the handler input when documenting parameters.
    pub input_model: Option<TypeInfo>,
}

/// An additional documented response.
#[derive(Debug, Clone, Default)]
pub struct OperationResponse {
    /// Status code, `"default"` or a range such as `"4XX"`.
    pub code: String,
    pub description: String,
    pub model: Option<TypeInfo>,
    pub headers: Vec<ResponseHeader>,
    pub example: Option<Value>,
    pub examples: BTreeMap<String, Value>,
}

/// A documented response header.
#[derive(Debug, Clone)]
pub struct ResponseHeader {
    pub name: String,
    pub description: String,
    pub model: Option<TypeInfo>,
}

impl ResponseHeader {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        ResponseHeader {
            name: name.into(),
            description: description.into(),
            model: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: TypeInfo) -> Self {
        self.model = Some(model);
        self
    }
}

/// Builder applied to an [`OperationInfo`] at handler creation.
pub type OperationOption = Box<dyn FnOnce(&mut OperationInfo) + Send>;

pub fn summary(summary: impl Into<String>) -> OperationOption {
    let summary = summary.into();
    Box::new(move |o| o.summary = summary)
}

pub fn description(description: impl Into<String>) -> OperationOption {
    let description = description.into();
    Box::new(move |o| o.description = description)
}

/// Override the generated operation ID.
pub fn id(id: impl Into<String>) -> OperationOption {
    let id = id.into();
    Box::new(move |o| o.id = id)
}

pub fn deprecated(deprecated: bool) -> OperationOption {
    Box::new(move |o| o.deprecated = deprecated)
}

/// Description of the default success response.
pub fn status_description(description: impl Into<String>) -> OperationOption {
    let description = description.into();
    Box::new(move |o| o.status_description = description)
}

/// Document an additional response with an optional single example.
pub fn response(
    code: impl Into<String>,
    description: impl Into<String>,
    model: Option<TypeInfo>,
    headers: Vec<ResponseHeader>,
    example: Option<Value>,
) -> OperationOption {
    let response = OperationResponse {
        code: code.into(),
        description: description.into(),
        model,
        headers,
        example,
        examples: BTreeMap::new(),
    };
    Box::new(move |o| o.responses.push(response))
}

/// Like [`response`], with named examples.
pub fn response_with_examples(
    code: impl Into<String>,
    description: impl Into<String>,
    model: Option<TypeInfo>,
    headers: Vec<ResponseHeader>,
    examples: BTreeMap<String, Value>,
) -> OperationOption {
    let response = OperationResponse {
        code: code.into(),
        description: description.into(),
        model,
        headers,
        example: None,
        examples,
    };
    Box::new(move |o| o.responses.push(response))
}

/// Document a header of the default response.
pub fn header(
    name: impl Into<String>,
    description: impl Into<String>,
    model: Option<TypeInfo>,
) -> OperationOption {
    let header = ResponseHeader {
        name: name.into(),
        description: description.into(),
        model,
    };
    Box::new(move |o| o.headers.push(header))
}

/// Document parameters from `T` instead of the handler input.
pub fn input_model<T: Bindable + Default + 'static>() -> OperationOption {
    Box::new(|o| o.input_model = Some(TypeInfo::input::<T>()))
}

/// The documented operation of the route serving `ctx`.
///
/// # Errors
///
/// Fails with `operation not found` outside a documented route.
pub fn operation_from_context(ctx: &Context) -> anyhow::Result<Arc<Operation>> {
    ctx.locals()
        .get::<Arc<Operation>>()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("operation not found"))
}
