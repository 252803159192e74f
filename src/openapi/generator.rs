use http::StatusCode;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::binding::{Location, ParamSchema, Shape, TagError};
use crate::operation::{OperationInfo, ResponseHeader};
use crate::router::{param_name, split_segments};

use super::describe::describe_params;
use super::types::{
    component_name, schema_for_name, Info, Operation, ParamSpec, SpecGenConfig, TypeInfo,
};

/// OpenAPI version of generated documents.
pub const OPENAPI_VERSION: &str = "3.0.3";

/// Operation rejected by the generator.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorError {
    DuplicateOperation {
        method: String,
        path: String,
    },
    DuplicateOperationId {
        id: String,
    },
    DuplicateParameter {
        name: String,
        location: Location,
        path: String,
    },
    DuplicateResponse {
        code: String,
        path: String,
    },
    /// The route captures a parameter the input does not declare.
    UndeclaredPathParameter {
        name: String,
        path: String,
    },
    /// The input declares a path parameter the route does not capture.
    UnknownPathParameter {
        name: String,
        path: String,
    },
    InvalidTag {
        type_name: &'static str,
        field: &'static str,
        source: TagError,
    },
    UnknownValidation {
        type_name: &'static str,
        field: &'static str,
        rule: String,
    },
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::DuplicateOperation { method, path } => {
                write!(f, "operation {} {} already exists", method, path)
            }
            GeneratorError::DuplicateOperationId { id } => {
                write!(f, "operation with id '{}' already exists", id)
            }
            GeneratorError::DuplicateParameter {
                name,
                location,
                path,
            } => write!(
                f,
                "parameter '{}' in {} is declared twice for path {}",
                name, location, path
            ),
            GeneratorError::DuplicateResponse { code, path } => {
                write!(f, "response {} is declared twice for path {}", code, path)
            }
            GeneratorError::UndeclaredPathParameter { name, path } => write!(
                f,
                "semantic error for path {}: declared path parameter '{}' needs to be defined at operation level",
                path, name
            ),
            GeneratorError::UnknownPathParameter { name, path } => write!(
                f,
                "semantic error for path {}: path parameter '{}' is not part of the path",
                path, name
            ),
            GeneratorError::InvalidTag {
                type_name,
                field,
                source,
            } => write!(
                f,
                "invalid tag on field '{}' of type '{}': {}",
                field, type_name, source
            ),
            GeneratorError::UnknownValidation {
                type_name,
                field,
                rule,
            } => write!(
                f,
                "undefined validation '{}' on field '{}' of type '{}'",
                rule, field, type_name
            ),
        }
    }
}

impl std::error::Error for GeneratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeneratorError::InvalidTag { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Rewrite framework `:name` segments as `{name}`, keeping slashes.
#[must_use]
pub fn openapi_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    for segment in split_segments(path) {
        out.push('/');
        match param_name(segment) {
            Some(name) => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            None => out.push_str(segment),
        }
    }
    if out.is_empty() || (path.ends_with('/') && path.len() > 1) {
        out.push('/');
    }
    out
}

fn typed_value(raw: &str, ty: &str) -> Value {
    let typed = match ty {
        "integer" => raw.trim().parse::<i64>().ok().map(Value::from),
        "number" => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        "boolean" => raw.trim().parse::<bool>().ok().map(Value::Bool),
        _ => None,
    };
    typed.unwrap_or_else(|| Value::String(raw.to_string()))
}

fn parameter_document(param: &ParamSpec) -> Value {
    let mut item = Map::new();
    item.insert("type".into(), param.schema.ty.into());
    if let Some(format) = param.schema.format {
        item.insert("format".into(), format.into());
    }
    if !param.allowed.is_empty() {
        let allowed = param
            .allowed
            .iter()
            .map(|v| typed_value(v, param.schema.ty))
            .collect();
        item.insert("enum".into(), Value::Array(allowed));
    }

    let schema = if param.shape.is_sequence() {
        let mut array = Map::new();
        array.insert("type".into(), "array".into());
        array.insert("items".into(), Value::Object(item));
        if let Shape::Array(len) = param.shape {
            array.insert("minItems".into(), len.into());
            array.insert("maxItems".into(), len.into());
        }
        if let Some(default) = &param.default {
            let values: Vec<Value> = if param.explode {
                default
                    .split(',')
                    .map(|v| typed_value(v, param.schema.ty))
                    .collect()
            } else {
                vec![typed_value(default, param.schema.ty)]
            };
            array.insert("default".into(), Value::Array(values));
        }
        array
    } else {
        if let Some(default) = &param.default {
            item.insert("default".into(), typed_value(default, param.schema.ty));
        }
        item
    };

    let mut doc = json!({
        "name": param.name,
        "in": param.location.as_str(),
        "required": param.required,
        "schema": schema,
    });
    if param.shape.is_sequence() && param.location == Location::Query {
        doc["style"] = "form".into();
        doc["explode"] = param.explode.into();
    }
    doc
}

/// Builds an OpenAPI 3 document from registered operations.
#[derive(Debug, Default)]
pub struct Generator {
    config: SpecGenConfig,
    info: Info,
    tags: Vec<(String, String)>,
    paths: BTreeMap<String, Map<String, Value>>,
    schemas: BTreeMap<String, Value>,
    operation_ids: HashSet<String>,
    errors: Vec<GeneratorError>,
}

impl Generator {
    #[must_use]
    pub fn new(config: SpecGenConfig) -> Self {
        Generator {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &SpecGenConfig {
        &self.config
    }

    pub fn set_info(&mut self, info: Info) {
        self.info = info;
    }

    #[must_use]
    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Declare a tag. Blank names are ignored, the first description wins.
    pub fn add_tag(&mut self, name: &str, description: &str) {
        let name = name.trim();
        if name.is_empty() || self.tags.iter().any(|(n, _)| n == name) {
            return;
        }
        self.tags.push((name.to_string(), description.to_string()));
    }

    /// Errors raised by rejected operations, oldest first.
    #[must_use]
    pub fn errors(&self) -> &[GeneratorError] {
        &self.errors
    }

    /// Document one operation.
    ///
    /// # Arguments
    ///
    /// * `path` - Route path, `:name` or `{name}` parameters
    /// * `method` - HTTP method, any case
    /// * `group` - Tag of the operation, empty for none
    /// * `input` - Bindable input listing parameters and the request body
    /// * `output` - Model of the default response
    /// * `info` - Summary, ID, status and additional responses
    ///
    /// # Errors
    ///
    /// The error is also kept in [`Generator::errors`].
    pub fn add_operation(
        &mut self,
        path: &str,
        method: &str,
        group: &str,
        input: Option<&TypeInfo>,
        output: Option<&TypeInfo>,
        info: &OperationInfo,
    ) -> Result<Arc<Operation>, GeneratorError> {
        let result = self.build_operation(path, method, group, input, output, info);
        match &result {
            Ok(op) => debug!(method = %op.method, path = %op.path, id = %op.id, "operation documented"),
            Err(err) => {
                warn!(method, path, error = %err, "operation rejected");
                self.errors.push(err.clone());
            }
        }
        result
    }

    fn build_operation(
        &mut self,
        path: &str,
        method: &str,
        group: &str,
        input: Option<&TypeInfo>,
        output: Option<&TypeInfo>,
        info: &OperationInfo,
    ) -> Result<Arc<Operation>, GeneratorError> {
        let method = method.to_ascii_uppercase();
        let method_key = method.to_ascii_lowercase();
        let doc_path = openapi_path(path);

        if self
            .paths
            .get(&doc_path)
            .is_some_and(|item| item.contains_key(&method_key))
        {
            return Err(GeneratorError::DuplicateOperation {
                method,
                path: doc_path,
            });
        }
        if !info.id.is_empty() && self.operation_ids.contains(&info.id) {
            return Err(GeneratorError::DuplicateOperationId {
                id: info.id.clone(),
            });
        }

        let params = self.operation_params(&doc_path, input)?;
        let mut doc = Map::new();
        if !group.trim().is_empty() {
            doc.insert("tags".into(), json!([group.trim()]));
        }
        if !info.summary.is_empty() {
            doc.insert("summary".into(), info.summary.clone().into());
        }
        if !info.description.is_empty() {
            doc.insert("description".into(), info.description.clone().into());
        }
        if !info.id.is_empty() {
            doc.insert("operationId".into(), info.id.clone().into());
        }
        if info.deprecated {
            doc.insert("deprecated".into(), true.into());
        }
        if !params.is_empty() {
            let params = params.iter().map(parameter_document).collect();
            doc.insert("parameters".into(), Value::Array(params));
        }
        if let Some(input) = input {
            if matches!(method.as_str(), "POST" | "PUT" | "PATCH") {
                if let Some(schema) = self.model_schema(input) {
                    doc.insert(
                        "requestBody".into(),
                        json!({"required": true, "content": {"application/json": {"schema": schema}}}),
                    );
                }
            }
        }
        doc.insert(
            "responses".into(),
            Value::Object(self.responses(&doc_path, output, info)?),
        );

        let document = Value::Object(doc);
        self.paths
            .entry(doc_path.clone())
            .or_default()
            .insert(method_key, document.clone());
        if !info.id.is_empty() {
            self.operation_ids.insert(info.id.clone());
        }
        Ok(Arc::new(Operation {
            id: info.id.clone(),
            method,
            path: doc_path,
            group: group.trim().to_string(),
            document,
        }))
    }

    fn operation_params(
        &self,
        doc_path: &str,
        input: Option<&TypeInfo>,
    ) -> Result<Vec<ParamSpec>, GeneratorError> {
        let route_params: Vec<&str> = split_segments(doc_path).filter_map(param_name).collect();

        let Some(mut instance) = input.and_then(TypeInfo::instance) else {
            return Ok(route_params
                .into_iter()
                .map(|name| ParamSpec {
                    location: Location::Path,
                    name: name.to_string(),
                    field: "",
                    shape: Shape::Scalar,
                    schema: ParamSchema::STRING,
                    required: true,
                    default: None,
                    allowed: Vec::new(),
                    explode: true,
                    rules: String::new(),
                })
                .collect());
        };

        let params = describe_params(instance.as_mut(), &self.config)?;
        for name in &route_params {
            let declared = params
                .iter()
                .any(|p| p.location == Location::Path && p.name == *name);
            if !declared {
                return Err(GeneratorError::UndeclaredPathParameter {
                    name: (*name).to_string(),
                    path: doc_path.to_string(),
                });
            }
        }
        let mut seen = HashSet::new();
        for param in &params {
            if param.location == Location::Path && !route_params.contains(&param.name.as_str()) {
                return Err(GeneratorError::UnknownPathParameter {
                    name: param.name.clone(),
                    path: doc_path.to_string(),
                });
            }
            if !seen.insert((param.location, param.name.as_str())) {
                return Err(GeneratorError::DuplicateParameter {
                    name: param.name.clone(),
                    location: param.location,
                    path: doc_path.to_string(),
                });
            }
        }
        Ok(params)
    }

    fn responses(
        &mut self,
        doc_path: &str,
        output: Option<&TypeInfo>,
        info: &OperationInfo,
    ) -> Result<Map<String, Value>, GeneratorError> {
        let status = if info.status_code == 0 {
            StatusCode::OK.as_u16()
        } else {
            info.status_code
        };
        let description = if info.status_description.is_empty() {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default()
                .to_string()
        } else {
            info.status_description.clone()
        };

        let mut responses = Map::new();
        let mut default = json!({ "description": description });
        if let Some(schema) = output.and_then(|model| self.model_schema(model)) {
            default["content"] = json!({"application/json": {"schema": schema}});
        }
        if !info.headers.is_empty() {
            default["headers"] = self.headers_document(&info.headers);
        }
        responses.insert(status.to_string(), default);

        for extra in &info.responses {
            if responses.contains_key(&extra.code) {
                return Err(GeneratorError::DuplicateResponse {
                    code: extra.code.clone(),
                    path: doc_path.to_string(),
                });
            }
            let mut response = json!({ "description": extra.description });
            let mut media = Map::new();
            if let Some(schema) = extra.model.as_ref().and_then(|m| self.model_schema(m)) {
                media.insert("schema".into(), schema);
            }
            if let Some(example) = &extra.example {
                media.insert("example".into(), example.clone());
            }
            if !extra.examples.is_empty() {
                let examples: Map<String, Value> = extra
                    .examples
                    .iter()
                    .map(|(name, value)| (name.clone(), json!({ "value": value })))
                    .collect();
                media.insert("examples".into(), Value::Object(examples));
            }
            if !media.is_empty() {
                response["content"] = json!({ "application/json": media });
            }
            if !extra.headers.is_empty() {
                response["headers"] = self.headers_document(&extra.headers);
            }
            responses.insert(extra.code.clone(), response);
        }
        Ok(responses)
    }

    fn headers_document(&mut self, headers: &[ResponseHeader]) -> Value {
        let mut doc = Map::new();
        for header in headers {
            let schema = header
                .model
                .as_ref()
                .and_then(|m| self.model_schema(m))
                .unwrap_or_else(|| json!({"type": "string"}));
            doc.insert(
                header.name.clone(),
                json!({ "description": header.description, "schema": schema }),
            );
        }
        Value::Object(doc)
    }

    /// Schema for a model, registering the components it refers to.
    fn model_schema(&mut self, model: &TypeInfo) -> Option<Value> {
        if let Some(explicit) = model.schema() {
            let name = component_name(model.name());
            self.schemas.insert(name.clone(), explicit.clone());
            return Some(json!({ "$ref": format!("#/components/schemas/{}", name) }));
        }
        let schema = schema_for_name(model.name())?;
        self.register_refs(&schema);
        Some(schema)
    }

    fn register_refs(&mut self, schema: &Value) {
        match schema {
            Value::Object(map) => {
                if let Some(name) = map
                    .get("$ref")
                    .and_then(Value::as_str)
                    .and_then(|r| r.strip_prefix("#/components/schemas/"))
                {
                    self.schemas
                        .entry(name.to_string())
                        .or_insert_with(|| json!({"type": "object"}));
                }
                for value in map.values() {
                    self.register_refs(value);
                }
            }
            Value::Array(items) => items.iter().for_each(|v| self.register_refs(v)),
            _ => {}
        }
    }

    /// The full document.
    #[must_use]
    pub fn api(&self) -> Value {
        let mut doc = json!({
            "openapi": OPENAPI_VERSION,
            "info": self.info,
            "paths": self.paths,
        });
        if !self.tags.is_empty() {
            let tags: Vec<Value> = self
                .tags
                .iter()
                .map(|(name, description)| {
                    if description.is_empty() {
                        json!({ "name": name })
                    } else {
                        json!({ "name": name, "description": description })
                    }
                })
                .collect();
            doc["tags"] = Value::Array(tags);
        }
        if !self.schemas.is_empty() {
            doc["components"] = json!({ "schemas": self.schemas });
        }
        doc
    }

    /// The full document as YAML.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.api())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_path() {
        assert_eq!(openapi_path("/api/ping/:path1"), "/api/ping/{path1}");
        assert_eq!(openapi_path("/users/{id}/"), "/users/{id}/");
        assert_eq!(openapi_path(""), "/");
        assert_eq!(openapi_path("/"), "/");
    }

    #[test]
    fn test_typed_defaults() {
        assert_eq!(typed_value("5", "integer"), json!(5));
        assert_eq!(typed_value("1.5", "number"), json!(1.5));
        assert_eq!(typed_value("true", "boolean"), json!(true));
        assert_eq!(typed_value("x", "integer"), json!("x"));
    }

    #[test]
    fn test_tags_are_deduplicated() {
        let mut gen = Generator::default();
        gen.add_tag("pets", "Pet routes");
        gen.add_tag(" pets ", "other");
        gen.add_tag("  ", "ignored");
        let api = gen.api();
        assert_eq!(api["tags"], json!([{"name": "pets", "description": "Pet routes"}]));
    }

    #[test]
    fn test_path_params_without_input_are_strings() {
        let mut gen = Generator::default();
        let op = gen
            .add_operation("/pets/:id", "get", "", None, None, &OperationInfo::default())
            .unwrap();
        assert_eq!(op.method, "GET");
        assert_eq!(
            op.document["parameters"],
            json!([{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}])
        );
        assert_eq!(op.document["responses"]["200"]["description"], "OK");
    }

    #[test]
    fn test_duplicates_are_recorded() {
        let mut gen = Generator::default();
        let info = OperationInfo {
            id: "one".into(),
            ..OperationInfo::default()
        };
        gen.add_operation("/a", "GET", "", None, None, &info).unwrap();
        let err = gen.add_operation("/a", "get", "", None, None, &info).unwrap_err();
        assert!(matches!(err, GeneratorError::DuplicateOperation { .. }));
        let err = gen.add_operation("/b", "GET", "", None, None, &info).unwrap_err();
        assert_eq!(err, GeneratorError::DuplicateOperationId { id: "one".into() });
        assert_eq!(gen.errors().len(), 2);
    }
}
