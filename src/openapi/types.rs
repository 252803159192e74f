use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::any::type_name;
use std::fmt;
use std::str::FromStr;

use crate::binding::{
    Bindable, Location, ParamSchema, Shape, DEFAULT_TAG, ENUM_TAG, HEADER_TAG, PATH_TAG,
    QUERY_TAG, VALIDATION_TAG,
};

/// Rust type documented as a parameter source, body or response model.
#[derive(Clone)]
pub struct TypeInfo {
    name: String,
    rust_name: &'static str,
    factory: Option<fn() -> Box<dyn Bindable>>,
    schema: Option<Value>,
}

fn zero_instance<T: Bindable + Default + 'static>() -> Box<dyn Bindable> {
    Box::new(T::default())
}

impl TypeInfo {
    /// Describe `T` by name. `Option`, `Box` and `Arc` wrappers are transparent.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let rust_name = type_name::<T>();
        TypeInfo {
            name: schema_name(rust_name),
            rust_name,
            factory: None,
            schema: None,
        }
    }

    /// Describe a bindable input whose parameters can be listed.
    #[must_use]
    pub fn input<T: Bindable + Default + 'static>() -> Self {
        TypeInfo {
            factory: Some(zero_instance::<T>),
            ..Self::of::<T>()
        }
    }

    /// Attach an explicit JSON schema used for the component.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Short name, e.g. `Pet` or `Vec<Pet>`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    #[must_use]
    pub fn schema(&self) -> Option<&Value> {
        self.schema.as_ref()
    }

    /// A zeroed instance, for bindable inputs.
    #[must_use]
    pub fn instance(&self) -> Option<Box<dyn Bindable>> {
        self.factory.map(|make| make())
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("rust_name", &self.rust_name)
            .field("bindable", &self.factory.is_some())
            .finish()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.rust_name == other.rust_name
    }
}

/// Strip module paths and transparent wrappers from a `type_name`.
pub(crate) fn schema_name(rust_name: &str) -> String {
    let mut short = String::with_capacity(rust_name.len());
    let mut ident = String::new();
    for c in rust_name.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            ident.push(c);
        } else {
            short.push_str(ident.rsplit("::").next().unwrap_or_default());
            ident.clear();
            short.push(c);
        }
    }
    short.push_str(ident.rsplit("::").next().unwrap_or_default());

    let mut name = short.trim_start_matches('&').trim();
    loop {
        let unwrapped = ["Option<", "Box<", "Arc<", "Rc<"]
            .iter()
            .find_map(|w| name.strip_prefix(w).and_then(|rest| rest.strip_suffix('>')));
        match unwrapped {
            Some(inner) => name = inner.trim_start_matches('&').trim(),
            None => break,
        }
    }
    name.to_string()
}

/// Split `Name<A, B>` into `("Name", ["A", "B"])` at the top level.
fn generic_args(name: &str) -> Option<(&str, Vec<&str>)> {
    let open = name.find('<')?;
    let inner = name[open + 1..].strip_suffix('>')?;
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' | '[' | '(' => depth += 1,
            '>' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(inner[start..].trim());
    Some((&name[..open], args))
}

/// Schema of a named type: inline for primitives and containers, a
/// component reference otherwise. `None` for types rendering nothing.
pub(crate) fn schema_for_name(name: &str) -> Option<Value> {
    let schema = match name {
        "()" => return None,
        "i8" | "i16" | "i32" | "u8" | "u16" => json!({"type": "integer", "format": "int32"}),
        "i64" | "i128" | "isize" | "u32" | "u64" | "u128" | "usize" => {
            json!({"type": "integer", "format": "int64"})
        }
        "f32" => json!({"type": "number", "format": "float"}),
        "f64" => json!({"type": "number", "format": "double"}),
        "bool" => json!({"type": "boolean"}),
        "String" | "str" | "char" | "Cow<str>" => json!({"type": "string"}),
        "Ulid" => json!({"type": "string", "format": "ulid"}),
        "Url" => json!({"type": "string", "format": "uri"}),
        "Duration" => json!({"type": "string", "format": "duration"}),
        "Value" => json!({}),
        _ => {
            if let Some(item) = name
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .map(|rest| rest.split(';').next().unwrap_or_default().trim())
            {
                return Some(json!({"type": "array", "items": schema_for_name(item)?}));
            }
            match generic_args(name) {
                Some(("Vec" | "VecDeque" | "HashSet" | "BTreeSet", args)) if args.len() == 1 => {
                    json!({"type": "array", "items": schema_for_name(args[0])?})
                }
                Some(("HashMap" | "BTreeMap", args)) if args.len() >= 2 => {
                    json!({"type": "object", "additionalProperties": schema_for_name(args[1])?})
                }
                _ => json!({"$ref": format!("#/components/schemas/{}", component_name(name))}),
            }
        }
    };
    Some(schema)
}

/// Component key for a named type (`Page<Pet>` becomes `PagePet`).
pub(crate) fn component_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// `info` block of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub version: String,
}

impl Default for Info {
    fn default() -> Self {
        Info {
            title: "API".to_string(),
            description: String::new(),
            version: "1.0.0".to_string(),
        }
    }
}

/// Serialization of the served document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFormat {
    #[default]
    Json,
    Yaml,
}

/// Unknown document format name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDocFormat(pub String);

impl fmt::Display for InvalidDocFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid content type, use JSON or YAML: '{}'", self.0)
    }
}

impl std::error::Error for InvalidDocFormat {}

impl FromStr for DocFormat {
    type Err = InvalidDocFormat;

    /// Case-insensitive; an empty name means JSON.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "json" => Ok(DocFormat::Json),
            "yaml" | "yml" => Ok(DocFormat::Yaml),
            _ => Err(InvalidDocFormat(s.to_string())),
        }
    }
}

/// Tag names the generator reads field metadata from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGenConfig {
    pub validator_tag: &'static str,
    pub path_location_tag: &'static str,
    pub query_location_tag: &'static str,
    pub header_location_tag: &'static str,
    pub enum_tag: &'static str,
    pub default_tag: &'static str,
}

impl Default for SpecGenConfig {
    fn default() -> Self {
        SpecGenConfig {
            validator_tag: VALIDATION_TAG,
            path_location_tag: PATH_TAG,
            query_location_tag: QUERY_TAG,
            header_location_tag: HEADER_TAG,
            enum_tag: ENUM_TAG,
            default_tag: DEFAULT_TAG,
        }
    }
}

impl SpecGenConfig {
    pub(crate) fn locations(&self) -> [(Location, &'static str); 3] {
        [
            (Location::Path, self.path_location_tag),
            (Location::Query, self.query_location_tag),
            (Location::Header, self.header_location_tag),
        ]
    }
}

/// A documented operation, as registered.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub id: String,
    pub method: String,
    /// OpenAPI path, `{name}` style.
    pub path: String,
    pub group: String,
    /// The operation object inserted into the document.
    pub document: Value,
}

/// A parameter described from a bindable input field.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub location: Location,
    pub name: String,
    /// Rust field name.
    pub field: &'static str,
    pub shape: Shape,
    pub schema: ParamSchema,
    pub required: bool,
    pub default: Option<String>,
    pub allowed: Vec<String>,
    pub explode: bool,
    /// Validation rules, verbatim.
    pub rules: String,
}
