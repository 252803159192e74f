use tracing::trace;

use super::error::{BindError, BindErrorKind};
use super::extract::{Extracted, Extractor, RequestFacade};
use super::model::{Bindable, FieldMut};
use super::slot::{Shape, Target};
use super::tag::{Tags, DEFAULT_TAG, ENUM_TAG, EXPLODE_TAG};

/// Explode flag of a field: `true` unless the `explode` tag parses as `false`.
#[must_use]
pub fn explode_flag(tags: Tags) -> bool {
    match tags.lookup(EXPLODE_TAG) {
        Some(raw) => !matches!(raw, "0" | "f" | "F" | "FALSE" | "false" | "False"),
        None => true,
    }
}

/// Bind the fields of `target` tagged with `tag_key` using `extract`.
///
/// Fields are visited in declaration order and embedded structs are bound
/// recursively. Fields written before a failure keep their new values.
///
/// # Errors
///
/// Returns a [`BindError`] naming the field and the struct that owns it.
pub fn bind(
    req: &dyn RequestFacade,
    target: &mut dyn Bindable,
    tag_key: &str,
    extract: Extractor,
) -> Result<(), BindError> {
    let type_name = target.type_name();
    for field in target.fields_mut() {
        match field {
            FieldMut::Embedded(inner) => bind(req, inner, tag_key, extract)?,
            FieldMut::Param {
                name,
                tags,
                mut target,
            } => {
                let tag_value = tags.get(tag_key);
                if tag_value.is_empty() {
                    continue;
                }
                bind_field(req, tags, tag_value, target.as_mut(), extract)
                    .map_err(|kind| BindError::field(name, type_name, kind))?;
            }
        }
    }
    Ok(())
}

fn bind_field(
    req: &dyn RequestFacade,
    tags: Tags,
    tag_value: &str,
    target: &mut dyn Target,
    extract: Extractor,
) -> Result<(), BindErrorKind> {
    let explode = explode_flag(tags);
    let Extracted { name, mut values } =
        extract(req, tag_value, explode).map_err(BindErrorKind::Extract)?;

    if values.is_empty() {
        if let Some(default) = tags.lookup(DEFAULT_TAG) {
            if explode {
                values.extend(default.split(',').map(str::to_string));
            } else {
                values.push(default.to_string());
            }
        }
    }
    if values.is_empty() {
        trace!(param = %name, "parameter absent, field left untouched");
        return Ok(());
    }

    let shape = target.shape();
    if values.len() > 1 && !shape.is_sequence() {
        return Err(BindErrorKind::MultipleValues);
    }
    if let Shape::Array(expected) = shape {
        if expected != values.len() {
            return Err(BindErrorKind::CountMismatch {
                expected,
                got: values.len(),
            });
        }
    }
    if shape == Shape::Scalar {
        let allowed = tags.get(ENUM_TAG).trim();
        if !allowed.is_empty() {
            let allowed: Vec<String> = allowed.split(',').map(str::to_string).collect();
            if !allowed.contains(&values[0]) {
                return Err(BindErrorKind::Enum { allowed });
            }
        }
    }

    trace!(param = %name, count = values.len(), ty = target.type_name(), "binding parameter");
    target.assign(&values).map_err(BindErrorKind::Coerce)
}
