use crate::binding::{explode_flag, parse_tag_key, Bindable, FieldMut, FieldRef, Location, Tags};
use crate::validation::validator;

use super::generator::GeneratorError;
use super::types::{ParamSpec, SpecGenConfig};

/// List the parameters a bindable input reads, embedded structs included.
///
/// # Errors
///
/// Fails on the first malformed location tag or unknown validation rule.
pub fn describe_params(
    input: &mut dyn Bindable,
    config: &SpecGenConfig,
) -> Result<Vec<ParamSpec>, GeneratorError> {
    let mut params = Vec::new();
    collect(input, config, &mut params)?;
    check_rules(input, config)?;
    Ok(params)
}

fn check_rules(input: &dyn Bindable, config: &SpecGenConfig) -> Result<(), GeneratorError> {
    for field in input.fields() {
        match field {
            FieldRef::Embedded(Some(inner)) => check_rules(inner, config)?,
            FieldRef::Embedded(None) => {}
            FieldRef::Value { name, tags, .. } => {
                validator()
                    .check_rules(tags.get(config.validator_tag))
                    .map_err(|rule| GeneratorError::UnknownValidation {
                        type_name: input.type_name(),
                        field: name,
                        rule,
                    })?;
            }
        }
    }
    Ok(())
}

fn collect(
    input: &mut dyn Bindable,
    config: &SpecGenConfig,
    params: &mut Vec<ParamSpec>,
) -> Result<(), GeneratorError> {
    let type_name = input.type_name();
    for field in input.fields_mut() {
        let (name, tags, target) = match field {
            FieldMut::Embedded(inner) => {
                collect(inner, config, params)?;
                continue;
            }
            FieldMut::Param { name, tags, target } => (name, tags, target),
        };
        for (location, tag) in config.locations() {
            let raw = tags.get(tag);
            if raw.is_empty() {
                continue;
            }
            let key = parse_tag_key(raw).map_err(|source| GeneratorError::InvalidTag {
                type_name,
                field: name,
                source,
            })?;
            let rules = tags.get(config.validator_tag).to_string();
            params.push(ParamSpec {
                location,
                required: location == Location::Path || key.required || has_required(&rules),
                default: tags
                    .lookup(config.default_tag)
                    .map(str::to_string)
                    .or(key.default),
                allowed: allowed_values(tags, config),
                explode: explode_flag(tags),
                name: key.name,
                field: name,
                shape: target.shape(),
                schema: target.schema(),
                rules,
            });
        }
    }
    Ok(())
}

fn has_required(rules: &str) -> bool {
    rules.split(',').any(|rule| rule.trim() == "required")
}

fn allowed_values(tags: Tags, config: &SpecGenConfig) -> Vec<String> {
    let raw = tags.get(config.enum_tag).trim();
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::to_string).collect()
}
