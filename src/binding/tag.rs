use std::fmt;

/// Field tag naming the query parameter a field binds from.
pub const QUERY_TAG: &str = "query";
/// Field tag naming the path parameter a field binds from.
pub const PATH_TAG: &str = "path";
/// Field tag naming the header a field binds from.
pub const HEADER_TAG: &str = "header";
/// Comma-separated list of accepted values for a scalar field.
pub const ENUM_TAG: &str = "enum";
/// Legacy option inside a location tag marking the parameter as mandatory.
pub const REQUIRED_TAG: &str = "required";
/// Default value tag; also the prefix of the legacy `default=` option.
pub const DEFAULT_TAG: &str = "default";
/// Rule string consumed by the validator.
pub const VALIDATION_TAG: &str = "validate";
/// `true`/`false` switch for splitting query values on commas.
pub const EXPLODE_TAG: &str = "explode";

/// Parsed form of a location tag such as `"limit,required,default=10"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagKey {
    pub name: String,
    /// Legacy `required` option.
    pub required: bool,
    /// Legacy `default=<v>` option.
    pub default: Option<String>,
}

/// Malformed location tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    EmptyName { tag: String },
    UnknownOption { name: String, option: String },
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagError::EmptyName { tag } => {
                write!(f, "malformed tag '{}': parameter name is empty", tag)
            }
            TagError::UnknownOption { name, option } => write!(
                f,
                "malformed tag for param '{}': unknown option '{}'",
                name, option
            ),
        }
    }
}

impl std::error::Error for TagError {}

/// Parse a location tag into its name and legacy options.
///
/// The first comma-separated segment is the parameter name. Every other
/// segment, once trimmed, must be `required` or `default=<value>`.
///
/// # Errors
///
/// Returns [`TagError::EmptyName`] for an empty name and
/// [`TagError::UnknownOption`] for any other option.
pub fn parse_tag_key(tag: &str) -> Result<TagKey, TagError> {
    let mut parts = tag.split(',');
    let name = parts.next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err(TagError::EmptyName {
            tag: tag.to_string(),
        });
    }

    let mut key = TagKey {
        name: name.to_string(),
        required: false,
        default: None,
    };
    for option in parts {
        let option = option.trim();
        if option == REQUIRED_TAG {
            key.required = true;
        } else if let Some(value) = option
            .strip_prefix(DEFAULT_TAG)
            .and_then(|rest| rest.strip_prefix('='))
        {
            key.default = Some(value.to_string());
        } else {
            return Err(TagError::UnknownOption {
                name: key.name,
                option: option.to_string(),
            });
        }
    }
    Ok(key)
}

/// Parse a location tag and return only the parameter name.
///
/// The legacy `required` and `default=` options are accepted but not
/// exposed; the `validate` and `default` tags supersede them.
pub fn parse_tag_name(tag: &str) -> Result<String, TagError> {
    parse_tag_key(tag).map(|key| key.name)
}

/// Static tag table attached to a field by `#[derive(Bind)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tags(&'static [(&'static str, &'static str)]);

impl Tags {
    pub const EMPTY: Tags = Tags(&[]);

    #[must_use]
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Tags(entries)
    }

    /// Value of `key`, or `""` when the tag is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &'static str {
        self.lookup(key).unwrap_or_default()
    }

    /// Value of `key`, distinguishing an absent tag from an empty one.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let key = parse_tag_key("limit").unwrap();
        assert_eq!(key.name, "limit");
        assert!(!key.required);
        assert_eq!(key.default, None);
    }

    #[test]
    fn test_parse_legacy_options() {
        let key = parse_tag_key("name,required,default=5").unwrap();
        assert_eq!(key.name, "name");
        assert!(key.required);
        assert_eq!(key.default.as_deref(), Some("5"));
    }

    #[test]
    fn test_options_are_trimmed() {
        let key = parse_tag_key("name, required , default=a b").unwrap();
        assert!(key.required);
        assert_eq!(key.default.as_deref(), Some("a b"));
    }

    #[test]
    fn test_unknown_option() {
        let err = parse_tag_key("name,bogus").unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed tag for param 'name': unknown option 'bogus'"
        );
    }

    #[test]
    fn test_default_prefix_needs_equals() {
        assert!(matches!(
            parse_tag_key("name,defaults"),
            Err(TagError::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_empty_name() {
        assert!(matches!(
            parse_tag_key(",required"),
            Err(TagError::EmptyName { .. })
        ));
        assert!(parse_tag_name("").is_err());
    }

    #[test]
    fn test_tag_table_lookup() {
        let tags = Tags::new(&[("query", "q"), ("default", "")]);
        assert_eq!(tags.get("query"), "q");
        assert_eq!(tags.get("enum"), "");
        assert_eq!(tags.lookup("default"), Some(""));
        assert_eq!(tags.lookup("enum"), None);
    }
}
