//! Location-specific extraction of raw parameter values.

use std::fmt;

use super::tag::{parse_tag_key, TagError, TagKey};

/// Read access to the parts of a request that parameters bind from.
pub trait RequestFacade {
    /// Every value delivered for query key `name`, in request order.
    fn query_values(&self, name: &str) -> Vec<&str>;

    fn path_param(&self, name: &str) -> Option<&str>;

    /// Header value; names are case-insensitive.
    fn header(&self, name: &str) -> Option<&str>;
}

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Query,
    Path,
    Header,
}

impl Location {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Query => "query",
            Location::Path => "path",
            Location::Header => "header",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter name and the raw values found for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    Tag(TagError),
    Missing { location: Location, name: String },
    RepeatedValues { name: String },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Tag(err) => err.fmt(f),
            ExtractError::Missing { location, name } => {
                write!(f, "missing {} parameter: {}", location, name)
            }
            ExtractError::RepeatedValues { .. } => {
                f.write_str("repeating values not supported: use comma-separated list")
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Tag(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TagError> for ExtractError {
    fn from(err: TagError) -> Self {
        ExtractError::Tag(err)
    }
}

/// Extractor signature: request, location tag value, explode flag.
pub type Extractor = fn(&dyn RequestFacade, &str, bool) -> Result<Extracted, ExtractError>;

/// Apply the legacy `default=` and `required` tag options to an empty extraction.
fn finish(key: TagKey, location: Location, values: Vec<String>) -> Result<Extracted, ExtractError> {
    if values.is_empty() {
        if let Some(default) = key.default.filter(|d| !d.is_empty()) {
            return Ok(Extracted {
                name: key.name,
                values: vec![default],
            });
        }
        if key.required {
            return Err(ExtractError::Missing {
                location,
                name: key.name,
            });
        }
    }
    Ok(Extracted {
        name: key.name,
        values,
    })
}

/// Query extractor.
///
/// Repeating the key is an error; lists travel as one comma-separated
/// value. With `explode` that value is kept whole, without it the value is
/// split on commas. Empty values and parts are dropped.
pub fn extract_query(
    req: &dyn RequestFacade,
    tag: &str,
    explode: bool,
) -> Result<Extracted, ExtractError> {
    let key = parse_tag_key(tag)?;
    let delivered = req.query_values(&key.name);
    if delivered.len() > 1 {
        return Err(ExtractError::RepeatedValues { name: key.name });
    }

    let values: Vec<String> = match delivered.first() {
        None => Vec::new(),
        Some(raw) if explode => single(Some(raw)),
        Some(raw) => raw
            .split(',')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
    };
    finish(key, Location::Query, values)
}

/// Path extractor. The explode flag is ignored.
pub fn extract_path(
    req: &dyn RequestFacade,
    tag: &str,
    _explode: bool,
) -> Result<Extracted, ExtractError> {
    let key = parse_tag_key(tag)?;
    let values = single(req.path_param(&key.name));
    finish(key, Location::Path, values)
}

/// Header extractor. The explode flag is ignored.
pub fn extract_header(
    req: &dyn RequestFacade,
    tag: &str,
    _explode: bool,
) -> Result<Extracted, ExtractError> {
    let key = parse_tag_key(tag)?;
    let values = single(req.header(&key.name));
    finish(key, Location::Header, values)
}

fn single(value: Option<&str>) -> Vec<String> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| vec![v.to_string()])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::testing::FakeRequest;

    #[test]
    fn test_query_single_value() {
        let req = FakeRequest::new().query("q", "a,b");
        let got = extract_query(&req, "q", true).unwrap();
        assert_eq!(got.name, "q");
        assert_eq!(got.values, vec!["a,b"]);
    }

    #[test]
    fn test_query_split_when_not_exploded() {
        let req = FakeRequest::new().query("q", "a,,b,c,");
        let got = extract_query(&req, "q", false).unwrap();
        assert_eq!(got.values, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_query_repeated_keys() {
        let req = FakeRequest::new().query("q", "a").query("q", "b");
        for explode in [true, false] {
            let err = extract_query(&req, "q", explode).unwrap_err();
            assert_eq!(err, ExtractError::RepeatedValues { name: "q".into() });
            assert_eq!(
                err.to_string(),
                "repeating values not supported: use comma-separated list"
            );
        }
    }

    #[test]
    fn test_query_empty_value_is_absent() {
        let req = FakeRequest::new().query("q", "");
        assert!(extract_query(&req, "q", true).unwrap().values.is_empty());
        assert!(extract_query(&req, "q", false).unwrap().values.is_empty());
        assert_eq!(
            extract_query(&req, "q,default=x", true).unwrap().values,
            vec!["x"]
        );
    }

    #[test]
    fn test_legacy_default_is_not_split() {
        let req = FakeRequest::new();
        let got = extract_query(&req, "q,default=a,b", false);
        // `b` is parsed as an option of the tag, not part of the default.
        assert!(got.is_err());
        let got = extract_query(&req, "q,default=a b", true).unwrap();
        assert_eq!(got.values, vec!["a b"]);
    }

    #[test]
    fn test_legacy_required() {
        let req = FakeRequest::new().query("q1", "");
        let err = extract_query(&req, "q1,required", true).unwrap_err();
        assert_eq!(err.to_string(), "missing query parameter: q1");

        let err = extract_path(&req, "id,required", true).unwrap_err();
        assert_eq!(err.to_string(), "missing path parameter: id");

        let err = extract_header(&req, "X-Token,required", true).unwrap_err();
        assert_eq!(err.to_string(), "missing header parameter: X-Token");
    }

    #[test]
    fn test_path_and_header() {
        let req = FakeRequest::new()
            .path("id", "42")
            .header("x-trace", "abc");
        assert_eq!(extract_path(&req, "id", true).unwrap().values, vec!["42"]);
        assert_eq!(
            extract_header(&req, "X-Trace", true).unwrap().values,
            vec!["abc"]
        );
        assert!(extract_path(&req, "other", true).unwrap().values.is_empty());
        assert_eq!(
            extract_header(&req, "X-Missing,default=none", true)
                .unwrap()
                .values,
            vec!["none"]
        );
    }

    #[test]
    fn test_malformed_tag() {
        let req = FakeRequest::new();
        assert!(matches!(
            extract_header(&req, "X-A,optional", true),
            Err(ExtractError::Tag(TagError::UnknownOption { .. }))
        ));
    }
}
