//! Tag-driven validation of bound handler inputs.
//!
//! Fields opt in with a `validate` attribute holding a comma-separated rule
//! list such as `"required,min=3,max=64"`. Alternatives are separated with
//! `|` (`"email|url"`), a parameter follows `=`, and `-` skips the field.
//!
//! The process-wide [`Validator`] is built lazily by [`validator`]. Custom
//! rules registered through [`register_validation`] take precedence over the
//! built-in ones.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::binding::{parse_duration, Bindable, FieldRef, VALIDATION_TAG};

/// Value of a field as seen by validation rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// `None` or JSON `null`.
    Absent,
    Str(&'a str),
    Int(i128),
    Float(f64),
    Bool(bool),
    Duration(Duration),
    /// Sequence or map with this many entries.
    Collection(usize),
    /// Present, but with no comparable representation.
    Opaque,
}

impl FieldValue<'_> {
    /// Whether the value counts as unset for `required` and `omitempty`.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::Int(i) => *i == 0,
            FieldValue::Float(f) => *f == 0.0,
            FieldValue::Bool(b) => !b,
            FieldValue::Duration(d) => d.is_zero(),
            FieldValue::Collection(len) => *len == 0,
            FieldValue::Opaque => false,
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => Ok(()),
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Duration(d) => write!(f, "{:?}", d),
            FieldValue::Collection(len) => write!(f, "[{} items]", len),
            FieldValue::Opaque => f.write_str("<opaque>"),
        }
    }
}

/// Exposes a field to validation rules.
pub trait Inspect {
    fn inspect(&self) -> FieldValue<'_>;

    /// `Some(is_set)` for optional fields, whose `required` and `omitempty`
    /// checks test presence rather than the zero value.
    fn presence(&self) -> Option<bool> {
        None
    }
}

impl Inspect for str {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl Inspect for String {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl<T: Inspect + ?Sized> Inspect for &T {
    fn inspect(&self) -> FieldValue<'_> {
        (**self).inspect()
    }

    fn presence(&self) -> Option<bool> {
        (**self).presence()
    }
}

impl<T: Inspect + ?Sized> Inspect for Box<T> {
    fn inspect(&self) -> FieldValue<'_> {
        (**self).inspect()
    }

    fn presence(&self) -> Option<bool> {
        (**self).presence()
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn inspect(&self) -> FieldValue<'_> {
        self.as_ref().map_or(FieldValue::Absent, Inspect::inspect)
    }

    fn presence(&self) -> Option<bool> {
        Some(self.is_some())
    }
}

macro_rules! inspect_int {
    ($($ty:ty),*) => {$(
        impl Inspect for $ty {
            fn inspect(&self) -> FieldValue<'_> {
                FieldValue::Int(*self as i128)
            }
        }
    )*};
}

inspect_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Inspect for f32 {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Float(f64::from(*self))
    }
}

impl Inspect for f64 {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Float(*self)
    }
}

impl Inspect for bool {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

impl Inspect for Duration {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Duration(*self)
    }
}

impl<T> Inspect for Vec<T> {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Collection(self.len())
    }
}

impl<T, const N: usize> Inspect for [T; N] {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Collection(N)
    }
}

impl<K, V, S> Inspect for HashMap<K, V, S> {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Collection(self.len())
    }
}

impl<K, V> Inspect for BTreeMap<K, V> {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Collection(self.len())
    }
}

impl Inspect for url::Url {
    fn inspect(&self) -> FieldValue<'_> {
        FieldValue::Str(self.as_str())
    }
}

macro_rules! inspect_opaque {
    ($($ty:ty),*) => {$(
        impl Inspect for $ty {
            fn inspect(&self) -> FieldValue<'_> {
                FieldValue::Opaque
            }
        }
    )*};
}

inspect_opaque!(IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ulid::Ulid);

impl Inspect for serde_json::Value {
    fn inspect(&self) -> FieldValue<'_> {
        use serde_json::Value;
        match self {
            Value::Null => FieldValue::Absent,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i128::from(i)),
                None => n
                    .as_u64()
                    .map(|u| FieldValue::Int(i128::from(u)))
                    .or_else(|| n.as_f64().map(FieldValue::Float))
                    .unwrap_or(FieldValue::Opaque),
            },
            Value::String(s) => FieldValue::Str(s),
            Value::Array(items) => FieldValue::Collection(items.len()),
            Value::Object(map) => FieldValue::Collection(map.len()),
        }
    }
}

/// What a custom rule sees for the field under validation.
#[derive(Debug, Clone, Copy)]
pub struct FieldLevel<'a> {
    field: &'a str,
    param: &'a str,
    value: FieldValue<'a>,
    unset: bool,
}

impl<'a> FieldLevel<'a> {
    #[must_use]
    pub fn field_name(&self) -> &'a str {
        self.field
    }

    /// Text after `=` in the rule, or `""`.
    #[must_use]
    pub fn param(&self) -> &'a str {
        self.param
    }

    #[must_use]
    pub fn value(&self) -> FieldValue<'a> {
        self.value
    }

    /// Whether the field counts as unset: `None` for optional fields, the
    /// zero value for the rest.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.unset
    }
}

/// Custom validation rule.
pub type RuleFn = Arc<dyn Fn(&FieldLevel<'_>) -> bool + Send + Sync>;

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// `Type.field`, with embedded type names in between.
    pub namespace: String,
    pub field: String,
    pub tag: String,
    pub param: String,
    pub value: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Key: '{}' Error:Field validation for '{}' failed on the '{}' tag",
            self.namespace, self.field, self.tag
        )
    }
}

/// Every rule that failed for one struct, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            err.fmt(f)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    EmptyTag,
    ReservedTag(String),
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterError::EmptyTag => f.write_str("function Key cannot be empty"),
            RegisterError::ReservedTag(tag) => {
                write!(f, "tag '{}' either contains restricted characters or is the same as a restricted tag needed for normal operation", tag)
            }
        }
    }
}

impl std::error::Error for RegisterError {}

const OMIT_EMPTY: &str = "omitempty";
const SKIP: &str = "-";

static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$").ok()
});
static NUMERIC: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").ok());

/// Rule-driven struct validator reading one field tag.
pub struct Validator {
    tag_name: &'static str,
    custom: RwLock<HashMap<String, RuleFn>>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let custom = self.custom.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Validator")
            .field("tag_name", &self.tag_name)
            .field("custom", &custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Validator {
    #[must_use]
    pub fn new(tag_name: &'static str) -> Self {
        Validator {
            tag_name,
            custom: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn tag_name(&self) -> &'static str {
        self.tag_name
    }

    /// Add a rule under `tag`, replacing any built-in or earlier rule.
    pub fn register_validation<F>(&self, tag: &str, rule: F) -> Result<(), RegisterError>
    where
        F: Fn(&FieldLevel<'_>) -> bool + Send + Sync + 'static,
    {
        if tag.is_empty() {
            return Err(RegisterError::EmptyTag);
        }
        if tag == OMIT_EMPTY || tag == SKIP || tag.contains([',', '|', '=']) {
            return Err(RegisterError::ReservedTag(tag.to_string()));
        }
        self.custom
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tag.to_string(), Arc::new(rule));
        debug!(tag, "custom validation registered");
        Ok(())
    }

    /// Validate every tagged field of `target`, embedded structs included.
    ///
    /// # Errors
    ///
    /// Returns all failed rules; an empty result is `Ok`.
    pub fn validate_struct(&self, target: &dyn Bindable) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        self.walk(target, target.type_name(), &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    fn walk(&self, target: &dyn Bindable, namespace: &str, errors: &mut Vec<FieldError>) {
        for field in target.fields() {
            match field {
                FieldRef::Embedded(Some(inner)) => {
                    let nested = format!("{}.{}", namespace, inner.type_name());
                    self.walk(inner, &nested, errors);
                }
                FieldRef::Embedded(None) => {}
                FieldRef::Value { name, tags, value } => {
                    let rules = tags.get(self.tag_name);
                    if let Some(err) =
                        self.check_field(namespace, name, rules, value.inspect(), value.presence())
                    {
                        errors.push(err);
                    }
                }
            }
        }
    }

    /// First failing rule of one field, if any.
    fn check_field(
        &self,
        namespace: &str,
        field: &str,
        rules: &str,
        value: FieldValue<'_>,
        presence: Option<bool>,
    ) -> Option<FieldError> {
        if rules.is_empty() || rules == SKIP {
            return None;
        }
        let unset = presence.map_or_else(|| value.is_zero(), |set| !set);
        for rule in rules.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            if rule == OMIT_EMPTY {
                if unset {
                    return None;
                }
                continue;
            }
            let passed = rule.split('|').any(|alternative| {
                let (tag, param) = alternative.split_once('=').unwrap_or((alternative, ""));
                self.run(
                    tag,
                    &FieldLevel {
                        field,
                        param,
                        value,
                        unset,
                    },
                )
            });
            if !passed {
                let (tag, param) = rule.split_once('=').unwrap_or((rule, ""));
                return Some(FieldError {
                    namespace: format!("{}.{}", namespace, field),
                    field: field.to_string(),
                    tag: tag.to_string(),
                    param: param.to_string(),
                    value: value.to_string(),
                });
            }
        }
        None
    }

    fn run(&self, tag: &str, level: &FieldLevel<'_>) -> bool {
        let custom = self
            .custom
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .cloned();
        match custom {
            Some(rule) => rule(level),
            None => builtin(tag, level).unwrap_or(false),
        }
    }

    /// First rule name in `rules` that is neither built in nor registered.
    ///
    /// # Errors
    ///
    /// Returns the unknown rule name.
    pub fn check_rules(&self, rules: &str) -> Result<(), String> {
        if rules.trim() == SKIP {
            return Ok(());
        }
        let custom = self.custom.read().unwrap_or_else(PoisonError::into_inner);
        let unknown = rules
            .split([',', '|'])
            .map(|rule| rule.split_once('=').map_or(rule, |(tag, _)| tag).trim())
            .filter(|tag| !tag.is_empty() && *tag != OMIT_EMPTY)
            .find(|tag| !BUILTIN_RULES.contains(tag) && !custom.contains_key(*tag));
        match unknown {
            Some(tag) => Err(tag.to_string()),
            None => Ok(()),
        }
    }
}

const BUILTIN_RULES: &[&str] = &[
    "required", "len", "min", "max", "eq", "ne", "gt", "gte", "lt", "lte", "oneof", "email",
    "url", "alpha", "alphanum", "numeric", "contains", "startswith", "endswith",
];

/// Length or magnitude used by the ordering rules.
fn measure(value: FieldValue<'_>) -> Option<f64> {
    match value {
        FieldValue::Str(s) => Some(s.chars().count() as f64),
        FieldValue::Int(i) => Some(i as f64),
        FieldValue::Float(f) => Some(f),
        FieldValue::Duration(d) => Some(d.as_nanos() as f64),
        FieldValue::Collection(len) => Some(len as f64),
        _ => None,
    }
}

fn threshold(value: FieldValue<'_>, param: &str) -> Option<f64> {
    match value {
        FieldValue::Duration(_) => parse_duration(param).ok().map(|d| d.as_nanos() as f64),
        _ => param.parse::<f64>().ok(),
    }
}

fn compare(value: FieldValue<'_>, param: &str, accept: fn(f64, f64) -> bool) -> Option<bool> {
    Some(accept(measure(value)?, threshold(value, param)?))
}

fn text(value: FieldValue<'_>) -> Option<&str> {
    match value {
        FieldValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Evaluate a built-in rule; `None` when the rule is unknown or does not
/// apply to the value's kind.
fn builtin(tag: &str, level: &FieldLevel<'_>) -> Option<bool> {
    let (param, value) = (level.param, level.value);
    match tag {
        "required" => Some(!level.unset),
        "len" => compare(value, param, |a, b| a == b),
        "min" | "gte" => compare(value, param, |a, b| a >= b),
        "max" | "lte" => compare(value, param, |a, b| a <= b),
        "gt" => compare(value, param, |a, b| a > b),
        "lt" => compare(value, param, |a, b| a < b),
        "eq" | "ne" => {
            let equal = match value {
                FieldValue::Str(s) => s == param,
                FieldValue::Bool(b) => Some(b) == param.parse::<bool>().ok(),
                other => compare(other, param, |a, b| a == b)?,
            };
            Some(if tag == "eq" { equal } else { !equal })
        }
        "oneof" => {
            let mut choices = param.split_whitespace();
            match value {
                FieldValue::Str(s) => Some(choices.any(|c| c == s)),
                FieldValue::Int(i) => Some(choices.any(|c| c.parse::<i128>().ok() == Some(i))),
                _ => None,
            }
        }
        "email" => {
            let s = text(value)?;
            EMAIL.as_ref().map(|re| re.is_match(s))
        }
        "numeric" => {
            let s = text(value)?;
            NUMERIC.as_ref().map(|re| re.is_match(s))
        }
        "url" => {
            let s = text(value)?;
            Some(url::Url::parse(s).is_ok_and(|u| !u.scheme().is_empty()))
        }
        "alpha" => {
            let s = text(value)?;
            Some(!s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()))
        }
        "alphanum" => {
            let s = text(value)?;
            Some(!s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
        }
        "contains" => Some(text(value)?.contains(param)),
        "startswith" => Some(text(value)?.starts_with(param)),
        "endswith" => Some(text(value)?.ends_with(param)),
        _ => None,
    }
}

static VALIDATOR: OnceCell<Validator> = OnceCell::new();

/// Process-wide validator reading the `validate` tag, built on first use.
pub fn validator() -> &'static Validator {
    VALIDATOR.get_or_init(|| {
        debug!(tag_name = VALIDATION_TAG, "initializing validator");
        Validator::new(VALIDATION_TAG)
    })
}

/// Register a custom rule on the process-wide validator.
///
/// Registration is meant to happen during startup, before requests are
/// served; rules registered later only affect subsequent validations.
pub fn register_validation<F>(tag: &str, rule: F) -> Result<(), RegisterError>
where
    F: Fn(&FieldLevel<'_>) -> bool + Send + Sync + 'static,
{
    validator().register_validation(tag, rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bind;

    #[derive(Debug, Default, Bind)]
    struct Inner {
        #[bind(query = "code", validate = "omitempty,len=3")]
        code: String,
    }

    #[derive(Debug, Default, Bind)]
    struct Signup {
        #[bind(validate = "required,email")]
        email: String,
        #[bind(validate = "min=18,max=130")]
        age: u8,
        #[bind(validate = "oneof=free pro")]
        plan: String,
        #[bind(validate = "omitempty,url")]
        homepage: Option<String>,
        #[bind(validate = "max=2")]
        tags: Vec<String>,
        #[bind(validate = "gte=1s")]
        timeout: Duration,
        #[bind(embed)]
        inner: Inner,
    }

    fn valid() -> Signup {
        Signup {
            email: "ada@example.com".into(),
            age: 36,
            plan: "pro".into(),
            homepage: None,
            tags: vec!["a".into()],
            timeout: Duration::from_secs(5),
            inner: Inner::default(),
        }
    }

    #[test]
    fn test_valid_struct() {
        Validator::new(VALIDATION_TAG)
            .validate_struct(&valid())
            .unwrap();
    }

    #[test]
    fn test_failures_are_collected_in_order() {
        let mut signup = valid();
        signup.email.clear();
        signup.age = 12;
        signup.tags = vec!["a".into(), "b".into(), "c".into()];
        let errs = Validator::new(VALIDATION_TAG)
            .validate_struct(&signup)
            .unwrap_err();
        let tags: Vec<&str> = errs.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["required", "min", "max"]);
        assert_eq!(
            errs.errors()[0].to_string(),
            "Key: 'Signup.email' Error:Field validation for 'email' failed on the 'required' tag"
        );
        assert_eq!(errs.errors()[1].param, "18");
    }

    #[test]
    fn test_omitempty_and_embedded_namespace() {
        let mut signup = valid();
        signup.homepage = Some("not a url".into());
        signup.inner.code = "toolong".into();
        let errs = Validator::new(VALIDATION_TAG)
            .validate_struct(&signup)
            .unwrap_err();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs.errors()[0].tag, "url");
        assert_eq!(errs.errors()[1].namespace, "Signup.Inner.code");
    }

    #[test]
    fn test_duration_threshold() {
        let mut signup = valid();
        signup.timeout = Duration::from_millis(10);
        let errs = Validator::new(VALIDATION_TAG)
            .validate_struct(&signup)
            .unwrap_err();
        assert_eq!(errs.errors()[0].tag, "gte");
    }

    #[test]
    fn test_custom_rule_overrides_and_extends() {
        let v = Validator::new(VALIDATION_TAG);
        v.register_validation("email", |fl| {
            matches!(fl.value(), FieldValue::Str(s) if s.ends_with("@corp.example"))
        })
        .unwrap();
        let errs = v.validate_struct(&valid()).unwrap_err();
        assert_eq!(errs.errors()[0].tag, "email");

        assert_eq!(
            v.register_validation("", |_| true),
            Err(RegisterError::EmptyTag)
        );
        assert!(v.register_validation("omitempty", |_| true).is_err());
    }

    #[test]
    fn test_alternatives_and_unknown_rules() {
        let check = |rules: &str, value: FieldValue<'_>| {
            Validator::new(VALIDATION_TAG)
                .check_field("T", "f", rules, value, None)
                .map(|e| e.tag)
        };
        assert_eq!(check("email|url", FieldValue::Str("https://a.example")), None);
        assert_eq!(
            check("nosuchrule", FieldValue::Str("x")).as_deref(),
            Some("nosuchrule")
        );
        assert_eq!(check("-", FieldValue::Absent), None);
        assert_eq!(check("eq=abc", FieldValue::Str("abc")), None);
        assert_eq!(check("ne=0", FieldValue::Int(0)).as_deref(), Some("ne"));
        assert_eq!(check("numeric", FieldValue::Str("-12.5")), None);
        assert_eq!(check("alpha", FieldValue::Str("ab1")).as_deref(), Some("alpha"));
    }

    #[derive(Debug, Default, Bind)]
    struct Flags {
        #[bind(query = "active", validate = "required")]
        active: Option<bool>,
        #[bind(query = "retries", validate = "omitempty,min=1")]
        retries: Option<u32>,
    }

    #[test]
    fn test_optional_fields_test_presence() {
        let v = Validator::new(VALIDATION_TAG);
        let sent_zero = Flags {
            active: Some(false),
            retries: None,
        };
        v.validate_struct(&sent_zero).unwrap();

        let errs = v.validate_struct(&Flags::default()).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.errors()[0].tag, "required");

        let zero_retries = Flags {
            active: Some(true),
            retries: Some(0),
        };
        let errs = v.validate_struct(&zero_retries).unwrap_err();
        assert_eq!(errs.errors()[0].namespace, "Flags.retries");
        assert_eq!(errs.errors()[0].tag, "min");
        assert_eq!(errs.errors()[0].value, "0");
    }

    #[test]
    fn test_rule_names_are_checked() {
        let v = Validator::new(VALIDATION_TAG);
        v.check_rules("required,min=1,email|url").unwrap();
        v.check_rules("omitempty,oneof=a b").unwrap();
        v.check_rules("-").unwrap();
        assert_eq!(v.check_rules("requird"), Err("requird".to_string()));
        assert_eq!(v.check_rules("email|slug"), Err("slug".to_string()));
        v.register_validation("slug", |_| true).unwrap();
        v.check_rules("email|slug").unwrap();
    }

    #[test]
    fn test_singleton_is_shared() {
        let first = validator() as *const Validator;
        let second = validator() as *const Validator;
        assert_eq!(first, second);
        assert_eq!(validator().tag_name(), "validate");
    }
}
