//! Field declarations and validation for call-site forms.

pub mod editor;

pub use editor::{FormBinding, FormEditor};

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Current (or stored) values of one form, keyed by field name.
pub type FormValues = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Text rendered masked in the editor.
    Secret,
    Integer { min: Option<i64>, max: Option<i64> },
    Choice(&'static [&'static str]),
    Toggle,
    /// Comma-separated input, stored as an array of strings.
    List,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub help: Option<&'static str>,
    pattern: Option<Regex>,
}

impl FieldDef {
    fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            help: None,
            pattern: None,
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn secret(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Secret)
    }

    pub fn integer(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Integer { min: None, max: None })
    }

    pub fn choice(name: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self::new(name, label, FieldKind::Choice(options))
    }

    pub fn toggle(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Toggle)
    }

    pub fn list(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::List)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    /// Only meaningful for integer fields.
    pub fn range(mut self, min: i64, max: i64) -> Self {
        if let FieldKind::Integer { .. } = self.kind {
            self.kind = FieldKind::Integer {
                min: Some(min),
                max: Some(max),
            };
        }
        self
    }

    /// Applied to text values and to each item of a list.
    pub fn pattern(mut self, pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => self.pattern = Some(re),
            Err(err) => warn!(field = self.name, error = %err, "ignoring invalid field pattern"),
        }
        self
    }

    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    fn check(&self, value: Option<&Value>) -> Result<(), FieldErrorKind> {
        let value = match value {
            Some(v) if !is_blank(v) => v,
            _ if self.required => return Err(FieldErrorKind::Required),
            _ => return Ok(()),
        };
        match (&self.kind, value) {
            (FieldKind::Text | FieldKind::Secret, Value::String(s)) => self.check_pattern(s),
            (FieldKind::Integer { min, max }, Value::Number(n)) => {
                let n = n.as_i64().ok_or(FieldErrorKind::NotAnInteger)?;
                if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
                    return Err(FieldErrorKind::OutOfRange { min: *min, max: *max });
                }
                Ok(())
            }
            (FieldKind::Integer { .. }, _) => Err(FieldErrorKind::NotAnInteger),
            (FieldKind::Choice(options), Value::String(s)) => {
                if options.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(FieldErrorKind::NotAnOption(*options))
                }
            }
            (FieldKind::Choice(options), _) => Err(FieldErrorKind::NotAnOption(*options)),
            (FieldKind::Toggle, Value::Bool(_)) => Ok(()),
            (FieldKind::List, Value::Array(items)) => {
                for item in items {
                    match item {
                        Value::String(s) => self.check_pattern(s)?,
                        _ => return Err(FieldErrorKind::WrongType("a list of strings")),
                    }
                }
                Ok(())
            }
            (FieldKind::List, _) => Err(FieldErrorKind::WrongType("a list of strings")),
            (FieldKind::Toggle, _) => Err(FieldErrorKind::WrongType("true or false")),
            (FieldKind::Text | FieldKind::Secret, _) => Err(FieldErrorKind::WrongType("text")),
        }
    }

    fn check_pattern(&self, s: &str) -> Result<(), FieldErrorKind> {
        match &self.pattern {
            Some(re) if !re.is_match(s) => Err(FieldErrorKind::PatternMismatch(re.as_str().to_string())),
            _ => Ok(()),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    Required,
    NotAnInteger,
    OutOfRange { min: Option<i64>, max: Option<i64> },
    NotAnOption(&'static [&'static str]),
    WrongType(&'static str),
    PatternMismatch(String),
    /// Raised by a call-site build function.
    Invalid(String),
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldErrorKind::Required => write!(f, "is required"),
            FieldErrorKind::NotAnInteger => write!(f, "must be an integer"),
            FieldErrorKind::OutOfRange { min, max } => match (min, max) {
                (Some(min), Some(max)) => write!(f, "must be between {} and {}", min, max),
                (Some(min), None) => write!(f, "must be at least {}", min),
                (None, Some(max)) => write!(f, "must be at most {}", max),
                (None, None) => write!(f, "is out of range"),
            },
            FieldErrorKind::NotAnOption(options) => write!(f, "must be one of: {}", options.join(", ")),
            FieldErrorKind::WrongType(expected) => write!(f, "must be {}", expected),
            FieldErrorKind::PatternMismatch(pattern) => write!(f, "must match {}", pattern),
            FieldErrorKind::Invalid(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} {kind}")]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Invalid(reason.into()),
        }
    }
}

/// Every field that failed, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(err: FieldError) -> Self {
        ValidationErrors(vec![err])
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check `values` against the declared constraints. Keys with no matching
/// field are ignored.
pub fn validate(fields: &[FieldDef], values: &FormValues) -> Result<(), ValidationErrors> {
    let errors: Vec<FieldError> = fields
        .iter()
        .filter_map(|field| {
            field.check(values.get(field.name)).err().map(|kind| FieldError {
                field: field.name.to_string(),
                kind,
            })
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(value: Value) -> FormValues {
        value.as_object().cloned().unwrap_or_default()
    }

    fn fields() -> Vec<FieldDef> {
        vec![
            FieldDef::text("account", "Account").required().pattern(r"^[a-z0-9_]+$"),
            FieldDef::integer("limit", "Limit").range(1, 100),
            FieldDef::choice("direction", "Direction", &["older", "newer"]),
            FieldDef::toggle("onlineOnly", "Online only"),
            FieldDef::list("accountIds", "Accounts").pattern(r"^[a-z]+$"),
        ]
    }

    #[test]
    fn accepts_well_formed_values() {
        let v = values(json!({
            "account": "alice_1",
            "limit": 20,
            "direction": "older",
            "onlineOnly": true,
            "accountIds": ["bob", "carol"],
            "extra": "ignored"
        }));
        assert_eq!(validate(&fields(), &v), Ok(()));
    }

    #[test]
    fn missing_required_field_is_reported() {
        for account in [json!(null), json!("   ")] {
            let errs = validate(&fields(), &values(json!({ "account": account }))).unwrap_err();
            assert_eq!(errs.for_field("account").map(|e| &e.kind), Some(&FieldErrorKind::Required));
        }
        let errs = validate(&fields(), &FormValues::new()).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.to_string(), "account is required");
    }

    #[test]
    fn reports_every_failing_field() {
        let v = values(json!({
            "account": "Alice!",
            "limit": 500,
            "direction": "sideways",
            "onlineOnly": "yes",
            "accountIds": ["ok", "NOT_OK"]
        }));
        let errs = validate(&fields(), &v).unwrap_err();
        assert_eq!(errs.len(), 5);
        assert_eq!(
            errs.for_field("limit").unwrap().to_string(),
            "limit must be between 1 and 100"
        );
        assert_eq!(
            errs.for_field("direction").unwrap().to_string(),
            "direction must be one of: older, newer"
        );
        assert!(matches!(
            errs.for_field("account").unwrap().kind,
            FieldErrorKind::PatternMismatch(_)
        ));
    }

    #[test]
    fn non_integer_numbers_are_rejected() {
        let errs = validate(&fields(), &values(json!({"account": "a", "limit": 2.5}))).unwrap_err();
        assert_eq!(errs.for_field("limit").unwrap().kind, FieldErrorKind::NotAnInteger);
        let errs = validate(&fields(), &values(json!({"account": "a", "limit": "ten"}))).unwrap_err();
        assert_eq!(errs.for_field("limit").unwrap().kind, FieldErrorKind::NotAnInteger);
    }

    #[test]
    fn invalid_pattern_is_dropped() {
        let field = FieldDef::text("x", "X").pattern("(unclosed");
        assert!(!field.has_pattern());
    }
}
