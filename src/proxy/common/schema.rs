use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::theme::normalize_hex_color;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid phone regex"));

/// One rejected field, reported verbatim to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    /// Any finite number; numeric strings are coerced
    Number,
    /// Whole number; numeric strings are coerced
    Integer,
    Boolean,
    /// Array of non-empty strings
    StringList,
    /// Object of `name -> bool` selections
    Flags,
}

#[derive(Debug, Clone)]
pub enum Rule {
    MinLen(usize),
    MaxLen(usize),
    MinItems(usize),
    Email,
    Phone,
    HexColor,
    /// `YYYY-MM-DD`
    Date,
    /// Absolute http(s) URL
    Url,
    OneOf(&'static [&'static str]),
    Min(f64),
    Max(f64),
}

#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    kind: FieldKind,
    required: bool,
    rules: Vec<Rule>,
}

impl Field {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            rules: Vec::new(),
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn string_list(name: &'static str) -> Self {
        Self::new(name, FieldKind::StringList)
    }

    pub fn flags(name: &'static str) -> Self {
        Self::new(name, FieldKind::Flags)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn min_len(self, n: usize) -> Self {
        self.rule(Rule::MinLen(n))
    }

    pub fn max_len(self, n: usize) -> Self {
        self.rule(Rule::MaxLen(n))
    }

    pub fn min_items(self, n: usize) -> Self {
        self.rule(Rule::MinItems(n))
    }

    pub fn email(self) -> Self {
        self.rule(Rule::Email)
    }

    pub fn phone(self) -> Self {
        self.rule(Rule::Phone)
    }

    pub fn hex_color(self) -> Self {
        self.rule(Rule::HexColor)
    }

    pub fn date(self) -> Self {
        self.rule(Rule::Date)
    }

    pub fn url(self) -> Self {
        self.rule(Rule::Url)
    }

    pub fn one_of(self, values: &'static [&'static str]) -> Self {
        self.rule(Rule::OneOf(values))
    }

    pub fn min(self, n: f64) -> Self {
        self.rule(Rule::Min(n))
    }

    pub fn max(self, n: f64) -> Self {
        self.rule(Rule::Max(n))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Validate one present value. Returns the normalised value to forward.
    fn check(&self, value: &Value) -> Result<Option<Value>, String> {
        let name = self.name;
        match self.kind {
            FieldKind::String => {
                let s = value
                    .as_str()
                    .ok_or_else(|| format!("{} must be a string", name))?
                    .trim();
                if s.is_empty() {
                    return if self.required {
                        Err(format!("{} is required", name))
                    } else {
                        Ok(None)
                    };
                }
                self.check_string(s).map(|s| Some(Value::String(s)))
            }
            FieldKind::Number | FieldKind::Integer => {
                let n = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|n| n.is_finite())
                .ok_or_else(|| format!("{} must be a number", name))?;

                if self.kind == FieldKind::Integer && n.fract() != 0.0 {
                    return Err(format!("{} must be a whole number", name));
                }
                self.check_number(n)?;

                let out = if self.kind == FieldKind::Integer {
                    Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n)
                        .map(Value::Number)
                        .ok_or_else(|| format!("{} must be a number", name))?
                };
                Ok(Some(out))
            }
            FieldKind::Boolean => value
                .as_bool()
                .map(|b| Some(Value::Bool(b)))
                .ok_or_else(|| format!("{} must be true or false", name)),
            FieldKind::StringList => {
                let items = value
                    .as_array()
                    .ok_or_else(|| format!("{} must be a list", name))?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str().map(str::trim) {
                        Some(s) if !s.is_empty() => out.push(Value::String(s.to_string())),
                        _ => return Err(format!("{} must only contain non-empty strings", name)),
                    }
                }
                self.check_items(out.len())?;
                Ok(Some(Value::Array(out)))
            }
            FieldKind::Flags => {
                let map = value
                    .as_object()
                    .ok_or_else(|| format!("{} must be an object", name))?;
                let mut out = Map::new();
                for (key, flag) in map {
                    let flag = flag
                        .as_bool()
                        .ok_or_else(|| format!("{}.{} must be true or false", name, key))?;
                    if let Some(Rule::OneOf(allowed)) =
                        self.rules.iter().find(|r| matches!(r, Rule::OneOf(_)))
                    {
                        if !allowed.contains(&key.as_str()) {
                            return Err(format!("{} contains unknown option '{}'", name, key));
                        }
                    }
                    out.insert(key.clone(), Value::Bool(flag));
                }
                Ok(Some(Value::Object(out)))
            }
        }
    }

    fn check_string(&self, s: &str) -> Result<String, String> {
        let name = self.name;
        let mut out = s.to_string();
        for rule in &self.rules {
            match rule {
                Rule::MinLen(n) if s.chars().count() < *n => {
                    return Err(format!("{} must be at least {} characters", name, n));
                }
                Rule::MaxLen(n) if s.chars().count() > *n => {
                    return Err(format!("{} must be at most {} characters", name, n));
                }
                Rule::Email if !EMAIL.is_match(s) => {
                    return Err(format!("{} must be a valid email address", name));
                }
                Rule::Email => out = s.to_ascii_lowercase(),
                Rule::Phone => {
                    let compact: String =
                        s.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
                    if !PHONE.is_match(&compact) {
                        return Err(format!("{} must be a valid phone number", name));
                    }
                    out = compact;
                }
                Rule::HexColor => {
                    out = normalize_hex_color(s)
                        .ok_or_else(|| format!("{} must be a hex colour like #1e40af", name))?;
                }
                Rule::Date if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() => {
                    return Err(format!("{} must be a date in YYYY-MM-DD format", name));
                }
                Rule::Url => match url::Url::parse(s) {
                    Ok(u) if matches!(u.scheme(), "http" | "https") => {}
                    _ => return Err(format!("{} must be a valid URL", name)),
                },
                Rule::OneOf(allowed) if !allowed.contains(&s) => {
                    return Err(format!("{} must be one of: {}", name, allowed.join(", ")));
                }
                _ => {}
            }
        }
        Ok(out)
    }

    fn check_number(&self, n: f64) -> Result<(), String> {
        for rule in &self.rules {
            match rule {
                Rule::Min(min) if n < *min => {
                    return Err(format!("{} must be at least {}", self.name, min));
                }
                Rule::Max(max) if n > *max => {
                    return Err(format!("{} must be at most {}", self.name, max));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_items(&self, count: usize) -> Result<(), String> {
        for rule in &self.rules {
            if let Rule::MinItems(n) = rule {
                if count < *n {
                    return Err(format!("{} must contain at least {} item(s)", self.name, n));
                }
            }
        }
        Ok(())
    }
}

/// Post-validation rewrite of the envelope (cross-field checks, derived fields)
pub type Transform = fn(Map<String, Value>) -> Result<Map<String, Value>, Vec<FieldViolation>>;

/// Declared shape of a request body
#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    fields: Vec<Field>,
    transform: Option<Transform>,
}

impl Schema {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            transform: None,
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Same schema with every field optional, for PATCH bodies
    pub fn partial(&self) -> Self {
        Self {
            name: self.name,
            fields: self.fields.iter().cloned().map(Field::optional).collect(),
            transform: self.transform,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Parse a raw body and validate it. An empty body validates as `{}`.
    pub fn parse(&self, raw: &[u8]) -> Result<Value, Vec<FieldViolation>> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return self.validate(&Value::Object(Map::new()));
        }
        let body: Value = serde_json::from_slice(raw)
            .map_err(|_| vec![FieldViolation::new("body", "Request body must be valid JSON")])?;
        self.validate(&body)
    }

    /// Validate `body`, producing the envelope to forward.
    ///
    /// Every field is checked before failing; undeclared keys are dropped.
    pub fn validate(&self, body: &Value) -> Result<Value, Vec<FieldViolation>> {
        let input = body.as_object().ok_or_else(|| {
            vec![FieldViolation::new(
                "body",
                "Request body must be a JSON object",
            )]
        })?;

        let mut envelope = Map::new();
        let mut violations = Vec::new();

        for field in &self.fields {
            match input.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        violations.push(FieldViolation::new(
                            field.name,
                            format!("{} is required", field.name),
                        ));
                    }
                }
                Some(value) => match field.check(value) {
                    Ok(Some(normalized)) => {
                        envelope.insert(field.name.to_string(), normalized);
                    }
                    Ok(None) => {}
                    Err(message) => violations.push(FieldViolation::new(field.name, message)),
                },
            }
        }

        if !violations.is_empty() {
            return Err(violations);
        }

        match self.transform {
            Some(transform) => transform(envelope).map(Value::Object),
            None => Ok(Value::Object(envelope)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contact() -> Schema {
        Schema::new("contact")
            .field(Field::string("name").min_len(2))
            .field(Field::string("email").email())
            .field(Field::string("phone").phone().optional())
            .field(Field::integer("age").min(1.0).max(120.0).optional())
    }

    #[test]
    fn collects_every_violation() {
        let err = contact().validate(&json!({ "name": "A" })).unwrap_err();
        let fields: Vec<_> = err.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email"]);
        assert_eq!(err[1].message, "email is required");
    }

    #[test]
    fn strips_unknown_keys_and_normalises() {
        let out = contact()
            .validate(&json!({
                "name": "  Ada  ",
                "email": "Ada@Example.COM",
                "phone": "+234 803-123-4567",
                "age": "34",
                "role": "admin"
            }))
            .unwrap();
        assert_eq!(
            out,
            json!({
                "name": "Ada",
                "email": "ada@example.com",
                "phone": "+2348031234567",
                "age": 34
            })
        );
    }

    #[test]
    fn optional_blank_string_is_dropped() {
        let out = contact()
            .validate(&json!({ "name": "Ada", "email": "a@b.co", "phone": "  " }))
            .unwrap();
        assert!(out.get("phone").is_none());
    }

    #[test]
    fn type_errors_are_reported_per_field() {
        let err = contact()
            .validate(&json!({ "name": 7, "email": "a@b.co", "age": 3.5 }))
            .unwrap_err();
        assert_eq!(err[0], FieldViolation::new("name", "name must be a string"));
        assert_eq!(err[1], FieldViolation::new("age", "age must be a whole number"));
    }

    #[test]
    fn empty_body_reports_required_fields() {
        let err = contact().parse(b"").unwrap_err();
        assert_eq!(err.len(), 2);
        let err = contact().parse(b"{not json").unwrap_err();
        assert_eq!(err[0].field, "body");
        let err = contact().parse(b"[1,2]").unwrap_err();
        assert_eq!(err[0].message, "Request body must be a JSON object");
    }

    #[test]
    fn partial_accepts_empty_object() {
        let out = contact().partial().validate(&json!({})).unwrap();
        assert_eq!(out, json!({}));
        let err = contact().partial().validate(&json!({ "email": "nope" })).unwrap_err();
        assert_eq!(err[0].field, "email");
    }

    #[test]
    fn flags_and_lists() {
        let schema = Schema::new("pick")
            .field(Field::flags("groups").one_of(&["a", "b"]))
            .field(Field::string_list("ids").min_items(1).optional());
        assert!(schema.validate(&json!({ "groups": { "a": true } })).is_ok());
        let err = schema
            .validate(&json!({ "groups": { "c": true }, "ids": [] }))
            .unwrap_err();
        assert_eq!(err[0].message, "groups contains unknown option 'c'");
        assert_eq!(err[1].message, "ids must contain at least 1 item(s)");
    }

    #[test]
    fn string_rules() {
        let schema = Schema::new("misc")
            .field(Field::string("day").date())
            .field(Field::string("site").url())
            .field(Field::string("mode").one_of(&["light", "dark"]))
            .field(Field::string("color").hex_color());
        let err = schema
            .validate(&json!({
                "day": "2024-02-30",
                "site": "ftp://x",
                "mode": "neon",
                "color": "#ABC"
            }))
            .unwrap_err();
        let fields: Vec<_> = err.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["day", "site", "mode"]);

        let out = schema
            .validate(&json!({
                "day": "2024-02-29",
                "site": "https://school.example/logo.png",
                "mode": "dark",
                "color": "#ABC"
            }))
            .unwrap();
        assert_eq!(out["color"], "#aabbcc");
    }
}
