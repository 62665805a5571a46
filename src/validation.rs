//! Field-level validation helpers shared by the user and event validators.
//!
//! Validators take a raw JSON object so that type errors, missing fields and
//! rule violations all end up in one [`FieldErrors`] map instead of stopping
//! at the first serde failure.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use serde_json::{Map, Value};
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

/// Field name → human readable violation. One message per field, first one wins.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[cfg(test)]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(value)` when nothing was collected.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// A closed set of string values (roles, categories, genders).
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == raw)
    }

    fn listing() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// How a key appears in a request object.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Absent,
    Null,
    Present(&'a Value),
}

pub fn field<'a>(body: &'a Map<String, Value>, key: &str) -> FieldValue<'a> {
    match body.get(key) {
        None => FieldValue::Absent,
        Some(Value::Null) => FieldValue::Null,
        Some(v) => FieldValue::Present(v),
    }
}

/// Reads a required string field, reporting missing/null/non-string values.
pub fn required_str<'a>(
    body: &'a Map<String, Value>,
    key: &str,
    errors: &mut FieldErrors,
) -> Option<&'a str> {
    match field(body, key) {
        FieldValue::Absent | FieldValue::Null => {
            errors.add(key, format!("{key} is required"));
            None
        }
        FieldValue::Present(v) => expect_str(v, key, errors),
    }
}

pub fn expect_str<'a>(value: &'a Value, key: &str, errors: &mut FieldErrors) -> Option<&'a str> {
    match value.as_str() {
        Some(s) => Some(s),
        None => {
            errors.add(key, format!("{key} must be a string"));
            None
        }
    }
}

/// Trims and checks the character count (not bytes) of `value`.
pub fn length_between(
    key: &str,
    value: &str,
    min: usize,
    max: usize,
    errors: &mut FieldErrors,
) -> Option<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min || len > max {
        if min == 0 {
            errors.add(key, format!("{key} must be at most {max} characters"));
        } else {
            errors.add(key, format!("{key} must be between {min} and {max} characters"));
        }
        return None;
    }
    Some(trimmed.to_string())
}

pub fn one_of<C: Choice>(key: &str, value: &str, errors: &mut FieldErrors) -> Option<C> {
    match C::parse(value) {
        Some(c) => Some(c),
        None => {
            errors.add(key, format!("{key} must be one of: {}", C::listing()));
            None
        }
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_datetime(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt);
    }
    parse_date(raw).map(|d| d.midnight().assume_utc())
}

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

/// Date-time strictly after `now`.
pub fn future_datetime(
    key: &str,
    value: &Value,
    now: OffsetDateTime,
    errors: &mut FieldErrors,
) -> Option<OffsetDateTime> {
    let raw = expect_str(value, key, errors)?;
    let Some(dt) = parse_datetime(raw) else {
        errors.add(key, format!("{key} must be a valid date"));
        return None;
    };
    if dt <= now {
        errors.add(key, format!("{key} must be in the future"));
        return None;
    }
    Some(dt)
}

/// Calendar date strictly before `today`.
pub fn past_date(key: &str, value: &Value, today: Date, errors: &mut FieldErrors) -> Option<Date> {
    let raw = expect_str(value, key, errors)?;
    let Some(date) = parse_date(raw) else {
        errors.add(key, format!("{key} must be a date in YYYY-MM-DD format"));
        return None;
    };
    if date >= today {
        errors.add(key, format!("{key} must be in the past"));
        return None;
    }
    Some(date)
}

/// Shared preamble of every partial update.
///
/// Rejects an empty object, an object made only of unknown keys, and any
/// attempt to touch an immutable field. Unknown keys next to recognized ones
/// are ignored.
pub fn check_update_shape(
    body: &Map<String, Value>,
    mutable: &[&str],
    immutable: &[&str],
    errors: &mut FieldErrors,
) {
    if body.is_empty() {
        errors.add("body", "No fields supplied for update");
        return;
    }

    for key in immutable {
        if body.contains_key(*key) {
            errors.add(key, format!("{key} cannot be changed"));
        }
    }

    let recognized = body
        .keys()
        .any(|k| mutable.contains(&k.as_str()) || immutable.contains(&k.as_str()));
    if !recognized {
        let unknown = body.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
        errors.add(
            "body",
            format!("No valid fields supplied for update (unknown fields: {unknown})"),
        );
    }
}
