use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use time::Date;

use crate::users::repo_types::{Gender, ProfileChanges, Role};
use crate::validation::{
    check_update_shape, expect_str, field, length_between, one_of, past_date, required_str,
    FieldErrors, FieldValue,
};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const EMAIL_MAX: usize = 255;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

const PROFILE_MUTABLE: &[&str] = &["name", "last_name", "middle_name", "gender", "birth_date"];
const PROFILE_IMMUTABLE: &[&str] = &["id", "email", "role", "password", "created_at"];

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn validate_registration(body: &Map<String, Value>) -> Result<Registration, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = required_str(body, "name", &mut errors)
        .and_then(|n| length_between("name", n, NAME_MIN, NAME_MAX, &mut errors));
    let email = required_str(body, "email", &mut errors).and_then(|e| email(e, &mut errors));
    let password = required_str(body, "password", &mut errors).and_then(|p| {
        let len = p.chars().count();
        if len < PASSWORD_MIN {
            errors.add(
                "password",
                format!("password must be at least {PASSWORD_MIN} characters"),
            );
            None
        } else if len > PASSWORD_MAX {
            errors.add(
                "password",
                format!("password must be at most {PASSWORD_MAX} characters"),
            );
            None
        } else {
            Some(p.to_string())
        }
    });

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(Registration {
            name,
            email,
            password,
        }),
        _ => Err(errors),
    }
}

/// Login only checks presence; a bad address simply fails to authenticate.
pub fn validate_login(body: &Map<String, Value>) -> Result<Credentials, FieldErrors> {
    let mut errors = FieldErrors::new();
    let email = non_empty(body, "email", &mut errors).map(|e| e.trim().to_lowercase());
    let password = non_empty(body, "password", &mut errors).map(str::to_string);
    match (email, password) {
        (Some(email), Some(password)) => Ok(Credentials { email, password }),
        _ => Err(errors),
    }
}

pub fn validate_profile_changes(
    body: &Map<String, Value>,
    today: Date,
) -> Result<ProfileChanges, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_update_shape(body, PROFILE_MUTABLE, PROFILE_IMMUTABLE, &mut errors);

    let mut changes = ProfileChanges::default();

    match field(body, "name") {
        FieldValue::Absent => {}
        FieldValue::Null => errors.add("name", "name cannot be empty"),
        FieldValue::Present(v) => {
            changes.name = expect_str(v, "name", &mut errors)
                .and_then(|n| length_between("name", n, NAME_MIN, NAME_MAX, &mut errors));
        }
    }

    changes.last_name = optional_name(body, "last_name", &mut errors);
    changes.middle_name = optional_name(body, "middle_name", &mut errors);

    match field(body, "gender") {
        FieldValue::Absent => {}
        FieldValue::Null => changes.gender = Some(None),
        FieldValue::Present(v) => {
            if let Some(g) = expect_str(v, "gender", &mut errors)
                .and_then(|g| one_of::<Gender>("gender", g, &mut errors))
            {
                changes.gender = Some(Some(g));
            }
        }
    }

    match field(body, "birth_date") {
        FieldValue::Absent => {}
        FieldValue::Null => changes.birth_date = Some(None),
        FieldValue::Present(v) => {
            if let Some(d) = past_date("birth_date", v, today, &mut errors) {
                changes.birth_date = Some(Some(d));
            }
        }
    }

    errors.finish(|| changes)
}

pub fn validate_role_change(body: &Map<String, Value>) -> Result<Role, FieldErrors> {
    let mut errors = FieldErrors::new();
    let role = required_str(body, "role", &mut errors)
        .and_then(|r| one_of::<Role>("role", r, &mut errors));
    role.ok_or(errors)
}

fn email(raw: &str, errors: &mut FieldErrors) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.len() > EMAIL_MAX {
        errors.add("email", format!("email must be at most {EMAIL_MAX} characters"));
        return None;
    }
    if !is_valid_email(&email) {
        errors.add("email", "email must be a valid email address");
        return None;
    }
    Some(email)
}

fn non_empty<'a>(
    body: &'a Map<String, Value>,
    key: &str,
    errors: &mut FieldErrors,
) -> Option<&'a str> {
    let value = required_str(body, key, errors)?;
    if value.trim().is_empty() {
        errors.add(key, format!("{key} is required"));
        return None;
    }
    Some(value)
}

fn optional_name(
    body: &Map<String, Value>,
    key: &str,
    errors: &mut FieldErrors,
) -> Option<Option<String>> {
    match field(body, key) {
        FieldValue::Absent => None,
        FieldValue::Null => Some(None),
        FieldValue::Present(v) => expect_str(v, key, errors)
            .and_then(|s| length_between(key, s, 0, NAME_MAX, errors))
            .map(|s| if s.is_empty() { None } else { Some(s) }),
    }
}
