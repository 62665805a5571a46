use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::events::repo_types::{EventCategory, EventChanges, NewEvent};
use crate::validation::{
    check_update_shape, expect_str, field, future_datetime, length_between, one_of, required_str,
    FieldErrors, FieldValue,
};

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 2000;

const MUTABLE: &[&str] = &["title", "description", "date", "category"];
const IMMUTABLE: &[&str] = &["id", "created_by", "created_at"];

pub fn validate_new_event(
    body: &Map<String, Value>,
    now: OffsetDateTime,
) -> Result<NewEvent, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = required_str(body, "title", &mut errors)
        .and_then(|t| length_between("title", t, TITLE_MIN, TITLE_MAX, &mut errors));

    let description = match field(body, "description") {
        FieldValue::Absent | FieldValue::Null => None,
        FieldValue::Present(v) => description(v, &mut errors),
    };

    let date = match field(body, "date") {
        FieldValue::Absent | FieldValue::Null => {
            errors.add("date", "date is required");
            None
        }
        FieldValue::Present(v) => future_datetime("date", v, now, &mut errors),
    };

    let category = required_str(body, "category", &mut errors)
        .and_then(|c| one_of::<EventCategory>("category", c, &mut errors));

    match (title, date, category) {
        (Some(title), Some(date), Some(category)) if errors.is_empty() => Ok(NewEvent {
            title,
            description,
            date,
            category,
        }),
        _ => Err(errors),
    }
}

pub fn validate_event_changes(
    body: &Map<String, Value>,
    now: OffsetDateTime,
) -> Result<EventChanges, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_update_shape(body, MUTABLE, IMMUTABLE, &mut errors);

    let mut changes = EventChanges::default();

    match field(body, "title") {
        FieldValue::Absent => {}
        FieldValue::Null => errors.add("title", "title cannot be empty"),
        FieldValue::Present(v) => {
            changes.title = expect_str(v, "title", &mut errors)
                .and_then(|t| length_between("title", t, TITLE_MIN, TITLE_MAX, &mut errors));
        }
    }

    match field(body, "description") {
        FieldValue::Absent => {}
        FieldValue::Null => changes.description = Some(None),
        FieldValue::Present(v) => {
            if let Some(d) = description(v, &mut errors) {
                changes.description = Some(Some(d));
            }
        }
    }

    match field(body, "date") {
        FieldValue::Absent => {}
        FieldValue::Null => errors.add("date", "date cannot be empty"),
        FieldValue::Present(v) => changes.date = future_datetime("date", v, now, &mut errors),
    }

    match field(body, "category") {
        FieldValue::Absent => {}
        FieldValue::Null => errors.add("category", "category cannot be empty"),
        FieldValue::Present(v) => {
            changes.category = expect_str(v, "category", &mut errors)
                .and_then(|c| one_of::<EventCategory>("category", c, &mut errors));
        }
    }

    errors.finish(|| changes)
}

/// Validates the `?category=` filter of the listing endpoint.
pub fn parse_category_filter(raw: &str) -> Result<EventCategory, FieldErrors> {
    let mut errors = FieldErrors::new();
    let category = one_of::<EventCategory>("category", raw, &mut errors);
    match category {
        Some(c) => Ok(c),
        None => Err(errors),
    }
}

fn description(value: &Value, errors: &mut FieldErrors) -> Option<String> {
    expect_str(value, "description", errors)
        .and_then(|d| length_between("description", d, 0, DESCRIPTION_MAX, errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2030-06-01 12:00 UTC);

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn accepts_valid_event() {
        let event = validate_new_event(
            &obj(json!({
                "title": "  Jazz night ",
                "description": "Live quartet",
                "date": "2030-07-01T19:30:00+02:00",
                "category": "master class"
            })),
            NOW,
        )
        .expect("valid");
        assert_eq!(event.title, "Jazz night");
        assert_eq!(event.description.as_deref(), Some("Live quartet"));
        assert_eq!(event.date, datetime!(2030-07-01 17:30 UTC));
        assert_eq!(event.category, EventCategory::MasterClass);
    }

    #[test]
    fn collects_every_violation() {
        let errors = validate_new_event(
            &obj(json!({
                "title": "ab",
                "description": "x".repeat(2001),
                "date": "2030-05-01T00:00:00Z",
                "category": "party"
            })),
            NOW,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("title"), Some("title must be between 3 and 100 characters"));
        assert_eq!(errors.get("description"), Some("description must be at most 2000 characters"));
        assert_eq!(errors.get("date"), Some("date must be in the future"));
        assert_eq!(
            errors.get("category"),
            Some("category must be one of: concert, lecture, exhibition, master class, sport")
        );
    }

    #[test]
    fn rejects_date_equal_to_now_and_unparseable_dates() {
        let errors = validate_new_event(
            &obj(json!({"title": "Talk", "date": "2030-06-01T12:00:00Z", "category": "lecture"})),
            NOW,
        )
        .unwrap_err();
        assert_eq!(errors.get("date"), Some("date must be in the future"));

        let errors = validate_new_event(
            &obj(json!({"title": "Talk", "date": "soon", "category": "lecture"})),
            NOW,
        )
        .unwrap_err();
        assert_eq!(errors.get("date"), Some("date must be a valid date"));
    }

    #[test]
    fn missing_and_mistyped_fields() {
        let errors = validate_new_event(&obj(json!({"title": 42})), NOW).unwrap_err();
        assert_eq!(errors.get("title"), Some("title must be a string"));
        assert_eq!(errors.get("date"), Some("date is required"));
        assert_eq!(errors.get("category"), Some("category is required"));
    }

    #[test]
    fn update_is_field_optional() {
        let changes =
            validate_event_changes(&obj(json!({"category": "sport"})), NOW).expect("valid");
        assert_eq!(
            changes,
            EventChanges {
                category: Some(EventCategory::Sport),
                ..Default::default()
            }
        );

        let changes =
            validate_event_changes(&obj(json!({"description": null})), NOW).expect("valid");
        assert_eq!(changes.description, Some(None));
    }

    #[test]
    fn update_rejects_empty_and_unknown_only_bodies_differently() {
        let empty = validate_event_changes(&obj(json!({})), NOW).unwrap_err();
        assert_eq!(empty.get("body"), Some("No fields supplied for update"));

        let unknown = validate_event_changes(&obj(json!({"venue": "Hall A"})), NOW).unwrap_err();
        assert_eq!(
            unknown.get("body"),
            Some("No valid fields supplied for update (unknown fields: venue)")
        );
    }

    #[test]
    fn update_cannot_change_creator() {
        let errors = validate_event_changes(
            &obj(json!({"created_by": "7d8f0a4e-4f4b-4a53-9a49-3b0a1f1d2c11", "title": "New title"})),
            NOW,
        )
        .unwrap_err();
        assert_eq!(errors.get("created_by"), Some("created_by cannot be changed"));
    }

    #[test]
    fn update_validates_present_date() {
        let errors =
            validate_event_changes(&obj(json!({"date": "2020-01-01T00:00:00Z"})), NOW).unwrap_err();
        assert_eq!(errors.get("date"), Some("date must be in the future"));
    }

    #[test]
    fn category_filter() {
        assert_eq!(parse_category_filter("concert").unwrap(), EventCategory::Concert);
        assert!(parse_category_filter("Concert").unwrap_err().contains("category"));
    }
}
