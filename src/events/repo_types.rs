use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::validation::Choice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum EventCategory {
    #[serde(rename = "concert")]
    #[sqlx(rename = "concert")]
    Concert,
    #[serde(rename = "lecture")]
    #[sqlx(rename = "lecture")]
    Lecture,
    #[serde(rename = "exhibition")]
    #[sqlx(rename = "exhibition")]
    Exhibition,
    #[serde(rename = "master class")]
    #[sqlx(rename = "master class")]
    MasterClass,
    #[serde(rename = "sport")]
    #[sqlx(rename = "sport")]
    Sport,
}

impl Choice for EventCategory {
    const ALL: &'static [Self] = &[
        Self::Concert,
        Self::Lecture,
        Self::Exhibition,
        Self::MasterClass,
        Self::Sport,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Concert => "concert",
            Self::Lecture => "lecture",
            Self::Exhibition => "exhibition",
            Self::MasterClass => "master class",
            Self::Sport => "sport",
        }
    }
}

/// Event record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub category: EventCategory,
    pub created_by: Uuid, // owner, never changes
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: OffsetDateTime,
    pub category: EventCategory,
}

/// Partial event update. `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<OffsetDateTime>,
    pub category: Option<EventCategory>,
}
