use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::events::repo_types::{Event, EventCategory, EventChanges, NewEvent};

const EVENT_COLUMNS: &str = "id, title, description, date, category, created_by, created_at";

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Events ordered by date, optionally narrowed by category and/or creator.
    async fn list(
        &self,
        category: Option<EventCategory>,
        created_by: Option<Uuid>,
    ) -> Result<Vec<Event>, ApiError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, ApiError>;
    async fn create(&self, created_by: Uuid, event: NewEvent) -> Result<Event, ApiError>;
    async fn update(&self, id: Uuid, changes: &EventChanges) -> Result<Option<Event>, ApiError>;
    /// Returns `true` if a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, ApiError>;
}

#[derive(Clone)]
pub struct PgEventRepository {
    pub db: PgPool,
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn list(
        &self,
        category: Option<EventCategory>,
        created_by: Option<Uuid>,
    ) -> Result<Vec<Event>, ApiError> {
        let rows = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::uuid IS NULL OR created_by = $2)
            ORDER BY date ASC
            "#
        ))
        .bind(category)
        .bind(created_by)
        .fetch_all(&self.db)
        .await
        .context("list events")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, ApiError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find event by id")?;
        Ok(event)
    }

    async fn create(&self, created_by: Uuid, event: NewEvent) -> Result<Event, ApiError> {
        let created = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (title, description, date, category, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.category)
        .bind(created_by)
        .fetch_one(&self.db)
        .await
        .context("create event")?;
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &EventChanges) -> Result<Option<Event>, ApiError> {
        let updated = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events SET
                title       = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                date        = COALESCE($5, date),
                category    = COALESCE($6, category)
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(changes.description.is_some())
        .bind(changes.description.clone().flatten())
        .bind(changes.date)
        .bind(changes.category)
        .fetch_optional(&self.db)
        .await
        .context("update event")?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete event")?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub use memory::InMemoryEventRepository;

#[cfg(test)]
mod memory {
    use std::sync::Mutex;

    use time::OffsetDateTime;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryEventRepository {
        events: Mutex<Vec<Event>>,
    }

    #[async_trait]
    impl EventRepository for InMemoryEventRepository {
        async fn list(
            &self,
            category: Option<EventCategory>,
            created_by: Option<Uuid>,
        ) -> Result<Vec<Event>, ApiError> {
            let mut rows: Vec<Event> = self
                .events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| category.map_or(true, |c| e.category == c))
                .filter(|e| created_by.map_or(true, |u| e.created_by == u))
                .cloned()
                .collect();
            rows.sort_by_key(|e| e.date);
            Ok(rows)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, ApiError> {
            Ok(self.events.lock().unwrap().iter().find(|e| e.id == id).cloned())
        }

        async fn create(&self, created_by: Uuid, event: NewEvent) -> Result<Event, ApiError> {
            let created = Event {
                id: Uuid::new_v4(),
                title: event.title,
                description: event.description,
                date: event.date,
                category: event.category,
                created_by,
                created_at: OffsetDateTime::now_utc(),
            };
            self.events.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update(
            &self,
            id: Uuid,
            changes: &EventChanges,
        ) -> Result<Option<Event>, ApiError> {
            let mut events = self.events.lock().unwrap();
            let Some(event) = events.iter_mut().find(|e| e.id == id) else {
                return Ok(None);
            };
            if let Some(title) = &changes.title {
                event.title = title.clone();
            }
            if let Some(description) = &changes.description {
                event.description = description.clone();
            }
            if let Some(date) = changes.date {
                event.date = date;
            }
            if let Some(category) = changes.category {
                event.category = category;
            }
            Ok(Some(event.clone()))
        }

        async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
            let mut events = self.events.lock().unwrap();
            let before = events.len();
            events.retain(|e| e.id != id);
            Ok(events.len() < before)
        }
    }
}
