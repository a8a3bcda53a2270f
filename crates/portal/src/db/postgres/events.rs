//! Event queries.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use nagar_core::{EventId, UserId};

use super::{PgDocumentStore, sql_limit};
use crate::db::{EventStore, RepositoryError};
use crate::models::{Event, NewEvent};

const EVENT_COLUMNS: &str = "id, title, description, date, time, location, form_link, \
                             image_url, created_by, created_at";

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    date: NaiveDate,
    time: Option<NaiveTime>,
    location: Option<String>,
    form_link: Option<String>,
    image_url: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::new(row.id),
            title: row.title,
            description: row.description,
            date: row.date,
            time: row.time,
            location: row.location,
            form_link: row.form_link,
            image_url: row.image_url,
            created_by: UserId::new(row.created_by),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl EventStore for PgDocumentStore {
    #[instrument(skip(self))]
    async fn list_events(&self) -> Result<Vec<Event>, RepositoryError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM portal.events ORDER BY date ASC, created_at ASC"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    #[instrument(skip(self))]
    async fn latest_events(&self, limit: usize) -> Result<Vec<Event>, RepositoryError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM portal.events \
             ORDER BY date DESC, created_at DESC LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_event(&self, id: EventId) -> Result<Option<Event>, RepositoryError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM portal.events WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Event::from))
    }

    #[instrument(skip(self, event), fields(title = %event.title))]
    async fn insert_event(&self, event: NewEvent) -> Result<Event, RepositoryError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r"
            INSERT INTO portal.events
                (id, title, description, date, time, location, form_link, image_url, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {EVENT_COLUMNS}
            "
        ))
        .bind(EventId::generate().as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.time)
        .bind(&event.location)
        .bind(&event.form_link)
        .bind(&event.image_url)
        .bind(event.created_by.as_uuid())
        .fetch_one(self.pool())
        .await?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete_event(&self, id: EventId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM portal.events WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
