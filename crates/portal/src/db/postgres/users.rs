//! Role document queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use nagar_core::{Email, UserId};

use super::PgDocumentStore;
use crate::db::{RepositoryError, UserStore};
use crate::models::UserProfile;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    is_admin: bool,
    is_entrepreneur: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: UserId::new(row.id),
            email,
            is_admin: row.is_admin,
            is_entrepreneur: row.is_entrepreneur,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl UserStore for PgDocumentStore {
    #[instrument(skip(self, profile), fields(user_id = %profile.id))]
    async fn put_user_profile(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO portal.users (id, email, is_admin, is_entrepreneur, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                is_admin = EXCLUDED.is_admin,
                is_entrepreneur = EXCLUDED.is_entrepreneur
            ",
        )
        .bind(profile.id.as_uuid())
        .bind(profile.email.as_str())
        .bind(profile.is_admin)
        .bind(profile.is_entrepreneur)
        .bind(profile.created_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user_profile(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, is_admin, is_entrepreneur, created_at
            FROM portal.users
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
