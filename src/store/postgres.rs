use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{StoreError, SubscriberStore};
use crate::domain::{Subscriber, SubscriberEmail};

#[derive(Clone)]
pub struct PostgresSubscriberStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: i64,
    email: String,
    subscribed_at: DateTime<Utc>,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct InsertedRow {
    id: i64,
    subscribed_at: DateTime<Utc>,
    is_active: bool,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = anyhow::Error;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(row.email).map_err(|e| anyhow::anyhow!(e))?;
        Ok(Subscriber {
            id: row.id,
            email,
            subscribed_at: row.subscribed_at,
            is_active: row.is_active,
        })
    }
}

impl PostgresSubscriberStore {
    /// Brings the schema up to date before handing out the store.
    ///
    /// sqlx holds an advisory lock while migrating, so several instances can
    /// start at once against the same database.
    #[tracing::instrument(name = "Initialize subscriber store", skip(pool))]
    pub async fn initialize(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")
            .map_err(StoreError::Unavailable)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Waits for checked out connections to be returned, then closes them all.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl SubscriberStore for PostgresSubscriberStore {
    #[tracing::instrument(name = "Save new subscriber to database", skip(self))]
    async fn create(&self, email: &SubscriberEmail) -> Result<Subscriber, StoreError> {
        let row = sqlx::query_as::<_, InsertedRow>(
            r#"
            INSERT INTO subscribers (email)
            VALUES ($1)
            RETURNING id, subscribed_at, is_active
            "#,
        )
        .bind(email.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db_error| db_error.is_unique_violation())
            {
                return StoreError::DuplicateEmail;
            }
            StoreError::Unavailable(
                anyhow::Error::new(e).context("Failed to insert subscriber into database"),
            )
        })?;

        Ok(Subscriber {
            id: row.id,
            email: email.clone(),
            subscribed_at: row.subscribed_at,
            is_active: row.is_active,
        })
    }

    #[tracing::instrument(name = "Deactivate subscriber", skip(self))]
    async fn deactivate(&self, email: &SubscriberEmail) -> Result<(), StoreError> {
        sqlx::query("UPDATE subscribers SET is_active = FALSE WHERE email = $1")
            .bind(email.as_ref())
            .execute(&self.pool)
            .await
            .context("Failed to deactivate subscriber")
            .map_err(StoreError::Unavailable)?;
        Ok(())
    }

    #[tracing::instrument(name = "Get list of all active subscribers", skip(self))]
    async fn list_active(&self) -> Result<Vec<Subscriber>, StoreError> {
        let rows = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT id, email, subscribed_at, is_active
            FROM subscribers
            WHERE is_active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to get active subscribers from database")
        .map_err(StoreError::Unavailable)?;

        let subscribers = rows
            .into_iter()
            .filter_map(|row| match Subscriber::try_from(row) {
                Ok(subscriber) => Some(subscriber),
                Err(e) => {
                    tracing::warn!(error.cause_chain = ?e,
                        "Skipping an active subscriber. \
                        Their stored contact information is invalid");
                    None
                }
            })
            .collect();

        Ok(subscribers)
    }
}
