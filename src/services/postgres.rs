use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::models::{Event, ExperienceLevel, MatchingProfile, Registration, RegistrationStatus};
use crate::services::store::{
    EventStore, ProfileStore, PromoteOutcome, RegistrationStore, StoreError,
};

const EVENT_COLUMNS: &str =
    "event_id, name, date, time, location, category, capacity, COALESCE(registered, 0) AS registered";

const REGISTRATION_COLUMNS: &str = "registration_id, event_id, event_name, full_name, email, \
     phone, organization, interest, status, registered_at, waitlist_position, promoted_at, qr_payload";

const PROFILE_COLUMNS: &str = "user_id, event_id, name, email, organization, skills, looking_for, \
     experience_level, goals, interests, created_at";

/// PostgreSQL-backed store for events, registrations and matching profiles
///
/// Counter updates are conditional `UPDATE`s, and waitlist allocation and
/// promotion run in transactions holding the event row lock, so concurrent
/// requests for one event serialize in the database rather than in-process.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn event_from_row(row: &PgRow) -> Result<Event, StoreError> {
    Ok(Event {
        event_id: row.try_get("event_id")?,
        name: row.try_get("name")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        location: row.try_get("location")?,
        category: row.try_get("category")?,
        capacity: row.try_get("capacity")?,
        registered: row.try_get("registered")?,
    })
}

fn registration_from_row(row: &PgRow) -> Result<Registration, StoreError> {
    let status: String = row.try_get("status")?;
    let status = RegistrationStatus::parse(&status)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown registration status {}", status)))?;

    Ok(Registration {
        registration_id: row.try_get("registration_id")?,
        event_id: row.try_get("event_id")?,
        event_name: row.try_get("event_name")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        organization: row.try_get("organization")?,
        interest: row.try_get("interest")?,
        status,
        registered_at: row.try_get("registered_at")?,
        waitlist_position: row.try_get("waitlist_position")?,
        promoted_at: row.try_get("promoted_at")?,
        qr_payload: row.try_get("qr_payload")?,
    })
}

fn profile_from_row(row: &PgRow) -> Result<MatchingProfile, StoreError> {
    let level: String = row.try_get("experience_level")?;
    let experience_level = ExperienceLevel::parse(&level)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown experience level {}", level)))?;

    let set = |column: &str| -> Result<BTreeSet<String>, StoreError> {
        let values: Vec<String> = row.try_get(column)?;
        Ok(values.into_iter().collect())
    };

    Ok(MatchingProfile {
        user_id: row.try_get("user_id")?,
        event_id: row.try_get("event_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        organization: row.try_get("organization")?,
        skills: set("skills")?,
        looking_for: set("looking_for")?,
        experience_level,
        goals: set("goals")?,
        interests: set("interests")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl EventStore for PostgresStore {
    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        let query = format!("SELECT {} FROM events WHERE event_id = $1", EVENT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        tracing::debug!("Fetched event {} (found: {})", event_id, row.is_some());

        row.as_ref().map(event_from_row).transpose()
    }

    async fn put_event(&self, event: &Event) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO events (event_id, name, date, time, location, category, capacity, registered)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (event_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                date = EXCLUDED.date,
                time = EXCLUDED.time,
                location = EXCLUDED.location,
                category = EXCLUDED.category,
                capacity = EXCLUDED.capacity,
                registered = EXCLUDED.registered
        "#;

        sqlx::query(query)
            .bind(&event.event_id)
            .bind(&event.name)
            .bind(&event.date)
            .bind(&event.time)
            .bind(&event.location)
            .bind(&event.category)
            .bind(event.capacity)
            .bind(event.registered)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn try_reserve_seat(&self, event_id: &str) -> Result<bool, StoreError> {
        let query = r#"
            UPDATE events
            SET registered = COALESCE(registered, 0) + 1
            WHERE event_id = $1 AND COALESCE(registered, 0) < capacity
            RETURNING registered
        "#;

        let row = sqlx::query(query)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn release_seat(&self, event_id: &str) -> Result<(), StoreError> {
        let query = r#"
            UPDATE events
            SET registered = GREATEST(COALESCE(registered, 0) - 1, 0)
            WHERE event_id = $1
        "#;

        sqlx::query(query).bind(event_id).execute(&self.pool).await?;
        Ok(())
    }

    async fn set_capacity(
        &self,
        event_id: &str,
        capacity: i64,
    ) -> Result<Option<Event>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {} FROM events WHERE event_id = $1 FOR UPDATE",
            EVENT_COLUMNS
        );
        let before = match sqlx::query(&select)
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?
        {
            Some(row) => event_from_row(&row)?,
            None => return Ok(None),
        };

        sqlx::query("UPDATE events SET capacity = $2 WHERE event_id = $1")
            .bind(event_id)
            .bind(capacity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(before))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl RegistrationStore for PostgresStore {
    async fn insert_registration(&self, registration: &Registration) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO registrations (
                registration_id, event_id, event_name, full_name, email, phone,
                organization, interest, status, registered_at, waitlist_position,
                promoted_at, qr_payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#;

        sqlx::query(query)
            .bind(&registration.registration_id)
            .bind(&registration.event_id)
            .bind(&registration.event_name)
            .bind(&registration.full_name)
            .bind(&registration.email)
            .bind(&registration.phone)
            .bind(&registration.organization)
            .bind(&registration.interest)
            .bind(registration.status.as_str())
            .bind(registration.registered_at)
            .bind(registration.waitlist_position)
            .bind(registration.promoted_at)
            .bind(&registration.qr_payload)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Inserted registration {} for event {} ({})",
            registration.registration_id,
            registration.event_id,
            registration.status.as_str()
        );

        Ok(())
    }

    async fn enqueue_waitlisted(
        &self,
        mut registration: Registration,
    ) -> Result<Registration, StoreError> {
        let mut tx = self.pool.begin().await?;

        // The event row lock serializes position allocation per event
        sqlx::query("SELECT event_id FROM events WHERE event_id = $1 FOR UPDATE")
            .bind(&registration.event_id)
            .fetch_one(&mut *tx)
            .await?;

        let waiting: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'waitlist'",
        )
        .bind(&registration.event_id)
        .fetch_one(&mut *tx)
        .await?;

        registration.status = RegistrationStatus::Waitlist;
        registration.waitlist_position = Some(waiting + 1);

        let insert = r#"
            INSERT INTO registrations (
                registration_id, event_id, event_name, full_name, email, phone,
                organization, interest, status, registered_at, waitlist_position,
                promoted_at, qr_payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'waitlist', $9, $10, NULL, $11)
        "#;

        sqlx::query(insert)
            .bind(&registration.registration_id)
            .bind(&registration.event_id)
            .bind(&registration.event_name)
            .bind(&registration.full_name)
            .bind(&registration.email)
            .bind(&registration.phone)
            .bind(&registration.organization)
            .bind(&registration.interest)
            .bind(registration.registered_at)
            .bind(registration.waitlist_position)
            .bind(&registration.qr_payload)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(registration)
    }

    async fn get_registration(
        &self,
        registration_id: &str,
    ) -> Result<Option<Registration>, StoreError> {
        let query = format!(
            "SELECT {} FROM registrations WHERE registration_id = $1",
            REGISTRATION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(registration_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(registration_from_row).transpose()
    }

    async fn list_waitlisted(&self, event_id: &str) -> Result<Vec<Registration>, StoreError> {
        let query = format!(
            "SELECT {} FROM registrations \
             WHERE event_id = $1 AND status = 'waitlist' \
             ORDER BY registered_at ASC, seq ASC",
            REGISTRATION_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Event {} has {} waitlisted registrations", event_id, rows.len());

        rows.iter().map(registration_from_row).collect()
    }

    async fn count_waitlisted(&self, event_id: &str) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM registrations WHERE event_id = $1 AND status = 'waitlist'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as usize)
    }

    async fn promote(
        &self,
        event_id: &str,
        registration_id: &str,
        promoted_at: DateTime<Utc>,
    ) -> Result<PromoteOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT event_id FROM events WHERE event_id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await?;

        // Take the seat first; a registrant may have claimed it since capacity changed
        let seat = sqlx::query(
            r#"
            UPDATE events SET registered = COALESCE(registered, 0) + 1
            WHERE event_id = $1 AND COALESCE(registered, 0) < capacity
            "#,
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        if seat.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(PromoteOutcome::NoSeat);
        }

        let updated = sqlx::query(
            r#"
            UPDATE registrations
            SET status = 'confirmed', waitlist_position = NULL, promoted_at = $3
            WHERE registration_id = $2 AND event_id = $1 AND status = 'waitlist'
            "#,
        )
        .bind(event_id)
        .bind(registration_id)
        .bind(promoted_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(PromoteOutcome::NotWaitlisted);
        }

        tx.commit().await?;
        Ok(PromoteOutcome::Promoted)
    }

    async fn set_waitlist_position(
        &self,
        registration_id: &str,
        position: i64,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE registrations SET waitlist_position = $2 WHERE registration_id = $1")
            .bind(registration_id)
            .bind(position)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn upsert_profile(&self, profile: &MatchingProfile) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO matching_profiles (
                user_id, event_id, name, email, organization, skills, looking_for,
                experience_level, goals, interests, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id, event_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                organization = EXCLUDED.organization,
                skills = EXCLUDED.skills,
                looking_for = EXCLUDED.looking_for,
                experience_level = EXCLUDED.experience_level,
                goals = EXCLUDED.goals,
                interests = EXCLUDED.interests,
                created_at = EXCLUDED.created_at
        "#;

        let to_vec = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>();

        sqlx::query(query)
            .bind(&profile.user_id)
            .bind(&profile.event_id)
            .bind(&profile.name)
            .bind(&profile.email)
            .bind(&profile.organization)
            .bind(to_vec(&profile.skills))
            .bind(to_vec(&profile.looking_for))
            .bind(profile.experience_level.as_str())
            .bind(to_vec(&profile.goals))
            .bind(to_vec(&profile.interests))
            .bind(profile.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Upserted matching profile {} for event {}",
            profile.user_id,
            profile.event_id
        );

        Ok(())
    }

    async fn get_profile(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<MatchingProfile>, StoreError> {
        let query = format!(
            "SELECT {} FROM matching_profiles WHERE user_id = $1 AND event_id = $2",
            PROFILE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn profiles_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<MatchingProfile>, StoreError> {
        let query = format!(
            "SELECT {} FROM matching_profiles WHERE event_id = $1 ORDER BY created_at ASC, user_id ASC",
            PROFILE_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(profile_from_row).collect()
    }
}
