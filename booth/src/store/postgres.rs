//! `PostgreSQL` booking and notification store.
//!
//! Columns map 1:1 to [`Booking`] and [`Notification`]. Ids and `created_at`
//! are assigned by the database. Enum columns hold their display labels and
//! `time` holds `HH:MM` text.
//!
//! The `bookings_slot_unique` index on `(date, time)` turns a racing second
//! insert into [`StoreError::UniqueViolation`], which the lifecycle reports as
//! a slot conflict.
//!
//! # Example
//!
//! ```no_run
//! use booth_reservations::store::PostgresBookingStore;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgres://localhost/booth").await?;
//! let store = PostgresBookingStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

use booth_core::environment::{BookingStore, EnvFuture, NotificationStore};
use booth_core::{
    Booking, BookingDraft, BookingId, BookingPatch, NaiveDate, NewNotification, Notification,
    NotificationId, Slot, SlotTime, StatusFlag, StoreError,
};
use booth_web::handlers::ReadinessProbe;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id, name, email, company_name, country, product_interest, \
     inquiry_type, message, customer_type, date, time, meeting_with, status_flag, created_at";

const NOTIFICATION_COLUMNS: &str = "id, booking_id, message, action_type, is_read, created_at";

/// `PgPool`-backed implementation of both store traits.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    async fn select_bookings(
        &self,
        filter: &str,
        binds: SelectBinds,
    ) -> Result<Vec<Booking>, StoreError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings {filter}");
        let query = sqlx::query(&sql);
        let query = match binds {
            SelectBinds::None => query,
            SelectBinds::Date(date) => query.bind(date),
            SelectBinds::Slot(slot) => query.bind(slot.date).bind(slot.time.to_string()),
            SelectBinds::Email(email) => query.bind(email),
        };
        let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(row_to_booking).collect()
    }
}

enum SelectBinds {
    None,
    Date(NaiveDate),
    Slot(Slot),
    Email(String),
}

/// Maps a driver error, singling out unique-index violations.
fn db_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::UniqueViolation(db.message().to_string())
        },
        _ => StoreError::Database(e.to_string()),
    }
}

#[allow(clippy::needless_pass_by_value)] // used as a map_err fn
fn corrupt(e: sqlx::Error) -> StoreError {
    StoreError::Corrupt(e.to_string())
}

fn row_to_booking(row: &PgRow) -> Result<Booking, StoreError> {
    let id: Uuid = row.try_get("id").map_err(corrupt)?;
    let product_interest: String = row.try_get("product_interest").map_err(corrupt)?;
    let inquiry_type: String = row.try_get("inquiry_type").map_err(corrupt)?;
    let customer_type: Option<String> = row.try_get("customer_type").map_err(corrupt)?;
    let time: String = row.try_get("time").map_err(corrupt)?;
    let status_flag: Option<String> = row.try_get("status_flag").map_err(corrupt)?;

    Ok(Booking {
        id: BookingId::from_uuid(id),
        name: row.try_get("name").map_err(corrupt)?,
        email: row.try_get("email").map_err(corrupt)?,
        company_name: row.try_get("company_name").map_err(corrupt)?,
        country: row.try_get("country").map_err(corrupt)?,
        product_interest: product_interest.parse().map_err(StoreError::Corrupt)?,
        inquiry_type: inquiry_type.parse().map_err(StoreError::Corrupt)?,
        message: row.try_get("message").map_err(corrupt)?,
        customer_type: customer_type
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(StoreError::Corrupt)?,
        date: row.try_get("date").map_err(corrupt)?,
        time: time
            .parse::<SlotTime>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        meeting_with: row.try_get("meeting_with").map_err(corrupt)?,
        status_flag: status_flag
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(StoreError::Corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

fn row_to_notification(row: &PgRow) -> Result<Notification, StoreError> {
    let id: Uuid = row.try_get("id").map_err(corrupt)?;
    let booking_id: Option<Uuid> = row.try_get("booking_id").map_err(corrupt)?;
    let action_type: String = row.try_get("action_type").map_err(corrupt)?;

    Ok(Notification {
        id: NotificationId::from_uuid(id),
        booking_id: booking_id.map(BookingId::from_uuid),
        message: row.try_get("message").map_err(corrupt)?,
        action_type: action_type.parse().map_err(StoreError::Corrupt)?,
        is_read: row.try_get("is_read").map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(corrupt)?,
    })
}

/// `UPDATE ... RETURNING` touching only the fields present in `patch`.
///
/// Returns `None` for an empty patch.
fn update_query(id: BookingId, patch: BookingPatch) -> Option<QueryBuilder<'static, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let mut builder = QueryBuilder::new("UPDATE bookings SET ");
    {
        let mut set = builder.separated(", ");
        if let Some(name) = patch.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(email) = patch.email {
            set.push("email = ").push_bind_unseparated(email);
        }
        if let Some(company) = patch.company_name {
            set.push("company_name = ").push_bind_unseparated(company);
        }
        if let Some(country) = patch.country {
            set.push("country = ").push_bind_unseparated(country);
        }
        if let Some(product) = patch.product_interest {
            set.push("product_interest = ")
                .push_bind_unseparated(product.as_str());
        }
        if let Some(inquiry) = patch.inquiry_type {
            set.push("inquiry_type = ")
                .push_bind_unseparated(inquiry.as_str());
        }
        if let Some(message) = patch.message {
            set.push("message = ").push_bind_unseparated(message);
        }
        if let Some(customer_type) = patch.customer_type {
            set.push("customer_type = ")
                .push_bind_unseparated(customer_type.map(|c| c.as_str()));
        }
        if let Some(date) = patch.date {
            set.push("date = ").push_bind_unseparated(date);
        }
        if let Some(time) = patch.time {
            set.push("time = ").push_bind_unseparated(time.to_string());
        }
        if let Some(host) = patch.meeting_with {
            set.push("meeting_with = ").push_bind_unseparated(host);
        }
        if let Some(flag) = patch.status_flag {
            set.push("status_flag = ")
                .push_bind_unseparated(flag.map(|f| f.as_str()));
        }
    }
    builder
        .push(" WHERE id = ")
        .push_bind(*id.as_uuid())
        .push(" RETURNING ")
        .push(BOOKING_COLUMNS);
    Some(builder)
}

impl BookingStore for PostgresBookingStore {
    fn insert_booking(
        &self,
        draft: BookingDraft,
        status: StatusFlag,
    ) -> EnvFuture<'_, Result<Booking, StoreError>> {
        Box::pin(async move {
            let sql = format!(
                "INSERT INTO bookings (name, email, company_name, country, product_interest, \
                 inquiry_type, message, customer_type, date, time, meeting_with, status_flag) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                 RETURNING {BOOKING_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(draft.name)
                .bind(draft.email)
                .bind(draft.company_name)
                .bind(draft.country)
                .bind(draft.product_interest.as_str())
                .bind(draft.inquiry_type.as_str())
                .bind(draft.message)
                .bind(draft.customer_type.map(|c| c.as_str()))
                .bind(draft.date)
                .bind(draft.time.to_string())
                .bind(draft.meeting_with)
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;

            row_to_booking(&row)
        })
    }

    fn get_booking(&self, id: BookingId) -> EnvFuture<'_, Result<Option<Booking>, StoreError>> {
        Box::pin(async move {
            let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
            let row = sqlx::query(&sql)
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

            row.as_ref().map(row_to_booking).transpose()
        })
    }

    fn bookings_at(&self, slot: Slot) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>> {
        Box::pin(async move {
            self.select_bookings("WHERE date = $1 AND time = $2", SelectBinds::Slot(slot))
                .await
        })
    }

    fn bookings_on(&self, date: NaiveDate) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>> {
        Box::pin(async move {
            self.select_bookings("WHERE date = $1 ORDER BY time", SelectBinds::Date(date))
                .await
        })
    }

    fn list_bookings(&self) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>> {
        Box::pin(async move {
            self.select_bookings("ORDER BY date, time, created_at", SelectBinds::None)
                .await
        })
    }

    fn bookings_by_email(
        &self,
        email: String,
    ) -> EnvFuture<'_, Result<Vec<Booking>, StoreError>> {
        Box::pin(async move {
            self.select_bookings(
                "WHERE lower(email) = lower($1) ORDER BY created_at DESC",
                SelectBinds::Email(email.trim().to_string()),
            )
            .await
        })
    }

    fn update_booking(
        &self,
        id: BookingId,
        patch: BookingPatch,
    ) -> EnvFuture<'_, Result<Booking, StoreError>> {
        Box::pin(async move {
            let Some(mut query) = update_query(id, patch) else {
                return self
                    .get_booking(id)
                    .await?
                    .ok_or(StoreError::BookingNotFound(id));
            };

            let row = query
                .build()
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?
                .ok_or(StoreError::BookingNotFound(id))?;

            row_to_booking(&row)
        })
    }

    fn delete_booking(&self, id: BookingId) -> EnvFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
                .bind(*id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::BookingNotFound(id));
            }
            Ok(())
        })
    }
}

impl NotificationStore for PostgresBookingStore {
    fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> EnvFuture<'_, Result<Notification, StoreError>> {
        Box::pin(async move {
            let sql = format!(
                "INSERT INTO notifications (booking_id, message, action_type) \
                 VALUES ($1, $2, $3) RETURNING {NOTIFICATION_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(notification.booking_id.map(|id| *id.as_uuid()))
                .bind(notification.message)
                .bind(notification.action_type.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;

            row_to_notification(&row)
        })
    }

    fn list_notifications(&self) -> EnvFuture<'_, Result<Vec<Notification>, StoreError>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY created_at DESC"
            );
            let rows = sqlx::query(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;

            rows.iter().map(row_to_notification).collect()
        })
    }

    fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> EnvFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let result = sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1")
                .bind(*id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotificationNotFound(id));
            }
            Ok(())
        })
    }
}

impl ReadinessProbe for PostgresBookingStore {
    fn component(&self) -> &'static str {
        "database"
    }

    fn probe(&self) -> EnvFuture<'_, Result<(), String>> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
    }
}
