//! PostgreSQL [`BookingStore`].
//!
//! The no-double-booking rule is enforced by the
//! `bookings_no_confirmed_overlap` exclusion constraint, so an insert or
//! update that would leave two overlapping confirmed bookings fails inside
//! the database regardless of how many servers race. SQLSTATE `23P01` maps
//! to [`StoreError::Overlap`].
//!
//! Updates carry `AND status = $expected`, so a write computed from a stale
//! read affects no rows and reports [`StoreError::StatusChanged`].

use booking_core::{
    Booking, BookingFilter, BookingId, BookingNumber, BookingStatus, BookingStore, Customer,
    Money, PageRequest, PaymentStatus, PropertyId, StayDates, StoreError,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// Counter of unexpected database failures, labelled by operation.
pub const STORE_ERRORS: &str = "booking_store_errors_total";

/// SQLSTATE for `exclusion_violation`.
const EXCLUSION_VIOLATION: &str = "23P01";
const OVERLAP_CONSTRAINT: &str = "bookings_no_confirmed_overlap";
const NUMBER_CONSTRAINT: &str = "bookings_booking_number_key";

const COLUMNS: &str = "id, booking_number, property_id, customer_name, customer_email, \
    customer_phone, customer_address, check_in, check_out, guests, total_amount_cents, status, \
    payment_status, special_requests, notes, created_at, updated_at";

/// Shared by the page query and the count query.
/// `$1` search pattern, `$2` status, `$3` payment status, `$4` property.
const LIST_FILTER: &str = "($1::text IS NULL \
        OR booking_number ILIKE $1 OR customer_name ILIKE $1 OR customer_email ILIKE $1) \
    AND ($2::text IS NULL OR status = $2) \
    AND ($3::text IS NULL OR payment_status = $3) \
    AND ($4::uuid IS NULL OR property_id = $4)";

/// PostgreSQL booking store.
///
/// # Example
///
/// ```no_run
/// use booking_postgres::PostgresBookingStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresBookingStore::connect("postgres://localhost/bookings").await?;
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Connects with default pool settings.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| database_error("connect", &e))?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for sharing with the property catalog.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the bundled migrations.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Closes every pooled connection, waiting for checked-out ones.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl BookingStore for PostgresBookingStore {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO bookings ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
        );
        sqlx::query(&sql)
            .bind(booking.id.as_uuid())
            .bind(booking.booking_number.as_str())
            .bind(booking.property_id.as_uuid())
            .bind(&booking.customer.name)
            .bind(&booking.customer.email)
            .bind(&booking.customer.phone)
            .bind(booking.customer.address.as_deref())
            .bind(booking.stay.check_in())
            .bind(booking.stay.check_out())
            .bind(guests_column(booking.guests)?)
            .bind(cents_column(booking.total_amount)?)
            .bind(booking.status.as_str())
            .bind(booking.payment_status.as_str())
            .bind(booking.special_requests.as_deref())
            .bind(booking.notes.as_deref())
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, booking, "insert booking"))?;
        Ok(())
    }

    async fn update(&self, booking: &Booking, expected: BookingStatus) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE bookings SET \
                property_id = $2, customer_name = $3, customer_email = $4, customer_phone = $5, \
                customer_address = $6, check_in = $7, check_out = $8, guests = $9, \
                total_amount_cents = $10, status = $11, payment_status = $12, \
                special_requests = $13, notes = $14, updated_at = $15 \
             WHERE id = $1 AND status = $16",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.property_id.as_uuid())
        .bind(&booking.customer.name)
        .bind(&booking.customer.email)
        .bind(&booking.customer.phone)
        .bind(booking.customer.address.as_deref())
        .bind(booking.stay.check_in())
        .bind(booking.stay.check_out())
        .bind(guests_column(booking.guests)?)
        .bind(cents_column(booking.total_amount)?)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.special_requests.as_deref())
        .bind(booking.notes.as_deref())
        .bind(booking.updated_at)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, booking, "update booking"))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Zero rows: the booking is gone or its status moved on.
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bookings WHERE id = $1)")
            .bind(booking.id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| database_error("check booking", &e))?;
        if exists {
            tracing::debug!(booking_id = %booking.id, expected = %expected, "Stale status refused update");
            Err(StoreError::StatusChanged {
                id: booking.id,
                expected,
            })
        } else {
            Err(StoreError::NotFound(booking.id))
        }
    }

    async fn delete(&self, id: BookingId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("delete booking", &e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("get booking", &e))?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn booking_number_exists(&self, number: &BookingNumber) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bookings WHERE booking_number = $1)")
                .bind(number.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| database_error("check booking number", &e))?;
        Ok(exists)
    }

    async fn find_confirmed_overlaps(
        &self,
        property_id: PropertyId,
        stay: StayDates,
        exclude: Option<BookingId>,
    ) -> Result<Vec<Booking>, StoreError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM bookings \
             WHERE property_id = $1 \
               AND status = 'confirmed' \
               AND check_in < $3 \
               AND $2 < check_out \
               AND ($4::uuid IS NULL OR id <> $4) \
             ORDER BY check_in"
        );
        let rows = sqlx::query(&sql)
            .bind(property_id.as_uuid())
            .bind(stay.check_in())
            .bind(stay.check_out())
            .bind(exclude.map(|id| *id.as_uuid()))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("find overlapping bookings", &e))?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn list(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> Result<(Vec<Booking>, u64), StoreError> {
        let pattern = filter.search.as_deref().map(like_pattern);
        let status = filter.status.map(|status| status.as_str());
        let payment_status = filter.payment_status.map(|status| status.as_str());
        let property_id = filter.property_id.map(|id| *id.as_uuid());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM bookings WHERE {LIST_FILTER}"
        ))
        .bind(pattern.as_deref())
        .bind(status)
        .bind(payment_status)
        .bind(property_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| database_error("count bookings", &e))?;

        let sql = format!(
            "SELECT {COLUMNS} FROM bookings WHERE {LIST_FILTER} \
             ORDER BY created_at DESC, booking_number DESC \
             LIMIT $5 OFFSET $6"
        );
        let rows = sqlx::query(&sql)
            .bind(pattern.as_deref())
            .bind(status)
            .bind(payment_status)
            .bind(property_id)
            .bind(i64::from(page.limit()))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("list bookings", &e))?;

        let items = rows.iter().map(booking_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok((items, u64::try_from(total).unwrap_or(0)))
    }
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn guests_column(guests: u32) -> Result<i32, StoreError> {
    i32::try_from(guests).map_err(|_| StoreError::Database(format!("guests out of range: {guests}")))
}

fn cents_column(amount: Money) -> Result<i64, StoreError> {
    i64::try_from(amount.cents())
        .map_err(|_| StoreError::Database(format!("amount out of range: {amount}")))
}

fn booking_from_row(row: &PgRow) -> Result<Booking, StoreError> {
    let guests: i32 = row.try_get("guests").map_err(|e| decode_error(&e))?;
    let cents: i64 = row.try_get("total_amount_cents").map_err(|e| decode_error(&e))?;
    let status: String = row.try_get("status").map_err(|e| decode_error(&e))?;
    let payment_status: String = row.try_get("payment_status").map_err(|e| decode_error(&e))?;

    Ok(Booking {
        id: BookingId::from_uuid(row.try_get("id").map_err(|e| decode_error(&e))?),
        booking_number: BookingNumber::new(
            row.try_get::<String, _>("booking_number")
                .map_err(|e| decode_error(&e))?,
        ),
        property_id: PropertyId::from_uuid(row.try_get("property_id").map_err(|e| decode_error(&e))?),
        customer: Customer {
            name: row.try_get("customer_name").map_err(|e| decode_error(&e))?,
            email: row.try_get("customer_email").map_err(|e| decode_error(&e))?,
            phone: row.try_get("customer_phone").map_err(|e| decode_error(&e))?,
            address: row.try_get("customer_address").map_err(|e| decode_error(&e))?,
        },
        stay: StayDates::new(
            row.try_get("check_in").map_err(|e| decode_error(&e))?,
            row.try_get("check_out").map_err(|e| decode_error(&e))?,
        )
        .map_err(corrupt)?,
        guests: u32::try_from(guests).map_err(corrupt)?,
        total_amount: Money::from_cents(u64::try_from(cents).map_err(corrupt)?),
        status: status.parse::<BookingStatus>().map_err(corrupt)?,
        payment_status: payment_status
            .parse::<PaymentStatus>()
            .map_err(corrupt)?,
        special_requests: row.try_get("special_requests").map_err(|e| decode_error(&e))?,
        notes: row.try_get("notes").map_err(|e| decode_error(&e))?,
        created_at: row.try_get("created_at").map_err(|e| decode_error(&e))?,
        updated_at: row.try_get("updated_at").map_err(|e| decode_error(&e))?,
    })
}

fn corrupt(error: impl std::fmt::Display) -> StoreError {
    StoreError::Database(format!("Corrupt booking row: {error}"))
}

fn decode_error(error: &sqlx::Error) -> StoreError {
    StoreError::Database(format!("Failed to decode booking row: {error}"))
}

/// Maps constraint violations on a write to their store errors.
fn write_error(error: sqlx::Error, booking: &Booking, operation: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION)
            || db_err.constraint() == Some(OVERLAP_CONSTRAINT)
        {
            tracing::warn!(
                booking_id = %booking.id,
                property_id = %booking.property_id,
                stay = %booking.stay,
                "Exclusion constraint refused confirmed booking"
            );
            return StoreError::Overlap {
                property_id: booking.property_id,
                check_in: booking.stay.check_in(),
                check_out: booking.stay.check_out(),
            };
        }
        if db_err.is_unique_violation() && db_err.constraint() == Some(NUMBER_CONSTRAINT) {
            return StoreError::DuplicateBookingNumber(booking.booking_number.clone());
        }
    }
    database_error(operation, &error)
}

/// Logs and counts an unexpected database failure.
pub(crate) fn database_error(operation: &str, error: &sqlx::Error) -> StoreError {
    metrics::counter!(STORE_ERRORS, "operation" => operation.to_string()).increment(1);
    tracing::error!(operation, error = %error, "Database operation failed");
    StoreError::Database(format!("Failed to {operation}: {error}"))
}
