//! PostgreSQL [`PropertyCatalog`] over the `properties` table.

use crate::store::database_error;
use booking_core::{Money, Property, PropertyCatalog, PropertyId, StoreError};
use sqlx::{PgPool, Row};

/// Reads nightly prices from the `properties` table.
#[derive(Clone, Debug)]
pub struct PostgresPropertyCatalog {
    pool: PgPool,
}

impl PostgresPropertyCatalog {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adds or replaces a catalog entry.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] on query failure or an out-of-range price.
    pub async fn upsert(&self, property: &Property) -> Result<(), StoreError> {
        let cents = i64::try_from(property.nightly_price.cents()).map_err(|_| {
            StoreError::Database(format!("nightly price out of range: {}", property.nightly_price))
        })?;
        sqlx::query(
            "INSERT INTO properties (id, title, nightly_price_cents) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE \
             SET title = EXCLUDED.title, nightly_price_cents = EXCLUDED.nightly_price_cents",
        )
        .bind(property.id.as_uuid())
        .bind(&property.title)
        .bind(cents)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("upsert property", &e))?;
        Ok(())
    }
}

impl PropertyCatalog for PostgresPropertyCatalog {
    async fn get_by_id(&self, id: PropertyId) -> Result<Option<Property>, StoreError> {
        let row = sqlx::query("SELECT id, title, nightly_price_cents FROM properties WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("get property", &e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let decode = |e: sqlx::Error| StoreError::Database(format!("Failed to decode property row: {e}"));
        let cents: i64 = row.try_get("nightly_price_cents").map_err(decode)?;
        Ok(Some(Property {
            id: PropertyId::from_uuid(row.try_get("id").map_err(decode)?),
            title: row.try_get("title").map_err(decode)?,
            nightly_price: Money::from_cents(u64::try_from(cents).map_err(|_| {
                StoreError::Database(format!("negative nightly price for property {id}"))
            })?),
        }))
    }
}
