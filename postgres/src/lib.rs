//! PostgreSQL adapters for the booking engine.
//!
//! - [`PostgresBookingStore`]: bookings, with the no-double-booking rule
//!   enforced by an exclusion constraint on confirmed date ranges
//! - [`PostgresPropertyCatalog`]: nightly prices from the `properties` table
//!
//! Both share one [`sqlx::PgPool`]. Migrations ship in `./migrations` and
//! are applied with [`PostgresBookingStore::migrate`]; they need the
//! `btree_gist` and `pg_trgm` extensions, which the official PostgreSQL
//! images include.

mod catalog;
mod store;

pub use catalog::PostgresPropertyCatalog;
pub use store::{PostgresBookingStore, STORE_ERRORS};

/// Registers descriptions for the metrics this crate records.
pub fn describe_metrics() {
    metrics::describe_counter!(STORE_ERRORS, "Unexpected database failures by store operation");
}
