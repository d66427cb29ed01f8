//! HTTP surface for the booking engine.
//!
//! An axum [`Router`](axum::Router) over a shared
//! [`BookingService`](booking_core::BookingService). Handlers only translate
//! between HTTP and the service: they parse input, call one operation, and
//! wrap the outcome in the JSON envelope
//! `{success, data | message, code?, pagination?}`.
//!
//! # Example
//!
//! ```ignore
//! use booking_web::booking_router;
//!
//! let app = booking_router(Arc::new(service));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extractors::{ApiJson, ApiPath, ApiQuery, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use response::ApiResponse;
pub use router::booking_router;
pub use state::AppState;
