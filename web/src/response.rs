//! Success envelope.
//!
//! Every successful response has the shape
//! `{"success": true, "data": ..., "pagination": ...}`; operations without a
//! payload carry a `message` instead of `data`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use booking_core::{Page, Pagination};
use serde::Serialize;

/// Successful API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T> ApiResponse<T> {
    /// 200 with `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
            status: StatusCode::OK,
        }
    }

    /// 201 with the created resource.
    #[must_use]
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(data)
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// 200 with one page of items and its pagination block.
    #[must_use]
    pub fn page(page: Page<T>) -> Self {
        Self {
            pagination: Some(page.pagination),
            ..Self::ok(page.items)
        }
    }
}

impl ApiResponse<()> {
    /// 200 with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            pagination: None,
            status: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
