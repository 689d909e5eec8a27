//! Route handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use mirage_core::{ResultCode, StoreError};

use crate::envelope::ApiResponse;

pub mod query;
pub mod summary;
pub mod targets;

/// Map a store rejection onto its wire form.
fn store_error_response(error: StoreError) -> Response {
    let (status, code) = match error {
        StoreError::UnknownTarget => (StatusCode::NOT_FOUND, ResultCode::UnknownTarget),
        StoreError::NameExists => (StatusCode::FORBIDDEN, ResultCode::TargetNameExist),
        StoreError::TargetProcessing => {
            (StatusCode::FORBIDDEN, ResultCode::TargetStatusProcessing)
        }
        StoreError::TargetNotSuccess => {
            (StatusCode::FORBIDDEN, ResultCode::TargetStatusNotSuccess)
        }
        StoreError::ProjectInactive => (StatusCode::FORBIDDEN, ResultCode::ProjectInactive),
    };
    ApiResponse::code(status, code).into_response()
}
