//! Extractors whose rejections are reported as [`ApiError`](crate::ApiError).

use axum::extract::{FromRequest, FromRequestParts};

use crate::ApiError;

/// `axum::Json`, rejecting malformed bodies with a `{"detail": ...}` 422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Query`, rejecting bad parameters the same way.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
