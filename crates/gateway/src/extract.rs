//! Extractors whose rejections use the `{"message"}` error body

use axum::extract::{FromRequest, FromRequestParts};
use dof_common::errors::AppError;

/// `axum::extract::Path` with an `AppError` rejection
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// `axum::extract::Query` with an `AppError` rejection
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// `axum::Json` request body with an `AppError` rejection
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
