//! Router harness for handler tests backed by SeaORM's mock database

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use dof_common::{
    config::{AppConfig, StorageConfig},
    db::DbPool,
    pdf::PdfResolver,
};
use sea_orm::{DatabaseBackend, MockDatabase, Transaction};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{create_router, AppState};

pub fn mock_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::MySql)
}

pub struct TestApp {
    router: Router,
    db: DbPool,
}

impl TestApp {
    pub fn new(db: MockDatabase) -> Self {
        let db = DbPool::from_connection(db.into_connection());
        let state = AppState {
            config: Arc::new(AppConfig::default()),
            db: db.clone(),
            resolver: PdfResolver::from_config(&StorageConfig::default()).unwrap(),
        };

        Self {
            router: create_router(state),
            db,
        }
    }

    /// Statements the handlers issued against the mock
    pub fn transaction_log(self) -> Vec<Transaction> {
        let Self { router, db } = self;
        drop(router);

        db.into_connection()
            .expect("router still holds the connection")
            .into_transaction_log()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send a request and return status, headers, and raw body bytes
pub async fn send_raw(app: &TestApp, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, headers, body.to_vec())
}

/// Send a request and decode the JSON body (`Null` when empty)
pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = send_raw(app, request).await;
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

    (status, json)
}
