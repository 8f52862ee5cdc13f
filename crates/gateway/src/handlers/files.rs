//! Gazette file handlers: listing, detail, and download

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;

use super::ListParams;
use crate::extract::{Path, Query};
use crate::AppState;
use dof_common::{
    bundle::{self, NO_SUMMARY_PLACEHOLDER},
    db::{models::{DownloadRow, FileListRow}, FileDetail, Repository},
    errors::{AppError, Result},
};

const DEFAULT_MIME: &str = "application/pdf";
const ZIP_MIME: &str = "application/zip";

#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    /// `zip` bundles the PDF with its summary; anything else sends the PDF
    pub bundle: Option<String>,
}

/// How a download is packaged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packaging {
    Pdf,
    Zip,
}

impl Packaging {
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "zip" => Packaging::Zip,
            _ => Packaging::Pdf,
        }
    }
}

/// List the newest gazette files
pub async fn list_files(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<FileListRow>>> {
    let repo = Repository::new(state.db.clone());
    let limit = state.config.api.list_limit(params.limit);

    let files = repo.list_files(limit).await?;

    Ok(Json(files))
}

/// Get a file with its pages and publication summary
pub async fn get_file(
    State(state): State<AppState>,
    Path(file_id): Path<i64>,
) -> Result<Json<FileDetail>> {
    let repo = Repository::new(state.db.clone());

    let detail = repo
        .file_detail(file_id)
        .await?
        .ok_or_else(|| AppError::not_found("File", file_id))?;

    Ok(Json(detail))
}

/// Download a file as a PDF or as a zip with its summary
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<i64>,
    Query(params): Query<DownloadParams>,
) -> Result<Response> {
    let packaging = Packaging::from_param(params.bundle.as_deref());
    let repo = Repository::new(state.db.clone());

    let target = repo
        .download_target(file_id)
        .await?
        .ok_or_else(|| AppError::not_found("File", file_id))?;

    let pdf = state
        .resolver
        .resolve(&target.storage_uri, target.public_url.as_deref())
        .await?;

    let base_name = download_base_name(&target);

    tracing::info!(
        file_id,
        bytes = pdf.len(),
        packaging = ?packaging,
        "Serving file download"
    );

    match packaging {
        Packaging::Zip => {
            let summary = repo
                .publication_summary(target.publication_id)
                .await?
                .unwrap_or_else(|| NO_SUMMARY_PLACEHOLDER.to_string());

            let archive = bundle::build_bundle(&pdf, &summary)?;
            attachment(archive, ZIP_MIME, &format!("{}.zip", base_name))
        }
        Packaging::Pdf => {
            let mime = target
                .mime
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_MIME);

            attachment(pdf, mime, &format!("{}.pdf", base_name))
        }
    }
}

/// `DOF_{date}_{type}_file{id}`, sanitized
fn download_base_name(target: &DownloadRow) -> String {
    let date = target
        .dof_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let kind = target.publication_type.as_deref().unwrap_or("unknown");

    bundle::sanitize_filename(&format!("DOF_{}_{}_file{}", date, kind, target.id))
}

fn attachment(bytes: Vec<u8>, content_type: &str, filename: &str) -> Result<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal { message: e.to_string() })
}
