//! Read-only gazette rows
//!
//! Publications, files, pages, sections, items, and entities are owned by
//! the ingestion side; these structs only mirror what the API queries
//! select.

use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::FromQueryResult;
use serde::{Serialize, Serializer};

/// `has_ocr` is a nullable TINYINT; NULL reads as false
fn flag<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(value.unwrap_or(false))
}

/// Row of `GET /dof/files`
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct FileListRow {
    pub id: i64,
    pub publication_id: i64,
    pub storage_uri: String,
    pub mime: Option<String>,
    pub bytes: Option<i64>,
    pub sha256: Option<String>,
    #[serde(serialize_with = "flag")]
    pub has_ocr: Option<bool>,
    pub pages_count: Option<i32>,
    pub publication_date: Option<NaiveDate>,
    pub publication_type: Option<String>,
    pub source_url: Option<String>,
}

/// Minimal file row used by the file detail route
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct FileRow {
    pub id: i64,
    pub publication_id: i64,
    pub storage_uri: String,
    pub mime: Option<String>,
    #[serde(serialize_with = "flag")]
    pub has_ocr: Option<bool>,
}

/// Full file record attached to a publication
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct FileRecord {
    pub id: i64,
    pub publication_id: i64,
    pub storage_uri: String,
    pub public_url: Option<String>,
    pub mime: Option<String>,
    pub bytes: Option<i64>,
    pub sha256: Option<String>,
    #[serde(serialize_with = "flag")]
    pub has_ocr: Option<bool>,
    pub pages_count: Option<i32>,
}

/// What the download route needs to locate and name a file
#[derive(Debug, Clone, FromQueryResult)]
pub struct DownloadRow {
    pub id: i64,
    pub publication_id: i64,
    pub storage_uri: String,
    pub public_url: Option<String>,
    pub mime: Option<String>,
    pub dof_date: Option<NaiveDate>,
    pub publication_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct PageRow {
    pub page_no: i32,
    pub text: Option<String>,
    pub image_uri: Option<String>,
}

/// Row of `GET /dof/publications`
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct PublicationListRow {
    pub id: i64,
    pub dof_date: Option<NaiveDate>,
    pub issue_number: Option<String>,
    #[serde(rename = "type")]
    pub publication_type: Option<String>,
    pub source_url: Option<String>,
    pub status: Option<String>,
    pub published_at: Option<NaiveDateTime>,
    pub file_id: Option<i64>,
    pub pages_count: Option<i32>,
}

#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct PublicationRow {
    pub id: i64,
    pub dof_date: Option<NaiveDate>,
    pub issue_number: Option<String>,
    #[serde(rename = "type")]
    pub publication_type: Option<String>,
    pub source_url: Option<String>,
    pub status: Option<String>,
    pub published_at: Option<NaiveDateTime>,
}

/// One row of `sections LEFT JOIN items`; item columns are NULL for a
/// section without items
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct SectionItemRow {
    pub section_id: i64,
    pub section_name: String,
    pub section_seq: Option<i32>,
    pub page_start: Option<i32>,
    pub page_end: Option<i32>,
    pub item_id: Option<i64>,
    pub item_type: Option<String>,
    pub title: Option<String>,
    pub issuing_entity: Option<String>,
    pub page_from: Option<i32>,
    pub page_to: Option<i32>,
    pub raw_text: Option<String>,
    pub item_summary: Option<String>,
}

/// One row of `item_entities JOIN entities`
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct ItemEntityRow {
    pub item_id: i64,
    pub entity_id: i64,
    pub name: String,
    pub entity_type: Option<String>,
    pub normalized_name: Option<String>,
    pub evidence_span: Option<String>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct SourceUrlRow {
    pub source_url: Option<String>,
}
