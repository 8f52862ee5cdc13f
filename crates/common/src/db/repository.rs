//! Repository pattern for database operations
//!
//! One method per API operation. Multi-statement operations run inside a
//! single transaction; dropping an uncommitted `DatabaseTransaction` rolls
//! it back, so every early return releases the connection cleanly.

use crate::assembly::{self, PublicationTree};
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, Statement, TransactionTrait, Value,
};
use serde::Serialize;

const LIST_FILES_SQL: &str = r#"
    SELECT
        f.id,
        f.publication_id,
        f.storage_uri,
        f.mime,
        f.bytes,
        f.sha256,
        f.has_ocr,
        f.pages_count,
        p.dof_date   AS publication_date,
        p.type       AS publication_type,
        p.source_url AS source_url
    FROM files f
    JOIN publications p ON f.publication_id = p.id
    ORDER BY p.dof_date DESC, f.id DESC
    LIMIT ?
"#;

const FILE_SQL: &str = r#"
    SELECT id, publication_id, storage_uri, mime, has_ocr
    FROM files
    WHERE id = ?
"#;

const FILE_PAGES_SQL: &str = r#"
    SELECT page_no, text, image_uri
    FROM pages
    WHERE file_id = ?
    ORDER BY page_no
"#;

const DOWNLOAD_SQL: &str = r#"
    SELECT
        f.id,
        f.publication_id,
        f.storage_uri,
        f.public_url,
        f.mime,
        p.dof_date,
        p.type AS publication_type
    FROM files f
    JOIN publications p ON f.publication_id = p.id
    WHERE f.id = ?
"#;

const LIST_PUBLICATIONS_SQL: &str = r#"
    SELECT
        p.id,
        p.dof_date,
        p.issue_number,
        p.type AS publication_type,
        p.source_url,
        p.status,
        p.published_at,
        f.id AS file_id,
        f.pages_count
    FROM publications p
    LEFT JOIN files f ON f.publication_id = p.id
    ORDER BY p.dof_date DESC, p.id DESC
    LIMIT ?
"#;

const PUBLICATION_SQL: &str = r#"
    SELECT id, dof_date, issue_number, type AS publication_type, source_url, status, published_at
    FROM publications
    WHERE id = ?
"#;

const PUBLICATION_FILE_SQL: &str = r#"
    SELECT id, publication_id, storage_uri, public_url, mime, bytes, sha256, has_ocr, pages_count
    FROM files
    WHERE publication_id = ?
    ORDER BY id
    LIMIT 1
"#;

const SECTION_ITEMS_SQL: &str = r#"
    SELECT
        s.id         AS section_id,
        s.name       AS section_name,
        s.seq        AS section_seq,
        s.page_start,
        s.page_end,
        i.id         AS item_id,
        i.type       AS item_type,
        i.title,
        i.issuing_entity,
        i.page_from,
        i.page_to,
        i.raw_text,
        (
            SELECT sm.summary_text
            FROM summaries sm
            WHERE sm.object_type = 'item' AND sm.object_id = i.id
            ORDER BY sm.created_at DESC, sm.id DESC
            LIMIT 1
        ) AS item_summary
    FROM sections s
    LEFT JOIN items i ON i.section_id = s.id
    WHERE s.publication_id = ?
    ORDER BY s.seq, s.id, i.page_from, i.id
"#;

const ITEM_ENTITIES_SQL: &str = r#"
    SELECT
        ie.item_id,
        e.id   AS entity_id,
        e.name,
        e.type AS entity_type,
        e.normalized_name,
        ie.evidence_span
    FROM item_entities ie
    JOIN entities e ON e.id = ie.entity_id
    JOIN items i ON i.id = ie.item_id
    JOIN sections s ON s.id = i.section_id
    WHERE s.publication_id = ?
    ORDER BY ie.item_id, e.id
"#;

const PUBLICATION_PAGES_SQL: &str = r#"
    SELECT pg.page_no, pg.text, pg.image_uri
    FROM pages pg
    JOIN files f ON f.id = pg.file_id
    WHERE f.publication_id = ?
    ORDER BY pg.page_no
"#;

/// File with its pages and latest publication summary
#[derive(Debug, Clone, Serialize)]
pub struct FileDetail {
    #[serde(flatten)]
    pub file: FileRow,
    pub pages: Vec<PageRow>,
    pub summary: Option<String>,
}

/// Publication with its file, summary, and section tree
#[derive(Debug, Clone, Serialize)]
pub struct PublicationDetail {
    #[serde(flatten)]
    pub publication: PublicationRow,
    pub file: Option<FileRecord>,
    pub summary: Option<String>,
    #[serde(flatten)]
    pub tree: PublicationTree,
}

/// Outcome of a partial summary update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryUpdate {
    Updated,
    /// Every provided value already matched the stored row
    Unchanged,
    NotFound,
}

/// Summary text plus the official link of the publication it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedSummary {
    pub summary_id: i64,
    pub summary_text: String,
    pub source_url: Option<String>,
}

fn statement<I>(sql: &str, values: I) -> Statement
where
    I: IntoIterator<Item = Value>,
{
    Statement::from_sql_and_values(DbBackend::MySql, sql, values)
}

/// Most recent summary text for an object
async fn latest_summary_text<C: ConnectionTrait>(
    conn: &C,
    object_type: SummaryObjectType,
    object_id: i64,
) -> Result<Option<String>> {
    let summary = SummaryEntity::find()
        .filter(SummaryColumn::ObjectType.eq(object_type))
        .filter(SummaryColumn::ObjectId.eq(object_id))
        .order_by_desc(SummaryColumn::CreatedAt)
        .order_by_desc(SummaryColumn::Id)
        .one(conn)
        .await?;

    Ok(summary.map(|s| s.summary_text))
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.connection()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // File Operations
    // ========================================================================

    /// Newest files with their publication fields
    pub async fn list_files(&self, limit: u64) -> Result<Vec<FileListRow>> {
        let rows = FileListRow::find_by_statement(statement(LIST_FILES_SQL, [limit.into()]))
            .all(self.conn())
            .await?;

        Ok(rows)
    }

    /// File detail with pages and the latest publication summary
    pub async fn file_detail(&self, file_id: i64) -> Result<Option<FileDetail>> {
        let txn = self.conn().begin().await?;

        let Some(file) = FileRow::find_by_statement(statement(FILE_SQL, [file_id.into()]))
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let pages = PageRow::find_by_statement(statement(FILE_PAGES_SQL, [file_id.into()]))
            .all(&txn)
            .await?;

        let summary =
            latest_summary_text(&txn, SummaryObjectType::Publication, file.publication_id).await?;

        txn.commit().await?;

        Ok(Some(FileDetail { file, pages, summary }))
    }

    /// Location and naming data for a file download
    pub async fn download_target(&self, file_id: i64) -> Result<Option<DownloadRow>> {
        let row = DownloadRow::find_by_statement(statement(DOWNLOAD_SQL, [file_id.into()]))
            .one(self.conn())
            .await?;

        Ok(row)
    }

    /// Latest publication-level summary text
    pub async fn publication_summary(&self, publication_id: i64) -> Result<Option<String>> {
        latest_summary_text(self.conn(), SummaryObjectType::Publication, publication_id).await
    }

    // ========================================================================
    // Publication Operations
    // ========================================================================

    /// Newest publications with their linked file page count
    pub async fn list_publications(&self, limit: u64) -> Result<Vec<PublicationListRow>> {
        let rows =
            PublicationListRow::find_by_statement(statement(LIST_PUBLICATIONS_SQL, [limit.into()]))
                .all(self.conn())
                .await?;

        Ok(rows)
    }

    /// Full structured publication
    pub async fn publication_detail(&self, publication_id: i64) -> Result<Option<PublicationDetail>> {
        let txn = self.conn().begin().await?;

        let Some(publication) =
            PublicationRow::find_by_statement(statement(PUBLICATION_SQL, [publication_id.into()]))
                .one(&txn)
                .await?
        else {
            return Ok(None);
        };

        let file =
            FileRecord::find_by_statement(statement(PUBLICATION_FILE_SQL, [publication_id.into()]))
                .one(&txn)
                .await?;

        let summary =
            latest_summary_text(&txn, SummaryObjectType::Publication, publication_id).await?;

        let rows =
            SectionItemRow::find_by_statement(statement(SECTION_ITEMS_SQL, [publication_id.into()]))
                .all(&txn)
                .await?;

        let entities =
            ItemEntityRow::find_by_statement(statement(ITEM_ENTITIES_SQL, [publication_id.into()]))
                .all(&txn)
                .await?;

        let pages =
            PageRow::find_by_statement(statement(PUBLICATION_PAGES_SQL, [publication_id.into()]))
                .all(&txn)
                .await?;

        txn.commit().await?;

        tracing::debug!(
            publication_id,
            section_rows = rows.len(),
            entity_rows = entities.len(),
            pages = pages.len(),
            "Assembling publication detail"
        );

        Ok(Some(PublicationDetail {
            publication,
            file,
            summary,
            tree: assembly::assemble(rows, entities, pages),
        }))
    }

    // ========================================================================
    // Summary Operations
    // ========================================================================

    /// Insert a summary and return its id
    pub async fn create_summary(&self, summary: NewSummary) -> Result<i64> {
        let txn = self.conn().begin().await?;

        let result = SummaryEntity::insert(SummaryActiveModel::from(summary))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(result.last_insert_id)
    }

    /// All summaries
    pub async fn list_summaries(&self) -> Result<Vec<Summary>> {
        let summaries = SummaryEntity::find()
            .order_by_asc(SummaryColumn::Id)
            .all(self.conn())
            .await?;

        Ok(summaries)
    }

    /// Find summary by ID
    pub async fn find_summary(&self, id: i64) -> Result<Option<Summary>> {
        let summary = SummaryEntity::find_by_id(id)
            .one(self.conn())
            .await?;

        Ok(summary)
    }

    /// Apply a partial update.
    ///
    /// The driver reports matched rather than changed rows, so the stored
    /// row is compared first and an update that changes nothing is never
    /// issued.
    pub async fn update_summary(&self, id: i64, changes: SummaryChanges) -> Result<SummaryUpdate> {
        let txn = self.conn().begin().await?;

        let Some(current) = SummaryEntity::find_by_id(id).one(&txn).await? else {
            return Ok(SummaryUpdate::NotFound);
        };

        if !changes.differs_from(&current) {
            return Ok(SummaryUpdate::Unchanged);
        }

        SummaryEntity::update_many()
            .set(SummaryActiveModel::from(changes))
            .filter(SummaryColumn::Id.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(SummaryUpdate::Updated)
    }

    /// Delete summary by ID; returns the number of rows removed
    pub async fn delete_summary(&self, id: i64) -> Result<u64> {
        let txn = self.conn().begin().await?;

        let result = SummaryEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected)
    }

    /// Summary text with the source URL of its owning publication
    pub async fn share_summary(&self, id: i64) -> Result<Option<SharedSummary>> {
        let txn = self.conn().begin().await?;

        let Some(summary) = SummaryEntity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let target = SummaryTarget::from(&summary);
        let source_url = SourceUrlRow::find_by_statement(target.source_url_statement())
            .one(&txn)
            .await?
            .and_then(|row| row.source_url);

        txn.commit().await?;

        Ok(Some(SharedSummary {
            summary_id: summary.id,
            summary_text: summary.summary_text,
            source_url,
        }))
    }
}
