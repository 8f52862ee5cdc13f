//! Publication handlers

use axum::{extract::State, Json};

use super::ListParams;
use crate::extract::{Path, Query};
use crate::AppState;
use dof_common::{
    db::{models::PublicationListRow, PublicationDetail, Repository},
    errors::{AppError, Result},
};

/// List the newest publications
pub async fn list_publications(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PublicationListRow>>> {
    let repo = Repository::new(state.db.clone());
    let limit = state.config.api.list_limit(params.limit);

    let publications = repo.list_publications(limit).await?;

    Ok(Json(publications))
}

/// Get a publication with its file, summary, sections, items, and pages
pub async fn get_publication(
    State(state): State<AppState>,
    Path(publication_id): Path<i64>,
) -> Result<Json<PublicationDetail>> {
    let repo = Repository::new(state.db.clone());

    let detail = repo
        .publication_detail(publication_id)
        .await?
        .ok_or_else(|| AppError::not_found("Publication", publication_id))?;

    tracing::debug!(
        publication_id,
        sections = detail.tree.sections.len(),
        "Publication detail assembled"
    );

    Ok(Json(detail))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{get, mock_db, send, TestApp};
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use dof_common::db::models::Summary;
    use sea_orm::Value;
    use std::collections::BTreeMap;

    type Row = BTreeMap<&'static str, Value>;

    fn publication() -> Row {
        BTreeMap::from([
            ("id", 2i64.into()),
            ("dof_date", Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()).into()),
            ("issue_number", Some("10".to_string()).into()),
            ("publication_type", Some("matutina".to_string()).into()),
            ("source_url", Some("https://dof.gob.mx/index.php?year=2024".to_string()).into()),
            ("status", Some("parsed".to_string()).into()),
            ("published_at", Option::<chrono::NaiveDateTime>::None.into()),
        ])
    }

    fn section_row(section: (i64, &str, i32), item: Option<(i64, &str, i32)>) -> Row {
        let (section_id, name, seq) = section;
        BTreeMap::from([
            ("section_id", section_id.into()),
            ("section_name", name.to_string().into()),
            ("section_seq", Some(seq).into()),
            ("page_start", Some(1i32).into()),
            ("page_end", Some(20i32).into()),
            ("item_id", item.map(|(id, _, _)| id).into()),
            ("item_type", item.map(|_| "decreto".to_string()).into()),
            ("title", item.map(|(_, title, _)| title.to_string()).into()),
            ("issuing_entity", Option::<String>::None.into()),
            ("page_from", item.map(|(_, _, page)| page).into()),
            ("page_to", item.map(|(_, _, page)| page + 1).into()),
            ("raw_text", Option::<String>::None.into()),
            ("item_summary", Option::<String>::None.into()),
        ])
    }

    fn entity_row(item_id: i64, entity_id: i64, name: &str) -> Row {
        BTreeMap::from([
            ("item_id", item_id.into()),
            ("entity_id", entity_id.into()),
            ("name", name.to_string().into()),
            ("entity_type", Some("dependencia".to_string()).into()),
            ("normalized_name", Option::<String>::None.into()),
            ("evidence_span", Option::<String>::None.into()),
        ])
    }

    #[tokio::test]
    async fn test_publication_detail_tree() {
        let db = mock_db()
            .append_query_results([vec![publication()]])
            .append_query_results([Vec::<Row>::new()])
            .append_query_results([Vec::<Summary>::new()])
            .append_query_results([vec![
                section_row((1, "Poder Ejecutivo", 1), Some((10, "Decreto A", 2))),
                section_row((1, "Poder Ejecutivo", 1), Some((11, "Acuerdo B", 5))),
                section_row((3, "Avisos", 2), None),
            ]])
            .append_query_results([vec![
                entity_row(10, 100, "SHCP"),
                entity_row(11, 101, "SEP"),
                entity_row(11, 102, "IMSS"),
            ]])
            .append_query_results([Vec::<Row>::new()]);
        let app = TestApp::new(db);

        let (status, body) = send(&app, get("/dof/publications/2")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 2);
        assert_eq!(body["type"], "matutina");
        assert!(body["file"].is_null());
        assert!(body["summary"].is_null());

        let sections = body["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0]["name"], "Poder Ejecutivo");
        assert_eq!(sections[1]["name"], "Avisos");
        assert!(sections[1]["items"].as_array().unwrap().is_empty());

        let items = sections[0]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "Decreto A");
        assert_eq!(items[0]["page_range"]["start"], 2);
        assert_eq!(items[0]["entities"].as_array().unwrap().len(), 1);
        assert_eq!(items[1]["entities"][1]["name"], "IMSS");
        assert!(body["pages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publication_missing_is_404() {
        let db = mock_db().append_query_results([Vec::<Row>::new()]);
        let app = TestApp::new(db);

        let (status, body) = send(&app, get("/dof/publications/77")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Publication with id 77 not found");
    }

    #[tokio::test]
    async fn test_list_publications_uses_default_limit() {
        let row: Row = BTreeMap::from([
            ("id", 2i64.into()),
            ("dof_date", Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()).into()),
            ("issue_number", Option::<String>::None.into()),
            ("publication_type", Some("vespertina".to_string()).into()),
            ("source_url", Option::<String>::None.into()),
            ("status", Option::<String>::None.into()),
            ("published_at", Option::<chrono::NaiveDateTime>::None.into()),
            ("file_id", Some(4i64).into()),
            ("pages_count", Some(8i32).into()),
        ]);

        let db = mock_db().append_query_results([vec![row]]);
        let app = TestApp::new(db);

        let (status, body) = send(&app, get("/dof/publications")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["type"], "vespertina");
        assert_eq!(body[0]["file_id"], 4);

        let log = app.transaction_log();
        assert_eq!(log.len(), 1);
        let statement = format!("{:?}", log[0]);
        assert!(statement.contains("LIMIT ?"));
        assert!(statement.contains("BigUnsigned(Some(5))"));
    }

    #[tokio::test]
    async fn test_negative_limit_is_400_with_message() {
        let app = TestApp::new(mock_db());

        let (status, body) = send(&app, get("/dof/publications?limit=-1")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
        assert!(app.transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_non_numeric_publication_id_is_400() {
        let app = TestApp::new(mock_db());

        let (status, body) = send(&app, get("/dof/publications/abc")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request parameter:"));
    }
}
