//! Summary CRUD and sharing handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Deserializer};
use validator::Validate;

use super::MessageResponse;
use crate::extract::{JsonBody, Path};
use crate::AppState;
use dof_common::{
    db::{
        models::{NewSummary, Summary, SummaryChanges, SummaryObjectType, DEFAULT_LANG},
        Repository, SharedSummary, SummaryUpdate,
    },
    errors::{AppError, Result},
    metrics,
};

/// Body of `POST /summaries`.
///
/// Every field is optional at the serde level so that all missing fields can
/// be reported together instead of failing on the first one. Column
/// lengths are enforced by MySQL (error 1406 maps to 400).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateSummaryRequest {
    pub object_type: Option<SummaryObjectType>,

    pub object_id: Option<i64>,

    #[validate(length(min = 1))]
    pub model: Option<String>,

    pub model_version: Option<String>,

    #[validate(length(min = 1))]
    pub lang: Option<String>,

    #[validate(length(min = 1))]
    pub summary_text: Option<String>,

    pub confidence: Option<f64>,

    pub created_by: Option<String>,
}

impl CreateSummaryRequest {
    /// Check required fields and fill defaults
    pub fn into_new_summary(self) -> Result<NewSummary> {
        let mut missing = Vec::new();

        if self.object_type.is_none() {
            missing.push("object_type");
        }
        if self.object_id.is_none() {
            missing.push("object_id");
        }
        if blank(&self.model) {
            missing.push("model");
        }
        if blank(&self.summary_text) {
            missing.push("summary_text");
        }
        if self.confidence.is_none() {
            missing.push("confidence");
        }

        match (self.object_type, self.object_id, self.model, self.summary_text, self.confidence) {
            (Some(object_type), Some(object_id), Some(model), Some(summary_text), Some(confidence))
                if missing.is_empty() =>
            {
                Ok(NewSummary {
                    object_type,
                    object_id,
                    model,
                    model_version: self.model_version,
                    lang: self.lang.unwrap_or_else(|| DEFAULT_LANG.to_string()),
                    summary_text,
                    confidence,
                    created_by: self.created_by,
                })
            }
            _ => Err(AppError::MissingFields {
                fields: missing.into_iter().map(String::from).collect(),
            }),
        }
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Distinguish an explicit `null` from an absent field
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of `PUT /summaries/{id}`; only the given fields are written
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSummaryRequest {
    pub object_type: Option<SummaryObjectType>,

    pub object_id: Option<i64>,

    #[validate(length(min = 1))]
    pub model: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub model_version: Option<Option<String>>,

    #[validate(length(min = 1))]
    pub lang: Option<String>,

    #[validate(length(min = 1))]
    pub summary_text: Option<String>,

    pub confidence: Option<f64>,

    #[serde(default, deserialize_with = "double_option")]
    pub created_by: Option<Option<String>>,
}

impl From<UpdateSummaryRequest> for SummaryChanges {
    fn from(req: UpdateSummaryRequest) -> Self {
        SummaryChanges {
            object_type: req.object_type,
            object_id: req.object_id,
            model: req.model,
            model_version: req.model_version,
            lang: req.lang,
            summary_text: req.summary_text,
            confidence: req.confidence,
            created_by: req.created_by,
        }
    }
}

fn validate<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
    })
}

/// Create a summary
pub async fn create_summary(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateSummaryRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    validate(&request)?;
    let summary = request.into_new_summary()?;

    let repo = Repository::new(state.db.clone());
    let result = repo.create_summary(summary).await;
    metrics::record_summary_write("create", result.is_ok());
    let id = result?;

    tracing::info!(summary_id = id, "Summary created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Summary created".to_string(),
            id: Some(id),
        }),
    ))
}

/// List all summaries
pub async fn list_summaries(State(state): State<AppState>) -> Result<Json<Vec<Summary>>> {
    let repo = Repository::new(state.db.clone());

    let summaries = repo.list_summaries().await?;

    Ok(Json(summaries))
}

/// Get a summary by ID
pub async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Summary>> {
    let repo = Repository::new(state.db.clone());

    let summary = repo
        .find_summary(id)
        .await?
        .ok_or_else(|| AppError::not_found("Summary", id))?;

    Ok(Json(summary))
}

/// Partially update a summary
pub async fn update_summary(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(request): JsonBody<UpdateSummaryRequest>,
) -> Result<Json<MessageResponse>> {
    validate(&request)?;

    let changes = SummaryChanges::from(request);
    if changes.is_empty() {
        return Err(AppError::Validation {
            message: "No fields provided to update".to_string(),
        });
    }

    let columns = changes.changed_columns();
    let repo = Repository::new(state.db.clone());
    let result = repo.update_summary(id, changes).await;
    metrics::record_summary_write("update", matches!(result, Ok(SummaryUpdate::Updated)));

    match result? {
        SummaryUpdate::Updated => {
            tracing::info!(summary_id = id, ?columns, "Summary updated");
            Ok(Json(MessageResponse::new("Summary updated")))
        }
        SummaryUpdate::Unchanged => Err(AppError::Unchanged {
            resource_type: "Summary".to_string(),
            id: id.to_string(),
        }),
        SummaryUpdate::NotFound => Err(AppError::not_found("Summary", id)),
    }
}

/// Delete a summary
pub async fn delete_summary(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let repo = Repository::new(state.db.clone());
    let result = repo.delete_summary(id).await;
    metrics::record_summary_write("delete", result.is_ok());

    if result? == 0 {
        return Err(AppError::not_found("Summary", id));
    }

    tracing::info!(summary_id = id, "Summary deleted");

    Ok(Json(MessageResponse::new("Summary deleted")))
}

/// Summary text with the official link of its publication
pub async fn share_summary(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SharedSummary>> {
    let repo = Repository::new(state.db.clone());

    let shared = repo
        .share_summary(id)
        .await?
        .ok_or_else(|| AppError::not_found("Summary", id))?;

    Ok(Json(shared))
}
