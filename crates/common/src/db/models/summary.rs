//! Summary entity
//!
//! Summaries reference a publication, section, or item polymorphically
//! through `(object_type, object_id)`.

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, DbBackend, Statement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of object a summary describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "object_type")]
#[serde(rename_all = "lowercase")]
pub enum SummaryObjectType {
    #[sea_orm(string_value = "publication")]
    Publication,
    #[sea_orm(string_value = "section")]
    Section,
    #[sea_orm(string_value = "item")]
    Item,
}

impl SummaryObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryObjectType::Publication => "publication",
            SummaryObjectType::Section => "section",
            SummaryObjectType::Item => "item",
        }
    }
}

impl fmt::Display for SummaryObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "summaries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub object_type: SummaryObjectType,

    pub object_id: i64,

    pub model: String,

    pub model_version: Option<String>,

    pub lang: String,

    #[sea_orm(column_type = "Text")]
    pub summary_text: String,

    #[sea_orm(column_type = "Double")]
    pub confidence: f64,

    pub created_by: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Language used when a summary is created without one
pub const DEFAULT_LANG: &str = "es";

/// A validated summary ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewSummary {
    pub object_type: SummaryObjectType,
    pub object_id: i64,
    pub model: String,
    pub model_version: Option<String>,
    pub lang: String,
    pub summary_text: String,
    pub confidence: f64,
    pub created_by: Option<String>,
}

impl From<NewSummary> for ActiveModel {
    fn from(new: NewSummary) -> Self {
        ActiveModel {
            object_type: Set(new.object_type),
            object_id: Set(new.object_id),
            model: Set(new.model),
            model_version: Set(new.model_version),
            lang: Set(new.lang),
            summary_text: Set(new.summary_text),
            confidence: Set(new.confidence),
            created_by: Set(new.created_by),
            ..Default::default()
        }
    }
}

/// Partial update of a summary; `None` leaves the column untouched.
///
/// Nullable columns use `Option<Option<_>>` so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryChanges {
    pub object_type: Option<SummaryObjectType>,
    pub object_id: Option<i64>,
    pub model: Option<String>,
    pub model_version: Option<Option<String>>,
    pub lang: Option<String>,
    pub summary_text: Option<String>,
    pub confidence: Option<f64>,
    pub created_by: Option<Option<String>>,
}

impl SummaryChanges {
    pub fn is_empty(&self) -> bool {
        self.changed_columns().is_empty()
    }

    /// Names of the columns this update writes
    pub fn changed_columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::new();
        if self.object_type.is_some() {
            columns.push("object_type");
        }
        if self.object_id.is_some() {
            columns.push("object_id");
        }
        if self.model.is_some() {
            columns.push("model");
        }
        if self.model_version.is_some() {
            columns.push("model_version");
        }
        if self.lang.is_some() {
            columns.push("lang");
        }
        if self.summary_text.is_some() {
            columns.push("summary_text");
        }
        if self.confidence.is_some() {
            columns.push("confidence");
        }
        if self.created_by.is_some() {
            columns.push("created_by");
        }
        columns
    }

    /// Whether applying these changes to `current` would alter any column
    pub fn differs_from(&self, current: &Model) -> bool {
        fn differs<T: PartialEq>(new: &Option<T>, current: &T) -> bool {
            new.as_ref().is_some_and(|value| value != current)
        }

        differs(&self.object_type, &current.object_type)
            || differs(&self.object_id, &current.object_id)
            || differs(&self.model, &current.model)
            || differs(&self.model_version, &current.model_version)
            || differs(&self.lang, &current.lang)
            || differs(&self.summary_text, &current.summary_text)
            || differs(&self.confidence, &current.confidence)
            || differs(&self.created_by, &current.created_by)
    }
}

impl From<SummaryChanges> for ActiveModel {
    fn from(changes: SummaryChanges) -> Self {
        let mut model = <ActiveModel as Default>::default();
        if let Some(v) = changes.object_type {
            model.object_type = Set(v);
        }
        if let Some(v) = changes.object_id {
            model.object_id = Set(v);
        }
        if let Some(v) = changes.model {
            model.model = Set(v);
        }
        if let Some(v) = changes.model_version {
            model.model_version = Set(v);
        }
        if let Some(v) = changes.lang {
            model.lang = Set(v);
        }
        if let Some(v) = changes.summary_text {
            model.summary_text = Set(v);
        }
        if let Some(v) = changes.confidence {
            model.confidence = Set(v);
        }
        if let Some(v) = changes.created_by {
            model.created_by = Set(v);
        }
        model
    }
}

/// The object a summary points at, each with its own path to the
/// owning publication
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryTarget {
    Publication(i64),
    Section(i64),
    Item(i64),
}

impl SummaryTarget {
    pub fn new(object_type: SummaryObjectType, object_id: i64) -> Self {
        match object_type {
            SummaryObjectType::Publication => SummaryTarget::Publication(object_id),
            SummaryObjectType::Section => SummaryTarget::Section(object_id),
            SummaryObjectType::Item => SummaryTarget::Item(object_id),
        }
    }

    /// Query yielding a single `source_url` column for the owning publication
    pub fn source_url_statement(&self) -> Statement {
        let (sql, id) = match *self {
            SummaryTarget::Publication(id) => (
                "SELECT p.source_url FROM publications p WHERE p.id = ?",
                id,
            ),
            SummaryTarget::Section(id) => (
                r#"
                SELECT p.source_url
                FROM sections sec
                JOIN publications p ON p.id = sec.publication_id
                WHERE sec.id = ?
                "#,
                id,
            ),
            SummaryTarget::Item(id) => (
                r#"
                SELECT p.source_url
                FROM items i
                JOIN sections sec ON sec.id = i.section_id
                JOIN publications p ON p.id = sec.publication_id
                WHERE i.id = ?
                "#,
                id,
            ),
        };

        Statement::from_sql_and_values(DbBackend::MySql, sql, [id.into()])
    }
}

impl From<&Model> for SummaryTarget {
    fn from(summary: &Model) -> Self {
        SummaryTarget::new(summary.object_type, summary.object_id)
    }
}
