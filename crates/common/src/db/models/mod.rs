//! Database models
//!
//! `summaries` is a SeaORM entity because the API writes it; everything
//! else is read through raw statements into `FromQueryResult` rows.

mod dof;
pub mod summary;

pub use dof::{
    DownloadRow, FileListRow, FileRecord, FileRow, ItemEntityRow, PageRow, PublicationListRow,
    PublicationRow, SectionItemRow, SourceUrlRow,
};

pub use summary::{
    Entity as SummaryEntity,
    Model as Summary,
    ActiveModel as SummaryActiveModel,
    Column as SummaryColumn,
    NewSummary,
    SummaryChanges,
    SummaryObjectType,
    SummaryTarget,
    DEFAULT_LANG,
};
