//! Row-to-tree assembly for publication detail
//!
//! Folds the flat `sections LEFT JOIN items` result into
//! sections → items, then attaches entity rows to their items.
//! Input order is preserved at every level: the query decides section
//! order (by sequence) and item order (by starting page).

use serde::Serialize;
use std::collections::HashMap;

use crate::db::models::{ItemEntityRow, PageRow, SectionItemRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityNode {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub normalized_name: Option<String>,
    pub evidence_span: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemNode {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub title: Option<String>,
    pub issuing_entity: Option<String>,
    pub page_range: PageRange,
    pub raw_text: Option<String>,
    pub summary: Option<String>,
    pub entities: Vec<EntityNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionNode {
    pub id: i64,
    pub name: String,
    pub sequence: Option<i32>,
    pub page_range: PageRange,
    pub items: Vec<ItemNode>,
}

/// Structured body of a publication
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublicationTree {
    pub sections: Vec<SectionNode>,
    pub pages: Vec<PageRow>,
}

/// Build the section/item/entity tree from flat query rows
pub fn assemble(
    rows: Vec<SectionItemRow>,
    entities: Vec<ItemEntityRow>,
    pages: Vec<PageRow>,
) -> PublicationTree {
    let mut sections: Vec<SectionNode> = Vec::new();
    let mut section_index: HashMap<i64, usize> = HashMap::new();
    let mut item_index: HashMap<i64, (usize, usize)> = HashMap::new();

    for row in rows {
        let s = *section_index.entry(row.section_id).or_insert_with(|| {
            sections.push(SectionNode {
                id: row.section_id,
                name: row.section_name.clone(),
                sequence: row.section_seq,
                page_range: PageRange { start: row.page_start, end: row.page_end },
                items: Vec::new(),
            });
            sections.len() - 1
        });

        // NULL item: a section with no items, already recorded above
        let Some(item_id) = row.item_id else { continue };
        if item_index.contains_key(&item_id) {
            continue;
        }

        let items = &mut sections[s].items;
        items.push(ItemNode {
            id: item_id,
            item_type: row.item_type,
            title: row.title,
            issuing_entity: row.issuing_entity,
            page_range: PageRange { start: row.page_from, end: row.page_to },
            raw_text: row.raw_text,
            summary: row.item_summary,
            entities: Vec::new(),
        });
        item_index.insert(item_id, (s, items.len() - 1));
    }

    for entity in entities {
        let Some(&(s, i)) = item_index.get(&entity.item_id) else {
            tracing::debug!(item_id = entity.item_id, "Entity row for unknown item skipped");
            continue;
        };
        sections[s].items[i].entities.push(EntityNode {
            id: entity.entity_id,
            name: entity.name,
            entity_type: entity.entity_type,
            normalized_name: entity.normalized_name,
            evidence_span: entity.evidence_span,
        });
    }

    PublicationTree { sections, pages }
}
