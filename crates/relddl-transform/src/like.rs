//! `LIKE source_table [INCLUDING ...]` expansion (`spec.md` §4.1, glossary
//! "Attmap"): copies column definitions (and, optionally, defaults/
//! constraints/indexes) from an existing relation into a new one's element
//! list, recording the attmap so later elements in the same statement that
//! reference the source table's columns by name still resolve.

use relddl_catalog::{AttNum, Catalog, IdentityMode, RelId, StorageMode};
use std::collections::HashMap;

use crate::error::{Result, TransformError};
use crate::raw::RawLikeClause;
use crate::resolved::ColumnPlan;

/// Maps the source table's attnums to the position they land at in the new
/// table's element list (`spec.md` glossary "Attmap"). A `None` entry means
/// the source column was dropped and contributes nothing.
pub type AttMap = HashMap<AttNum, usize>;

pub struct LikeExpansion {
    pub columns: Vec<ColumnPlan>,
    pub attmap: AttMap,
}

pub fn expand_like(like: &RawLikeClause, catalog: &dyn Catalog, starting_offset: usize) -> Result<LikeExpansion> {
    let source = find_table(catalog, &like.source_table)?;

    let mut columns = Vec::new();
    let mut attmap = AttMap::new();

    let mut attrs: Vec<_> = catalog.attributes(source);
    attrs.sort_by_key(|a| a.attnum);

    for attr in attrs {
        if attr.dropped || attr.attnum.is_system_column() {
            continue;
        }
        let plan = ColumnPlan {
            name: attr.name.clone(),
            type_id: attr.type_id,
            typmod: attr.typmod,
            collation: attr.collation,
            storage: if like.include_storage { attr.storage } else { StorageMode::Plain },
            not_null: attr.not_null,
            default_expr: if like.include_defaults { attr.default_expr.clone() } else { None },
            identity: if like.include_defaults { attr.identity } else { IdentityMode::None },
        };
        attmap.insert(attr.attnum, starting_offset + columns.len());
        columns.push(plan);
    }

    Ok(LikeExpansion { columns, attmap })
}

fn find_table(catalog: &dyn Catalog, name: &str) -> Result<RelId> {
    catalog
        .all_relation_ids()
        .into_iter()
        .find(|&id| catalog.get_relation(id).map(|r| r.name == name).unwrap_or(false))
        .ok_or_else(|| TransformError::UndefinedTable(name.to_string()))
}
