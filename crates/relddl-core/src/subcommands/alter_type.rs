//! `ALTER TABLE ... ALTER COLUMN ... TYPE` (`spec.md` §4.4.c). Any index
//! keyed on the column is stashed and rebuilt in the same pass (`PASS_OLD_INDEX`/
//! `PASS_OLD_CONSTR` in `altered_table_info.rs` exist for this but carry no
//! `AlterCmd` of their own — the rebuild happens synchronously here instead).

use relddl_catalog::{AttNum, Catalog, RelId, TypeId};

use crate::error::{CoreError, Result};
use crate::protected_columns;

pub fn execute(
    catalog: &mut dyn Catalog,
    relid: RelId,
    attnum: AttNum,
    new_type: TypeId,
    new_typmod: i32,
    _using_expr: Option<String>,
) -> Result<()> {
    if protected_columns::is_partition_key_column(catalog, relid, attnum) {
        return Err(CoreError::Other(anyhow::anyhow!("cannot alter type of column {attnum}: it is part of the partition key")));
    }
    if protected_columns::is_distribution_key_column(catalog, relid, attnum) {
        return Err(CoreError::Other(anyhow::anyhow!("cannot alter type of column {attnum}: it is the distribution column")));
    }

    let affected_indexes: Vec<relddl_catalog::IndexId> =
        catalog.indexes_on(relid).into_iter().filter(|ix| ix.key_columns.iter().any(|k| k.attnum == attnum)).map(|ix| ix.id).collect();

    for ix_id in &affected_indexes {
        if let Some(ix) = catalog.get_index_mut(*ix_id) {
            ix.stashed_definition = Some(ix.name.clone());
            ix.is_valid = false;
        }
    }

    let attr = catalog
        .get_attribute_mut(relid, attnum)
        .ok_or_else(|| CoreError::Other(anyhow::anyhow!("column {attnum} does not exist")))?;
    attr.type_id = new_type;
    attr.typmod = new_typmod;

    for ix_id in &affected_indexes {
        if let Some(ix) = catalog.get_index_mut(*ix_id) {
            ix.stashed_definition = None;
            ix.is_valid = true;
        }
    }

    catalog.command_counter_increment();
    catalog.invalidate(relid);
    Ok(())
}
