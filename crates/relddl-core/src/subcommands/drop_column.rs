//! `ALTER TABLE ... DROP COLUMN` (`spec.md` §4.4.b). Attributes are never
//! physically removed (I1); this only flips `dropped` and, under `CASCADE`,
//! removes constraints that depended on the column.
//!
//! I4 governs an inherited column specially: it can never be dropped
//! directly from the child that merely inherited it, only from a parent
//! (which fans the drop back out here with [`Origin::Inherited`]) —
//! decrementing `attinhcount` and only actually dropping once it reaches
//! zero without `is_local` (`Attribute::should_vanish`).

use relddl_catalog::{AttNum, Catalog, RelId};

use crate::error::{CoreError, Result};
use crate::protected_columns;
use crate::subcommands::Origin;

pub fn execute(catalog: &mut dyn Catalog, relid: RelId, attnum: AttNum, cascade: bool, origin: Origin) -> Result<()> {
    if protected_columns::is_partition_key_column(catalog, relid, attnum) {
        return Err(CoreError::Other(anyhow::anyhow!("cannot drop column {attnum}: it is part of the partition key")));
    }
    if protected_columns::is_distribution_key_column(catalog, relid, attnum) {
        return Err(CoreError::Other(anyhow::anyhow!("cannot drop column {attnum}: it is the distribution column")));
    }

    let inhcount = catalog
        .get_attribute(relid, attnum)
        .ok_or_else(|| CoreError::Other(anyhow::anyhow!("column {attnum} does not exist")))?
        .inhcount;

    if origin == Origin::Direct && inhcount > 0 {
        return Err(CoreError::Other(anyhow::anyhow!(
            "cannot drop inherited column {attnum} directly; drop it from the parent table instead"
        )));
    }

    let should_drop = if origin == Origin::Inherited {
        let attr = catalog
            .get_attribute_mut(relid, attnum)
            .ok_or_else(|| CoreError::Other(anyhow::anyhow!("column {attnum} does not exist")))?;
        attr.inhcount = (attr.inhcount - 1).max(0);
        attr.should_vanish()
    } else {
        true
    };

    if !should_drop {
        catalog.command_counter_increment();
        catalog.invalidate(relid);
        return Ok(());
    }

    let dependents: Vec<relddl_catalog::ConstraintId> = catalog
        .constraints(relid)
        .into_iter()
        .filter(|c| constraint_references(c, attnum, &*catalog))
        .map(|c| c.id)
        .collect();

    if !dependents.is_empty() && !cascade {
        return Err(CoreError::Other(anyhow::anyhow!(
            "column {attnum} is used by {} constraint(s); use CASCADE to drop them too",
            dependents.len()
        )));
    }

    for id in dependents {
        if let Some(c) = catalog.get_constraint(id).cloned() {
            if let Some(ix_id) = c.index {
                catalog.delete_index(ix_id)?;
            }
        }
        catalog.delete_constraint(id)?;
    }

    let attr =
        catalog.get_attribute_mut(relid, attnum).ok_or_else(|| CoreError::Other(anyhow::anyhow!("column {attnum} does not exist")))?;
    attr.dropped = true;

    catalog.command_counter_increment();
    catalog.invalidate(relid);
    Ok(())
}

fn constraint_references(c: &relddl_catalog::Constraint, attnum: AttNum, catalog: &dyn Catalog) -> bool {
    if let Some(fk) = &c.foreign_key {
        if fk.local_cols.contains(&attnum) {
            return true;
        }
    }
    if let Some(ix_id) = c.index {
        if let Some(ix) = catalog.get_index(ix_id) {
            return ix.key_columns.iter().any(|k| k.attnum == attnum);
        }
    }
    false
}
