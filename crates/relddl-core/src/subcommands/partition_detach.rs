//! `ALTER TABLE parent DETACH PARTITION child [CONCURRENTLY]` (`spec.md`
//! §4.4.g). The `CONCURRENTLY` two-step protocol isn't modeled; this
//! performs the synchronous detach only.

use relddl_catalog::{Catalog, RelId};

use crate::error::{CoreError, Result};
use crate::oid_space;

pub fn execute(catalog: &mut dyn Catalog, parent: RelId, child: RelId) -> Result<()> {
    if !catalog.children_of(parent).contains(&child) {
        return Err(CoreError::Other(anyhow::anyhow!("relation {child} is not a partition of {parent}")));
    }

    catalog.remove_inheritance_edge(child, parent);
    catalog.remove_dependencies_of(oid_space::relation_objid(child));

    if let Some(rel) = catalog.get_relation_mut(child) {
        rel.is_partition = false;
        rel.partition_bound = None;
    }
    if catalog.children_of(parent).is_empty() {
        if let Some(p) = catalog.get_relation_mut(parent) {
            p.has_subclass = false;
        }
    }

    catalog.command_counter_increment();
    catalog.invalidate(parent);
    catalog.invalidate(child);
    Ok(())
}
