//! `ALTER TABLE parent ATTACH PARTITION child FOR VALUES ...` (`spec.md`
//! §4.4.g). The bound was already syntactically validated by
//! `transform_partition_bound`; this checks it against siblings, then
//! propagates the parent's existing constraints/indexes onto the child the
//! way `define_relation` would have if the child had been declared with
//! `PARTITION OF` from the start.

use relddl_catalog::{Catalog, DependKind, PartitionBound, RelId};

use crate::error::{CoreError, Result};
use crate::inheritance;
use crate::oid_space;
use crate::partition_manager;

pub fn execute(catalog: &mut dyn Catalog, parent: RelId, child: RelId, bound: PartitionBound) -> Result<()> {
    partition_manager::check_no_overlap(catalog, parent, &bound, None)?;

    let child_kind =
        catalog.get_relation(child).map(|r| r.kind).ok_or_else(|| CoreError::Other(anyhow::anyhow!("relation {child} does not exist")))?;
    if !child_kind.has_storage() && !child_kind.is_partitioned() {
        return Err(CoreError::Other(anyhow::anyhow!("relation {child} cannot be a partition")));
    }

    if let Some(rel) = catalog.get_relation_mut(child) {
        rel.is_partition = true;
        rel.partition_bound = Some(bound);
    }
    catalog.add_inheritance_edge(child, parent);
    catalog.add_dependency(oid_space::relation_objid(child), oid_space::relation_objid(parent), DependKind::Auto);
    if let Some(p) = catalog.get_relation_mut(parent) {
        p.has_subclass = true;
    }

    // Every PRIMARY/UNIQUE/EXCLUSION index on the parent must exist on the
    // new partition too (§4.5 index propagation); CHECK constraints inherit
    // via the ordinary merge rule.
    let parent_indexes: Vec<_> = catalog.indexes_on(parent).iter().map(|ix| ix.id).collect();
    for ix_id in parent_indexes {
        partition_manager::propagate_index_to_partitions(catalog, ix_id, parent)?;
    }
    inheritance::inherit(catalog, child, parent)?;

    catalog.command_counter_increment();
    catalog.invalidate(parent);
    catalog.invalidate(child);
    Ok(())
}
