//! Guards against mutating a column the partitioning or distribution layer
//! depends on out from under it (§4.4.b, §4.4.c: both DROP COLUMN and ALTER
//! COLUMN TYPE must reject touching the partition key or the distribution
//! column).

use relddl_catalog::{AttNum, Catalog, RelId};

pub fn is_partition_key_column(catalog: &dyn Catalog, relid: RelId, attnum: AttNum) -> bool {
    catalog
        .get_relation(relid)
        .and_then(|r| r.partition_key.as_ref())
        .map(|k| k.columns.iter().any(|c| c.attnum == Some(attnum)))
        .unwrap_or(false)
}

/// `spec.md` §9 "Distribution layer": distribution metadata is opaque to
/// this crate, so the guard resolves `attnum` to a name and compares it
/// against the stashed distribution column name rather than an attnum.
pub fn is_distribution_key_column(catalog: &dyn Catalog, relid: RelId, attnum: AttNum) -> bool {
    let Some(rel) = catalog.get_relation(relid) else { return false };
    let Some(column) = rel.distribution.as_ref().and_then(|d| d.column.as_ref()) else { return false };
    catalog.get_attribute(relid, attnum).map(|a| &a.name == column).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relddl_catalog::{Attribute, DistributionInfo, MemoryCatalog, NamespaceId, PartitionKey, PartitionKeyColumn, PartitionStrategy, RelKind, Relation, RoleId, TypeId};

    fn make_table(cat: &mut MemoryCatalog) -> RelId {
        let id = cat.allocate_oid();
        cat.insert_relation(Relation::new(id, "t", RelKind::Table, RoleId(1), NamespaceId(1))).unwrap();
        cat.insert_attribute(id, Attribute::new(AttNum(1), "region", TypeId(25))).unwrap();
        id
    }

    #[test]
    fn flags_a_column_participating_in_the_partition_key() {
        let mut cat = MemoryCatalog::new();
        let relid = make_table(&mut cat);
        if let Some(rel) = cat.get_relation_mut(relid) {
            rel.partition_key = Some(PartitionKey {
                strategy: PartitionStrategy::List,
                columns: vec![PartitionKeyColumn { attnum: Some(AttNum(1)), expr: None, opclass: "default".into(), collation: None }],
            });
        }
        assert!(is_partition_key_column(&cat, relid, AttNum(1)));
        assert!(!is_partition_key_column(&cat, relid, AttNum(2)));
    }

    #[test]
    fn flags_the_distribution_column_by_name() {
        let mut cat = MemoryCatalog::new();
        let relid = make_table(&mut cat);
        if let Some(rel) = cat.get_relation_mut(relid) {
            rel.distribution = Some(DistributionInfo { kind: "hash".into(), column: Some("region".into()) });
        }
        assert!(is_distribution_key_column(&cat, relid, AttNum(1)));
    }
}
