//! `ALTER TABLE ... REPLICA IDENTITY` (`spec.md` §4.4.f).

use relddl_catalog::{Catalog, RelId, ReplicaIdentity};

use crate::error::{CoreError, Result};

pub fn execute(catalog: &mut dyn Catalog, relid: RelId, identity: ReplicaIdentity) -> Result<()> {
    if let ReplicaIdentity::UsingIndex(ix_relid) = &identity {
        let eligible = catalog
            .indexes_on(relid)
            .into_iter()
            .any(|ix| relddl_catalog::RelId(ix.id.0) == *ix_relid && ix.eligible_for_replica_identity());
        if !eligible {
            return Err(CoreError::Other(anyhow::anyhow!("index is not eligible to be a replica identity")));
        }
    }

    let rel = catalog.get_relation_mut(relid).ok_or_else(|| CoreError::Other(anyhow::anyhow!("relation {relid} does not exist")))?;
    rel.replica_identity = identity;
    catalog.invalidate(relid);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relddl_catalog::{MemoryCatalog, NamespaceId, RelKind, Relation, RoleId};

    #[test]
    fn sets_full_replica_identity() {
        let mut cat = MemoryCatalog::new();
        let relid = cat.allocate_oid();
        cat.insert_relation(Relation::new(relid, "t", RelKind::Table, RoleId(1), NamespaceId(1))).unwrap();
        execute(&mut cat, relid, ReplicaIdentity::Full).unwrap();
        assert_eq!(cat.get_relation(relid).unwrap().replica_identity, ReplicaIdentity::Full);
    }
}
