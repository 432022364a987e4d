//! `ALTER TABLE ... SET TABLESPACE` (`spec.md` §4.4). No real heap to move
//! in this model; updating the catalog row is the whole operation.

use relddl_catalog::{Catalog, RelId, TablespaceId};

use crate::error::{CoreError, Result};

pub fn execute(catalog: &mut dyn Catalog, relid: RelId, tablespace: TablespaceId) -> Result<()> {
    let rel = catalog.get_relation_mut(relid).ok_or_else(|| CoreError::Other(anyhow::anyhow!("relation {relid} does not exist")))?;
    rel.tablespace = Some(tablespace);
    catalog.invalidate(relid);
    Ok(())
}
