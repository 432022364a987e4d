//! `ALTER TABLE ... ADD COLUMN` (`spec.md` §4.4.a).

use relddl_catalog::{AttNum, Attribute, Catalog, RelId};
use relddl_transform::ColumnPlan;

use crate::error::{CoreError, Result};
use crate::subcommands::Origin;

pub fn execute(catalog: &mut dyn Catalog, relid: RelId, column: &ColumnPlan, if_not_exists: bool, origin: Origin) -> Result<()> {
    if catalog.attributes(relid).into_iter().any(|a| !a.dropped && a.name == column.name) {
        if if_not_exists {
            return Ok(());
        }
        return Err(CoreError::Other(anyhow::anyhow!("column \"{}\" already exists", column.name)));
    }

    let next_attnum = catalog.attributes(relid).into_iter().map(|a| a.attnum.0).max().unwrap_or(0) + 1;
    let mut attr = Attribute::new(AttNum(next_attnum), &column.name, column.type_id);
    attr.typmod = column.typmod;
    attr.collation = column.collation;
    attr.storage = column.storage;
    attr.not_null = column.not_null;
    attr.identity = column.identity;

    // I4: a column fanned out onto a descendant (§4.4.a "recurse to children
    // with inhcount=1, islocal=false") is inherited metadata, not a local
    // declaration, even though it's physically added the same way.
    if origin == Origin::Inherited {
        attr.inhcount = 1;
        attr.is_local = false;
    }

    if let Some(expr) = &column.default_expr {
        attr.has_default = true;
        attr.default_expr = Some(expr.clone());
        // Fast-default path (§4.4.a): no existing rows to rewrite in this
        // in-memory model, but the missing-value slot is still populated
        // the way a real heap rewrite-avoidance would.
        attr.missing_value = Some(expr.clone());
    }

    catalog.insert_attribute(relid, attr)?;
    if let Some(rel) = catalog.get_relation_mut(relid) {
        rel.relnatts = catalog.attributes(relid).len() as i16;
    }
    catalog.command_counter_increment();
    catalog.invalidate(relid);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relddl_catalog::{MemoryCatalog, NamespaceId, RelKind, Relation, RoleId, TypeId};

    fn make_table(cat: &mut MemoryCatalog) -> RelId {
        let id = cat.allocate_oid();
        cat.insert_relation(Relation::new(id, "t", RelKind::Table, RoleId(1), NamespaceId(1))).unwrap();
        id
    }

    fn plan(name: &str) -> ColumnPlan {
        ColumnPlan {
            name: name.into(),
            type_id: TypeId(25),
            typmod: -1,
            collation: None,
            storage: relddl_catalog::StorageMode::Plain,
            not_null: false,
            default_expr: None,
            identity: relddl_catalog::IdentityMode::None,
        }
    }

    #[test]
    fn adds_column_with_next_attnum() {
        let mut cat = MemoryCatalog::new();
        let relid = make_table(&mut cat);
        cat.insert_attribute(relid, Attribute::new(AttNum(1), "id", TypeId(23))).unwrap();
        execute(&mut cat, relid, &plan("label"), false, Origin::Direct).unwrap();
        let attrs = cat.attributes(relid);
        assert_eq!(attrs[1].attnum, AttNum(2));
    }

    #[test]
    fn duplicate_without_if_not_exists_errors() {
        let mut cat = MemoryCatalog::new();
        let relid = make_table(&mut cat);
        execute(&mut cat, relid, &plan("x"), false, Origin::Direct).unwrap();
        assert!(execute(&mut cat, relid, &plan("x"), false, Origin::Direct).is_err());
        assert!(execute(&mut cat, relid, &plan("x"), true, Origin::Direct).is_ok());
    }

    #[test]
    fn default_value_populates_missing_value_fast_path() {
        let mut cat = MemoryCatalog::new();
        let relid = make_table(&mut cat);
        let mut p = plan("score");
        p.default_expr = Some("0".into());
        execute(&mut cat, relid, &p, false, Origin::Direct).unwrap();
        let attrs = cat.attributes(relid);
        assert_eq!(attrs[0].missing_value, Some("0".into()));
    }

    #[test]
    fn direct_add_is_a_local_column() {
        let mut cat = MemoryCatalog::new();
        let relid = make_table(&mut cat);
        execute(&mut cat, relid, &plan("x"), false, Origin::Direct).unwrap();
        let attr = cat.attributes(relid).into_iter().find(|a| a.name == "x").unwrap();
        assert!(attr.is_local);
        assert_eq!(attr.inhcount, 0);
    }

    #[test]
    fn cascaded_add_is_marked_inherited_not_local() {
        let mut cat = MemoryCatalog::new();
        let relid = make_table(&mut cat);
        execute(&mut cat, relid, &plan("x"), false, Origin::Inherited).unwrap();
        let attr = cat.attributes(relid).into_iter().find(|a| a.name == "x").unwrap();
        assert!(!attr.is_local);
        assert_eq!(attr.inhcount, 1);
    }
}
