//! One executor per `AlterCmd` variant (`spec.md` §4.2 "Catalog Rewrite
//! phase"). `execute` is the single entry point the controller (C3) calls
//! once per sub-command, in pass order; everything it needs to know about
//! *which* function handles a variant lives here, not in the controller.

pub mod add_column;
pub mod alter_type;
pub mod constraints;
pub mod drop_column;
pub mod partition_attach;
pub mod partition_detach;
pub mod replica_identity;
pub mod tablespace;

use relddl_catalog::{Catalog, RelId};
use relddl_transform::AlterCmd;

use crate::error::{CoreError, Result};
use crate::inheritance;

/// Whether a sub-command applies to the relation a statement actually named,
/// or was fanned out onto a descendant because the statement lacked `ONLY`
/// (I6). `ADD COLUMN`/`DROP COLUMN` update the inheritance-count bookkeeping
/// (I4) differently depending on which one this is (§4.4.a, §4.4.b); every
/// other sub-command ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Direct,
    Inherited,
}

pub fn execute(catalog: &mut dyn Catalog, relid: RelId, cmd: &AlterCmd, origin: Origin) -> Result<()> {
    match cmd {
        AlterCmd::AddColumn { column, if_not_exists } => add_column::execute(catalog, relid, column, *if_not_exists, origin),
        AlterCmd::DropColumn { attnum, cascade } => drop_column::execute(catalog, relid, *attnum, *cascade, origin),
        AlterCmd::AlterColumnType { attnum, new_type, new_typmod, using_expr } => {
            alter_type::execute(catalog, relid, *attnum, *new_type, *new_typmod, using_expr.clone())
        }
        AlterCmd::SetNotNull { attnum } => set_not_null(catalog, relid, *attnum, true),
        AlterCmd::DropNotNull { attnum } => set_not_null(catalog, relid, *attnum, false),
        AlterCmd::SetDefault { attnum, expr } => set_default(catalog, relid, *attnum, Some(expr.clone())),
        AlterCmd::DropDefault { attnum } => set_default(catalog, relid, *attnum, None),
        AlterCmd::AddConstraint { constraint } => constraints::add(catalog, relid, constraint),
        AlterCmd::DropConstraint { constraint_name, cascade } => constraints::drop(catalog, relid, constraint_name, *cascade),
        AlterCmd::AttachPartition { child, bound } => partition_attach::execute(catalog, relid, *child, bound.clone()),
        AlterCmd::DetachPartition { child } => partition_detach::execute(catalog, relid, *child),
        AlterCmd::SetTablespace { tablespace } => tablespace::execute(catalog, relid, *tablespace),
        AlterCmd::SetLogged { logged } => set_logged(catalog, relid, *logged),
        AlterCmd::SetReplicaIdentity { identity } => replica_identity::execute(catalog, relid, identity.clone()),
        AlterCmd::Inherit { parent } => inheritance::inherit(catalog, relid, *parent),
        AlterCmd::NoInherit { parent } => inheritance::no_inherit(catalog, relid, *parent),
        AlterCmd::OwnerTo { owner } => set_owner(catalog, relid, *owner),
    }
}

fn set_not_null(catalog: &mut dyn Catalog, relid: RelId, attnum: relddl_catalog::AttNum, not_null: bool) -> Result<()> {
    let attr = catalog
        .get_attribute_mut(relid, attnum)
        .ok_or_else(|| CoreError::Other(anyhow::anyhow!("column {attnum} does not exist")))?;
    attr.not_null = not_null;
    catalog.command_counter_increment();
    catalog.invalidate(relid);
    Ok(())
}

fn set_default(catalog: &mut dyn Catalog, relid: RelId, attnum: relddl_catalog::AttNum, expr: Option<String>) -> Result<()> {
    let attr = catalog
        .get_attribute_mut(relid, attnum)
        .ok_or_else(|| CoreError::Other(anyhow::anyhow!("column {attnum} does not exist")))?;
    attr.has_default = expr.is_some();
    attr.default_expr = expr;
    catalog.command_counter_increment();
    catalog.invalidate(relid);
    Ok(())
}

fn set_logged(catalog: &mut dyn Catalog, relid: RelId, logged: bool) -> Result<()> {
    let rel = catalog.get_relation_mut(relid).ok_or_else(|| CoreError::Other(anyhow::anyhow!("relation {relid} does not exist")))?;
    rel.persistence = if logged { relddl_catalog::Persistence::Permanent } else { relddl_catalog::Persistence::Unlogged };
    catalog.command_counter_increment();
    catalog.invalidate(relid);
    Ok(())
}

fn set_owner(catalog: &mut dyn Catalog, relid: RelId, owner: relddl_catalog::RoleId) -> Result<()> {
    let rel = catalog.get_relation_mut(relid).ok_or_else(|| CoreError::Other(anyhow::anyhow!("relation {relid} does not exist")))?;
    rel.owner = owner;
    catalog.command_counter_increment();
    catalog.invalidate(relid);
    Ok(())
}
