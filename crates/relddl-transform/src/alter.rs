//! `transform_alter`: lowers one raw `ALTER TABLE` statement into a single
//! [`ResolvedStmt::AlterTable`] naming the target relation and its resolved
//! sub-commands (`spec.md` §4.1, §4.2 step 1).
//!
//! Propagating a sub-command onto a table's partitions/inheritance children
//! (I6) is `relddl-core`'s job (`inheritance.rs`, C6): it has the catalog
//! access needed to walk the whole hierarchy and the lock-ordering context
//! to do it safely. This function only resolves the one statement's own
//! target.

use relddl_catalog::{AttNum, Catalog, IndexId, RelId, RoleId};

use crate::builtin_types::resolve_type_name;
use crate::error::{Result, TransformError};
use crate::partition_bound::transform_partition_bound;
use crate::raw::{RawAlterSubCmd, RawAlterTableStmt, RawTableConstraint};
use crate::resolved::{AlterCmd, ResolvedStmt};

pub fn transform_alter(
    stmt: &RawAlterTableStmt,
    catalog: &dyn Catalog,
    resolve_role: &dyn Fn(&str) -> Option<RoleId>,
) -> Result<Vec<ResolvedStmt>> {
    let relid = resolve_table(catalog, &stmt.target)?;
    log::trace!("transform_alter: target={} relid={relid} subcmds={}", stmt.target, stmt.subcmds.len());

    let mut cmds = Vec::with_capacity(stmt.subcmds.len());
    for sub in &stmt.subcmds {
        cmds.extend(lower_subcmd(relid, sub, catalog, resolve_role)?);
    }

    Ok(vec![ResolvedStmt::AlterTable { relation: relid, cmds }])
}

fn lower_subcmd(
    relid: RelId,
    sub: &RawAlterSubCmd,
    catalog: &dyn Catalog,
    resolve_role: &dyn Fn(&str) -> Option<RoleId>,
) -> Result<Vec<AlterCmd>> {
    use RawAlterSubCmd as R;

    let cmds = match sub {
        R::AddColumn { col, if_not_exists } => {
            if *if_not_exists && find_attnum(catalog, relid, &col.name).is_some() {
                return Ok(Vec::new());
            }
            let table_name = relation_name(catalog, relid)?;
            let (plan, inline_constraints) = crate::create::lower_column(&table_name, col, catalog)?;
            let mut out = vec![AlterCmd::AddColumn { column: plan, if_not_exists: *if_not_exists }];
            out.extend(inline_constraints.into_iter().map(|constraint| AlterCmd::AddConstraint { constraint }));
            out
        }
        R::DropColumn { name, if_exists, behavior } => {
            let attnum = match find_attnum(catalog, relid, name) {
                Some(a) => a,
                None if *if_exists => return Ok(Vec::new()),
                None => return Err(TransformError::UndefinedColumn(name.clone())),
            };
            vec![AlterCmd::DropColumn { attnum, cascade: is_cascade(behavior) }]
        }
        R::AlterColumnType { name, type_name, using } => {
            let attnum = require_attnum(catalog, relid, name)?;
            let new_type = resolve_type_name(type_name)?;
            vec![AlterCmd::AlterColumnType {
                attnum,
                new_type,
                new_typmod: type_name.typmod,
                using_expr: using.clone(),
            }]
        }
        R::SetNotNull { name } => vec![AlterCmd::SetNotNull { attnum: require_attnum(catalog, relid, name)? }],
        R::DropNotNull { name } => vec![AlterCmd::DropNotNull { attnum: require_attnum(catalog, relid, name)? }],
        R::SetDefault { name, expr } => {
            vec![AlterCmd::SetDefault { attnum: require_attnum(catalog, relid, name)?, expr: expr.clone() }]
        }
        R::DropDefault { name } => vec![AlterCmd::DropDefault { attnum: require_attnum(catalog, relid, name)? }],
        R::AddConstraint(tc) => vec![AlterCmd::AddConstraint { constraint: lower_alter_constraint(relid, tc, catalog)? }],
        R::DropConstraint { name, if_exists, behavior } => {
            if catalog.find_constraint_by_name(relid, name).is_none() {
                if *if_exists {
                    return Ok(Vec::new());
                }
                return Err(TransformError::InvalidTableDefinition(format!(
                    "constraint \"{name}\" does not exist"
                )));
            }
            vec![AlterCmd::DropConstraint { constraint_name: name.clone(), cascade: is_cascade(behavior) }]
        }
        R::AttachPartition { child, bound } => {
            let child_id = resolve_table(catalog, child)?;
            let parent_key = catalog
                .get_relation(relid)
                .and_then(|r| r.partition_key.clone())
                .ok_or_else(|| TransformError::InvalidTableDefinition("target is not a partitioned table".into()))?;
            let resolved_bound = transform_partition_bound(&parent_key, bound)?;
            vec![AlterCmd::AttachPartition { child: child_id, bound: resolved_bound }]
        }
        R::DetachPartition { child } => vec![AlterCmd::DetachPartition { child: resolve_table(catalog, child)? }],
        R::SetTablespace { tablespace } => vec![AlterCmd::SetTablespace { tablespace: *tablespace }],
        R::SetLogged { logged } => vec![AlterCmd::SetLogged { logged: *logged }],
        R::ReplicaIdentityDefault => {
            vec![AlterCmd::SetReplicaIdentity { identity: relddl_catalog::ReplicaIdentity::Default }]
        }
        R::ReplicaIdentityFull => vec![AlterCmd::SetReplicaIdentity { identity: relddl_catalog::ReplicaIdentity::Full }],
        R::ReplicaIdentityNothing => {
            vec![AlterCmd::SetReplicaIdentity { identity: relddl_catalog::ReplicaIdentity::Nothing }]
        }
        R::ReplicaIdentityUsingIndex { index_name } => {
            let ix = catalog
                .indexes_on(relid)
                .into_iter()
                .find(|ix| &ix.name == index_name)
                .ok_or_else(|| TransformError::InvalidTableDefinition(format!("index \"{index_name}\" does not exist")))?;
            if !ix.eligible_for_replica_identity() {
                return Err(TransformError::InvalidTableDefinition(format!(
                    "index \"{index_name}\" cannot be used as replica identity"
                )));
            }
            vec![AlterCmd::SetReplicaIdentity {
                identity: relddl_catalog::ReplicaIdentity::UsingIndex(index_relid(ix.id)),
            }]
        }
        R::Inherit { parent } => vec![AlterCmd::Inherit { parent: resolve_table(catalog, parent)? }],
        R::NoInherit { parent } => vec![AlterCmd::NoInherit { parent: resolve_table(catalog, parent)? }],
        R::OwnerTo { role_name } => {
            let owner = resolve_role(role_name)
                .ok_or_else(|| TransformError::InvalidTableDefinition(format!("role \"{role_name}\" does not exist")))?;
            vec![AlterCmd::OwnerTo { owner }]
        }
    };

    Ok(cmds)
}

fn relation_name(catalog: &dyn Catalog, relid: RelId) -> Result<String> {
    catalog.get_relation(relid).map(|r| r.name.clone()).ok_or(TransformError::UndefinedTable(relid.to_string()))
}

fn lower_alter_constraint(relid: RelId, tc: &RawTableConstraint, catalog: &dyn Catalog) -> Result<crate::resolved::ConstraintPlan> {
    // Reuses the same lowering `transform_create` does for a table-level
    // constraint element; the target table is already known here, so only
    // the name is threaded through.
    let table_name = relation_name(catalog, relid)?;
    crate::create::lower_table_constraint(&table_name, tc, catalog)
}

/// Both `IndexId` and `RelId` are allocated from the same logical oid space
/// in the original catalog this engine mirrors (an index is itself a
/// relation); this crate's `Index` type tracks its own counter for
/// simplicity, so the two numberspaces are reunited here by numeric value.
fn index_relid(id: IndexId) -> RelId {
    RelId(id.0)
}

fn is_cascade(behavior: &crate::raw::DropBehavior) -> bool {
    matches!(behavior, crate::raw::DropBehavior::Cascade)
}

fn find_attnum(catalog: &dyn Catalog, relid: RelId, name: &str) -> Option<AttNum> {
    catalog.attributes(relid).into_iter().find(|a| !a.dropped && a.name == name).map(|a| a.attnum)
}

fn require_attnum(catalog: &dyn Catalog, relid: RelId, name: &str) -> Result<AttNum> {
    find_attnum(catalog, relid, name).ok_or_else(|| TransformError::UndefinedColumn(name.to_string()))
}

fn resolve_table(catalog: &dyn Catalog, name: &str) -> Result<RelId> {
    catalog
        .all_relation_ids()
        .into_iter()
        .find(|&id| catalog.get_relation(id).map(|r| r.name == name).unwrap_or(false))
        .ok_or_else(|| TransformError::UndefinedTable(name.to_string()))
}
