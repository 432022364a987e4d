//! A minimal built-in type name table. This crate has no independent type
//! catalog (`spec.md` §9 treats the type system as out of scope); this is
//! just enough to resolve the handful of type names a `CREATE TABLE`
//! statement is likely to name, the way a real implementation would consult
//! `pg_type` by name.

use relddl_catalog::TypeId;

use crate::error::{Result, TransformError};
use crate::raw::RawTypeName;

pub fn resolve_type_name(type_name: &RawTypeName) -> Result<TypeId> {
    let oid = match type_name.name.to_ascii_lowercase().as_str() {
        "bool" | "boolean" => 16,
        "bytea" => 17,
        "int2" | "smallint" | "smallserial" => 21,
        "int4" | "integer" | "int" | "serial" => 23,
        "int8" | "bigint" | "bigserial" => 20,
        "text" => 25,
        "json" => 114,
        "float4" | "real" => 700,
        "float8" | "double precision" => 701,
        "varchar" | "character varying" => 1043,
        "bpchar" | "character" | "char" => 1042,
        "date" => 1082,
        "timestamp" => 1114,
        "timestamptz" | "timestamp with time zone" => 1184,
        "numeric" | "decimal" => 1700,
        "uuid" => 2950,
        "jsonb" => 3802,
        other => {
            return Err(TransformError::InvalidTableDefinition(format!("unknown type name \"{other}\"")));
        }
    };
    Ok(TypeId(oid))
}

/// `SERIAL`/`BIGSERIAL`/`SMALLSERIAL` are column-constraint sugar for an
/// integer column plus an owned sequence default, not really a type.
pub fn is_serial_type_name(name: &str) -> bool {
    matches!(name.to_ascii_lowercase().as_str(), "serial" | "bigserial" | "smallserial")
}
