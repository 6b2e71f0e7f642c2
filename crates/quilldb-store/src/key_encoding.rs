//! Key encoding utilities.
//!
//! Encodes and decodes storage keys for records and schema entities,
//! keeping key formats consistent across the codebase. Schema keys carry a
//! `!` prefix so they sort apart from record data.

use crate::engine::Partition;
use crate::{Result, StoreError};

/// Encode the partition for a `(namespace, database)` tenant pair.
///
/// # Examples
///
/// ```
/// use quilldb_store::key_encoding::tenant_partition;
///
/// let p = tenant_partition("acme", "crm");
/// assert_eq!(p.name(), "acme:crm");
/// ```
pub fn tenant_partition(ns: &str, db: &str) -> Partition {
    let mut s = String::with_capacity(ns.len() + 1 + db.len());
    s.push_str(ns);
    s.push(':');
    s.push_str(db);
    Partition::new(s)
}

/// Encode a record key: `{table}:{id}`
///
/// # Examples
///
/// ```
/// use quilldb_store::key_encoding::record_key;
///
/// assert_eq!(record_key("person", "tobie"), "person:tobie");
/// ```
pub fn record_key(table: &str, id: &str) -> String {
    let mut s = String::with_capacity(table.len() + 1 + id.len());
    s.push_str(table);
    s.push(':');
    s.push_str(id);
    s
}

/// Parse a record key into `(table, id)`.
///
/// # Examples
///
/// ```
/// use quilldb_store::key_encoding::parse_record_key;
///
/// let (table, id) = parse_record_key("person:tobie").unwrap();
/// assert_eq!(table, "person");
/// assert_eq!(id, "tobie");
/// ```
pub fn parse_record_key(key: &str) -> Result<(String, String)> {
    match key.split_once(':') {
        Some((table, id)) if !table.is_empty() && !id.is_empty() => {
            Ok((table.to_string(), id.to_string()))
        }
        _ => Err(StoreError::Other(format!("Invalid record key format: {}", key))),
    }
}

/// Encode the scan prefix covering every record of a table: `{table}:`
pub fn table_prefix(table: &str) -> String {
    let mut s = String::with_capacity(table.len() + 1);
    s.push_str(table);
    s.push(':');
    s
}

/// Encode the key holding a table definition: `!tb:{table}`
pub fn table_definition_key(table: &str) -> String {
    format!("!tb:{}", table)
}

/// The scan prefix covering every table definition.
pub fn table_definition_prefix() -> &'static str {
    "!tb:"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_round_trip() {
        let key = record_key("person", "id:with:colons");
        let (table, id) = parse_record_key(&key).unwrap();
        assert_eq!(table, "person");
        assert_eq!(id, "id:with:colons");
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert!(parse_record_key("noseparator").is_err());
        assert!(parse_record_key(":empty_table").is_err());
        assert!(parse_record_key("empty_id:").is_err());
    }

    #[test]
    fn definition_keys_sort_apart_from_records() {
        // '!' < any identifier start, so schema entries never interleave
        // with record scans over a table prefix.
        assert!(table_definition_key("person") < record_key("person", "a"));
    }
}
