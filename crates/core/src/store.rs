//! Authoritative inventory data.

use crate::differ::Triple;
use crate::error::ReconResult;
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;

const BLOCKOUT_TRIPLES_SQL: &str = r"
    SELECT DescnPart1, DescnPart3, Code
    FROM inventory_items
    WHERE inventory_group_code = ?1
      AND lower(DescnPart2) = 'blockout'
      AND CAST(Active AS INTEGER) = 1
";

/// Source of truth for group options.
pub trait InventoryStore {
    /// Active blockout `(fabric, colour, code)` triples of one inventory group.
    fn blockout_triples(&self, group_code: &str) -> ReconResult<Vec<Triple>>;
}

/// [`InventoryStore`] over the `inventory_items` table of a SQLite database.
///
/// Schema management belongs to whoever fills the database; this only reads.
pub struct SqliteInventory {
    conn: Connection,
}

impl SqliteInventory {
    /// Open an existing database read-only.
    pub fn open_path(path: impl AsRef<Path>) -> ReconResult<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(Self { conn })
    }

    /// Wrap an already open connection.
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl InventoryStore for SqliteInventory {
    fn blockout_triples(&self, group_code: &str) -> ReconResult<Vec<Triple>> {
        let mut stmt = self.conn.prepare(BLOCKOUT_TRIPLES_SQL)?;
        let rows = stmt.query_map(params![group_code], |r| {
            let fabric: Option<String> = r.get(0)?;
            let colour: Option<String> = r.get(1)?;
            let code: Option<String> = r.get(2)?;
            Ok(Triple::new(
                fabric.as_deref().unwrap_or_default(),
                colour.as_deref().unwrap_or_default(),
                code.as_deref().unwrap_or_default(),
            ))
        })?;
        let mut triples = Vec::new();
        for triple in rows {
            triples.push(triple?);
        }
        tracing::debug!(group = group_code, count = triples.len(), "fetched blockout triples");
        Ok(triples)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory database with a small ROLL group.
    pub(crate) fn seeded() -> SqliteInventory {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r"
            CREATE TABLE inventory_items (
                inventory_group_code TEXT,
                Code TEXT,
                DescnPart1 TEXT,
                DescnPart2 TEXT,
                DescnPart3 TEXT,
                Active TEXT
            );
            INSERT INTO inventory_items VALUES
                ('ROLL', 'RB001 ', 'Sanctuary' || char(160) || 'Blockout', 'Blockout', 'White', '1'),
                ('ROLL', 'RB002', 'Sanctuary Blockout', 'BLOCKOUT', 'Black', 1),
                ('ROLL', 'RB003', 'Vibe', 'blockout', 'Sand', '1'),
                ('ROLL', 'RS001', 'Vibe', 'Screen', 'Sand', '1'),
                ('ROLL', 'RB004', 'Retired', 'Blockout', 'Grey', '0'),
                ('WSROLL', 'WB001', 'Vibe', 'Blockout', 'Sand', '1');
            ",
        )
        .unwrap();
        SqliteInventory::from_connection(conn)
    }

    #[test]
    fn test_blockout_filter() {
        let store = seeded();
        let triples = store.blockout_triples("ROLL").unwrap();
        let codes: Vec<&str> = triples.iter().map(|t| t.code.as_str()).collect();
        assert_eq!(triples.len(), 3);
        assert!(codes.contains(&"RB001"));
        assert!(!codes.contains(&"RS001"));
        assert!(!codes.contains(&"RB004"));
    }

    #[test]
    fn test_values_normalized() {
        let store = seeded();
        let triples = store.blockout_triples("ROLL").unwrap();
        let white = triples.iter().find(|t| t.code == "RB001").unwrap();
        assert_eq!(white.name, "Sanctuary Blockout");
    }

    #[test]
    fn test_unknown_group_is_empty() {
        assert!(seeded().blockout_triples("NOPE").unwrap().is_empty());
    }
}
