//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Money is stored as integers in
//! the currency's minor unit.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Donation campaigns
-- =======================================================================
DEFINE TABLE donation_campaign SCHEMAFULL;
DEFINE FIELD title ON TABLE donation_campaign TYPE string;
DEFINE FIELD description ON TABLE donation_campaign TYPE option<string>;
DEFINE FIELD target_amount ON TABLE donation_campaign TYPE option<int>;
DEFINE FIELD is_completed ON TABLE donation_campaign TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE donation_campaign TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE donation_campaign TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Donations
-- =======================================================================
DEFINE TABLE donation SCHEMAFULL;
DEFINE FIELD user_id ON TABLE donation TYPE option<string>;
DEFINE FIELD is_anonymous ON TABLE donation TYPE bool DEFAULT false;
DEFINE FIELD anonymous_name ON TABLE donation TYPE option<string>;
DEFINE FIELD anonymous_email ON TABLE donation TYPE option<string>;
DEFINE FIELD kind ON TABLE donation TYPE string \
    ASSERT $value IN ['Money', 'Goods'];
DEFINE FIELD amount ON TABLE donation TYPE option<int>;
DEFINE FIELD status ON TABLE donation TYPE string \
    ASSERT $value IN ['Pending', 'Received', 'Failed'];
DEFINE FIELD campaign_id ON TABLE donation TYPE option<string>;
DEFINE FIELD child_id ON TABLE donation TYPE option<string>;
DEFINE FIELD notes ON TABLE donation TYPE option<string>;
DEFINE FIELD created_at ON TABLE donation TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE donation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_donation_campaign ON TABLE donation \
    COLUMNS campaign_id;

-- =======================================================================
-- Donated items (owned by donation)
-- =======================================================================
DEFINE TABLE donated_item SCHEMAFULL;
DEFINE FIELD donation_id ON TABLE donated_item TYPE string;
DEFINE FIELD position ON TABLE donated_item TYPE int;
DEFINE FIELD name ON TABLE donated_item TYPE string;
DEFINE FIELD quantity ON TABLE donated_item TYPE int \
    ASSERT $value > 0;
DEFINE FIELD estimated_value ON TABLE donated_item TYPE option<int>;
DEFINE FIELD in_inventory ON TABLE donated_item TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE donated_item TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE donated_item TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_donated_item_donation ON TABLE donated_item \
    COLUMNS donation_id;

-- =======================================================================
-- Inventory stock (record key = catalogue key of the item name)
-- =======================================================================
DEFINE TABLE inventory_stock SCHEMAFULL;
DEFINE FIELD item_name ON TABLE inventory_stock TYPE string;
DEFINE FIELD quantity ON TABLE inventory_stock TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD created_at ON TABLE inventory_stock TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE inventory_stock TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Inventory adjustments (append-only)
-- =======================================================================
DEFINE TABLE inventory_adjustment SCHEMAFULL;
DEFINE FIELD item_key ON TABLE inventory_adjustment TYPE string;
DEFINE FIELD item_name ON TABLE inventory_adjustment TYPE string;
DEFINE FIELD adjustment_type ON TABLE inventory_adjustment TYPE string \
    ASSERT $value IN ['Increase', 'Decrease', 'NewItem'];
DEFINE FIELD quantity_before ON TABLE inventory_adjustment TYPE int;
DEFINE FIELD quantity_after ON TABLE inventory_adjustment TYPE int;
DEFINE FIELD quantity_change ON TABLE inventory_adjustment TYPE int;
DEFINE FIELD reason ON TABLE inventory_adjustment TYPE string;
DEFINE FIELD source_donation_id ON TABLE inventory_adjustment \
    TYPE option<string>;
DEFINE FIELD donated_item_id ON TABLE inventory_adjustment \
    TYPE option<string>;
DEFINE FIELD actor_id ON TABLE inventory_adjustment TYPE string;
DEFINE FIELD created_at ON TABLE inventory_adjustment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_adjustment_donation ON TABLE inventory_adjustment \
    COLUMNS source_donation_id;
DEFINE INDEX idx_adjustment_item ON TABLE inventory_adjustment \
    COLUMNS item_key;
";

/// Bring the store's schema up to date and return its version.
///
/// Each pending migration runs in one transaction together with the
/// `_migration` row that records it, so a failed migration leaves no
/// partial schema behind and is retried on the next start.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("cannot create _migration table: {e}")))?;

    let mut version = applied_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > version).collect();
    if pending.is_empty() {
        debug!(schema_version = version, "Sponsora schema up to date");
        return Ok(version);
    }

    for migration in pending {
        info!(
            from = version,
            to = migration.version,
            name = migration.name,
            "Migrating Sponsora schema"
        );
        db.query(migration_script(migration.sql))
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "v{} '{}' rolled back: {e}",
                    migration.version, migration.name
                ))
            })?;
        version = migration.version;
    }

    info!(schema_version = version, "Sponsora schema migrated");
    Ok(version)
}

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version, name FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map_or(0, |m| m.version))
}

fn migration_script(sql: &str) -> String {
    format!(
        "BEGIN TRANSACTION;\n{sql}\
         CREATE _migration SET version = $version, name = $name;\n\
         COMMIT TRANSACTION;"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_defines_every_table() {
        for table in [
            "donation_campaign",
            "donation",
            "donated_item",
            "inventory_stock",
            "inventory_adjustment",
        ] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} SCHEMAFULL")),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn migration_is_recorded_inside_its_transaction() {
        let script = migration_script(SCHEMA_V1);
        let record = script.find("CREATE _migration").unwrap();
        assert!(script.starts_with("BEGIN TRANSACTION;"));
        assert!(record > script.find("inventory_adjustment").unwrap());
        assert!(script.ends_with("COMMIT TRANSACTION;"));
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
