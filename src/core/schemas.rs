//! Centralized schema definitions for the two datastore databases.
//!
//! Each datastore ("provisioner", "custodian") is one SQLite file holding the
//! datastore-wide collections below plus one `<prefix>_hosts` and one
//! `<prefix>_groups` table per registered environment. Set- and list-valued
//! fields are stored as JSON text columns.

pub const STORE_EVENTS_NAME: &str = "store.events.jsonl";

pub const CATALOG_SCHEMA_ENVIRONMENTS: &str = "
    CREATE TABLE IF NOT EXISTS environments (
        name TEXT PRIMARY KEY,
        prefix TEXT NOT NULL,
        groups TEXT NOT NULL -- JSON array of group names
    )
";

pub const CATALOG_SCHEMA_PULP_CLIENTS: &str = "
    CREATE TABLE IF NOT EXISTS pulp_clients (
        fqdn TEXT PRIMARY KEY,
        rpm_repos TEXT NOT NULL, -- JSON object: repository channel -> version
        os_type TEXT NOT NULL,
        os_version TEXT NOT NULL,
        machine_arch TEXT NOT NULL
    )
";

pub const CATALOG_SCHEMA_INVENTORY_FILES: &str = "
    CREATE TABLE IF NOT EXISTS inventory_files (
        environment TEXT PRIMARY KEY,
        path TEXT NOT NULL
    )
";

/// Per-environment hosts collection. No foreign keys: the membership edge to
/// groups is maintained by the operations layer.
pub fn hosts_table_schema(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            fqdn TEXT PRIMARY KEY,
            groups TEXT NOT NULL, -- JSON array of group names
            environment TEXT NOT NULL
        )"
    )
}

/// Per-environment groups collection. `members` is an ordered JSON array.
pub fn groups_table_schema(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            name TEXT PRIMARY KEY,
            description TEXT NOT NULL,
            environment TEXT NOT NULL,
            members TEXT NOT NULL
        )"
    )
}
