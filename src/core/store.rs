//! Datastore identity and session handles for the dual-store architecture.
//!
//! Two datastores are maintained side by side:
//! - `Provisioner`: hosts currently under active provisioning control
//! - `Custodian`: hosts handed off to steady-state custody
//!
//! Both hold the same collection shapes; hosts migrate between them one at a
//! time, without a cross-store transaction.

use crate::core::config::Config;
use crate::core::db;
use crate::core::error::QmError;
use crate::core::schemas;
use rusqlite::Connection;
use std::fmt;
use std::fs;

/// Datastore discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datastore {
    Provisioner,
    Custodian,
}

impl Datastore {
    pub fn name(self) -> &'static str {
        match self {
            Datastore::Provisioner => "provisioner",
            Datastore::Custodian => "custodian",
        }
    }

    pub fn db_file(self) -> &'static str {
        match self {
            Datastore::Provisioner => "provisioner.db",
            Datastore::Custodian => "custodian.db",
        }
    }

    /// The opposite datastore, i.e. the migration destination for this source.
    pub fn peer(self) -> Datastore {
        match self {
            Datastore::Provisioner => Datastore::Custodian,
            Datastore::Custodian => Datastore::Provisioner,
        }
    }
}

impl fmt::Display for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An open handle on one datastore, owned by the caller for the duration of
/// one top-level operation.
///
/// Every mutation on the connection auto-commits individually; nothing here
/// wraps a multi-step operation in a transaction, so the intermediate states
/// of a migration are observable if the process is interrupted.
pub struct StoreSession {
    datastore: Datastore,
    conn: Connection,
}

impl StoreSession {
    pub fn open(cfg: &Config, datastore: Datastore) -> Result<Self, QmError> {
        fs::create_dir_all(&cfg.data_dir)?;
        let conn = db::db_connect(&cfg.data_dir.join(datastore.db_file()))?;
        conn.execute(schemas::CATALOG_SCHEMA_ENVIRONMENTS, [])?;
        conn.execute(schemas::CATALOG_SCHEMA_PULP_CLIENTS, [])?;
        conn.execute(schemas::CATALOG_SCHEMA_INVENTORY_FILES, [])?;
        Ok(Self { datastore, conn })
    }

    pub fn datastore(&self) -> Datastore {
        self.datastore
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
