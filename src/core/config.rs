//! Runtime configuration: datastore location and inventory file roots.
//!
//! Configuration is optional: every field has the reference default, so a
//! bare invocation works against `/var/lib/quartermaster` and the standard
//! inventory roots. A TOML file passed via `--config` overrides any subset.

use crate::core::error::QmError;
use crate::core::store::Datastore;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the two datastore database files and the audit log.
    pub data_dir: PathBuf,
    /// Root directory for provisioner inventory files.
    pub provisioner_inventory_root: PathBuf,
    /// Root directory for custodian inventory files.
    pub custodian_inventory_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/quartermaster"),
            provisioner_inventory_root: PathBuf::from("/apps/ansible-provisioner-inventories"),
            custodian_inventory_root: PathBuf::from("/apps/ansible-inventories"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or fall back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, QmError> {
        match path {
            Some(p) => {
                let raw = fs::read_to_string(p)?;
                toml::from_str(&raw)
                    .map_err(|e| QmError::Config(format!("{}: {}", p.display(), e)))
            }
            None => Ok(Self::default()),
        }
    }

    /// Inventory root directory for one datastore.
    pub fn inventory_root(&self, datastore: Datastore) -> &Path {
        match datastore {
            Datastore::Provisioner => &self.provisioner_inventory_root,
            Datastore::Custodian => &self.custodian_inventory_root,
        }
    }
}
