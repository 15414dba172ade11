//! Inventory entity records shared by every operation.

use crate::core::error::QmError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Named deployment scope. All per-environment collections are namespaced by
/// `prefix`, the lowercase/underscored form of the name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
    pub prefix: String,
    pub groups: BTreeSet<String>,
}

impl Environment {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: env_prefix(name),
            groups: BTreeSet::new(),
        }
    }

    /// Name of the default group every host of this environment belongs to.
    pub fn all_group(&self) -> String {
        format!("{}_all", self.prefix)
    }
}

/// Named set of hosts with a description. `members` is the group-side half of
/// the bidirectional membership edge; order is meaningful and preserved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub description: String,
    pub environment: String,
    pub members: Vec<String>,
}

/// A managed host. `groups` is the host-side half of the membership edge.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub fqdn: String,
    pub groups: BTreeSet<String>,
    pub environment: String,
}

/// Repository-subscription record paired one-to-one with a host. Lives in the
/// same datastore as its host, keyed by the same fqdn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PulpClient {
    pub fqdn: String,
    pub rpm_repos: BTreeMap<String, String>,
    pub os_type: String,
    pub os_version: String,
    pub machine_arch: String,
}

/// Manifest record for a derived inventory file: created once per
/// (datastore, environment), never moved afterward.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InventoryRecord {
    pub path: PathBuf,
    pub environment: String,
}

/// Derive the collection prefix from an environment name.
pub fn env_prefix(name: &str) -> String {
    name.to_lowercase().replace('-', "_")
}

/// Reject prefixes that cannot be safely spliced into a table name.
pub fn validate_prefix(prefix: &str) -> Result<(), QmError> {
    let well_formed = !prefix.is_empty()
        && prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(QmError::Validation(format!(
            "environment prefix {prefix:?} must be non-empty lowercase alphanumeric/underscore"
        )))
    }
}

pub fn hosts_table(prefix: &str) -> String {
    format!("{prefix}_hosts")
}

pub fn groups_table(prefix: &str) -> String {
    format!("{prefix}_groups")
}
