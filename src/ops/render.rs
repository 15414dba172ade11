//! Derived inventory file rendering.
//!
//! The inventory file is a flat-text projection of an environment's group
//! state, consumed by an external provisioning tool. Regeneration always
//! snapshots the previous file into `backups/` first; backups are named by
//! unix-epoch seconds and never deleted automatically.
//!
//! Output order is a direct function of the underlying store's natural
//! iteration order: groups are never sorted and members keep their stored
//! order.

use crate::core::config::Config;
use crate::core::entities::{self, InventoryRecord};
use crate::core::error::QmError;
use crate::core::store::StoreSession;
use crate::core::time;
use crate::ops::catalog;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

pub const INVENTORY_HEADER: &str = "# -- !!! WARNING !!! -- This File is managed by provisioner, any changes will be over-written\n# on the next provisioner run.\n#\n#\n";

/// Create the inventory file for an environment: directory layout, manifest
/// record, and the header-only initial file. One inventory file exists per
/// (datastore, environment); registering a second is a duplicate error.
pub fn create_inventory(
    session: &StoreSession,
    cfg: &Config,
    env_name: &str,
) -> Result<PathBuf, QmError> {
    let prefix = entities::env_prefix(env_name);
    entities::validate_prefix(&prefix)?;

    let env_dir = cfg.inventory_root(session.datastore()).join(&prefix);
    fs::create_dir_all(env_dir.join("backups"))?;

    let path = env_dir.join(format!("{prefix}.inventory"));
    let record = InventoryRecord {
        path: path.clone(),
        environment: env_name.to_string(),
    };
    catalog::insert_inventory_record(session, &record)?;

    let mut f = File::create(&path)?;
    f.write_all(INVENTORY_HEADER.as_bytes())?;
    f.sync_all()?;
    Ok(path)
}

/// Regenerate the inventory file from current group state.
///
/// The previous file is renamed into `backups/<envDir>.inventory.<epoch>`
/// before the new one is written; a missing live file is fatal, there is no
/// tolerance for rendering over a hole.
pub fn regenerate(session: &StoreSession, env_name: &str) -> Result<PathBuf, QmError> {
    let record = catalog::require_inventory_record(session, env_name)?;
    let prefix = entities::env_prefix(env_name);

    let env_dir = record.path.parent().ok_or_else(|| {
        QmError::Validation(format!(
            "inventory path {} has no parent directory",
            record.path.display()
        ))
    })?;
    let backup_path = env_dir
        .join("backups")
        .join(format!("{prefix}.inventory.{}", time::now_epoch_secs()));
    fs::rename(&record.path, &backup_path)?;

    let mut f = File::create(&record.path)?;
    f.write_all(INVENTORY_HEADER.as_bytes())?;
    for group in catalog::list_groups(session, env_name)? {
        writeln!(f, "# {}", group.description)?;
        writeln!(f, "[{}]", group.name)?;
        for member in &group.members {
            writeln!(f, "{member}")?;
        }
        f.write_all(b"\n\n\n")?;
    }
    f.sync_all()?;
    Ok(record.path)
}
