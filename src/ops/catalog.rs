//! Typed access to the per-datastore collections.
//!
//! Collections: datastore-wide `environments`, `pulp_clients`, and
//! `inventory_files`, plus per-environment `<prefix>_hosts` and
//! `<prefix>_groups` tables. Per-environment tables are created on first
//! touch, mirroring a document store's implicit collections, so a lookup in a
//! datastore that never saw the environment reads as absent rather than as a
//! missing-table error.
//!
//! Nothing here enforces cross-collection consistency; the membership and
//! migration layers are responsible for keeping the edges aligned.

use crate::core::entities::{
    self, Environment, Group, Host, InventoryRecord, PulpClient,
};
use crate::core::error::QmError;
use crate::core::schemas;
use crate::core::store::StoreSession;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

fn encode<T: Serialize>(what: &str, value: &T) -> Result<String, QmError> {
    serde_json::to_string(value).map_err(|e| QmError::Validation(format!("{what} encode: {e}")))
}

fn decode<T: DeserializeOwned>(what: &str, raw: &str) -> Result<T, QmError> {
    serde_json::from_str(raw).map_err(|e| QmError::Validation(format!("malformed {what} column: {e}")))
}

/// Validate the environment's derived prefix and ensure its host/group
/// tables exist. Returns the (hosts, groups) table names.
fn env_tables(session: &StoreSession, env_name: &str) -> Result<(String, String), QmError> {
    let prefix = entities::env_prefix(env_name);
    entities::validate_prefix(&prefix)?;
    let hosts = entities::hosts_table(&prefix);
    let groups = entities::groups_table(&prefix);
    session
        .conn()
        .execute(&schemas::hosts_table_schema(&hosts), [])?;
    session
        .conn()
        .execute(&schemas::groups_table_schema(&groups), [])?;
    Ok((hosts, groups))
}

// --- environments ---

pub fn environment_exists(session: &StoreSession, name: &str) -> Result<bool, QmError> {
    let found: Option<i64> = session
        .conn()
        .query_row(
            "SELECT 1 FROM environments WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn get_environment(session: &StoreSession, name: &str) -> Result<Option<Environment>, QmError> {
    let row: Option<(String, String, String)> = session
        .conn()
        .query_row(
            "SELECT name, prefix, groups FROM environments WHERE name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    match row {
        Some((name, prefix, groups_raw)) => Ok(Some(Environment {
            name,
            prefix,
            groups: decode("environment groups", &groups_raw)?,
        })),
        None => Ok(None),
    }
}

pub fn require_environment(session: &StoreSession, name: &str) -> Result<Environment, QmError> {
    get_environment(session, name)?.ok_or_else(|| {
        QmError::NotFound(format!(
            "environment {} in datastore {}",
            name,
            session.datastore()
        ))
    })
}

pub fn insert_environment(session: &StoreSession, env: &Environment) -> Result<(), QmError> {
    if environment_exists(session, &env.name)? {
        return Err(QmError::Duplicate(format!(
            "environment {} in datastore {}",
            env.name,
            session.datastore()
        )));
    }
    session.conn().execute(
        "INSERT INTO environments(name, prefix, groups) VALUES(?1, ?2, ?3)",
        params![env.name, env.prefix, encode("environment groups", &env.groups)?],
    )?;
    Ok(())
}

pub fn update_environment_groups(session: &StoreSession, env: &Environment) -> Result<(), QmError> {
    session.conn().execute(
        "UPDATE environments SET groups = ?2 WHERE name = ?1",
        params![env.name, encode("environment groups", &env.groups)?],
    )?;
    Ok(())
}

/// Maintain the environment-side group registry: add `group_name` to the
/// environment's group set if not already present.
pub fn register_environment_group(
    session: &StoreSession,
    env_name: &str,
    group_name: &str,
) -> Result<(), QmError> {
    let mut env = require_environment(session, env_name)?;
    if env.groups.insert(group_name.to_string()) {
        update_environment_groups(session, &env)?;
    }
    Ok(())
}

/// Remove `group_name` from the environment's group set. Returns false when
/// the name was not registered.
pub fn deregister_environment_group(
    session: &StoreSession,
    env_name: &str,
    group_name: &str,
) -> Result<bool, QmError> {
    let mut env = require_environment(session, env_name)?;
    if env.groups.remove(group_name) {
        update_environment_groups(session, &env)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Ensure the per-environment host/group tables exist.
pub fn ensure_environment_tables(session: &StoreSession, env_name: &str) -> Result<(), QmError> {
    env_tables(session, env_name).map(|_| ())
}

// --- hosts ---

pub fn host_exists(session: &StoreSession, env_name: &str, fqdn: &str) -> Result<bool, QmError> {
    let (hosts, _) = env_tables(session, env_name)?;
    let found: Option<i64> = session
        .conn()
        .query_row(
            &format!("SELECT 1 FROM {hosts} WHERE fqdn = ?1"),
            params![fqdn],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn get_host(
    session: &StoreSession,
    env_name: &str,
    fqdn: &str,
) -> Result<Option<Host>, QmError> {
    let (hosts, _) = env_tables(session, env_name)?;
    let row: Option<(String, String, String)> = session
        .conn()
        .query_row(
            &format!("SELECT fqdn, groups, environment FROM {hosts} WHERE fqdn = ?1"),
            params![fqdn],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    match row {
        Some((fqdn, groups_raw, environment)) => Ok(Some(Host {
            fqdn,
            groups: decode("host groups", &groups_raw)?,
            environment,
        })),
        None => Ok(None),
    }
}

pub fn require_host(session: &StoreSession, env_name: &str, fqdn: &str) -> Result<Host, QmError> {
    get_host(session, env_name, fqdn)?.ok_or_else(|| {
        QmError::NotFound(format!(
            "host {} in environment {} in datastore {}",
            fqdn,
            env_name,
            session.datastore()
        ))
    })
}

pub fn insert_host(session: &StoreSession, env_name: &str, host: &Host) -> Result<(), QmError> {
    let (hosts, _) = env_tables(session, env_name)?;
    if host_exists(session, env_name, &host.fqdn)? {
        return Err(QmError::Duplicate(format!(
            "host {} in environment {} in datastore {}",
            host.fqdn,
            env_name,
            session.datastore()
        )));
    }
    session.conn().execute(
        &format!("INSERT INTO {hosts}(fqdn, groups, environment) VALUES(?1, ?2, ?3)"),
        params![host.fqdn, encode("host groups", &host.groups)?, host.environment],
    )?;
    Ok(())
}

pub fn update_host_groups(
    session: &StoreSession,
    env_name: &str,
    host: &Host,
) -> Result<(), QmError> {
    let (hosts, _) = env_tables(session, env_name)?;
    session.conn().execute(
        &format!("UPDATE {hosts} SET groups = ?2 WHERE fqdn = ?1"),
        params![host.fqdn, encode("host groups", &host.groups)?],
    )?;
    Ok(())
}

/// Remove a host record. Returns false when it was already absent.
pub fn remove_host(session: &StoreSession, env_name: &str, fqdn: &str) -> Result<bool, QmError> {
    let (hosts, _) = env_tables(session, env_name)?;
    let affected = session.conn().execute(
        &format!("DELETE FROM {hosts} WHERE fqdn = ?1"),
        params![fqdn],
    )?;
    Ok(affected > 0)
}

/// All hosts of an environment in store-native order.
pub fn list_hosts(session: &StoreSession, env_name: &str) -> Result<Vec<Host>, QmError> {
    let (hosts, _) = env_tables(session, env_name)?;
    let mut stmt = session
        .conn()
        .prepare(&format!("SELECT fqdn, groups, environment FROM {hosts}"))?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let groups_raw: String = row.get(1)?;
        out.push(Host {
            fqdn: row.get(0)?,
            groups: decode("host groups", &groups_raw)?,
            environment: row.get(2)?,
        });
    }
    Ok(out)
}

// --- groups ---

pub fn group_exists(session: &StoreSession, env_name: &str, name: &str) -> Result<bool, QmError> {
    let (_, groups) = env_tables(session, env_name)?;
    let found: Option<i64> = session
        .conn()
        .query_row(
            &format!("SELECT 1 FROM {groups} WHERE name = ?1"),
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn get_group(
    session: &StoreSession,
    env_name: &str,
    name: &str,
) -> Result<Option<Group>, QmError> {
    let (_, groups) = env_tables(session, env_name)?;
    let row: Option<(String, String, String, String)> = session
        .conn()
        .query_row(
            &format!("SELECT name, description, environment, members FROM {groups} WHERE name = ?1"),
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;
    match row {
        Some((name, description, environment, members_raw)) => Ok(Some(Group {
            name,
            description,
            environment,
            members: decode("group members", &members_raw)?,
        })),
        None => Ok(None),
    }
}

pub fn require_group(session: &StoreSession, env_name: &str, name: &str) -> Result<Group, QmError> {
    get_group(session, env_name, name)?.ok_or_else(|| {
        QmError::NotFound(format!(
            "group {} in environment {} in datastore {}",
            name,
            env_name,
            session.datastore()
        ))
    })
}

pub fn insert_group(session: &StoreSession, env_name: &str, group: &Group) -> Result<(), QmError> {
    let (_, groups) = env_tables(session, env_name)?;
    if group_exists(session, env_name, &group.name)? {
        return Err(QmError::Duplicate(format!(
            "group {} in environment {} in datastore {}",
            group.name,
            env_name,
            session.datastore()
        )));
    }
    session.conn().execute(
        &format!("INSERT INTO {groups}(name, description, environment, members) VALUES(?1, ?2, ?3, ?4)"),
        params![
            group.name,
            group.description,
            group.environment,
            encode("group members", &group.members)?
        ],
    )?;
    Ok(())
}

pub fn update_group_members(
    session: &StoreSession,
    env_name: &str,
    group: &Group,
) -> Result<(), QmError> {
    let (_, groups) = env_tables(session, env_name)?;
    session.conn().execute(
        &format!("UPDATE {groups} SET members = ?2 WHERE name = ?1"),
        params![group.name, encode("group members", &group.members)?],
    )?;
    Ok(())
}

/// Remove a group record. Returns false when it was already absent.
pub fn remove_group(session: &StoreSession, env_name: &str, name: &str) -> Result<bool, QmError> {
    let (_, groups) = env_tables(session, env_name)?;
    let affected = session.conn().execute(
        &format!("DELETE FROM {groups} WHERE name = ?1"),
        params![name],
    )?;
    Ok(affected > 0)
}

/// All groups of an environment in store-native order. The renderer depends
/// on this being the raw table order, so no ORDER BY.
pub fn list_groups(session: &StoreSession, env_name: &str) -> Result<Vec<Group>, QmError> {
    let (_, groups) = env_tables(session, env_name)?;
    let mut stmt = session
        .conn()
        .prepare(&format!("SELECT name, description, environment, members FROM {groups}"))?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let members_raw: String = row.get(3)?;
        out.push(Group {
            name: row.get(0)?,
            description: row.get(1)?,
            environment: row.get(2)?,
            members: decode("group members", &members_raw)?,
        });
    }
    Ok(out)
}

// --- pulp clients ---

pub fn get_pulp_client(session: &StoreSession, fqdn: &str) -> Result<Option<PulpClient>, QmError> {
    let row: Option<(String, String, String, String, String)> = session
        .conn()
        .query_row(
            "SELECT fqdn, rpm_repos, os_type, os_version, machine_arch FROM pulp_clients WHERE fqdn = ?1",
            params![fqdn],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )
        .optional()?;
    match row {
        Some((fqdn, repos_raw, os_type, os_version, machine_arch)) => Ok(Some(PulpClient {
            fqdn,
            rpm_repos: decode("pulp client repos", &repos_raw)?,
            os_type,
            os_version,
            machine_arch,
        })),
        None => Ok(None),
    }
}

pub fn insert_pulp_client(session: &StoreSession, client: &PulpClient) -> Result<(), QmError> {
    if get_pulp_client(session, &client.fqdn)?.is_some() {
        return Err(QmError::Duplicate(format!(
            "pulp client {} in datastore {}",
            client.fqdn,
            session.datastore()
        )));
    }
    session.conn().execute(
        "INSERT INTO pulp_clients(fqdn, rpm_repos, os_type, os_version, machine_arch) VALUES(?1, ?2, ?3, ?4, ?5)",
        params![
            client.fqdn,
            encode("pulp client repos", &client.rpm_repos)?,
            client.os_type,
            client.os_version,
            client.machine_arch
        ],
    )?;
    Ok(())
}

/// Remove a pulp client record. Returns false when it was already absent.
pub fn remove_pulp_client(session: &StoreSession, fqdn: &str) -> Result<bool, QmError> {
    let affected = session
        .conn()
        .execute("DELETE FROM pulp_clients WHERE fqdn = ?1", params![fqdn])?;
    Ok(affected > 0)
}

// --- inventory file manifests ---

pub fn get_inventory_record(
    session: &StoreSession,
    env_name: &str,
) -> Result<Option<InventoryRecord>, QmError> {
    let row: Option<(String, String)> = session
        .conn()
        .query_row(
            "SELECT environment, path FROM inventory_files WHERE environment = ?1",
            params![env_name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(row.map(|(environment, path)| InventoryRecord {
        path: PathBuf::from(path),
        environment,
    }))
}

pub fn require_inventory_record(
    session: &StoreSession,
    env_name: &str,
) -> Result<InventoryRecord, QmError> {
    get_inventory_record(session, env_name)?.ok_or_else(|| {
        QmError::NotFound(format!(
            "inventory file record for environment {} in datastore {}",
            env_name,
            session.datastore()
        ))
    })
}

pub fn insert_inventory_record(
    session: &StoreSession,
    record: &InventoryRecord,
) -> Result<(), QmError> {
    if get_inventory_record(session, &record.environment)?.is_some() {
        return Err(QmError::Duplicate(format!(
            "inventory file record for environment {} in datastore {}",
            record.environment,
            session.datastore()
        )));
    }
    session.conn().execute(
        "INSERT INTO inventory_files(environment, path) VALUES(?1, ?2)",
        params![record.environment, record.path.to_string_lossy().into_owned()],
    )?;
    Ok(())
}
