//! Environment, group, and host lifecycle.
//!
//! Creation and deletion are the only places records enter or leave a
//! datastore outside of migration. Deletion must unwind the membership edges
//! before removing a record; removing first would leave dangling references
//! on the surviving side.

use crate::core::config::Config;
use crate::core::entities::{Environment, Group, Host, PulpClient};
use crate::core::error::QmError;
use crate::core::output;
use crate::core::store::StoreSession;
use crate::ops::{catalog, membership, render};
use std::collections::BTreeSet;

/// Register an environment: its record, its per-environment tables, the
/// default `<prefix>_all` group, and its inventory file.
pub fn add_environment(
    session: &StoreSession,
    cfg: &Config,
    name: &str,
) -> Result<Environment, QmError> {
    let env = Environment::new(name);
    catalog::ensure_environment_tables(session, name)?;
    catalog::insert_environment(session, &env)?;

    add_group(
        session,
        name,
        &env.all_group(),
        &format!("Default Group for all members in {name}"),
    )?;

    render::create_inventory(session, cfg, name)?;
    Ok(env)
}

/// Create a group with an empty member list and register it in its
/// environment's group set.
pub fn add_group(
    session: &StoreSession,
    env_name: &str,
    group_name: &str,
    description: &str,
) -> Result<(), QmError> {
    catalog::require_environment(session, env_name)?;
    let group = Group {
        name: group_name.to_string(),
        description: description.to_string(),
        environment: env_name.to_string(),
        members: Vec::new(),
    };
    catalog::insert_group(session, env_name, &group)?;
    catalog::register_environment_group(session, env_name, group_name)
}

/// Delete a group: detach it from every member host, deregister it from the
/// environment, then remove the record. The default `<prefix>_all` group is
/// protected while its environment exists.
pub fn delete_group(
    session: &StoreSession,
    env_name: &str,
    group_name: &str,
) -> Result<(), QmError> {
    if let Some(env) = catalog::get_environment(session, env_name)? {
        if group_name == env.all_group() {
            return Err(QmError::Validation(format!(
                "group {} is the default group of environment {} and cannot be deleted while the environment exists",
                group_name, env_name
            )));
        }
    }

    let group = catalog::require_group(session, env_name, group_name)?;
    for member in &group.members {
        membership::detach_from_host(session, env_name, member, group_name)?;
    }

    if !catalog::deregister_environment_group(session, env_name, group_name)? {
        output::warn(&format!(
            "group {} was not registered in environment {}, skipping deregistration",
            group_name, env_name
        ));
    }

    catalog::remove_group(session, env_name, group_name)?;
    Ok(())
}

/// Create a host and its pulp client twin. The host starts with an empty
/// group set and is immediately attached to its environment's default group.
pub fn add_host(
    session: &StoreSession,
    env_name: &str,
    client: &PulpClient,
) -> Result<(), QmError> {
    let env = catalog::require_environment(session, env_name)?;
    let host = Host {
        fqdn: client.fqdn.clone(),
        groups: BTreeSet::new(),
        environment: env_name.to_string(),
    };
    catalog::insert_host(session, env_name, &host)?;
    membership::attach(session, env_name, &host.fqdn, &env.all_group())?;
    catalog::insert_pulp_client(session, client)?;
    Ok(())
}

/// Delete a host: detach it from every group it belongs to, remove the
/// record, then remove its pulp client twin. An already-absent host or twin
/// is a warning, not a failure.
pub fn delete_host(session: &StoreSession, env_name: &str, fqdn: &str) -> Result<(), QmError> {
    let Some(host) = catalog::get_host(session, env_name, fqdn)? else {
        output::warn(&format!(
            "host {} does not exist in {}, nothing to delete",
            fqdn,
            session.datastore()
        ));
        return Ok(());
    };

    for group_name in &host.groups {
        membership::detach_from_group(session, env_name, fqdn, group_name)?;
    }
    catalog::remove_host(session, env_name, fqdn)?;

    if !catalog::remove_pulp_client(session, fqdn)? {
        output::warn(&format!(
            "host {} has no pulp client in {}, continuing without deleting",
            fqdn,
            session.datastore()
        ));
    }
    Ok(())
}

/// Create a new host from a template host: same environment, same group set,
/// cloned pulp client under the new fqdn. The new fqdn is enrolled into every
/// copied group's member list.
pub fn clone_host(
    session: &StoreSession,
    env_name: &str,
    template_fqdn: &str,
    new_fqdn: &str,
) -> Result<(), QmError> {
    let template = catalog::require_host(session, env_name, template_fqdn)?;

    let host = Host {
        fqdn: new_fqdn.to_string(),
        groups: template.groups.clone(),
        environment: template.environment.clone(),
    };
    catalog::insert_host(session, env_name, &host)?;
    for group_name in &host.groups {
        membership::enroll_member(session, env_name, group_name, new_fqdn)?;
    }

    let twin = catalog::get_pulp_client(session, template_fqdn)?.ok_or_else(|| {
        QmError::NotFound(format!(
            "pulp client for template host {} in datastore {}",
            template_fqdn,
            session.datastore()
        ))
    })?;
    let mut cloned = twin.clone();
    cloned.fqdn = new_fqdn.to_string();
    catalog::insert_pulp_client(session, &cloned)
}
