//! Host migration between the provisioner and custodian datastores.
//!
//! `push` moves a host provisioner→custodian, `pull` the reverse; both run
//! the same symmetric transfer over a (source, destination) session pair:
//!
//! 1. read the host from the source
//! 2. copy it into the destination (duplicate fqdn is fatal)
//! 3. for each of its groups: create a member-less shadow of the group in the
//!    destination if absent (sourced from the source store's copy; a group
//!    present in neither store is a desynchronization and fatal), then enroll
//!    the host, deduplicating by linear scan
//! 4. re-read the host from the source and remove it from each of its
//!    source-side groups (stable single-match removal)
//! 5. remove the host from the source
//! 6. copy the pulp client twin into the destination (missing twin is fatal;
//!    an existing destination twin is left in place)
//! 7. remove the twin from the source
//! 8. (push only) regenerate the environment's inventory file in both stores
//!
//! There is no cross-store transaction, no retry, and no compensating
//! rollback: a crash after step 2 leaves the host present in both datastores
//! until an operator intervenes.

use crate::core::broker::StoreBroker;
use crate::core::entities::Group;
use crate::core::error::QmError;
use crate::core::output;
use crate::core::store::{Datastore, StoreSession};
use crate::ops::{catalog, membership, render};

/// Move one host from provisioner into custodian, then regenerate the
/// environment's inventory file in both datastores.
pub fn push(broker: &StoreBroker, env_name: &str, fqdn: &str) -> Result<(), QmError> {
    broker.with_pair(Datastore::Provisioner, "migrate.push", |src, dst| {
        transfer(src, dst, env_name, fqdn)?;
        render::regenerate(src, env_name)?;
        render::regenerate(dst, env_name)?;
        Ok(())
    })
}

/// Move one host from custodian back into provisioner.
pub fn pull(broker: &StoreBroker, env_name: &str, fqdn: &str) -> Result<(), QmError> {
    broker.with_pair(Datastore::Custodian, "migrate.pull", |src, dst| {
        transfer(src, dst, env_name, fqdn)
    })
}

fn transfer(
    src: &StoreSession,
    dst: &StoreSession,
    env_name: &str,
    fqdn: &str,
) -> Result<(), QmError> {
    // Steps 1 and 2: copy the host record before anything else is touched.
    let host = catalog::require_host(src, env_name, fqdn)?;
    catalog::insert_host(dst, env_name, &host)?;

    // 3: rebuild the group-side membership edges in the destination.
    for group_name in &host.groups {
        if catalog::get_group(dst, env_name, group_name)?.is_none() {
            let Some(src_group) = catalog::get_group(src, env_name, group_name)? else {
                return Err(QmError::Desync(format!(
                    "group {} is referenced by host {} but exists in neither {} nor {}",
                    group_name,
                    fqdn,
                    src.datastore(),
                    dst.datastore()
                )));
            };
            let shadow = Group {
                name: src_group.name.clone(),
                description: src_group.description.clone(),
                environment: src_group.environment.clone(),
                members: Vec::new(),
            };
            catalog::insert_group(dst, env_name, &shadow)?;
            catalog::register_environment_group(dst, env_name, group_name)?;
        }
        if !membership::enroll_member(dst, env_name, group_name, fqdn)? {
            output::info(&format!(
                "host {} already a member of {} in {}, skipping add",
                fqdn,
                group_name,
                dst.datastore()
            ));
        }
    }

    // 4: defensive re-fetch before unwinding the source-side edges.
    match catalog::get_host(src, env_name, fqdn)? {
        Some(fresh) => {
            for group_name in &fresh.groups {
                membership::detach_from_group(src, env_name, fqdn, group_name)?;
            }
        }
        None => output::warn(&format!(
            "host {} vanished from {} mid-transfer, skipping member removal",
            fqdn,
            src.datastore()
        )),
    }

    // 5
    if !catalog::remove_host(src, env_name, fqdn)? {
        output::warn(&format!(
            "host {} already absent from {}, continuing",
            fqdn,
            src.datastore()
        ));
    }

    // 6: the pulp client twin travels with its host.
    let twin = catalog::get_pulp_client(src, fqdn)?.ok_or_else(|| {
        QmError::NotFound(format!(
            "pulp client for host {} in datastore {}",
            fqdn,
            src.datastore()
        ))
    })?;
    if catalog::get_pulp_client(dst, fqdn)?.is_some() {
        output::info(&format!(
            "pulp client for {} already present in {}, skipping copy",
            fqdn,
            dst.datastore()
        ));
    } else {
        catalog::insert_pulp_client(dst, &twin)?;
    }

    // 7
    if !catalog::remove_pulp_client(src, fqdn)? {
        output::warn(&format!(
            "pulp client for {} already absent from {}, continuing",
            fqdn,
            src.datastore()
        ));
    }

    Ok(())
}
