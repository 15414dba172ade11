//! Membership invariant maintenance.
//!
//! The Host→Groups and Group→Members edges live in separate documents with no
//! referential integrity between them. The operations here keep both sides
//! aligned: after any completed attach, `group ∈ host.groups` iff the host's
//! fqdn appears exactly once in the group's member list. Each operation issues
//! two independent document updates with no combined atomicity; both detach
//! halves must run together to fully restore the edge.

use crate::core::error::QmError;
use crate::core::output;
use crate::core::store::StoreSession;
use crate::ops::catalog;

/// Attach a host to a group: record the group on the host document, then
/// append the host to the group's member list. Idempotent: a second call
/// for the same pair is a no-op.
///
/// The host must exist; the group must exist once the host-side update has
/// been persisted (the updates are not atomic as a pair).
pub fn attach(
    session: &StoreSession,
    env_name: &str,
    fqdn: &str,
    group_name: &str,
) -> Result<(), QmError> {
    let mut host = catalog::require_host(session, env_name, fqdn)?;
    if !host.groups.insert(group_name.to_string()) {
        return Ok(());
    }
    catalog::update_host_groups(session, env_name, &host)?;

    let mut group = catalog::require_group(session, env_name, group_name)?;
    group.members.push(host.fqdn.clone());
    catalog::update_group_members(session, env_name, &group)?;
    Ok(())
}

/// Remove the group from the host document's group set. A missing host
/// degrades to a logged no-op; the group-side edge is untouched either way.
pub fn detach_from_host(
    session: &StoreSession,
    env_name: &str,
    fqdn: &str,
    group_name: &str,
) -> Result<(), QmError> {
    let Some(mut host) = catalog::get_host(session, env_name, fqdn)? else {
        output::warn(&format!(
            "host {} not found in {}, skipping group detach",
            fqdn,
            session.datastore()
        ));
        return Ok(());
    };
    host.groups.remove(group_name);
    catalog::update_host_groups(session, env_name, &host)
}

/// Remove the first exact match of the host from the group's member list
/// (stable removal; remaining member order is preserved). A missing group is
/// fatal, unlike the host-side detach.
pub fn detach_from_group(
    session: &StoreSession,
    env_name: &str,
    fqdn: &str,
    group_name: &str,
) -> Result<(), QmError> {
    let mut group = catalog::require_group(session, env_name, group_name)?;
    remove_first_member(&mut group.members, fqdn);
    catalog::update_group_members(session, env_name, &group)
}

/// Append a host to a group's member list unless already present (linear
/// scan). Used where the host document's group set is already populated and
/// only the group-side edge needs repair: migration and host cloning.
pub fn enroll_member(
    session: &StoreSession,
    env_name: &str,
    group_name: &str,
    fqdn: &str,
) -> Result<bool, QmError> {
    let mut group = catalog::require_group(session, env_name, group_name)?;
    if group.members.iter().any(|m| m == fqdn) {
        return Ok(false);
    }
    group.members.push(fqdn.to_string());
    catalog::update_group_members(session, env_name, &group)?;
    Ok(true)
}

/// Move a host between two groups of the same environment: detach both edge
/// halves from the source group, then attach to the destination.
pub fn move_host(
    session: &StoreSession,
    env_name: &str,
    fqdn: &str,
    from_group: &str,
    to_group: &str,
) -> Result<(), QmError> {
    detach_from_host(session, env_name, fqdn, from_group)?;
    detach_from_group(session, env_name, fqdn, from_group)?;
    attach(session, env_name, fqdn, to_group)
}

/// Stable first-match removal. Returns false when the member was absent.
pub(crate) fn remove_first_member(members: &mut Vec<String>, fqdn: &str) -> bool {
    match members.iter().position(|m| m == fqdn) {
        Some(idx) => {
            members.remove(idx);
            true
        }
        None => false,
    }
}
