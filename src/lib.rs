//! Quartermaster: a dual-store infrastructure inventory curator.
//!
//! Inventory metadata (hosts, groups, environments, and their paired
//! repository-subscription records) lives in two independent
//! datastores: **provisioner** (hosts under active provisioning control) and
//! **custodian** (hosts handed off to steady-state custody). A derived flat
//! inventory file per (datastore, environment) is regenerated after every
//! mutation and consumed by an external provisioning tool.
//!
//! # Architecture
//!
//! ## Dual-store model
//!
//! Each datastore is one SQLite file holding per-environment host/group
//! collections plus datastore-wide environment, pulp client, and inventory
//! manifest collections. The stores share no referential integrity and no
//! cross-store transactions: hosts migrate between them one at a time
//! (`push`/`pull`), step by step, copy before delete.
//!
//! ## The Store Broker
//!
//! All datastore access routes through [`core::broker::StoreBroker`], which
//! owns the session(s) for the duration of one top-level operation and
//! appends an audit event per operation to `store.events.jsonl`.
//!
//! ## Operations
//!
//! - [`ops::catalog`]: typed entity access (the only code that touches SQL)
//! - [`ops::membership`]: the bidirectional host↔group membership edge
//! - [`ops::migrate`]: host migration between the two datastores
//! - [`ops::provision`]: environment/group/host lifecycle
//! - [`ops::render`]: derived inventory file rendering with versioned backups
//!
//! # Examples
//!
//! ```bash
//! # Register an environment in both datastores
//! quartermaster env add --name qa-east --datastore all
//!
//! # Add a host (lands in the default qa_east_all group)
//! quartermaster host add --environment qa-east --datastore provisioner \
//!     --fqdn db01.example.net --os-type CentOS --os-version 7.0 --machine-arch x86_64
//!
//! # Hand the host off to custodian
//! quartermaster push --environment qa-east --host db01.example.net
//! ```

mod cli;
pub mod core;
pub mod ops;

use crate::cli::{Cli, Command, EnvCommand, GroupCommand, HostCommand, InventoryCommand};
use crate::core::broker::StoreBroker;
use crate::core::config::Config;
use crate::core::entities::PulpClient;
use crate::core::error::QmError;
use crate::core::output;
use crate::core::store::Datastore;
use crate::ops::{catalog, membership, migrate, provision, render};
use clap::Parser;
use std::collections::BTreeMap;

pub fn run() -> Result<(), QmError> {
    let cli = Cli::parse();
    let cfg = Config::load(cli.config.as_deref())?;
    let broker = StoreBroker::new(&cfg);

    match cli.command {
        Command::Env(env) => run_env(&broker, env.command),
        Command::Host(host) => run_host(&broker, host.command),
        Command::Group(group) => run_group(&broker, group.command),
        Command::Push { environment, hosts } => run_push(&broker, &environment, &hosts),
        Command::Pull { environment, hosts } => run_pull(&broker, &environment, &hosts),
        Command::Inventory(inv) => run_inventory(&broker, inv.command),
    }
}

fn run_env(broker: &StoreBroker, command: EnvCommand) -> Result<(), QmError> {
    match command {
        EnvCommand::Add { name, datastore } => {
            for ds in datastore.datastores() {
                broker.with_session(ds, "env.add", |session| {
                    provision::add_environment(session, broker.config(), &name)?;
                    Ok(())
                })?;
                output::ok(&format!("registered environment {name} in {ds}"));
            }
            Ok(())
        }
    }
}

fn run_host(broker: &StoreBroker, command: HostCommand) -> Result<(), QmError> {
    match command {
        HostCommand::Add {
            environment,
            datastore,
            fqdn,
            os_type,
            os_version,
            machine_arch,
            base_repo_version,
            updates_repo_version,
            extras_repo_version,
            plus_repo_version,
            epel_repo_version,
            groups,
        } => {
            let mut rpm_repos = BTreeMap::new();
            rpm_repos.insert("Base".to_string(), base_repo_version);
            rpm_repos.insert("Updates".to_string(), updates_repo_version);
            rpm_repos.insert("Extras".to_string(), extras_repo_version);
            rpm_repos.insert("Plus".to_string(), plus_repo_version);
            rpm_repos.insert("Epel".to_string(), epel_repo_version);
            let client = PulpClient {
                fqdn: fqdn.clone(),
                rpm_repos,
                os_type,
                os_version,
                machine_arch,
            };

            let ds = datastore.datastore();
            broker.with_session(ds, "host.add", |session| {
                provision::add_host(session, &environment, &client)?;
                for group in &groups {
                    if !catalog::group_exists(session, &environment, group)? {
                        return Err(QmError::NotFound(format!(
                            "group {} in environment {} in datastore {}",
                            group, environment, ds
                        )));
                    }
                    membership::attach(session, &environment, &fqdn, group)?;
                }
                render::regenerate(session, &environment)?;
                Ok(())
            })?;
            output::ok(&format!("added host {fqdn} to {environment} in {ds}"));
            Ok(())
        }
        HostCommand::Delete {
            environment,
            datastore,
            fqdn,
        } => {
            for ds in datastore.datastores() {
                broker.with_session(ds, "host.delete", |session| {
                    provision::delete_host(session, &environment, &fqdn)?;
                    render::regenerate(session, &environment)?;
                    Ok(())
                })?;
                output::ok(&format!("deleted host {fqdn} from {environment} in {ds}"));
            }
            Ok(())
        }
        HostCommand::Clone {
            environment,
            datastore,
            template,
            clone,
        } => {
            let ds = datastore.datastore();
            broker.with_session(ds, "host.clone", |session| {
                provision::clone_host(session, &environment, &template, &clone)?;
                render::regenerate(session, &environment)?;
                Ok(())
            })?;
            output::ok(&format!("created host {clone} from template {template} in {ds}"));
            Ok(())
        }
        HostCommand::Attach {
            environment,
            datastore,
            fqdn,
            groups,
        } => {
            let ds = datastore.datastore();
            broker.with_session(ds, "host.attach", |session| {
                for group in &groups {
                    if !catalog::group_exists(session, &environment, group)? {
                        return Err(QmError::NotFound(format!(
                            "group {} in environment {} in datastore {}",
                            group, environment, ds
                        )));
                    }
                    membership::attach(session, &environment, &fqdn, group)?;
                }
                render::regenerate(session, &environment)?;
                Ok(())
            })?;
            output::ok(&format!("attached {fqdn} to {} group(s) in {ds}", groups.len()));
            Ok(())
        }
        HostCommand::Detach {
            environment,
            datastore,
            fqdn,
            groups,
        } => {
            for ds in datastore.datastores() {
                broker.with_session(ds, "host.detach", |session| {
                    catalog::require_host(session, &environment, &fqdn)?;
                    for group in &groups {
                        membership::detach_from_host(session, &environment, &fqdn, group)?;
                        membership::detach_from_group(session, &environment, &fqdn, group)?;
                    }
                    render::regenerate(session, &environment)?;
                    Ok(())
                })?;
                output::ok(&format!(
                    "detached {fqdn} from {} group(s) in {ds}",
                    groups.len()
                ));
            }
            Ok(())
        }
        HostCommand::Move {
            environment,
            datastore,
            fqdn,
            from_group,
            to_group,
        } => {
            let ds = datastore.datastore();
            broker.with_session(ds, "host.move", |session| {
                catalog::require_group(session, &environment, &from_group)?;
                catalog::require_group(session, &environment, &to_group)?;
                membership::move_host(session, &environment, &fqdn, &from_group, &to_group)?;
                render::regenerate(session, &environment)?;
                Ok(())
            })?;
            output::ok(&format!("moved {fqdn} from {from_group} to {to_group} in {ds}"));
            Ok(())
        }
        HostCommand::Show {
            environment,
            datastore,
            fqdn,
        } => broker.with_session(datastore.datastore(), "host.show", |session| {
            let host = catalog::require_host(session, &environment, &fqdn)?;
            println!("Hostname:    {}", host.fqdn);
            println!("Environment: {}", host.environment);
            println!("Groups:");
            for group in &host.groups {
                println!("  {group}");
            }
            Ok(())
        }),
        HostCommand::List {
            environment,
            datastore,
        } => broker.with_session(datastore.datastore(), "host.list", |session| {
            for host in catalog::list_hosts(session, &environment)? {
                println!("{}", host.fqdn);
            }
            Ok(())
        }),
    }
}

fn run_group(broker: &StoreBroker, command: GroupCommand) -> Result<(), QmError> {
    match command {
        GroupCommand::Add {
            environment,
            datastore,
            name,
            description,
        } => {
            if datastore.is_all() {
                broker.with_pair(Datastore::Provisioner, "group.add", |prov, cust| {
                    if !catalog::environment_exists(prov, &environment)?
                        || !catalog::environment_exists(cust, &environment)?
                    {
                        return Err(QmError::NotFound(format!(
                            "environment {environment} is not present in both datastores"
                        )));
                    }
                    let in_prov = catalog::group_exists(prov, &environment, &name)?;
                    let in_cust = catalog::group_exists(cust, &environment, &name)?;
                    if in_prov && in_cust {
                        return Err(QmError::Duplicate(format!(
                            "group {name} in environment {environment} in all datastores"
                        )));
                    }
                    for (session, present) in [(prov, in_prov), (cust, in_cust)] {
                        if present {
                            output::info(&format!(
                                "group {} already exists in {}, skipping add",
                                name,
                                session.datastore()
                            ));
                        } else {
                            provision::add_group(session, &environment, &name, &description)?;
                            render::regenerate(session, &environment)?;
                            output::ok(&format!(
                                "added group {} to {} in {}",
                                name,
                                environment,
                                session.datastore()
                            ));
                        }
                    }
                    Ok(())
                })
            } else {
                let ds = datastore.datastores()[0];
                broker.with_session(ds, "group.add", |session| {
                    provision::add_group(session, &environment, &name, &description)?;
                    render::regenerate(session, &environment)?;
                    Ok(())
                })?;
                output::ok(&format!("added group {name} to {environment} in {ds}"));
                Ok(())
            }
        }
        GroupCommand::Delete {
            environment,
            datastore,
            name,
        } => {
            if datastore.is_all() {
                broker.with_pair(Datastore::Provisioner, "group.delete", |prov, cust| {
                    for session in [prov, cust] {
                        if catalog::group_exists(session, &environment, &name)? {
                            provision::delete_group(session, &environment, &name)?;
                            render::regenerate(session, &environment)?;
                            output::ok(&format!(
                                "deleted group {} from {} in {}",
                                name,
                                environment,
                                session.datastore()
                            ));
                        } else {
                            output::info(&format!(
                                "group {} does not exist in {}, skipping delete",
                                name,
                                session.datastore()
                            ));
                        }
                    }
                    Ok(())
                })
            } else {
                let ds = datastore.datastores()[0];
                broker.with_session(ds, "group.delete", |session| {
                    provision::delete_group(session, &environment, &name)?;
                    render::regenerate(session, &environment)?;
                    Ok(())
                })?;
                output::ok(&format!("deleted group {name} from {environment} in {ds}"));
                Ok(())
            }
        }
        GroupCommand::Show {
            environment,
            datastore,
            name,
        } => broker.with_session(datastore.datastore(), "group.show", |session| {
            let group = catalog::require_group(session, &environment, &name)?;
            println!("Groupname:   {}", group.name);
            println!("Description: {}", group.description);
            println!("Environment: {}", group.environment);
            println!("Members:");
            for member in &group.members {
                println!("  {member}");
            }
            Ok(())
        }),
        GroupCommand::List {
            environment,
            datastore,
        } => broker.with_session(datastore.datastore(), "group.list", |session| {
            for group in catalog::list_groups(session, &environment)? {
                println!("{}", group.name);
            }
            Ok(())
        }),
        GroupCommand::Summaries {
            environment,
            datastore,
        } => broker.with_session(datastore.datastore(), "group.summaries", |session| {
            for group in catalog::list_groups(session, &environment)? {
                println!("{}: {}", group.name, group.description);
            }
            Ok(())
        }),
    }
}

fn run_push(broker: &StoreBroker, environment: &str, hosts: &[String]) -> Result<(), QmError> {
    for fqdn in hosts {
        migrate::push(broker, environment, fqdn)?;
        output::ok(&format!("pushed {fqdn} to custodian"));
    }
    Ok(())
}

fn run_pull(broker: &StoreBroker, environment: &str, hosts: &[String]) -> Result<(), QmError> {
    for fqdn in hosts {
        migrate::pull(broker, environment, fqdn)?;
        output::ok(&format!("pulled {fqdn} back to provisioner"));
    }
    Ok(())
}

fn run_inventory(broker: &StoreBroker, command: InventoryCommand) -> Result<(), QmError> {
    match command {
        InventoryCommand::Dump {
            environment,
            datastore,
        } => broker.with_session(datastore.datastore(), "inventory.dump", |session| {
            let mut doc: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for group in catalog::list_groups(session, &environment)? {
                doc.insert(group.name, group.members);
            }
            let rendered = serde_json::to_string_pretty(&doc)
                .map_err(|e| QmError::Validation(format!("inventory dump encode: {e}")))?;
            println!("{rendered}");
            Ok(())
        }),
        InventoryCommand::Regenerate {
            environment,
            datastore,
        } => {
            let ds = datastore.datastore();
            broker.with_session(ds, "inventory.regenerate", |session| {
                render::regenerate(session, &environment)?;
                Ok(())
            })?;
            output::ok(&format!("regenerated inventory file for {environment} in {ds}"));
            Ok(())
        }
    }
}
