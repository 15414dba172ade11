//! CLI struct definitions for the quartermaster command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use crate::core::store::Datastore;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "quartermaster",
    version = env!("CARGO_PKG_VERSION"),
    about = "Dual-store infrastructure inventory curator: hosts, groups, environments, repository subscriptions, and derived Ansible inventory files."
)]
pub(crate) struct Cli {
    /// Path to a TOML config file; built-in defaults are used when omitted.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Manage environments.
    Env(EnvCli),
    /// Manage hosts and their group memberships.
    Host(HostCli),
    /// Manage groups.
    Group(GroupCli),
    /// Move hosts from the provisioner datastore into custodian.
    Push {
        #[clap(long)]
        environment: String,
        /// One or more host fqdns (repeatable and/or comma-separated).
        #[clap(long = "host", value_delimiter = ',', required = true)]
        hosts: Vec<String>,
    },
    /// Move hosts from the custodian datastore back into provisioner.
    Pull {
        #[clap(long)]
        environment: String,
        /// One or more host fqdns (repeatable and/or comma-separated).
        #[clap(long = "host", value_delimiter = ',', required = true)]
        hosts: Vec<String>,
    },
    /// Inventory file operations.
    Inventory(InventoryCli),
}

/// Single-datastore selector.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum DatastoreArg {
    Provisioner,
    Custodian,
}

impl DatastoreArg {
    pub fn datastore(self) -> Datastore {
        match self {
            DatastoreArg::Provisioner => Datastore::Provisioner,
            DatastoreArg::Custodian => Datastore::Custodian,
        }
    }
}

/// Datastore selector for commands that can run against both stores.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum DatastoreScope {
    Provisioner,
    Custodian,
    All,
}

impl DatastoreScope {
    pub fn datastores(self) -> Vec<Datastore> {
        match self {
            DatastoreScope::Provisioner => vec![Datastore::Provisioner],
            DatastoreScope::Custodian => vec![Datastore::Custodian],
            DatastoreScope::All => vec![Datastore::Provisioner, Datastore::Custodian],
        }
    }

    pub fn is_all(self) -> bool {
        self == DatastoreScope::All
    }
}

#[derive(clap::Args, Debug)]
pub(crate) struct EnvCli {
    #[clap(subcommand)]
    pub command: EnvCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum EnvCommand {
    /// Register an environment: record, default group, and inventory file.
    Add {
        #[clap(long)]
        name: String,
        #[clap(long, value_enum)]
        datastore: DatastoreScope,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct HostCli {
    #[clap(subcommand)]
    pub command: HostCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum HostCommand {
    /// Add a host and its pulp client record.
    Add {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
        /// Fully qualified domain name of the host.
        #[clap(long)]
        fqdn: String,
        /// Operating system type (e.g. CentOS, RedHat).
        #[clap(long)]
        os_type: String,
        /// Operating system version (e.g. 7.0).
        #[clap(long)]
        os_version: String,
        /// Machine architecture (e.g. x86_64).
        #[clap(long)]
        machine_arch: String,
        #[clap(long, default_value = "1")]
        base_repo_version: String,
        #[clap(long, default_value = "1")]
        updates_repo_version: String,
        #[clap(long, default_value = "1")]
        extras_repo_version: String,
        #[clap(long, default_value = "1")]
        plus_repo_version: String,
        #[clap(long, default_value = "1")]
        epel_repo_version: String,
        /// Groups to attach after creation (repeatable and/or comma-separated).
        #[clap(long = "group", value_delimiter = ',')]
        groups: Vec<String>,
    },
    /// Delete a host, its memberships, and its pulp client record.
    Delete {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreScope,
        #[clap(long)]
        fqdn: String,
    },
    /// Create a new host from a template host.
    Clone {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
        /// Fqdn of the existing host to copy.
        #[clap(long)]
        template: String,
        /// Fqdn of the host to create.
        #[clap(long)]
        clone: String,
    },
    /// Attach a host to one or more groups.
    Attach {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
        #[clap(long)]
        fqdn: String,
        #[clap(long = "group", value_delimiter = ',', required = true)]
        groups: Vec<String>,
    },
    /// Detach a host from one or more groups.
    Detach {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreScope,
        #[clap(long)]
        fqdn: String,
        #[clap(long = "group", value_delimiter = ',', required = true)]
        groups: Vec<String>,
    },
    /// Move a host between two groups.
    Move {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
        #[clap(long)]
        fqdn: String,
        #[clap(long)]
        from_group: String,
        #[clap(long)]
        to_group: String,
    },
    /// Display one host's details and memberships.
    Show {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
        #[clap(long)]
        fqdn: String,
    },
    /// List host fqdns in an environment.
    List {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct GroupCli {
    #[clap(subcommand)]
    pub command: GroupCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum GroupCommand {
    /// Add a group to an environment.
    Add {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreScope,
        #[clap(long)]
        name: String,
        /// A short description of the group.
        #[clap(long)]
        description: String,
    },
    /// Delete a group and detach all of its members.
    Delete {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreScope,
        #[clap(long)]
        name: String,
    },
    /// Display one group's details and members.
    Show {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
        #[clap(long)]
        name: String,
    },
    /// List group names in an environment.
    List {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
    },
    /// List groups with their descriptions.
    Summaries {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct InventoryCli {
    #[clap(subcommand)]
    pub command: InventoryCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum InventoryCommand {
    /// Print the group→members JSON document for one environment.
    Dump {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
    },
    /// Rebuild the inventory file from current group state.
    Regenerate {
        #[clap(long)]
        environment: String,
        #[clap(long, value_enum)]
        datastore: DatastoreArg,
    },
}
