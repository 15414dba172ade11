use quartermaster::core::broker::StoreBroker;
use quartermaster::core::config::Config;
use quartermaster::core::entities::{Host, PulpClient};
use quartermaster::core::error::QmError;
use quartermaster::core::store::{Datastore, StoreSession};
use quartermaster::ops::{catalog, membership, migrate, provision};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const ENV: &str = "qa-east";

fn test_config(root: &Path) -> Config {
    Config {
        data_dir: root.join("data"),
        provisioner_inventory_root: root.join("prov-inventories"),
        custodian_inventory_root: root.join("cust-inventories"),
    }
}

fn pulp_client(fqdn: &str) -> PulpClient {
    let mut rpm_repos = BTreeMap::new();
    rpm_repos.insert("Base".to_string(), "3".to_string());
    rpm_repos.insert("Epel".to_string(), "1".to_string());
    PulpClient {
        fqdn: fqdn.to_string(),
        rpm_repos,
        os_type: "CentOS".to_string(),
        os_version: "7.0".to_string(),
        machine_arch: "x86_64".to_string(),
    }
}

/// Environment registered in both datastores, group `qa_east_db` only in
/// provisioner, host `db01` in provisioner attached to it.
fn setup(cfg: &Config) -> (StoreSession, StoreSession) {
    let prov = StoreSession::open(cfg, Datastore::Provisioner).expect("open provisioner");
    let cust = StoreSession::open(cfg, Datastore::Custodian).expect("open custodian");
    provision::add_environment(&prov, cfg, ENV).expect("env in provisioner");
    provision::add_environment(&cust, cfg, ENV).expect("env in custodian");
    provision::add_group(&prov, ENV, "qa_east_db", "Database hosts").expect("group");
    provision::add_host(&prov, ENV, &pulp_client("db01")).expect("host");
    membership::attach(&prov, ENV, "db01", "qa_east_db").expect("attach");
    (prov, cust)
}

#[test]
fn push_moves_host_memberships_and_pulp_twin() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let (prov, cust) = setup(&cfg);
    let broker = StoreBroker::new(&cfg);

    migrate::push(&broker, ENV, "db01").expect("push");

    // Custodian holds the host with both memberships, including the shadow
    // copy of the group that only existed in provisioner.
    let host = catalog::require_host(&cust, ENV, "db01").expect("host in custodian");
    assert!(host.groups.contains("qa_east_all"));
    assert!(host.groups.contains("qa_east_db"));
    let shadow = catalog::require_group(&cust, ENV, "qa_east_db").expect("shadow group");
    assert_eq!(shadow.description, "Database hosts");
    assert_eq!(shadow.members, vec!["db01"]);
    let all = catalog::require_group(&cust, ENV, "qa_east_all").expect("all group");
    assert_eq!(all.members.iter().filter(|m| *m == "db01").count(), 1);
    let env = catalog::require_environment(&cust, ENV).expect("environment");
    assert!(env.groups.contains("qa_east_db"));
    assert!(catalog::get_pulp_client(&cust, "db01").expect("twin lookup").is_some());

    // Provisioner keeps nothing of the host.
    assert!(!catalog::host_exists(&prov, ENV, "db01").expect("host lookup"));
    assert!(catalog::get_pulp_client(&prov, "db01").expect("twin lookup").is_none());
    for group in ["qa_east_all", "qa_east_db"] {
        let g = catalog::require_group(&prov, ENV, group).expect("group");
        assert!(!g.members.iter().any(|m| m == "db01"));
    }

    // Push regenerates both inventory files; only custodian's lists the host.
    let prov_file = tmp
        .path()
        .join("prov-inventories/qa_east/qa_east.inventory");
    let cust_file = tmp
        .path()
        .join("cust-inventories/qa_east/qa_east.inventory");
    let prov_rendered = fs::read_to_string(prov_file).expect("provisioner inventory");
    let cust_rendered = fs::read_to_string(cust_file).expect("custodian inventory");
    assert!(!prov_rendered.contains("db01"));
    assert!(cust_rendered.contains("[qa_east_all]\ndb01\n"));
    assert!(cust_rendered.contains("[qa_east_db]\ndb01\n"));
}

#[test]
fn push_then_pull_round_trips_to_the_original_state() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let (prov, cust) = setup(&cfg);
    let broker = StoreBroker::new(&cfg);

    let host_before = catalog::require_host(&prov, ENV, "db01").expect("host");
    let all_before = catalog::require_group(&prov, ENV, "qa_east_all").expect("group");
    let db_before = catalog::require_group(&prov, ENV, "qa_east_db").expect("group");
    let twin_before = catalog::get_pulp_client(&prov, "db01").expect("twin").expect("twin present");

    migrate::push(&broker, ENV, "db01").expect("push");
    migrate::pull(&broker, ENV, "db01").expect("pull");

    assert_eq!(catalog::require_host(&prov, ENV, "db01").expect("host"), host_before);
    assert_eq!(catalog::require_group(&prov, ENV, "qa_east_all").expect("group"), all_before);
    assert_eq!(catalog::require_group(&prov, ENV, "qa_east_db").expect("group"), db_before);
    assert_eq!(
        catalog::get_pulp_client(&prov, "db01").expect("twin").expect("twin present"),
        twin_before
    );

    // Custodian keeps no trace of the host: no record, no twin, no members.
    assert!(!catalog::host_exists(&cust, ENV, "db01").expect("host lookup"));
    assert!(catalog::get_pulp_client(&cust, "db01").expect("twin lookup").is_none());
    for group in ["qa_east_all", "qa_east_db"] {
        let g = catalog::require_group(&cust, ENV, group).expect("group");
        assert!(!g.members.iter().any(|m| m == "db01"));
    }
}

#[test]
fn push_does_not_duplicate_a_preseeded_destination_member() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let (_prov, cust) = setup(&cfg);
    let broker = StoreBroker::new(&cfg);

    // Simulate drift: custodian's default group already lists the host.
    let mut all = catalog::require_group(&cust, ENV, "qa_east_all").expect("group");
    all.members.push("db01".to_string());
    catalog::update_group_members(&cust, ENV, &all).expect("preseed");

    migrate::push(&broker, ENV, "db01").expect("push");

    let all = catalog::require_group(&cust, ENV, "qa_east_all").expect("group");
    assert_eq!(all.members.iter().filter(|m| *m == "db01").count(), 1);
}

#[test]
fn push_fails_on_duplicate_destination_host_before_touching_the_source() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let (prov, cust) = setup(&cfg);
    let broker = StoreBroker::new(&cfg);

    catalog::insert_host(
        &cust,
        ENV,
        &Host {
            fqdn: "db01".to_string(),
            groups: BTreeSet::new(),
            environment: ENV.to_string(),
        },
    )
    .expect("preexisting destination host");

    let err = migrate::push(&broker, ENV, "db01").expect_err("duplicate must fail");
    assert!(matches!(err, QmError::Duplicate(_)));
    // Copy-before-delete: the source record is untouched.
    assert!(catalog::host_exists(&prov, ENV, "db01").expect("host lookup"));
}

#[test]
fn push_with_missing_pulp_twin_is_fatal_and_leaves_the_documented_torn_state() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let (prov, cust) = setup(&cfg);
    let broker = StoreBroker::new(&cfg);

    catalog::remove_pulp_client(&prov, "db01").expect("drop twin");

    let err = migrate::push(&broker, ENV, "db01").expect_err("missing twin must fail");
    assert!(matches!(err, QmError::NotFound(_)));

    // Steps 1-5 already ran: the host has moved, only the twin step failed.
    assert!(catalog::host_exists(&cust, ENV, "db01").expect("host lookup"));
    assert!(!catalog::host_exists(&prov, ENV, "db01").expect("host lookup"));
}

#[test]
fn push_with_group_in_neither_store_is_a_desynchronization() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let (prov, _cust) = setup(&cfg);
    let broker = StoreBroker::new(&cfg);

    // The host still references qa_east_db, but the record is gone from both
    // stores (it never existed in custodian).
    catalog::remove_group(&prov, ENV, "qa_east_db").expect("drop group record");

    let err = migrate::push(&broker, ENV, "db01").expect_err("desync must fail");
    assert!(matches!(err, QmError::Desync(_)));
}
