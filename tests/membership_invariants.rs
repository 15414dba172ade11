use quartermaster::core::config::Config;
use quartermaster::core::entities::PulpClient;
use quartermaster::core::error::QmError;
use quartermaster::core::store::{Datastore, StoreSession};
use quartermaster::ops::{catalog, membership, provision};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::tempdir;

fn test_config(root: &Path) -> Config {
    Config {
        data_dir: root.join("data"),
        provisioner_inventory_root: root.join("prov-inventories"),
        custodian_inventory_root: root.join("cust-inventories"),
    }
}

fn pulp_client(fqdn: &str) -> PulpClient {
    let mut rpm_repos = BTreeMap::new();
    rpm_repos.insert("Base".to_string(), "1".to_string());
    rpm_repos.insert("Updates".to_string(), "1".to_string());
    PulpClient {
        fqdn: fqdn.to_string(),
        rpm_repos,
        os_type: "CentOS".to_string(),
        os_version: "7.0".to_string(),
        machine_arch: "x86_64".to_string(),
    }
}

fn seeded_session(cfg: &Config) -> StoreSession {
    let session = StoreSession::open(cfg, Datastore::Provisioner).expect("open session");
    provision::add_environment(&session, cfg, "qa-east").expect("add environment");
    provision::add_group(&session, "qa-east", "qa_east_db", "Database hosts").expect("add group");
    session
}

fn member_count(session: &StoreSession, group: &str, fqdn: &str) -> usize {
    catalog::require_group(session, "qa-east", group)
        .expect("group")
        .members
        .iter()
        .filter(|m| m.as_str() == fqdn)
        .count()
}

#[test]
fn attach_and_detach_keep_both_edge_halves_aligned() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let session = seeded_session(&cfg);
    provision::add_host(&session, "qa-east", &pulp_client("db01")).expect("add host");

    membership::attach(&session, "qa-east", "db01", "qa_east_db").expect("attach");

    let host = catalog::require_host(&session, "qa-east", "db01").expect("host");
    assert!(host.groups.contains("qa_east_all"));
    assert!(host.groups.contains("qa_east_db"));
    assert_eq!(member_count(&session, "qa_east_db", "db01"), 1);

    membership::detach_from_host(&session, "qa-east", "db01", "qa_east_db").expect("detach host side");
    membership::detach_from_group(&session, "qa-east", "db01", "qa_east_db").expect("detach group side");

    let host = catalog::require_host(&session, "qa-east", "db01").expect("host");
    assert!(!host.groups.contains("qa_east_db"));
    assert_eq!(member_count(&session, "qa_east_db", "db01"), 0);
}

#[test]
fn attach_twice_is_a_no_op_on_the_second_call() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let session = seeded_session(&cfg);
    provision::add_host(&session, "qa-east", &pulp_client("db01")).expect("add host");

    membership::attach(&session, "qa-east", "db01", "qa_east_db").expect("first attach");
    let host_after_first = catalog::require_host(&session, "qa-east", "db01").expect("host");
    let group_after_first = catalog::require_group(&session, "qa-east", "qa_east_db").expect("group");

    membership::attach(&session, "qa-east", "db01", "qa_east_db").expect("second attach");
    let host_after_second = catalog::require_host(&session, "qa-east", "db01").expect("host");
    let group_after_second = catalog::require_group(&session, "qa-east", "qa_east_db").expect("group");

    assert_eq!(host_after_first, host_after_second);
    assert_eq!(group_after_first, group_after_second);
    assert_eq!(member_count(&session, "qa_east_db", "db01"), 1);
}

#[test]
fn detaching_a_missing_host_is_a_soft_no_op() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let session = seeded_session(&cfg);

    membership::detach_from_host(&session, "qa-east", "ghost01", "qa_east_db")
        .expect("missing host degrades to a warning");
}

#[test]
fn detaching_from_a_missing_group_is_fatal() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let session = seeded_session(&cfg);
    provision::add_host(&session, "qa-east", &pulp_client("db01")).expect("add host");

    let err = membership::detach_from_group(&session, "qa-east", "db01", "qa_east_missing")
        .expect_err("missing group must fail");
    assert!(matches!(err, QmError::NotFound(_)));
}

#[test]
fn detach_preserves_remaining_member_order() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let session = seeded_session(&cfg);
    for fqdn in ["a01", "b01", "c01"] {
        provision::add_host(&session, "qa-east", &pulp_client(fqdn)).expect("add host");
        membership::attach(&session, "qa-east", fqdn, "qa_east_db").expect("attach");
    }

    membership::detach_from_host(&session, "qa-east", "b01", "qa_east_db").expect("host side");
    membership::detach_from_group(&session, "qa-east", "b01", "qa_east_db").expect("group side");

    let group = catalog::require_group(&session, "qa-east", "qa_east_db").expect("group");
    assert_eq!(group.members, vec!["a01", "c01"]);
}

#[test]
fn move_host_swaps_groups_and_keeps_edges_aligned() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let session = seeded_session(&cfg);
    provision::add_group(&session, "qa-east", "qa_east_web", "Web hosts").expect("add group");
    provision::add_host(&session, "qa-east", &pulp_client("web01")).expect("add host");
    membership::attach(&session, "qa-east", "web01", "qa_east_db").expect("attach");

    membership::move_host(&session, "qa-east", "web01", "qa_east_db", "qa_east_web")
        .expect("move host");

    let host = catalog::require_host(&session, "qa-east", "web01").expect("host");
    assert!(!host.groups.contains("qa_east_db"));
    assert!(host.groups.contains("qa_east_web"));
    assert_eq!(member_count(&session, "qa_east_db", "web01"), 0);
    assert_eq!(member_count(&session, "qa_east_web", "web01"), 1);
}
