use quartermaster::core::config::Config;
use quartermaster::core::entities::PulpClient;
use quartermaster::core::error::QmError;
use quartermaster::core::store::{Datastore, StoreSession};
use quartermaster::ops::render::{self, INVENTORY_HEADER};
use quartermaster::ops::{catalog, provision};
use std::collections::BTreeMap;
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
    rpm_repos.insert("Base".to_string(), "1".to_string());
    PulpClient {
        fqdn: fqdn.to_string(),
        rpm_repos,
        os_type: "CentOS".to_string(),
        os_version: "7.0".to_string(),
        machine_arch: "x86_64".to_string(),
    }
}

#[test]
fn create_inventory_writes_header_and_registers_the_manifest() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let session = StoreSession::open(&cfg, Datastore::Provisioner).expect("open session");

    let path = render::create_inventory(&session, &cfg, ENV).expect("create inventory");

    assert_eq!(
        path,
        tmp.path().join("prov-inventories/qa_east/qa_east.inventory")
    );
    assert_eq!(fs::read_to_string(&path).expect("read"), INVENTORY_HEADER);
    assert!(path.parent().expect("env dir").join("backups").is_dir());

    let record = catalog::require_inventory_record(&session, ENV).expect("manifest");
    assert_eq!(record.path, path);

    // The manifest is created once per (datastore, environment).
    let err = render::create_inventory(&session, &cfg, ENV).expect_err("second create must fail");
    assert!(matches!(err, QmError::Duplicate(_)));
}

#[test]
fn regenerate_backs_up_the_previous_file_and_renders_current_state() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let session = StoreSession::open(&cfg, Datastore::Provisioner).expect("open session");
    provision::add_environment(&session, &cfg, ENV).expect("add environment");
    provision::add_host(&session, ENV, &pulp_client("web01")).expect("add host");

    let live = tmp.path().join("prov-inventories/qa_east/qa_east.inventory");
    let before = fs::read_to_string(&live).expect("live file before regeneration");

    render::regenerate(&session, ENV).expect("regenerate");

    let backups_dir = tmp.path().join("prov-inventories/qa_east/backups");
    let backups: Vec<_> = fs::read_dir(&backups_dir)
        .expect("backups dir")
        .map(|e| e.expect("entry"))
        .collect();
    assert_eq!(backups.len(), 1);
    let backup_name = backups[0].file_name().to_string_lossy().to_string();
    let suffix = backup_name
        .strip_prefix("qa_east.inventory.")
        .expect("backup name carries the inventory prefix");
    assert!(suffix.parse::<u64>().is_ok());
    assert_eq!(
        fs::read_to_string(backups[0].path()).expect("backup content"),
        before
    );

    // Single-group environment, so the rendered order is pinned.
    let expected = format!(
        "{INVENTORY_HEADER}# Default Group for all members in {ENV}\n[qa_east_all]\nweb01\n\n\n\n"
    );
    assert_eq!(fs::read_to_string(&live).expect("live file"), expected);
}

#[test]
fn regenerate_with_a_missing_live_file_is_fatal() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let session = StoreSession::open(&cfg, Datastore::Provisioner).expect("open session");
    provision::add_environment(&session, &cfg, ENV).expect("add environment");

    let live = tmp.path().join("prov-inventories/qa_east/qa_east.inventory");
    fs::remove_file(&live).expect("drop live file");

    let err = render::regenerate(&session, ENV).expect_err("missing live file must fail");
    assert!(matches!(err, QmError::Io(_)));
}

#[test]
fn regenerate_for_an_unregistered_environment_is_fatal() {
    let tmp = tempdir().expect("tempdir");
    let cfg = test_config(tmp.path());
    let session = StoreSession::open(&cfg, Datastore::Provisioner).expect("open session");

    let err = render::regenerate(&session, ENV).expect_err("unregistered environment must fail");
    assert!(matches!(err, QmError::NotFound(_)));
}
