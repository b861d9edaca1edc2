//! Folder permission grant tests.

mod support;
use support::*;

use latchkey::core::remote::Aro;
use latchkey::{Error, FolderSpec, GrantSpec, Reconcile};

fn folder(t: &Test, name: &str) -> String {
    t.provider.folders().create(&FolderSpec::new(name)).unwrap().id
}

#[test]
fn test_revoke_reads_absent() {
    let t = Test::new();
    t.group("ops");
    let f = folder(&t, "Infra");
    let grants = t.provider.folder_permissions();

    let owner = grants.create(&GrantSpec::new(&f, "ops", "owner")).unwrap();
    assert_eq!(grants.read(&owner.id, Some(&owner)).unwrap().unwrap().permission, "owner");

    grants
        .update(&owner.id, &GrantSpec::new(&f, "ops", "delete"), &owner)
        .unwrap();
    assert!(grants.read(&owner.id, Some(&owner)).unwrap().is_none());
}

#[test]
fn test_level_change() {
    let t = Test::new();
    t.group("ops");
    let f = folder(&t, "Infra");
    let grants = t.provider.folder_permissions();
    let read_grant = grants.create(&GrantSpec::new(&f, "ops", "read")).unwrap();

    let updated = grants
        .update(&read_grant.id, &GrantSpec::new(&f, "ops", "update"), &read_grant)
        .unwrap();
    assert_eq!(updated.id, read_grant.id);
    assert_eq!(grants.read(&updated.id, None).unwrap().unwrap().permission, "update");
}

#[test]
fn test_import_reconstructs_grant() {
    let t = Test::new();
    let ops = t.group("ops");
    let f = folder(&t, "Infra");
    t.remote().seed_folder_permission(&f, Aro::Group, &ops, 15);

    let grant = t
        .provider
        .folder_permissions()
        .read(&format!("{}:ops", f), None)
        .unwrap()
        .unwrap();
    assert_eq!(grant.folder_id, f);
    assert_eq!(grant.group, "ops");
    assert_eq!(grant.permission, "owner");
}

#[test]
fn test_import_group_name_with_colon() {
    let t = Test::new();
    let group = t.group("team:ops");
    let f = folder(&t, "Infra");
    t.remote().seed_folder_permission(&f, Aro::Group, &group, 1);

    let grant = t
        .provider
        .folder_permissions()
        .read(&format!("{}:team:ops", f), None)
        .unwrap()
        .unwrap();
    assert_eq!(grant.group, "team:ops");
    assert_eq!(grant.permission, "read");
}

#[test]
fn test_malformed_import_id() {
    let t = Test::new();
    let err = t
        .provider
        .folder_permissions()
        .read("just-a-folder-id", None)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidImportId { .. }));
    let msg = err.to_string();
    assert!(msg.contains("folder permission 'just-a-folder-id'"));
    assert!(msg.contains("<folder_id>:<group_name>"));
    assert!(t.remote().calls().is_empty());
}

#[test]
fn test_unrecognized_level_reads_unknown() {
    let t = Test::new();
    let ops = t.group("ops");
    let f = folder(&t, "Infra");
    t.remote().seed_folder_permission(&f, Aro::Group, &ops, 31);

    let grant = t
        .provider
        .folder_permissions()
        .read(&format!("{}:ops", f), None)
        .unwrap()
        .unwrap();
    assert_eq!(grant.permission, "unknown");
}

#[test]
fn test_invalid_level_names_value() {
    let t = Test::new();
    t.group("ops");
    let f = folder(&t, "Infra");
    t.quiet();

    let err = t
        .provider
        .folder_permissions()
        .create(&GrantSpec::new(&f, "ops", "bogus"))
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("bogus"));
    assert!(msg.contains("read, update, owner, delete"));
    assert!(t.remote().mutations().is_empty());
}

#[test]
fn test_group_deletion_removes_grant() {
    let t = Test::new();
    let ops = t.group("ops");
    let f = folder(&t, "Infra");
    let grants = t.provider.folder_permissions();
    let grant = grants.create(&GrantSpec::new(&f, "ops", "update")).unwrap();

    t.provider.groups().delete(&ops).unwrap();
    assert!(grants.read(&grant.id, Some(&grant)).unwrap().is_none());
    assert!(grants.delete(&grant.id).is_ok());
}

#[test]
fn test_delete_twice() {
    let t = Test::new();
    t.group("ops");
    let f = folder(&t, "Infra");
    let grants = t.provider.folder_permissions();
    let grant = grants.create(&GrantSpec::new(&f, "ops", "read")).unwrap();

    assert!(grants.delete(&grant.id).is_ok());
    assert!(grants.delete(&grant.id).is_ok());
    assert!(grants.read(&grant.id, None).unwrap().is_none());
}
