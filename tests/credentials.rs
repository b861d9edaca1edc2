//! Credential record reconciliation tests.

mod support;
use support::*;

use latchkey::{Call, Error, FolderSpec, Reconcile, RemoteError};

#[test]
fn test_create_then_read_converges() {
    let t = Test::new();
    let creds = t.provider.credentials();
    let desired = db_credential();

    let created = creds.create(&desired).unwrap();
    let read = creds.read(&created.id, Some(&created)).unwrap().unwrap();

    assert_eq!(read.name, desired.name);
    assert_eq!(read.username, desired.username);
    assert_eq!(read.uri, desired.uri);
    assert_eq!(read.description, desired.description);
    assert_eq!(read.secret.as_ref(), Some(&desired.secret));
    assert_eq!(read, created);
}

#[test]
fn test_withheld_secret_is_not_blanked() {
    let t = Test::new();
    let creds = t.provider.credentials();
    let created = creds.create(&db_credential()).unwrap();
    t.remote().withhold_secrets(true);

    let read = creds.read(&created.id, Some(&created)).unwrap().unwrap();
    assert_eq!(read.secret.as_deref().map(String::as_str), Some(DB_SECRET));
}

#[test]
fn test_replace_returns_new_id() {
    let t = Test::new();
    let creds = t.provider.credentials();
    let created = creds.create(&db_credential()).unwrap();

    let desired = db_credential().described("primary database, rotated");
    let updated = creds.update(&created.id, &desired, &created).unwrap();

    assert_ne!(updated.id, created.id);
    assert!(creds.read(&created.id, None).unwrap().is_none());
    let read = creds.read(&updated.id, Some(&updated)).unwrap().unwrap();
    assert_eq!(read.description.as_deref(), Some("primary database, rotated"));
}

#[test]
fn test_failed_recreate_is_called_out() {
    let t = Test::new();
    let creds = t.provider.credentials();
    let created = creds.create(&db_credential()).unwrap();
    t.remote().fail_on(
        Call::CreateResource,
        RemoteError::Unavailable("gateway timeout".to_string()),
    );

    let mut desired = db_credential();
    desired.username = "admin".to_string();
    let err = creds.update(&created.id, &desired, &created).unwrap_err();

    match &err {
        Error::ReplaceIncomplete { token, cause, .. } => {
            assert_eq!(token, &created.id);
            assert!(cause.contains("gateway timeout"));
        }
        other => panic!("expected ReplaceIncomplete, got {:?}", other),
    }
    assert!(err.to_string().contains("absent remotely"));
    assert!(creds.read(&created.id, Some(&created)).unwrap().is_none());
}

#[test]
fn test_share_failure_after_replace_keeps_one_record() {
    let t = Test::new();
    t.group("ops");
    let creds = t.provider.credentials();
    let created = creds.create(&db_credential().shared_with("ops")).unwrap();
    t.remote().fail_on(
        Call::ShareResource,
        RemoteError::Unavailable("gateway timeout".to_string()),
    );

    let mut desired = db_credential().shared_with("ops");
    desired.username = "admin".to_string();
    let err = creds.update(&created.id, &desired, &created).unwrap_err();

    assert!(err.to_string().contains(&created.id));
    let new_id = err.new_id().unwrap().to_string();
    assert!(creds.read(&created.id, Some(&created)).unwrap().is_none());

    // Continuing from the reported id converges without another create.
    let current = creds.read(&new_id, None).unwrap().unwrap();
    let converged = creds.update(&new_id, &desired, &current).unwrap();

    assert_eq!(converged.id, new_id);
    assert_eq!(converged.share_group.as_deref(), Some("ops"));
    assert_eq!(t.remote().count(Call::CreateResource), 2);
}

#[test]
fn test_share_failure_after_create_hands_back_id() {
    let t = Test::new();
    t.group("ops");
    let creds = t.provider.credentials();
    t.remote().fail_on(
        Call::ShareResource,
        RemoteError::Rejected("permission denied".to_string()),
    );

    let err = creds.create(&db_credential().shared_with("ops")).unwrap_err();

    assert!(matches!(err, Error::PartiallyApplied { .. }));
    let new_id = err.new_id().unwrap();
    assert!(creds.read(new_id, None).unwrap().is_some());
    assert_eq!(t.remote().count(Call::CreateResource), 1);
}

#[test]
fn test_folder_change_moves_without_replace() {
    let t = Test::new();
    let infra = t.provider.folders().create(&FolderSpec::new("Infra")).unwrap();
    let creds = t.provider.credentials();
    let created = creds.create(&db_credential()).unwrap();
    t.quiet();

    let updated = creds
        .update(&created.id, &db_credential().in_folder("Infra"), &created)
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.folder_id, Some(infra.id));
    assert_eq!(t.remote().count(Call::DeleteResource), 0);
    assert_eq!(t.remote().count(Call::MoveResource), 1);
}

#[test]
fn test_unresolved_folder_leaves_record_untouched() {
    let t = Test::new();
    let creds = t.provider.credentials();
    let created = creds.create(&db_credential()).unwrap();
    t.quiet();

    let mut desired = db_credential().in_folder("Missing");
    desired.name = "db-renamed".to_string();
    let err = creds.update(&created.id, &desired, &created).unwrap_err();

    assert!(matches!(err, Error::ReferenceNotFound { .. }));
    assert!(t.remote().mutations().is_empty());
    assert!(t.remote().resource(&created.id).is_some());
}

#[test]
fn test_share_group_on_create() {
    let t = Test::new();
    let ops = t.group("ops");
    let creds = t.provider.credentials();

    let created = creds.create(&db_credential().shared_with("ops")).unwrap();
    assert_eq!(created.share_group.as_deref(), Some("ops"));

    let perms = t.remote().resource_permissions(&created.id);
    assert!(perms.iter().any(|p| p.aro_foreign_key == ops && p.level == 7));

    // Sharing is not read back, so it is carried from the prior state.
    let read = creds.read(&created.id, Some(&created)).unwrap().unwrap();
    assert_eq!(read.share_group.as_deref(), Some("ops"));
}

#[test]
fn test_delete_twice() {
    let t = Test::new();
    let creds = t.provider.credentials();
    let created = creds.create(&db_credential()).unwrap();

    assert!(creds.delete(&created.id).is_ok());
    assert!(creds.delete(&created.id).is_ok());
}
