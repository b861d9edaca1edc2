//! Group reconciliation.

use tracing::{debug, info, warn};

use super::{absent_ok, found, Reconcile};
use crate::core::domain::{Group, GroupSpec};
use crate::core::membership;
use crate::core::remote::{MembershipOp, Remote};
use crate::error::{Action, Error, Kind, Result};

/// Reconciles groups and their memberships.
pub struct Groups<'a, R: ?Sized> {
    remote: &'a R,
}

impl<'a, R: Remote + ?Sized> Groups<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }

    fn require_unique(desired: &GroupSpec, token: &str) -> Result<()> {
        match membership::duplicate(&desired.members) {
            Some(user_id) => Err(Error::DuplicateMember {
                kind: Kind::Group,
                token: token.to_string(),
                user_id: user_id.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl<R: Remote + ?Sized> Reconcile for Groups<'_, R> {
    type Desired = GroupSpec;
    type Actual = Group;

    const KIND: Kind = Kind::Group;

    fn create(&self, desired: &GroupSpec) -> Result<Group> {
        Self::require_unique(desired, &desired.name)?;
        let ops = membership::plan(&desired.members, &[]);

        let created = self
            .remote
            .create_group(&desired.name, &ops)
            .map_err(|e| Error::remote(Self::KIND, &desired.name, Action::Create, e))?;

        info!(
            id = %created.id,
            name = %created.name,
            members = created.memberships.len(),
            "created group"
        );
        Ok(Group::from(created))
    }

    fn read(&self, id: &str, _prior: Option<&Group>) -> Result<Option<Group>> {
        match found(Self::KIND, id, Action::Read, self.remote.get_group(id))? {
            Some(group) => {
                debug!(id, name = %group.name, "read group");
                Ok(Some(Group::from(group)))
            }
            None => {
                warn!(id, "group removed out of band");
                Ok(None)
            }
        }
    }

    /// Send only the membership delta. Converged groups issue no calls.
    fn update(&self, id: &str, desired: &GroupSpec, prior: &Group) -> Result<Group> {
        Self::require_unique(desired, id)?;
        let ops = membership::plan(&desired.members, &prior.members);

        if ops.is_empty() && desired.name == prior.name {
            debug!(id, "group already converged");
            let mut current = prior.clone();
            current.id = id.to_string();
            return Ok(current);
        }

        let added = ops
            .iter()
            .filter(|op| matches!(op, MembershipOp::Set { .. }))
            .count();
        let removed = ops.len() - added;

        let updated = self
            .remote
            .update_group(id, &desired.name, &ops)
            .map_err(|e| Error::remote(Self::KIND, id, Action::Update, e))?;

        info!(id, name = %updated.name, set = added, removed, "updated group");
        Ok(Group::from(updated))
    }

    fn delete(&self, id: &str) -> Result<()> {
        absent_ok(Self::KIND, id, Action::Delete, self.remote.delete_group(id))?;
        info!(id, "deleted group");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::membership::Member;
    use crate::core::remote::{Call, MemoryRemote};

    fn users(remote: &MemoryRemote) -> (String, String, String) {
        let a = remote.seed_user("alice@example.com", "Alice", "Doe", "user");
        let b = remote.seed_user("bob@example.com", "Bob", "Doe", "user");
        let c = remote.seed_user("carol@example.com", "Carol", "Doe", "user");
        (a.id, b.id, c.id)
    }

    #[test]
    fn test_create_with_members() {
        let remote = MemoryRemote::new();
        let (a, b, _) = users(&remote);
        let groups = Groups::new(&remote);

        let group = groups
            .create(&GroupSpec::new(
                "ops",
                vec![Member::manager(a.clone()), Member::regular(b.clone())],
            ))
            .unwrap();
        assert_eq!(group.name, "ops");
        assert_eq!(group.members.len(), 2);
        assert_eq!(group.managers(), vec![a.as_str()]);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let remote = MemoryRemote::new();
        let (a, _, _) = users(&remote);
        let groups = Groups::new(&remote);
        let spec = GroupSpec::new("ops", vec![Member::manager(a)]);

        groups.create(&spec).unwrap();
        let err = groups.create(&spec).unwrap_err();
        assert!(matches!(err, Error::RemoteRejected { .. }));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_member_listed_twice_fails_before_any_call() {
        let remote = MemoryRemote::new();
        let (a, b, _) = users(&remote);
        let groups = Groups::new(&remote);
        let twice = vec![
            Member::manager(a.clone()),
            Member::regular(b.clone()),
            Member::manager(b.clone()),
        ];

        let err = groups.create(&GroupSpec::new("ops", twice.clone())).unwrap_err();
        assert!(matches!(err, Error::DuplicateMember { .. }));
        assert!(err.is_validation());
        assert!(err.to_string().contains(&b));
        assert!(remote.calls().is_empty());

        let created = groups
            .create(&GroupSpec::new("ops", vec![Member::manager(a)]))
            .unwrap();
        remote.reset_calls();
        let err = groups
            .update(&created.id, &GroupSpec::new("ops", twice), &created)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateMember { .. }));
        assert!(remote.calls().is_empty());
    }

    #[test]
    fn test_update_sends_only_delta() {
        let remote = MemoryRemote::new();
        let (a, b, c) = users(&remote);
        let groups = Groups::new(&remote);
        let created = groups
            .create(&GroupSpec::new(
                "ops",
                vec![Member::manager(a.clone()), Member::regular(b.clone())],
            ))
            .unwrap();

        let updated = groups
            .update(
                &created.id,
                &GroupSpec::new(
                    "ops",
                    vec![Member::manager(a.clone()), Member::regular(c.clone())],
                ),
                &created,
            )
            .unwrap();

        let ids: Vec<&str> = updated.members.iter().map(|m| m.user_id.as_str()).collect();
        assert!(ids.contains(&a.as_str()));
        assert!(ids.contains(&c.as_str()));
        assert!(!ids.contains(&b.as_str()));
    }

    #[test]
    fn test_update_converged_issues_no_call() {
        let remote = MemoryRemote::new();
        let (a, _, _) = users(&remote);
        let groups = Groups::new(&remote);
        let spec = GroupSpec::new("ops", vec![Member::manager(a)]);
        let created = groups.create(&spec).unwrap();
        remote.reset_calls();

        let updated = groups.update(&created.id, &spec, &created).unwrap();
        assert_eq!(updated, created);
        assert!(remote.calls().is_empty());
    }

    #[test]
    fn test_manager_flag_change_updates_in_place() {
        let remote = MemoryRemote::new();
        let (a, b, _) = users(&remote);
        let groups = Groups::new(&remote);
        let created = groups
            .create(&GroupSpec::new(
                "ops",
                vec![Member::manager(a.clone()), Member::regular(b.clone())],
            ))
            .unwrap();

        let updated = groups
            .update(
                &created.id,
                &GroupSpec::new("ops", vec![Member::manager(a), Member::manager(b.clone())]),
                &created,
            )
            .unwrap();
        assert!(updated.managers().contains(&b.as_str()));
        assert_eq!(remote.count(Call::UpdateGroup), 1);
    }

    #[test]
    fn test_read_and_delete() {
        let remote = MemoryRemote::new();
        let (a, _, _) = users(&remote);
        let groups = Groups::new(&remote);
        let created = groups
            .create(&GroupSpec::new("ops", vec![Member::manager(a)]))
            .unwrap();

        assert_eq!(groups.read(&created.id, None).unwrap(), Some(created.clone()));
        groups.delete(&created.id).unwrap();
        groups.delete(&created.id).unwrap();
        assert!(groups.read(&created.id, Some(&created)).unwrap().is_none());
    }
}
