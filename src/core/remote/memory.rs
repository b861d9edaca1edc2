//! In-memory remote vault.
//!
//! Behaves like the real service for everything reconcilers depend on:
//! listing order is creation order, identifiers are fresh UUIDs, missing
//! entities report `NotFound`, and invalid mutations are rejected. Every
//! call is recorded so tests can assert which remote calls a reconciliation
//! issued, and failures can be injected per call.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::{
    Aro, MembershipOp, NewFolder, NewResource, NewUser, Remote, RemoteFolder, RemoteGroup,
    RemoteMembership, RemotePermission, RemoteResource, RemoteResult, RemoteUser, Share,
};
use crate::core::constants::{LEVEL_OWNER, LEVEL_READ, LEVEL_REVOKE, LEVEL_UPDATE};
use crate::error::RemoteError;

const FOLDER_MISSING: &str = "The folder does not exist.";
const RESOURCE_MISSING: &str = "The resource does not exist.";
const GROUP_MISSING: &str = "The group does not exist.";
const USER_MISSING: &str = "The user does not exist.";
const ROLES: &[&str] = &["user", "admin"];

/// A recorded remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    ListFolders,
    CreateFolder,
    UpdateFolder,
    MoveFolder,
    DeleteFolder,
    ShareFolder,
    GetResource,
    CreateResource,
    MoveResource,
    ShareResource,
    DeleteResource,
    ListGroups,
    GetGroup,
    CreateGroup,
    UpdateGroup,
    DeleteGroup,
    ListUsers,
    CreateUser,
    UpdateUser,
    DeleteUser,
}

impl Call {
    /// Whether the call changes remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::ListFolders
                | Self::GetResource
                | Self::ListGroups
                | Self::GetGroup
                | Self::ListUsers
        )
    }
}

#[derive(Default)]
struct State {
    folders: Vec<RemoteFolder>,
    resources: Vec<StoredResource>,
    groups: Vec<RemoteGroup>,
    users: Vec<RemoteUser>,
}

struct StoredResource {
    resource: RemoteResource,
    permissions: Vec<RemotePermission>,
}

/// A queued failure: `call` succeeds `skip` more times, then fails.
struct Failure {
    call: Call,
    skip: usize,
    error: RemoteError,
}

/// In-memory implementation of [`Remote`].
pub struct MemoryRemote {
    session_user: String,
    state: Mutex<State>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<Failure>>,
    withhold_secrets: AtomicBool,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRemote")
            .field("session_user", &self.session_user)
            .field("calls", &self.lock_calls().len())
            .finish_non_exhaustive()
    }
}

impl MemoryRemote {
    /// Create an empty vault with a fresh session user.
    pub fn new() -> Self {
        Self {
            session_user: Uuid::new_v4().to_string(),
            state: Mutex::new(State::default()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            withhold_secrets: AtomicBool::new(false),
        }
    }

    /// Identifier of the authenticated session user.
    pub fn session_user(&self) -> &str {
        &self.session_user
    }

    /// Insert a user directly, without recording a call.
    pub fn seed_user(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
        role: &str,
    ) -> RemoteUser {
        let user = RemoteUser {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role: role.to_string(),
        };
        self.lock_state().users.push(user.clone());
        user
    }

    /// Insert a group directly, without recording a call.
    pub fn seed_group(&self, name: &str, managers: &[&str]) -> RemoteGroup {
        let group = RemoteGroup {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            memberships: managers
                .iter()
                .map(|id| RemoteMembership {
                    user_id: id.to_string(),
                    is_manager: true,
                })
                .collect(),
        };
        self.lock_state().groups.push(group.clone());
        group
    }

    /// Insert a folder directly, without recording a call.
    pub fn seed_folder(&self, name: &str, parent: Option<&str>) -> RemoteFolder {
        let folder = self.new_folder(name, parent.map(str::to_string), false);
        self.lock_state().folders.push(folder.clone());
        folder
    }

    /// Insert a credential record directly, skipping folder checks.
    ///
    /// Stands in for records written by other clients, which may report an
    /// empty parent for the top level.
    pub fn seed_resource(
        &self,
        name: &str,
        folder_parent_id: Option<&str>,
        secret: &str,
    ) -> RemoteResource {
        let resource = RemoteResource {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            username: String::new(),
            uri: String::new(),
            description: String::new(),
            folder_parent_id: folder_parent_id.map(str::to_string),
            secret: Some(Zeroizing::new(secret.to_string())),
        };
        self.lock_state().resources.push(StoredResource {
            resource: resource.clone(),
            permissions: vec![RemotePermission {
                aro: Aro::User,
                aro_foreign_key: self.session_user.clone(),
                level: LEVEL_OWNER,
            }],
        });
        resource
    }

    /// Set a permission entry on a folder directly, skipping level checks.
    ///
    /// Stands in for grants made by other clients, including levels this
    /// crate never writes.
    pub fn seed_folder_permission(&self, folder_id: &str, aro: Aro, aro_id: &str, level: i32) {
        let mut state = self.lock_state();
        if let Some(folder) = state.folders.iter_mut().find(|f| f.id == folder_id) {
            folder
                .permissions
                .retain(|p| !(p.aro == aro && p.aro_foreign_key == aro_id));
            folder.permissions.push(RemotePermission {
                aro,
                aro_foreign_key: aro_id.to_string(),
                level,
            });
        }
    }

    /// Make the next `call` fail with `error`. Injections queue in order.
    pub fn fail_on(&self, call: Call, error: RemoteError) {
        self.fail_after(call, 0, error);
    }

    /// Let `call` succeed `skip` times, then fail once with `error`.
    pub fn fail_after(&self, call: Call, skip: usize, error: RemoteError) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Failure { call, skip, error });
    }

    /// Stop (or resume) returning secrets from `get_resource`.
    pub fn withhold_secrets(&self, withhold: bool) {
        self.withhold_secrets.store(withhold, Ordering::SeqCst);
    }

    /// Every call recorded so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock_calls().clone()
    }

    /// Recorded calls that changed remote state.
    pub fn mutations(&self) -> Vec<Call> {
        self.lock_calls()
            .iter()
            .copied()
            .filter(Call::is_mutation)
            .collect()
    }

    /// Number of times `call` was issued.
    pub fn count(&self, call: Call) -> usize {
        self.lock_calls().iter().filter(|c| **c == call).count()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        self.lock_calls().clear();
    }

    /// Snapshot of a folder, bypassing call recording.
    pub fn folder(&self, id: &str) -> Option<RemoteFolder> {
        self.lock_state().folders.iter().find(|f| f.id == id).cloned()
    }

    /// Snapshot of a credential record, bypassing call recording.
    pub fn resource(&self, id: &str) -> Option<RemoteResource> {
        self.lock_state()
            .resources
            .iter()
            .find(|r| r.resource.id == id)
            .map(|r| r.resource.clone())
    }

    /// Permissions of a credential record, bypassing call recording.
    pub fn resource_permissions(&self, id: &str) -> Vec<RemotePermission> {
        self.lock_state()
            .resources
            .iter()
            .find(|r| r.resource.id == id)
            .map(|r| r.permissions.clone())
            .unwrap_or_default()
    }

    /// Snapshot of a group, bypassing call recording.
    pub fn group(&self, id: &str) -> Option<RemoteGroup> {
        self.lock_state().groups.iter().find(|g| g.id == id).cloned()
    }

    /// Snapshot of a user, bypassing call recording.
    pub fn user(&self, id: &str) -> Option<RemoteUser> {
        self.lock_state().users.iter().find(|u| u.id == id).cloned()
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record `call` and return an injected failure if one is queued for it.
    fn enter(&self, call: Call) -> RemoteResult<()> {
        self.lock_calls().push(call);
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        let Some(pos) = failures.iter().position(|f| f.call == call) else {
            return Ok(());
        };
        if failures[pos].skip > 0 {
            failures[pos].skip -= 1;
            return Ok(());
        }
        match failures.remove(pos) {
            Some(failure) => Err(failure.error),
            None => Ok(()),
        }
    }

    fn new_folder(&self, name: &str, parent: Option<String>, personal: bool) -> RemoteFolder {
        let now = Utc::now();
        RemoteFolder {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            folder_parent_id: parent,
            personal,
            created: now,
            modified: now,
            created_by: self.session_user.clone(),
            modified_by: self.session_user.clone(),
            permissions: vec![RemotePermission {
                aro: Aro::User,
                aro_foreign_key: self.session_user.clone(),
                level: LEVEL_OWNER,
            }],
        }
    }
}

fn rejected(msg: impl Into<String>) -> RemoteError {
    RemoteError::Rejected(msg.into())
}

fn not_found(msg: &str) -> RemoteError {
    RemoteError::NotFound(msg.to_string())
}

fn require_name(name: &str) -> RemoteResult<()> {
    if name.trim().is_empty() {
        return Err(rejected("name cannot be empty"));
    }
    Ok(())
}

fn require_role(role: &str) -> RemoteResult<()> {
    if !ROLES.contains(&role) {
        return Err(rejected(format!("role '{}' does not exist", role)));
    }
    Ok(())
}

/// Apply shares to a permission list. Level `-1` removes the grantee.
fn apply_shares(permissions: &mut Vec<RemotePermission>, shares: &[Share]) -> RemoteResult<()> {
    for share in shares {
        let known = [LEVEL_READ, LEVEL_UPDATE, LEVEL_OWNER].contains(&share.level);
        if share.level != LEVEL_REVOKE && !known {
            return Err(rejected(format!("invalid permission type {}", share.level)));
        }
    }
    for share in shares {
        let existing = permissions
            .iter()
            .position(|p| p.aro == share.aro && p.aro_foreign_key == share.aro_id);
        match (existing, share.level) {
            (Some(pos), LEVEL_REVOKE) => {
                permissions.remove(pos);
            }
            (None, LEVEL_REVOKE) => {}
            (Some(pos), level) => permissions[pos].level = level,
            (None, level) => permissions.push(RemotePermission {
                aro: share.aro,
                aro_foreign_key: share.aro_id.clone(),
                level,
            }),
        }
    }
    Ok(())
}

/// Whether `candidate` is `folder` itself or one of its descendants.
fn is_within(folders: &[RemoteFolder], candidate: &str, folder: &str) -> bool {
    let mut cursor = Some(candidate.to_string());
    while let Some(id) = cursor {
        if id == folder {
            return true;
        }
        cursor = folders
            .iter()
            .find(|f| f.id == id)
            .and_then(|f| f.folder_parent_id.clone());
    }
    false
}

impl State {
    fn folder_mut(&mut self, id: &str) -> RemoteResult<&mut RemoteFolder> {
        self.folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| not_found(FOLDER_MISSING))
    }

    fn require_parent(&self, parent: Option<&str>) -> RemoteResult<()> {
        match parent {
            Some(id) if !self.folders.iter().any(|f| f.id == id) => {
                Err(rejected(format!("parent folder '{}' does not exist", id)))
            }
            _ => Ok(()),
        }
    }

    fn resource_mut(&mut self, id: &str) -> RemoteResult<&mut StoredResource> {
        self.resources
            .iter_mut()
            .find(|r| r.resource.id == id)
            .ok_or_else(|| not_found(RESOURCE_MISSING))
    }

    fn require_group_name_free(&self, name: &str, except: Option<&str>) -> RemoteResult<()> {
        let taken = self
            .groups
            .iter()
            .any(|g| g.name == name && Some(g.id.as_str()) != except);
        if taken {
            return Err(rejected(format!("a group named '{}' already exists", name)));
        }
        Ok(())
    }

    fn apply_membership(
        &self,
        memberships: &mut Vec<RemoteMembership>,
        ops: &[MembershipOp],
    ) -> RemoteResult<()> {
        for op in ops {
            match op {
                MembershipOp::Set { user_id, is_manager } => {
                    if !self.users.iter().any(|u| &u.id == user_id) {
                        return Err(rejected(format!("user '{}' does not exist", user_id)));
                    }
                    match memberships.iter_mut().find(|m| &m.user_id == user_id) {
                        Some(m) => m.is_manager = *is_manager,
                        None => memberships.push(RemoteMembership {
                            user_id: user_id.clone(),
                            is_manager: *is_manager,
                        }),
                    }
                }
                MembershipOp::Remove { user_id } => {
                    let before = memberships.len();
                    memberships.retain(|m| &m.user_id != user_id);
                    if memberships.len() == before {
                        return Err(rejected(format!("user '{}' is not a member", user_id)));
                    }
                }
            }
        }
        if !memberships.iter().any(|m| m.is_manager) {
            return Err(rejected("a group needs at least one group manager"));
        }
        Ok(())
    }
}

impl Remote for MemoryRemote {
    fn list_folders(&self, with_permissions: bool) -> RemoteResult<Vec<RemoteFolder>> {
        self.enter(Call::ListFolders)?;
        let folders = self.lock_state().folders.clone();
        Ok(folders
            .into_iter()
            .map(|mut f| {
                if !with_permissions {
                    f.permissions.clear();
                }
                f
            })
            .collect())
    }

    fn create_folder(&self, folder: &NewFolder) -> RemoteResult<RemoteFolder> {
        self.enter(Call::CreateFolder)?;
        require_name(&folder.name)?;
        let mut state = self.lock_state();
        state.require_parent(folder.folder_parent_id.as_deref())?;
        let created =
            self.new_folder(&folder.name, folder.folder_parent_id.clone(), folder.personal);
        state.folders.push(created.clone());
        Ok(created)
    }

    fn update_folder(&self, id: &str, name: &str) -> RemoteResult<RemoteFolder> {
        self.enter(Call::UpdateFolder)?;
        require_name(name)?;
        let mut state = self.lock_state();
        let folder = state.folder_mut(id)?;
        folder.name = name.to_string();
        folder.modified = Utc::now();
        folder.modified_by = self.session_user.clone();
        Ok(folder.clone())
    }

    fn move_folder(&self, id: &str, parent: Option<&str>) -> RemoteResult<()> {
        self.enter(Call::MoveFolder)?;
        let mut state = self.lock_state();
        state.folder_mut(id)?;
        state.require_parent(parent)?;
        if let Some(parent) = parent {
            if is_within(&state.folders, parent, id) {
                return Err(rejected("a folder cannot be moved into itself or its descendants"));
            }
        }
        let folder = state.folder_mut(id)?;
        folder.folder_parent_id = parent.map(str::to_string);
        folder.modified = Utc::now();
        Ok(())
    }

    fn delete_folder(&self, id: &str) -> RemoteResult<()> {
        self.enter(Call::DeleteFolder)?;
        let mut state = self.lock_state();
        let before = state.folders.len();
        state.folders.retain(|f| f.id != id);
        if state.folders.len() == before {
            return Err(not_found(FOLDER_MISSING));
        }
        // Contents move to the top level rather than being deleted.
        for folder in state.folders.iter_mut() {
            if folder.folder_parent_id.as_deref() == Some(id) {
                folder.folder_parent_id = None;
            }
        }
        for stored in state.resources.iter_mut() {
            if stored.resource.folder_parent_id.as_deref() == Some(id) {
                stored.resource.folder_parent_id = None;
            }
        }
        Ok(())
    }

    fn share_folder(&self, id: &str, shares: &[Share]) -> RemoteResult<()> {
        self.enter(Call::ShareFolder)?;
        let mut state = self.lock_state();
        let folder = state.folder_mut(id)?;
        apply_shares(&mut folder.permissions, shares)
    }

    fn get_resource(&self, id: &str) -> RemoteResult<RemoteResource> {
        self.enter(Call::GetResource)?;
        let mut state = self.lock_state();
        let mut resource = state.resource_mut(id)?.resource.clone();
        if self.withhold_secrets.load(Ordering::SeqCst) {
            resource.secret = None;
        }
        Ok(resource)
    }

    fn create_resource(&self, resource: &NewResource) -> RemoteResult<RemoteResource> {
        self.enter(Call::CreateResource)?;
        require_name(&resource.name)?;
        let mut state = self.lock_state();
        if let Some(folder) = resource.folder_parent_id.as_deref() {
            if !state.folders.iter().any(|f| f.id == folder) {
                return Err(rejected(format!("folder '{}' does not exist", folder)));
            }
        }
        let created = RemoteResource {
            id: Uuid::new_v4().to_string(),
            name: resource.name.clone(),
            username: resource.username.clone(),
            uri: resource.uri.clone(),
            description: resource.description.clone(),
            folder_parent_id: resource.folder_parent_id.clone(),
            secret: Some(resource.secret.clone()),
        };
        state.resources.push(StoredResource {
            resource: created.clone(),
            permissions: vec![RemotePermission {
                aro: Aro::User,
                aro_foreign_key: self.session_user.clone(),
                level: LEVEL_OWNER,
            }],
        });
        Ok(created)
    }

    fn move_resource(&self, id: &str, folder: Option<&str>) -> RemoteResult<()> {
        self.enter(Call::MoveResource)?;
        let mut state = self.lock_state();
        state.require_parent(folder)?;
        state.resource_mut(id)?.resource.folder_parent_id = folder.map(str::to_string);
        Ok(())
    }

    fn share_resource(&self, id: &str, shares: &[Share]) -> RemoteResult<()> {
        self.enter(Call::ShareResource)?;
        let mut state = self.lock_state();
        for share in shares {
            if share.aro == Aro::Group && !state.groups.iter().any(|g| g.id == share.aro_id) {
                return Err(rejected(format!("group '{}' does not exist", share.aro_id)));
            }
        }
        let stored = state.resource_mut(id)?;
        apply_shares(&mut stored.permissions, shares)
    }

    fn delete_resource(&self, id: &str) -> RemoteResult<()> {
        self.enter(Call::DeleteResource)?;
        let mut state = self.lock_state();
        let before = state.resources.len();
        state.resources.retain(|r| r.resource.id != id);
        if state.resources.len() == before {
            return Err(not_found(RESOURCE_MISSING));
        }
        Ok(())
    }

    fn list_groups(&self) -> RemoteResult<Vec<RemoteGroup>> {
        self.enter(Call::ListGroups)?;
        Ok(self.lock_state().groups.clone())
    }

    fn get_group(&self, id: &str) -> RemoteResult<RemoteGroup> {
        self.enter(Call::GetGroup)?;
        self.lock_state()
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| not_found(GROUP_MISSING))
    }

    fn create_group(&self, name: &str, ops: &[MembershipOp]) -> RemoteResult<RemoteGroup> {
        self.enter(Call::CreateGroup)?;
        require_name(name)?;
        let mut state = self.lock_state();
        state.require_group_name_free(name, None)?;
        let mut memberships = Vec::new();
        state.apply_membership(&mut memberships, ops)?;
        let group = RemoteGroup {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            memberships,
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    fn update_group(
        &self,
        id: &str,
        name: &str,
        ops: &[MembershipOp],
    ) -> RemoteResult<RemoteGroup> {
        self.enter(Call::UpdateGroup)?;
        require_name(name)?;
        let mut state = self.lock_state();
        let pos = state
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| not_found(GROUP_MISSING))?;
        state.require_group_name_free(name, Some(id))?;
        let mut memberships = state.groups[pos].memberships.clone();
        state.apply_membership(&mut memberships, ops)?;
        let group = &mut state.groups[pos];
        group.name = name.to_string();
        group.memberships = memberships;
        Ok(group.clone())
    }

    fn delete_group(&self, id: &str) -> RemoteResult<()> {
        self.enter(Call::DeleteGroup)?;
        let mut state = self.lock_state();
        let before = state.groups.len();
        state.groups.retain(|g| g.id != id);
        if state.groups.len() == before {
            return Err(not_found(GROUP_MISSING));
        }
        // Grants held by the group disappear with it.
        for folder in state.folders.iter_mut() {
            folder
                .permissions
                .retain(|p| !(p.aro == Aro::Group && p.aro_foreign_key == id));
        }
        for stored in state.resources.iter_mut() {
            stored
                .permissions
                .retain(|p| !(p.aro == Aro::Group && p.aro_foreign_key == id));
        }
        Ok(())
    }

    fn list_users(&self, search: Option<&str>) -> RemoteResult<Vec<RemoteUser>> {
        self.enter(Call::ListUsers)?;
        let users = self.lock_state().users.clone();
        let Some(search) = search.map(str::to_lowercase) else {
            return Ok(users);
        };
        Ok(users
            .into_iter()
            .filter(|u| {
                u.username.to_lowercase().contains(&search)
                    || u.first_name.to_lowercase().contains(&search)
                    || u.last_name.to_lowercase().contains(&search)
            })
            .collect())
    }

    fn create_user(&self, user: &NewUser) -> RemoteResult<RemoteUser> {
        self.enter(Call::CreateUser)?;
        require_name(&user.username)?;
        require_role(&user.role)?;
        let mut state = self.lock_state();
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(rejected(format!("username '{}' is already in use", user.username)));
        }
        let created = RemoteUser {
            id: Uuid::new_v4().to_string(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role.clone(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    fn update_user(
        &self,
        id: &str,
        role: &str,
        first_name: &str,
        last_name: &str,
    ) -> RemoteResult<RemoteUser> {
        self.enter(Call::UpdateUser)?;
        require_role(role)?;
        let mut state = self.lock_state();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| not_found(USER_MISSING))?;
        user.role = role.to_string();
        user.first_name = first_name.to_string();
        user.last_name = last_name.to_string();
        Ok(user.clone())
    }

    fn delete_user(&self, id: &str) -> RemoteResult<()> {
        self.enter(Call::DeleteUser)?;
        let mut state = self.lock_state();
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(not_found(USER_MISSING));
        }
        for group in state.groups.iter_mut() {
            group.memberships.retain(|m| m.user_id != id);
        }
        Ok(())
    }
}
