//! Membership diff.
//!
//! Compares desired and observed group membership as sets. The diff is a
//! pure function of its inputs: identical inputs always give identical
//! output, and a converged group gives an empty diff.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::remote::MembershipOp;
use crate::core::types::UserId;

/// A group member and whether they manage the group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    #[serde(default)]
    pub manager: bool,
}

impl Member {
    pub fn new(user_id: impl Into<UserId>, manager: bool) -> Self {
        Self {
            user_id: user_id.into(),
            manager,
        }
    }

    pub fn manager(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id, true)
    }

    pub fn regular(user_id: impl Into<UserId>) -> Self {
        Self::new(user_id, false)
    }
}

/// Set-level additions and removals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    /// Members in desired but not observed.
    pub to_add: BTreeSet<UserId>,
    /// Members in observed but not desired.
    pub to_remove: BTreeSet<UserId>,
}

impl MembershipDiff {
    /// Compute the diff between desired and observed member ids.
    pub fn compute(desired: &BTreeSet<UserId>, observed: &BTreeSet<UserId>) -> Self {
        Self {
            to_add: desired.difference(observed).cloned().collect(),
            to_remove: observed.difference(desired).cloned().collect(),
        }
    }

    /// Whether membership has already converged.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Convenience wrapper over [`MembershipDiff::compute`].
pub fn diff(desired: &BTreeSet<UserId>, observed: &BTreeSet<UserId>) -> MembershipDiff {
    MembershipDiff::compute(desired, observed)
}

/// The first user id listed more than once, if any.
pub fn duplicate(members: &[Member]) -> Option<&UserId> {
    let mut seen = BTreeSet::new();
    members
        .iter()
        .map(|m| &m.user_id)
        .find(|id| !seen.insert(*id))
}

/// Collapse a member list into a map keyed by user id.
///
/// Callers reject lists with a [`duplicate`] first; otherwise the last flag
/// given for a user wins.
pub fn by_user(members: &[Member]) -> BTreeMap<UserId, bool> {
    members
        .iter()
        .map(|m| (m.user_id.clone(), m.manager))
        .collect()
}

/// Remote operations that converge `observed` onto `desired`.
///
/// Set-level additions carry their desired manager flag; removals follow.
/// Members kept on both sides whose manager flag differs are updated in
/// place. Output order is deterministic: sets, then removes, then flag
/// changes, each sorted by user id.
pub fn plan(desired: &[Member], observed: &[Member]) -> Vec<MembershipOp> {
    let desired = by_user(desired);
    let observed = by_user(observed);

    let desired_ids: BTreeSet<UserId> = desired.keys().cloned().collect();
    let observed_ids: BTreeSet<UserId> = observed.keys().cloned().collect();
    let delta = MembershipDiff::compute(&desired_ids, &observed_ids);

    let mut ops = Vec::with_capacity(delta.to_add.len() + delta.to_remove.len());

    for user_id in delta.to_add {
        let is_manager = desired.get(&user_id).copied().unwrap_or(false);
        ops.push(MembershipOp::Set { user_id, is_manager });
    }
    for user_id in delta.to_remove {
        ops.push(MembershipOp::Remove { user_id });
    }
    for (user_id, is_manager) in &desired {
        if let Some(current) = observed.get(user_id) {
            if current != is_manager {
                ops.push(MembershipOp::Set {
                    user_id: user_id.clone(),
                    is_manager: *is_manager,
                });
            }
        }
    }

    ops
}
