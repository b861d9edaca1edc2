//! Group models.

use serde::{Deserialize, Serialize};

use crate::core::membership::Member;
use crate::core::remote::RemoteGroup;
use crate::core::types::GroupId;

/// Desired shape of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>, members: Vec<Member>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

/// Observed state of a group. Members are sorted by user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<Member>,
}

impl Group {
    /// User ids of members flagged as managers.
    pub fn managers(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| m.manager)
            .map(|m| m.user_id.as_str())
            .collect()
    }
}

impl From<RemoteGroup> for Group {
    fn from(g: RemoteGroup) -> Self {
        let mut members: Vec<Member> = g
            .memberships
            .into_iter()
            .map(|m| Member::new(m.user_id, m.is_manager))
            .collect();
        members.sort();
        Self {
            id: g.id,
            name: g.name,
            members,
        }
    }
}
