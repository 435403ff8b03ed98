//! Group membership lookup.
//!
//! The protocol never queries storage itself. Whoever embeds it supplies a
//! [`MembershipLookup`]; [`MembershipRegistry`] is a thread-safe in-memory one.

use crate::types::GroupMembership;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Fetches the membership envelope of `user_id` in `group_id`, if any.
pub trait MembershipLookup {
    fn membership(&self, user_id: &str, group_id: &str) -> Option<GroupMembership>;
}

impl<F> MembershipLookup for F
where
    F: Fn(&str, &str) -> Option<GroupMembership>,
{
    fn membership(&self, user_id: &str, group_id: &str) -> Option<GroupMembership> {
        self(user_id, group_id)
    }
}

type MembershipKey = (String, String);

/// Thread-safe membership map keyed by `(user_id, group_id)`.
#[derive(Clone, Default)]
pub struct MembershipRegistry {
    memberships: Arc<RwLock<HashMap<MembershipKey, GroupMembership>>>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a membership, returning the one it replaced.
    pub fn insert(&self, membership: GroupMembership) -> Option<GroupMembership> {
        let key = (membership.user_id.clone(), membership.group_id.clone());
        self.memberships
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, membership)
    }

    /// Removes a membership row. This revokes nothing cryptographically: an
    /// envelope the user already copied still opens the group key.
    pub fn remove(&self, user_id: &str, group_id: &str) -> Option<GroupMembership> {
        self.memberships
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(user_id.to_string(), group_id.to_string()))
    }

    /// User ids holding a membership in `group_id`, sorted.
    pub fn members_of(&self, group_id: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .memberships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(_, group)| group == group_id)
            .map(|(user, _)| user.clone())
            .collect();
        members.sort();
        members
    }

    pub fn len(&self) -> usize {
        self.memberships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MembershipLookup for MembershipRegistry {
    fn membership(&self, user_id: &str, group_id: &str) -> Option<GroupMembership> {
        self.memberships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(user_id.to_string(), group_id.to_string()))
            .cloned()
    }
}
