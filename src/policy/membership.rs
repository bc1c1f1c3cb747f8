//! Group -> member expansion (case type sets, column sets, case type columns)

use crate::domain::StringUuid;
use std::collections::{HashMap, HashSet};

static EMPTY: std::sync::LazyLock<HashSet<StringUuid>> = std::sync::LazyLock::new(HashSet::new);

/// Membership relation between a group id and its leaf ids.
///
/// Unknown groups expand to the empty set, never to an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipMap {
    members: HashMap<StringUuid, HashSet<StringUuid>>,
}

impl MembershipMap {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (StringUuid, StringUuid)>,
    {
        let mut members: HashMap<StringUuid, HashSet<StringUuid>> = HashMap::new();
        for (group_id, leaf_id) in pairs {
            members.entry(group_id).or_default().insert(leaf_id);
        }
        Self { members }
    }

    pub fn members(&self, group_id: &StringUuid) -> &HashSet<StringUuid> {
        match self.members.get(group_id) {
            Some(leaves) => leaves,
            None => {
                tracing::debug!(group_id = %group_id, "Group has no members");
                &EMPTY
            }
        }
    }

    /// Members of an optional group; `None` expands to nothing.
    pub fn members_of(&self, group_id: Option<&StringUuid>) -> &HashSet<StringUuid> {
        group_id.map_or(&EMPTY, |id| self.members(id))
    }

    /// Expansion restricted to the requested groups, with empty sets for
    /// unknown ones.
    pub fn expand<'a, I>(&self, group_ids: I) -> HashMap<StringUuid, HashSet<StringUuid>>
    where
        I: IntoIterator<Item = &'a StringUuid>,
    {
        group_ids
            .into_iter()
            .map(|id| (*id, self.members(id).clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<(StringUuid, StringUuid)> for MembershipMap {
    fn from_iter<T: IntoIterator<Item = (StringUuid, StringUuid)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}
