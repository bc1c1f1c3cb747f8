//! Share-rights resolution

use super::membership::MembershipMap;
use super::merge::{intersect_grids, AbacCell, AbacGrid};
use crate::domain::{CaseTypeShareAbac, CaseTypeShareAbacs, ShareCasePolicy, ShareRight};

const SHARE_RIGHTS: [ShareRight; 4] = [
    ShareRight::AddCase,
    ShareRight::RemoveCase,
    ShareRight::AddCaseSet,
    ShareRight::RemoveCaseSet,
];

impl AbacCell for CaseTypeShareAbac {
    fn intersect(&self, other: &Self) -> Self {
        let mut merged = CaseTypeShareAbac::new(self.case_type_id, self.data_collection_id);
        for right in SHARE_RIGHTS {
            *merged.sources_mut(right) = self.sources(right) & other.sources(right);
        }
        merged
    }

    fn has_any_rights(&self) -> bool {
        CaseTypeShareAbac::has_any_rights(self)
    }
}

/// Rights granted by one level of share policies.
///
/// Policies targeting the same pair accumulate: each enabled operation
/// records the policy's source data collection.
pub fn build_share_grid<P: ShareCasePolicy>(
    policies: &[P],
    case_type_set_members: &MembershipMap,
) -> AbacGrid<CaseTypeShareAbac> {
    let mut grid = AbacGrid::new();

    for policy in policies.iter().filter(|p| p.is_active()) {
        let rights = policy.rights();
        let enabled = [
            (ShareRight::AddCase, rights.add_case),
            (ShareRight::RemoveCase, rights.remove_case),
            (ShareRight::AddCaseSet, rights.add_case_set),
            (ShareRight::RemoveCaseSet, rights.remove_case_set),
        ];
        let data_collection_id = policy.data_collection_id();

        for case_type_id in case_type_set_members.members(&policy.case_type_set_id()) {
            let cell = grid.upsert_with(*case_type_id, data_collection_id, || {
                CaseTypeShareAbac::new(*case_type_id, data_collection_id)
            });
            for (right, _) in enabled.iter().filter(|(_, on)| *on) {
                cell.sources_mut(*right)
                    .insert(policy.from_data_collection_id());
            }
        }
    }

    grid
}

/// Effective share rights: organization level intersected with user level
pub fn resolve_share<O, U>(
    organization_policies: &[O],
    user_policies: &[U],
    case_type_set_members: &MembershipMap,
) -> CaseTypeShareAbacs
where
    O: ShareCasePolicy,
    U: ShareCasePolicy,
{
    let organization = build_share_grid(organization_policies, case_type_set_members);
    let user = build_share_grid(user_policies, case_type_set_members);
    intersect_grids(&organization, &user)
}
