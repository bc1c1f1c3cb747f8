//! Access-rights resolution

use super::membership::MembershipMap;
use super::merge::{intersect_grids, AbacCell, AbacGrid};
use crate::domain::{AccessCasePolicy, CaseTypeAccessAbac, CaseTypeAccessAbacs};

impl AbacCell for CaseTypeAccessAbac {
    fn intersect(&self, other: &Self) -> Self {
        Self {
            case_type_id: self.case_type_id,
            data_collection_id: self.data_collection_id,
            is_private: self.is_private && other.is_private,
            add_case: self.add_case && other.add_case,
            remove_case: self.remove_case && other.remove_case,
            read_case_type_col_ids: &self.read_case_type_col_ids & &other.read_case_type_col_ids,
            write_case_type_col_ids: &self.write_case_type_col_ids
                & &other.write_case_type_col_ids,
            add_case_set: self.add_case_set && other.add_case_set,
            remove_case_set: self.remove_case_set && other.remove_case_set,
            read_case_set: self.read_case_set && other.read_case_set,
            write_case_set: self.write_case_set && other.write_case_set,
        }
    }

    fn has_any_rights(&self) -> bool {
        CaseTypeAccessAbac::has_any_rights(self)
    }
}

/// Rights granted by one level of access policies.
///
/// Each active policy yields one cell per case type in its case type set.
/// Column sets are narrowed to the columns of that case type. A later policy
/// for the same pair replaces an earlier one.
pub fn build_access_grid<P: AccessCasePolicy>(
    policies: &[P],
    case_type_set_members: &MembershipMap,
    case_type_cols: &MembershipMap,
    case_type_col_set_members: &MembershipMap,
) -> AbacGrid<CaseTypeAccessAbac> {
    let mut grid = AbacGrid::new();

    for policy in policies.iter().filter(|p| p.is_active()) {
        let rights = policy.rights();
        let read_cols =
            case_type_col_set_members.members_of(rights.read_case_type_col_set_id.as_ref());
        let write_cols =
            case_type_col_set_members.members_of(rights.write_case_type_col_set_id.as_ref());

        for case_type_id in case_type_set_members.members(&policy.case_type_set_id()) {
            let own_cols = case_type_cols.members(case_type_id);
            grid.insert(
                *case_type_id,
                policy.data_collection_id(),
                CaseTypeAccessAbac {
                    case_type_id: *case_type_id,
                    data_collection_id: policy.data_collection_id(),
                    is_private: policy.is_private(),
                    add_case: rights.add_case,
                    remove_case: rights.remove_case,
                    read_case_type_col_ids: own_cols & read_cols,
                    write_case_type_col_ids: own_cols & write_cols,
                    add_case_set: rights.add_case_set,
                    remove_case_set: rights.remove_case_set,
                    read_case_set: rights.read_case_set,
                    write_case_set: rights.write_case_set,
                },
            );
        }
    }

    grid
}

/// Effective access rights: organization level intersected with user level
pub fn resolve_access<O, U>(
    organization_policies: &[O],
    user_policies: &[U],
    case_type_set_members: &MembershipMap,
    case_type_cols: &MembershipMap,
    case_type_col_set_members: &MembershipMap,
) -> CaseTypeAccessAbacs
where
    O: AccessCasePolicy,
    U: AccessCasePolicy,
{
    let organization = build_access_grid(
        organization_policies,
        case_type_set_members,
        case_type_cols,
        case_type_col_set_members,
    );
    let user = build_access_grid(
        user_policies,
        case_type_set_members,
        case_type_cols,
        case_type_col_set_members,
    );
    intersect_grids(&organization, &user)
}
