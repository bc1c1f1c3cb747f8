//! Case policy resolution engine.
//!
//! Pure functions that turn the policies and membership tables read for one
//! principal into that principal's `CaseAbac`.

pub mod access;
pub mod graph;
pub mod membership;
pub mod merge;
pub mod share;

pub use graph::CaseShareGraph;
pub use membership::MembershipMap;
pub use merge::{intersect_grids, AbacCell, AbacGrid};

use crate::domain::{
    CaseAbac, OrganizationAccessCasePolicy, OrganizationShareCasePolicy, UserAccessCasePolicy,
    UserShareCasePolicy,
};

/// Everything read for one principal in a single unit of work
#[derive(Debug, Clone, Default)]
pub struct PolicySnapshot {
    pub organization_access_policies: Vec<OrganizationAccessCasePolicy>,
    pub user_access_policies: Vec<UserAccessCasePolicy>,
    pub organization_share_policies: Vec<OrganizationShareCasePolicy>,
    pub user_share_policies: Vec<UserShareCasePolicy>,
    /// case type -> columns
    pub case_type_cols: MembershipMap,
    /// case type set -> case types
    pub case_type_set_members: MembershipMap,
    /// column set -> columns
    pub case_type_col_set_members: MembershipMap,
}

/// Assemble the restricted (non full-access) `CaseAbac` of a snapshot
pub fn assemble_case_abac(snapshot: &PolicySnapshot) -> CaseAbac {
    CaseAbac {
        is_full_access: false,
        private_data_collection_ids: Default::default(),
        case_type_access_abacs: access::resolve_access(
            &snapshot.organization_access_policies,
            &snapshot.user_access_policies,
            &snapshot.case_type_set_members,
            &snapshot.case_type_cols,
            &snapshot.case_type_col_set_members,
        ),
        case_type_share_abacs: share::resolve_share(
            &snapshot.organization_share_policies,
            &snapshot.user_share_policies,
            &snapshot.case_type_set_members,
        ),
    }
}
