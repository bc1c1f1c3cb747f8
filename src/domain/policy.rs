//! Case policy records: organization/user access and share policies, the
//! membership rows they are expanded through, and the mutation events that
//! invalidate resolved snapshots.

use super::common::{
    CaseTypeColId, CaseTypeColSetId, CaseTypeId, CaseTypeSetId, DataCollectionId,
    OrganizationId, StringUuid, UserId,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

fn validate_not_nil(id: &StringUuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::new("nil_id"));
    }
    Ok(())
}

/// Rights granted by an access policy on its data collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate)]
pub struct CaseAccessRights {
    pub add_case: bool,
    pub remove_case: bool,
    pub add_case_set: bool,
    pub remove_case_set: bool,
    pub read_case_set: bool,
    pub write_case_set: bool,
    /// Columns whose values may be read. `None` means no read rights.
    #[validate(custom(function = "validate_not_nil"))]
    pub read_case_type_col_set_id: Option<CaseTypeColSetId>,
    /// Columns whose values may be updated. `None` means no write rights.
    #[validate(custom(function = "validate_not_nil"))]
    pub write_case_type_col_set_id: Option<CaseTypeColSetId>,
}

/// Rights granted by a share policy, from one data collection into another
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CaseShareRights {
    pub add_case: bool,
    pub remove_case: bool,
    pub add_case_set: bool,
    pub remove_case_set: bool,
}

/// Access rights of an organization to one data collection, limited to the
/// case types of the case type set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate)]
pub struct OrganizationAccessCasePolicy {
    pub id: StringUuid,
    #[validate(custom(function = "validate_not_nil"))]
    pub organization_id: OrganizationId,
    #[validate(custom(function = "validate_not_nil"))]
    pub data_collection_id: DataCollectionId,
    #[validate(custom(function = "validate_not_nil"))]
    pub case_type_set_id: CaseTypeSetId,
    pub is_active: bool,
    pub is_private: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[validate(nested)]
    pub rights: CaseAccessRights,
}

/// Maximum access rights of a user to one data collection. Effective rights
/// are the intersection with the organization's policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate)]
pub struct UserAccessCasePolicy {
    pub id: StringUuid,
    #[validate(custom(function = "validate_not_nil"))]
    pub user_id: UserId,
    #[validate(custom(function = "validate_not_nil"))]
    pub data_collection_id: DataCollectionId,
    #[validate(custom(function = "validate_not_nil"))]
    pub case_type_set_id: CaseTypeSetId,
    pub is_active: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[validate(nested)]
    pub rights: CaseAccessRights,
}

impl UserAccessCasePolicy {
    /// User-level copy of an organization policy, used when a user moves
    /// into that organization.
    pub fn from_organization_policy(user_id: UserId, policy: &OrganizationAccessCasePolicy) -> Self {
        Self {
            id: StringUuid::new_v4(),
            user_id,
            data_collection_id: policy.data_collection_id,
            case_type_set_id: policy.case_type_set_id,
            is_active: policy.is_active,
            rights: policy.rights.clone(),
        }
    }
}

/// Additional share rights of an organization into `data_collection_id` for
/// cases already present in `from_data_collection_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate)]
pub struct OrganizationShareCasePolicy {
    pub id: StringUuid,
    #[validate(custom(function = "validate_not_nil"))]
    pub organization_id: OrganizationId,
    #[validate(custom(function = "validate_not_nil"))]
    pub data_collection_id: DataCollectionId,
    #[validate(custom(function = "validate_not_nil"))]
    pub from_data_collection_id: DataCollectionId,
    #[validate(custom(function = "validate_not_nil"))]
    pub case_type_set_id: CaseTypeSetId,
    pub is_active: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub rights: CaseShareRights,
}

/// Maximum share rights of a user, analogous to the organization variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate)]
pub struct UserShareCasePolicy {
    pub id: StringUuid,
    #[validate(custom(function = "validate_not_nil"))]
    pub user_id: UserId,
    #[validate(custom(function = "validate_not_nil"))]
    pub data_collection_id: DataCollectionId,
    #[validate(custom(function = "validate_not_nil"))]
    pub from_data_collection_id: DataCollectionId,
    #[validate(custom(function = "validate_not_nil"))]
    pub case_type_set_id: CaseTypeSetId,
    pub is_active: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub rights: CaseShareRights,
}

impl UserShareCasePolicy {
    pub fn from_organization_policy(user_id: UserId, policy: &OrganizationShareCasePolicy) -> Self {
        Self {
            id: StringUuid::new_v4(),
            user_id,
            data_collection_id: policy.data_collection_id,
            from_data_collection_id: policy.from_data_collection_id,
            case_type_set_id: policy.case_type_set_id,
            is_active: policy.is_active,
            rights: policy.rights.clone(),
        }
    }
}

/// Fields every case policy carries, whatever its level.
pub trait CasePolicyScope {
    fn data_collection_id(&self) -> DataCollectionId;
    fn case_type_set_id(&self) -> CaseTypeSetId;
    fn is_active(&self) -> bool;
}

/// An access policy at either level.
pub trait AccessCasePolicy: CasePolicyScope {
    /// User-level policies carry no privacy flag and read as private.
    fn is_private(&self) -> bool {
        true
    }
    fn rights(&self) -> &CaseAccessRights;
}

/// A share policy at either level.
pub trait ShareCasePolicy: CasePolicyScope {
    fn from_data_collection_id(&self) -> DataCollectionId;
    fn rights(&self) -> &CaseShareRights;
}

macro_rules! impl_case_policy_scope {
    ($($ty:ty),+) => {
        $(impl CasePolicyScope for $ty {
            fn data_collection_id(&self) -> DataCollectionId {
                self.data_collection_id
            }
            fn case_type_set_id(&self) -> CaseTypeSetId {
                self.case_type_set_id
            }
            fn is_active(&self) -> bool {
                self.is_active
            }
        })+
    };
}

impl_case_policy_scope!(
    OrganizationAccessCasePolicy,
    UserAccessCasePolicy,
    OrganizationShareCasePolicy,
    UserShareCasePolicy
);

impl AccessCasePolicy for OrganizationAccessCasePolicy {
    fn is_private(&self) -> bool {
        self.is_private
    }
    fn rights(&self) -> &CaseAccessRights {
        &self.rights
    }
}

impl AccessCasePolicy for UserAccessCasePolicy {
    fn rights(&self) -> &CaseAccessRights {
        &self.rights
    }
}

impl ShareCasePolicy for OrganizationShareCasePolicy {
    fn from_data_collection_id(&self) -> DataCollectionId {
        self.from_data_collection_id
    }
    fn rights(&self) -> &CaseShareRights {
        &self.rights
    }
}

impl ShareCasePolicy for UserShareCasePolicy {
    fn from_data_collection_id(&self) -> DataCollectionId {
        self.from_data_collection_id
    }
    fn rights(&self) -> &CaseShareRights {
        &self.rights
    }
}

/// Marks a user as administrator of an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrganizationAdminPolicy {
    pub id: StringUuid,
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CaseTypeCol {
    pub id: CaseTypeColId,
    pub case_type_id: CaseTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CaseTypeSetMember {
    pub case_type_set_id: CaseTypeSetId,
    pub case_type_id: CaseTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CaseTypeColSetMember {
    pub case_type_col_set_id: CaseTypeColSetId,
    pub case_type_col_id: CaseTypeColId,
}

/// Directed relation between two data collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DataCollectionRelation {
    pub id: StringUuid,
    pub from_data_collection_id: DataCollectionId,
    pub to_data_collection_id: DataCollectionId,
    /// Whether a case can be shared from one data collection to the other
    pub share_case: bool,
}

/// The four policy kinds whose mutation invalidates resolved snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePolicyKind {
    OrganizationAccess,
    UserAccess,
    OrganizationShare,
    UserShare,
}

impl CasePolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasePolicyKind::OrganizationAccess => "organization_access_case_policy",
            CasePolicyKind::UserAccess => "user_access_case_policy",
            CasePolicyKind::OrganizationShare => "organization_share_case_policy",
            CasePolicyKind::UserShare => "user_share_case_policy",
        }
    }
}

/// A policy of any of the four kinds, as accepted by the CRUD surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CasePolicy {
    OrganizationAccess(OrganizationAccessCasePolicy),
    UserAccess(UserAccessCasePolicy),
    OrganizationShare(OrganizationShareCasePolicy),
    UserShare(UserShareCasePolicy),
}

impl CasePolicy {
    pub fn kind(&self) -> CasePolicyKind {
        match self {
            CasePolicy::OrganizationAccess(_) => CasePolicyKind::OrganizationAccess,
            CasePolicy::UserAccess(_) => CasePolicyKind::UserAccess,
            CasePolicy::OrganizationShare(_) => CasePolicyKind::OrganizationShare,
            CasePolicy::UserShare(_) => CasePolicyKind::UserShare,
        }
    }

    pub fn id(&self) -> StringUuid {
        match self {
            CasePolicy::OrganizationAccess(p) => p.id,
            CasePolicy::UserAccess(p) => p.id,
            CasePolicy::OrganizationShare(p) => p.id,
            CasePolicy::UserShare(p) => p.id,
        }
    }

    pub fn set_id(&mut self, id: StringUuid) {
        match self {
            CasePolicy::OrganizationAccess(p) => p.id = id,
            CasePolicy::UserAccess(p) => p.id = id,
            CasePolicy::OrganizationShare(p) => p.id = id,
            CasePolicy::UserShare(p) => p.id = id,
        }
    }
}

impl Validate for CasePolicy {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            CasePolicy::OrganizationAccess(p) => p.validate(),
            CasePolicy::UserAccess(p) => p.validate(),
            CasePolicy::OrganizationShare(p) => p.validate(),
            CasePolicy::UserShare(p) => p.validate(),
        }
    }
}

/// Operations after which every resolved snapshot must be discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyMutation {
    /// Create, update or delete of a case policy
    CasePolicy(CasePolicyKind),
    /// A user moved to another organization, rewriting their policies
    UserOrganizationTransfer,
}

impl PolicyMutation {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyMutation::CasePolicy(kind) => kind.as_str(),
            PolicyMutation::UserOrganizationTransfer => "user_organization_transfer",
        }
    }
}
