//! Common test utilities
//!
//! In-memory repository and fixtures for exercising the ABAC service
//! without a database.

#![allow(dead_code)]

use async_trait::async_trait;
use casedb_abac::cache::AbacCacheManager;
use casedb_abac::config::{AbacConfig, Config, DatabaseConfig, TelemetryConfig};
use casedb_abac::domain::{
    CaseAccessRights, CasePolicy, CasePolicyKind, CaseShareRights, CaseTypeCol, CaseTypeColSetId,
    CaseTypeColSetMember, CaseTypeSetId, CaseTypeSetMember, DataCollectionRelation,
    OrganizationAccessCasePolicy, OrganizationAdminPolicy, OrganizationId,
    OrganizationShareCasePolicy, Role, StringUuid, User, UserAccessCasePolicy, UserId,
    UserShareCasePolicy,
};
use casedb_abac::error::{AppError, Result};
use casedb_abac::repository::{AbacRepository, AbacUnitOfWork};
use casedb_abac::AbacService;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

pub fn test_config() -> Config {
    Config {
        database: DatabaseConfig {
            url: "mysql://localhost/casedb_test".to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        abac: AbacConfig::default(),
        telemetry: TelemetryConfig::default(),
    }
}

#[derive(Debug, Default, Clone)]
pub struct Store {
    pub users: Vec<User>,
    pub organization_access: Vec<OrganizationAccessCasePolicy>,
    pub user_access: Vec<UserAccessCasePolicy>,
    pub organization_share: Vec<OrganizationShareCasePolicy>,
    pub user_share: Vec<UserShareCasePolicy>,
    pub case_type_cols: Vec<CaseTypeCol>,
    pub case_type_set_members: Vec<CaseTypeSetMember>,
    pub case_type_col_set_members: Vec<CaseTypeColSetMember>,
    pub admin_policies: Vec<OrganizationAdminPolicy>,
    pub relations: Vec<DataCollectionRelation>,
}

/// In-memory repository counting units of work and policy reads
pub struct TestAbacRepository {
    store: Arc<RwLock<Store>>,
    begins: AtomicU32,
    policy_reads: Arc<AtomicU32>,
    fail_next_begin: AtomicBool,
}

impl TestAbacRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(Store::default())),
            begins: AtomicU32::new(0),
            policy_reads: Arc::new(AtomicU32::new(0)),
            fail_next_begin: AtomicBool::new(false),
        }
    }

    pub async fn with_store<F: FnOnce(&mut Store)>(&self, f: F) {
        f(&mut *self.store.write().await);
    }

    pub async fn snapshot(&self) -> Store {
        self.store.read().await.clone()
    }

    pub fn begin_count(&self) -> u32 {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn policy_read_count(&self) -> u32 {
        self.policy_reads.load(Ordering::SeqCst)
    }

    pub fn fail_next_begin(&self) {
        self.fail_next_begin.store(true, Ordering::SeqCst);
    }
}

impl Default for TestAbacRepository {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestUnitOfWork {
    store: Arc<RwLock<Store>>,
    policy_reads: Arc<AtomicU32>,
}

impl TestUnitOfWork {
    fn count_policy_read(&self) {
        self.policy_reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AbacUnitOfWork for TestUnitOfWork {
    async fn read_organization_access_policies(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationAccessCasePolicy>> {
        self.count_policy_read();
        let store = self.store.read().await;
        Ok(store
            .organization_access
            .iter()
            .filter(|p| p.organization_id == organization_id && p.is_active)
            .cloned()
            .collect())
    }

    async fn read_user_access_policies(&mut self, user_id: UserId) -> Result<Vec<UserAccessCasePolicy>> {
        self.count_policy_read();
        let store = self.store.read().await;
        Ok(store
            .user_access
            .iter()
            .filter(|p| p.user_id == user_id && p.is_active)
            .cloned()
            .collect())
    }

    async fn read_organization_share_policies(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationShareCasePolicy>> {
        self.count_policy_read();
        let store = self.store.read().await;
        Ok(store
            .organization_share
            .iter()
            .filter(|p| p.organization_id == organization_id && p.is_active)
            .cloned()
            .collect())
    }

    async fn read_user_share_policies(&mut self, user_id: UserId) -> Result<Vec<UserShareCasePolicy>> {
        self.count_policy_read();
        let store = self.store.read().await;
        Ok(store
            .user_share
            .iter()
            .filter(|p| p.user_id == user_id && p.is_active)
            .cloned()
            .collect())
    }

    async fn read_all_organization_share_policies(&mut self) -> Result<Vec<OrganizationShareCasePolicy>> {
        Ok(self.store.read().await.organization_share.clone())
    }

    async fn read_data_collection_relations(&mut self) -> Result<Vec<DataCollectionRelation>> {
        Ok(self.store.read().await.relations.clone())
    }

    async fn read_case_type_cols(&mut self) -> Result<Vec<CaseTypeCol>> {
        Ok(self.store.read().await.case_type_cols.clone())
    }

    async fn read_case_type_set_members(
        &mut self,
        case_type_set_ids: Vec<CaseTypeSetId>,
    ) -> Result<Vec<CaseTypeSetMember>> {
        let store = self.store.read().await;
        Ok(store
            .case_type_set_members
            .iter()
            .filter(|m| case_type_set_ids.contains(&m.case_type_set_id))
            .cloned()
            .collect())
    }

    async fn read_case_type_col_set_members(
        &mut self,
        case_type_col_set_ids: Vec<CaseTypeColSetId>,
    ) -> Result<Vec<CaseTypeColSetMember>> {
        let store = self.store.read().await;
        Ok(store
            .case_type_col_set_members
            .iter()
            .filter(|m| case_type_col_set_ids.contains(&m.case_type_col_set_id))
            .cloned()
            .collect())
    }

    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl AbacRepository for TestAbacRepository {
    async fn begin(&self) -> Result<Box<dyn AbacUnitOfWork>> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_begin.swap(false, Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(Box::new(TestUnitOfWork {
            store: self.store.clone(),
            policy_reads: self.policy_reads.clone(),
        }))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_organization_admin_policies(&self, user_id: UserId) -> Result<Vec<OrganizationAdminPolicy>> {
        let store = self.store.read().await;
        Ok(store
            .admin_policies
            .iter()
            .filter(|p| p.user_id == user_id && p.is_active)
            .cloned()
            .collect())
    }

    async fn list_organization_access_policies(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationAccessCasePolicy>> {
        let store = self.store.read().await;
        Ok(store
            .organization_access
            .iter()
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn list_organization_share_policies(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationShareCasePolicy>> {
        let store = self.store.read().await;
        Ok(store
            .organization_share
            .iter()
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn find_conflicting_case_policy(&self, policy: &CasePolicy) -> Result<Option<StringUuid>> {
        let store = self.store.read().await;
        let found = match policy {
            CasePolicy::OrganizationAccess(p) => store
                .organization_access
                .iter()
                .find(|x| {
                    x.id != p.id
                        && x.organization_id == p.organization_id
                        && x.data_collection_id == p.data_collection_id
                })
                .map(|x| x.id),
            CasePolicy::UserAccess(p) => store
                .user_access
                .iter()
                .find(|x| {
                    x.id != p.id
                        && x.user_id == p.user_id
                        && x.data_collection_id == p.data_collection_id
                })
                .map(|x| x.id),
            CasePolicy::OrganizationShare(p) => store
                .organization_share
                .iter()
                .find(|x| {
                    x.id != p.id
                        && x.organization_id == p.organization_id
                        && x.data_collection_id == p.data_collection_id
                        && x.from_data_collection_id == p.from_data_collection_id
                })
                .map(|x| x.id),
            CasePolicy::UserShare(p) => store
                .user_share
                .iter()
                .find(|x| {
                    x.id != p.id
                        && x.user_id == p.user_id
                        && x.data_collection_id == p.data_collection_id
                        && x.from_data_collection_id == p.from_data_collection_id
                })
                .map(|x| x.id),
        };
        Ok(found)
    }

    async fn insert_case_policy(&self, policy: &CasePolicy) -> Result<()> {
        let mut store = self.store.write().await;
        match policy.clone() {
            CasePolicy::OrganizationAccess(p) => store.organization_access.push(p),
            CasePolicy::UserAccess(p) => store.user_access.push(p),
            CasePolicy::OrganizationShare(p) => store.organization_share.push(p),
            CasePolicy::UserShare(p) => store.user_share.push(p),
        }
        Ok(())
    }

    async fn update_case_policy(&self, policy: &CasePolicy) -> Result<bool> {
        let mut store = self.store.write().await;
        let slot_found = match policy.clone() {
            CasePolicy::OrganizationAccess(p) => replace_by_id(&mut store.organization_access, p, |x| x.id),
            CasePolicy::UserAccess(p) => replace_by_id(&mut store.user_access, p, |x| x.id),
            CasePolicy::OrganizationShare(p) => replace_by_id(&mut store.organization_share, p, |x| x.id),
            CasePolicy::UserShare(p) => replace_by_id(&mut store.user_share, p, |x| x.id),
        };
        Ok(slot_found)
    }

    async fn delete_case_policy(&self, kind: CasePolicyKind, id: StringUuid) -> Result<bool> {
        let mut store = self.store.write().await;
        let removed = match kind {
            CasePolicyKind::OrganizationAccess => remove_by_id(&mut store.organization_access, id, |x| x.id),
            CasePolicyKind::UserAccess => remove_by_id(&mut store.user_access, id, |x| x.id),
            CasePolicyKind::OrganizationShare => remove_by_id(&mut store.organization_share, id, |x| x.id),
            CasePolicyKind::UserShare => remove_by_id(&mut store.user_share, id, |x| x.id),
        };
        Ok(removed)
    }

    async fn replace_user_policies_and_organization(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        access_policies: Vec<UserAccessCasePolicy>,
        share_policies: Vec<UserShareCasePolicy>,
    ) -> Result<()> {
        let mut store = self.store.write().await;
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.organization_id = organization_id;

        store.user_access.retain(|p| p.user_id != user_id);
        store.user_share.retain(|p| p.user_id != user_id);
        store.user_access.extend(access_policies);
        store.user_share.extend(share_policies);
        Ok(())
    }
}

fn replace_by_id<T>(items: &mut [T], item: T, id: impl Fn(&T) -> StringUuid) -> bool {
    let target = id(&item);
    match items.iter_mut().find(|x| id(&**x) == target) {
        Some(slot) => {
            *slot = item;
            true
        }
        None => false,
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, target: StringUuid, id: impl Fn(&T) -> StringUuid) -> bool {
    let before = items.len();
    items.retain(|x| id(x) != target);
    items.len() != before
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn service_with(repo: Arc<TestAbacRepository>, config: &Config) -> AbacService<TestAbacRepository> {
    AbacService::new(
        repo,
        Arc::new(AbacCacheManager::new(&config.abac)),
        config.abac.full_access_roles.clone(),
    )
}

pub fn org_user(organization_id: OrganizationId) -> User {
    User {
        organization_id,
        email: format!("user-{}@example.org", StringUuid::new_v4()),
        roles: [Role::OrgUser].into_iter().collect(),
        ..Default::default()
    }
}

pub fn access_rights(add_case: bool, read_col_set: Option<CaseTypeColSetId>) -> CaseAccessRights {
    CaseAccessRights {
        add_case,
        read_case_type_col_set_id: read_col_set,
        ..Default::default()
    }
}

pub fn org_access_policy(
    organization_id: OrganizationId,
    data_collection_id: StringUuid,
    case_type_set_id: CaseTypeSetId,
    rights: CaseAccessRights,
) -> OrganizationAccessCasePolicy {
    OrganizationAccessCasePolicy {
        id: StringUuid::new_v4(),
        organization_id,
        data_collection_id,
        case_type_set_id,
        is_active: true,
        is_private: true,
        rights,
    }
}

pub fn user_access_policy(
    user_id: UserId,
    data_collection_id: StringUuid,
    case_type_set_id: CaseTypeSetId,
    rights: CaseAccessRights,
) -> UserAccessCasePolicy {
    UserAccessCasePolicy {
        id: StringUuid::new_v4(),
        user_id,
        data_collection_id,
        case_type_set_id,
        is_active: true,
        rights,
    }
}

pub fn add_case_share() -> CaseShareRights {
    CaseShareRights {
        add_case: true,
        ..Default::default()
    }
}

pub fn org_share_policy(
    organization_id: OrganizationId,
    to: StringUuid,
    from: StringUuid,
    case_type_set_id: CaseTypeSetId,
) -> OrganizationShareCasePolicy {
    OrganizationShareCasePolicy {
        id: StringUuid::new_v4(),
        organization_id,
        data_collection_id: to,
        from_data_collection_id: from,
        case_type_set_id,
        is_active: true,
        rights: add_case_share(),
    }
}

pub fn user_share_policy(
    user_id: UserId,
    to: StringUuid,
    from: StringUuid,
    case_type_set_id: CaseTypeSetId,
) -> UserShareCasePolicy {
    UserShareCasePolicy {
        id: StringUuid::new_v4(),
        user_id,
        data_collection_id: to,
        from_data_collection_id: from,
        case_type_set_id,
        is_active: true,
        rights: add_case_share(),
    }
}
