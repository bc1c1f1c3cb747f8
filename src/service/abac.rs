//! Case ABAC service
//!
//! Resolves the effective case rights of a principal, keeps the snapshot
//! caches consistent with policy writes and builds the case-share graph.

use crate::cache::AbacCacheManager;
use crate::domain::{
    AccessCasePolicy, CaseAbac, CasePolicy, CasePolicyKind, CasePolicyScope, FullAccessRoles,
    OrganizationId, PolicyMutation, StringUuid, User, UserAccessCasePolicy, UserId,
    UserShareCasePolicy,
};
use crate::error::{AppError, Result};
use crate::policy::{assemble_case_abac, CaseShareGraph, MembershipMap, PolicySnapshot};
use crate::repository::AbacRepository;
use crate::telemetry::metrics::{
    POLICY_OPERATIONS_TOTAL, RESOLUTIONS_TOTAL, RESOLUTION_DURATION_SECONDS,
};
use metrics::{counter, histogram};
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use validator::Validate;

pub struct AbacService<R: AbacRepository> {
    repo: Arc<R>,
    cache: Arc<AbacCacheManager>,
    full_access_roles: FullAccessRoles,
}

fn record_operation<T>(operation: &'static str, result: &Result<T>) {
    let status = match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    counter!(POLICY_OPERATIONS_TOTAL, "operation" => operation, "result" => status).increment(1);
}

impl<R: AbacRepository + 'static> AbacService<R> {
    pub fn new(
        repo: Arc<R>,
        cache: Arc<AbacCacheManager>,
        full_access_roles: FullAccessRoles,
    ) -> Self {
        Self {
            repo,
            cache,
            full_access_roles,
        }
    }

    /// Effective case rights of the principal.
    ///
    /// Fails closed: a missing principal, a nil id or an id that does not
    /// resolve to a stored user is `Unauthorized`.
    pub async fn resolve(&self, principal: Option<&User>) -> Result<Arc<CaseAbac>> {
        let start = Instant::now();

        let user = principal.ok_or_else(|| AppError::Unauthorized("Command has no user".to_string()))?;
        if user.id.is_nil() {
            return Err(AppError::Unauthorized("User has no id".to_string()));
        }
        let user_id = user.id;

        let computed = AtomicBool::new(false);
        let result = self
            .cache
            .case_abacs()
            .get_or_compute(user_id, || async {
                computed.store(true, Ordering::Relaxed);
                self.compute_case_abac(user_id).await
            })
            .await;

        let outcome = match &result {
            Err(_) => "error",
            Ok(_) if !computed.load(Ordering::Relaxed) => "cached",
            Ok(abac) if abac.is_full_access => "full_access",
            Ok(_) => "resolved",
        };
        counter!(RESOLUTIONS_TOTAL, "outcome" => outcome).increment(1);
        histogram!(RESOLUTION_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        result.map_err(|e| match e {
            AppError::NotFound(msg) => AppError::Unauthorized(msg),
            other => other,
        })
    }

    /// Stored user by id, served from the user cache when possible
    pub async fn get_user_by_id(&self, user_id: UserId) -> Result<User> {
        self.cache
            .users()
            .get_or_compute(user_id, || async {
                self.repo
                    .find_user_by_id(user_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
            })
            .await
    }

    async fn compute_case_abac(&self, user_id: UserId) -> Result<Arc<CaseAbac>> {
        let user = self.get_user_by_id(user_id).await?;

        if self.full_access_roles.grants_full_access(&user.roles) {
            debug!(user_id = %user.id, "Full access granted by role");
            return Ok(Arc::new(CaseAbac::full_access()));
        }

        let snapshot = self.read_policy_snapshot(&user).await?;
        let abac = assemble_case_abac(&snapshot);

        debug!(
            user_id = %user.id,
            access_case_types = abac.case_type_access_abacs.len(),
            share_case_types = abac.case_type_share_abacs.len(),
            "Case ABAC resolved"
        );
        Ok(Arc::new(abac))
    }

    /// All policies and membership rows for the user, in one unit of work
    async fn read_policy_snapshot(&self, user: &User) -> Result<PolicySnapshot> {
        let mut uow = self.repo.begin().await?;

        let organization_access_policies = uow
            .read_organization_access_policies(user.organization_id)
            .await?;
        let user_access_policies = uow.read_user_access_policies(user.id).await?;
        let organization_share_policies = uow
            .read_organization_share_policies(user.organization_id)
            .await?;
        let user_share_policies = uow.read_user_share_policies(user.id).await?;

        let case_type_set_ids: BTreeSet<StringUuid> = organization_access_policies
            .iter()
            .map(CasePolicyScope::case_type_set_id)
            .chain(user_access_policies.iter().map(CasePolicyScope::case_type_set_id))
            .chain(organization_share_policies.iter().map(CasePolicyScope::case_type_set_id))
            .chain(user_share_policies.iter().map(CasePolicyScope::case_type_set_id))
            .collect();
        let case_type_col_set_ids: BTreeSet<StringUuid> = organization_access_policies
            .iter()
            .map(AccessCasePolicy::rights)
            .chain(user_access_policies.iter().map(AccessCasePolicy::rights))
            .flat_map(|r| [r.read_case_type_col_set_id, r.write_case_type_col_set_id])
            .flatten()
            .collect();

        let case_type_cols = uow.read_case_type_cols().await?;
        let case_type_set_members = uow
            .read_case_type_set_members(case_type_set_ids.into_iter().collect())
            .await?;
        let case_type_col_set_members = uow
            .read_case_type_col_set_members(case_type_col_set_ids.into_iter().collect())
            .await?;

        uow.finish().await?;

        Ok(PolicySnapshot {
            organization_access_policies,
            user_access_policies,
            organization_share_policies,
            user_share_policies,
            case_type_cols: case_type_cols
                .into_iter()
                .map(|c| (c.case_type_id, c.id))
                .collect(),
            case_type_set_members: case_type_set_members
                .into_iter()
                .map(|m| (m.case_type_set_id, m.case_type_id))
                .collect(),
            case_type_col_set_members: case_type_col_set_members
                .into_iter()
                .map(|m| (m.case_type_col_set_id, m.case_type_col_id))
                .collect::<MembershipMap>(),
        })
    }

    /// Case-share graph over all active organization share policies
    pub async fn build_case_share_graph(&self) -> Result<CaseShareGraph> {
        let mut uow = self.repo.begin().await?;
        let policies = uow.read_all_organization_share_policies().await?;
        uow.finish().await?;

        let graph = CaseShareGraph::from_share_policies(&policies);
        info!(
            policies = policies.len(),
            edges = graph.edge_count(),
            "Case share graph built"
        );
        Ok(graph)
    }

    /// Case-share graph over data collection relations that share cases
    pub async fn build_case_share_graph_from_relations(&self) -> Result<CaseShareGraph> {
        let mut uow = self.repo.begin().await?;
        let relations = uow.read_data_collection_relations().await?;
        uow.finish().await?;

        let graph = CaseShareGraph::from_data_collection_relations(&relations);
        info!(
            relations = relations.len(),
            edges = graph.edge_count(),
            "Case share graph built from relations"
        );
        Ok(graph)
    }

    /// Create a case policy. A nil id is replaced with a fresh one.
    pub async fn create_case_policy(&self, mut policy: CasePolicy) -> Result<CasePolicy> {
        if policy.id().is_nil() {
            policy.set_id(StringUuid::new_v4());
        }
        let result = self.create_case_policy_inner(&policy).await;
        record_operation("create", &result);
        result?;

        self.notify_policy_mutation(PolicyMutation::CasePolicy(policy.kind()))
            .await;
        Ok(policy)
    }

    async fn create_case_policy_inner(&self, policy: &CasePolicy) -> Result<()> {
        policy.validate()?;

        if let Some(existing) = self.repo.find_conflicting_case_policy(policy).await? {
            return Err(AppError::Conflict(format!(
                "A {} with the same scope already exists: {}",
                policy.kind().as_str(),
                existing
            )));
        }

        self.repo.insert_case_policy(policy).await
    }

    pub async fn update_case_policy(&self, policy: CasePolicy) -> Result<CasePolicy> {
        let result = self.update_case_policy_inner(&policy).await;
        record_operation("update", &result);
        result?;

        self.notify_policy_mutation(PolicyMutation::CasePolicy(policy.kind()))
            .await;
        Ok(policy)
    }

    async fn update_case_policy_inner(&self, policy: &CasePolicy) -> Result<()> {
        policy.validate()?;

        if let Some(existing) = self.repo.find_conflicting_case_policy(policy).await? {
            return Err(AppError::Conflict(format!(
                "A {} with the same scope already exists: {}",
                policy.kind().as_str(),
                existing
            )));
        }

        if !self.repo.update_case_policy(policy).await? {
            return Err(AppError::NotFound(format!(
                "{} {} not found",
                policy.kind().as_str(),
                policy.id()
            )));
        }
        Ok(())
    }

    pub async fn delete_case_policy(&self, kind: CasePolicyKind, id: StringUuid) -> Result<()> {
        let result = match self.repo.delete_case_policy(kind, id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::NotFound(format!("{} {} not found", kind.as_str(), id))),
            Err(e) => Err(e),
        };
        record_operation("delete", &result);
        result?;

        self.notify_policy_mutation(PolicyMutation::CasePolicy(kind))
            .await;
        Ok(())
    }

    /// Discard cached snapshots after a policy mutation made elsewhere
    pub async fn notify_policy_mutation(&self, mutation: PolicyMutation) {
        self.cache.handle_mutation(mutation).await;
    }

    /// Move a user to another organization.
    ///
    /// The user's access and share policies are replaced by copies of the
    /// target organization's policies, active or not. Nothing happens when
    /// the user already belongs to the target and is not new.
    pub async fn transfer_user_organization(
        &self,
        user: &User,
        target_organization_id: OrganizationId,
        is_new_user: bool,
    ) -> Result<User> {
        if target_organization_id.is_nil() {
            return Err(AppError::BadRequest(
                "Target organization id is required".to_string(),
            ));
        }
        if user.organization_id == target_organization_id && !is_new_user {
            debug!(user_id = %user.id, "User already in target organization");
            return Ok(user.clone());
        }

        let result = self
            .transfer_user_organization_inner(user, target_organization_id)
            .await;
        record_operation("transfer", &result);
        let (access_count, share_count) = result?;

        self.notify_policy_mutation(PolicyMutation::UserOrganizationTransfer)
            .await;
        info!(
            user_id = %user.id,
            from_organization_id = %user.organization_id,
            to_organization_id = %target_organization_id,
            access_policies = access_count,
            share_policies = share_count,
            "User moved to organization"
        );

        Ok(User {
            organization_id: target_organization_id,
            ..user.clone()
        })
    }

    async fn transfer_user_organization_inner(
        &self,
        user: &User,
        target_organization_id: OrganizationId,
    ) -> Result<(usize, usize)> {
        let access_policies: Vec<UserAccessCasePolicy> = self
            .repo
            .list_organization_access_policies(target_organization_id)
            .await?
            .iter()
            .map(|p| UserAccessCasePolicy::from_organization_policy(user.id, p))
            .collect();
        let share_policies: Vec<UserShareCasePolicy> = self
            .repo
            .list_organization_share_policies(target_organization_id)
            .await?
            .iter()
            .map(|p| UserShareCasePolicy::from_organization_policy(user.id, p))
            .collect();

        if access_policies.is_empty() && share_policies.is_empty() {
            warn!(
                organization_id = %target_organization_id,
                "Target organization has no case policies"
            );
        }

        let counts = (access_policies.len(), share_policies.len());
        self.repo
            .replace_user_policies_and_organization(
                user.id,
                target_organization_id,
                access_policies,
                share_policies,
            )
            .await?;
        Ok(counts)
    }

    /// Organizations the user administers through an active admin policy
    pub async fn organizations_under_admin(&self, user: &User) -> Result<HashSet<OrganizationId>> {
        let policies = self
            .repo
            .find_organization_admin_policies(user.id)
            .await?;
        Ok(policies
            .into_iter()
            .filter(|p| p.is_active)
            .map(|p| p.organization_id)
            .collect())
    }
}
