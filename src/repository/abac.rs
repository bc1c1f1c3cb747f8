//! Case policy repository.
//!
//! Resolution reads go through an `AbacUnitOfWork` so that all policies and
//! membership rows of one principal come from the same transaction.

use crate::domain::{
    CasePolicy, CasePolicyKind, CaseTypeCol, CaseTypeColSetId, CaseTypeColSetMember,
    CaseTypeSetId, CaseTypeSetMember, DataCollectionRelation, OrganizationAccessCasePolicy,
    OrganizationAdminPolicy, OrganizationId, OrganizationShareCasePolicy, Role, StringUuid, User,
    UserAccessCasePolicy, UserId, UserShareCasePolicy,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

const ORGANIZATION_ACCESS_COLUMNS: &str = "id, organization_id, data_collection_id, case_type_set_id, is_active, is_private, add_case, remove_case, add_case_set, remove_case_set, read_case_set, write_case_set, read_case_type_col_set_id, write_case_type_col_set_id";
const USER_ACCESS_COLUMNS: &str = "id, user_id, data_collection_id, case_type_set_id, is_active, add_case, remove_case, add_case_set, remove_case_set, read_case_set, write_case_set, read_case_type_col_set_id, write_case_type_col_set_id";
const ORGANIZATION_SHARE_COLUMNS: &str = "id, organization_id, data_collection_id, from_data_collection_id, case_type_set_id, is_active, add_case, remove_case, add_case_set, remove_case_set";
const USER_SHARE_COLUMNS: &str = "id, user_id, data_collection_id, from_data_collection_id, case_type_set_id, is_active, add_case, remove_case, add_case_set, remove_case_set";

/// Table backing each policy kind
pub fn policy_table(kind: CasePolicyKind) -> &'static str {
    match kind {
        CasePolicyKind::OrganizationAccess => "organization_access_case_policies",
        CasePolicyKind::UserAccess => "user_access_case_policies",
        CasePolicyKind::OrganizationShare => "organization_share_case_policies",
        CasePolicyKind::UserShare => "user_share_case_policies",
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Reads for one resolution, all within one transaction.
///
/// Dropping an unfinished unit of work rolls it back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AbacUnitOfWork: Send {
    /// Active access policies of an organization
    async fn read_organization_access_policies(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationAccessCasePolicy>>;

    /// Active access policies of a user
    async fn read_user_access_policies(&mut self, user_id: UserId) -> Result<Vec<UserAccessCasePolicy>>;

    /// Active share policies of an organization
    async fn read_organization_share_policies(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationShareCasePolicy>>;

    /// Active share policies of a user
    async fn read_user_share_policies(&mut self, user_id: UserId) -> Result<Vec<UserShareCasePolicy>>;

    /// Every organization share policy, active or not
    async fn read_all_organization_share_policies(&mut self) -> Result<Vec<OrganizationShareCasePolicy>>;

    async fn read_data_collection_relations(&mut self) -> Result<Vec<DataCollectionRelation>>;

    async fn read_case_type_cols(&mut self) -> Result<Vec<CaseTypeCol>>;

    async fn read_case_type_set_members(
        &mut self,
        case_type_set_ids: Vec<CaseTypeSetId>,
    ) -> Result<Vec<CaseTypeSetMember>>;

    async fn read_case_type_col_set_members(
        &mut self,
        case_type_col_set_ids: Vec<CaseTypeColSetId>,
    ) -> Result<Vec<CaseTypeColSetMember>>;

    /// Release the unit of work
    async fn finish(&mut self) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AbacRepository: Send + Sync {
    /// Open a unit of work for resolution reads
    async fn begin(&self) -> Result<Box<dyn AbacUnitOfWork>>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>>;

    async fn find_organization_admin_policies(&self, user_id: UserId) -> Result<Vec<OrganizationAdminPolicy>>;

    /// Access policies of an organization regardless of `is_active`
    async fn list_organization_access_policies(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationAccessCasePolicy>>;

    /// Share policies of an organization regardless of `is_active`
    async fn list_organization_share_policies(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationShareCasePolicy>>;

    /// Id of another policy of the same kind holding the same uniqueness key
    async fn find_conflicting_case_policy(&self, policy: &CasePolicy) -> Result<Option<StringUuid>>;

    async fn insert_case_policy(&self, policy: &CasePolicy) -> Result<()>;

    /// Returns false when no policy with the id exists
    async fn update_case_policy(&self, policy: &CasePolicy) -> Result<bool>;

    /// Returns false when no policy with the id exists
    async fn delete_case_policy(&self, kind: CasePolicyKind, id: StringUuid) -> Result<bool>;

    /// Replace all case policies of a user and move them to another
    /// organization, in one transaction.
    async fn replace_user_policies_and_organization(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        access_policies: Vec<UserAccessCasePolicy>,
        share_policies: Vec<UserShareCasePolicy>,
    ) -> Result<()>;
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: UserId,
    organization_id: OrganizationId,
    email: String,
    name: Option<String>,
    roles: Json<Vec<Role>>,
    is_active: bool,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            organization_id: record.organization_id,
            email: record.email,
            name: record.name,
            roles: record.roles.0.into_iter().collect(),
            is_active: record.is_active,
        }
    }
}

pub struct MySqlAbacUnitOfWork {
    tx: Option<Transaction<'static, MySql>>,
}

impl MySqlAbacUnitOfWork {
    fn tx(&mut self) -> Result<&mut Transaction<'static, MySql>> {
        self.tx
            .as_mut()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Unit of work already finished")))
    }
}

#[async_trait]
impl AbacUnitOfWork for MySqlAbacUnitOfWork {
    async fn read_organization_access_policies(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationAccessCasePolicy>> {
        let sql = format!(
            "SELECT {} FROM organization_access_case_policies WHERE organization_id = ? AND is_active = TRUE",
            ORGANIZATION_ACCESS_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrganizationAccessCasePolicy>(&sql)
            .bind(organization_id)
            .fetch_all(&mut **self.tx()?)
            .await?;
        Ok(rows)
    }

    async fn read_user_access_policies(&mut self, user_id: UserId) -> Result<Vec<UserAccessCasePolicy>> {
        let sql = format!(
            "SELECT {} FROM user_access_case_policies WHERE user_id = ? AND is_active = TRUE",
            USER_ACCESS_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserAccessCasePolicy>(&sql)
            .bind(user_id)
            .fetch_all(&mut **self.tx()?)
            .await?;
        Ok(rows)
    }

    async fn read_organization_share_policies(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationShareCasePolicy>> {
        let sql = format!(
            "SELECT {} FROM organization_share_case_policies WHERE organization_id = ? AND is_active = TRUE",
            ORGANIZATION_SHARE_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrganizationShareCasePolicy>(&sql)
            .bind(organization_id)
            .fetch_all(&mut **self.tx()?)
            .await?;
        Ok(rows)
    }

    async fn read_user_share_policies(&mut self, user_id: UserId) -> Result<Vec<UserShareCasePolicy>> {
        let sql = format!(
            "SELECT {} FROM user_share_case_policies WHERE user_id = ? AND is_active = TRUE",
            USER_SHARE_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserShareCasePolicy>(&sql)
            .bind(user_id)
            .fetch_all(&mut **self.tx()?)
            .await?;
        Ok(rows)
    }

    async fn read_all_organization_share_policies(&mut self) -> Result<Vec<OrganizationShareCasePolicy>> {
        let sql = format!(
            "SELECT {} FROM organization_share_case_policies",
            ORGANIZATION_SHARE_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrganizationShareCasePolicy>(&sql)
            .fetch_all(&mut **self.tx()?)
            .await?;
        Ok(rows)
    }

    async fn read_data_collection_relations(&mut self) -> Result<Vec<DataCollectionRelation>> {
        let rows = sqlx::query_as::<_, DataCollectionRelation>(
            "SELECT id, from_data_collection_id, to_data_collection_id, share_case FROM data_collection_relations",
        )
        .fetch_all(&mut **self.tx()?)
        .await?;
        Ok(rows)
    }

    async fn read_case_type_cols(&mut self) -> Result<Vec<CaseTypeCol>> {
        let rows = sqlx::query_as::<_, CaseTypeCol>("SELECT id, case_type_id FROM case_type_cols")
            .fetch_all(&mut **self.tx()?)
            .await?;
        Ok(rows)
    }

    async fn read_case_type_set_members(
        &mut self,
        case_type_set_ids: Vec<CaseTypeSetId>,
    ) -> Result<Vec<CaseTypeSetMember>> {
        if case_type_set_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT case_type_set_id, case_type_id FROM case_type_set_members WHERE case_type_set_id IN ({})",
            placeholders(case_type_set_ids.len())
        );
        let mut query = sqlx::query_as::<_, CaseTypeSetMember>(&sql);
        for id in case_type_set_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&mut **self.tx()?).await?;
        Ok(rows)
    }

    async fn read_case_type_col_set_members(
        &mut self,
        case_type_col_set_ids: Vec<CaseTypeColSetId>,
    ) -> Result<Vec<CaseTypeColSetMember>> {
        if case_type_col_set_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT case_type_col_set_id, case_type_col_id FROM case_type_col_set_members WHERE case_type_col_set_id IN ({})",
            placeholders(case_type_col_set_ids.len())
        );
        let mut query = sqlx::query_as::<_, CaseTypeColSetMember>(&sql);
        for id in case_type_col_set_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&mut **self.tx()?).await?;
        Ok(rows)
    }

    async fn finish(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }
}

pub struct AbacRepositoryImpl {
    pool: MySqlPool,
}

impl AbacRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn bind_access_rights<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    rights: &'q crate::domain::CaseAccessRights,
) -> Query<'q, MySql, MySqlArguments> {
    query
        .bind(rights.add_case)
        .bind(rights.remove_case)
        .bind(rights.add_case_set)
        .bind(rights.remove_case_set)
        .bind(rights.read_case_set)
        .bind(rights.write_case_set)
        .bind(rights.read_case_type_col_set_id)
        .bind(rights.write_case_type_col_set_id)
}

fn bind_share_rights<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    rights: &'q crate::domain::CaseShareRights,
) -> Query<'q, MySql, MySqlArguments> {
    query
        .bind(rights.add_case)
        .bind(rights.remove_case)
        .bind(rights.add_case_set)
        .bind(rights.remove_case_set)
}

/// Unique key violations surface as `Conflict`
fn map_write_error(err: sqlx::Error, kind: CasePolicyKind) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(format!(
            "A {} with the same scope already exists",
            kind.as_str()
        )),
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl AbacRepository for AbacRepositoryImpl {
    async fn begin(&self) -> Result<Box<dyn AbacUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlAbacUnitOfWork { tx: Some(tx) }))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, organization_id, email, name, roles, is_active FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(User::from))
    }

    async fn find_organization_admin_policies(&self, user_id: UserId) -> Result<Vec<OrganizationAdminPolicy>> {
        let rows = sqlx::query_as::<_, OrganizationAdminPolicy>(
            r#"
            SELECT id, organization_id, user_id, is_active
            FROM organization_admin_policies
            WHERE user_id = ? AND is_active = TRUE
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_organization_access_policies(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationAccessCasePolicy>> {
        let sql = format!(
            "SELECT {} FROM organization_access_case_policies WHERE organization_id = ?",
            ORGANIZATION_ACCESS_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrganizationAccessCasePolicy>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_organization_share_policies(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<OrganizationShareCasePolicy>> {
        let sql = format!(
            "SELECT {} FROM organization_share_case_policies WHERE organization_id = ?",
            ORGANIZATION_SHARE_COLUMNS
        );
        let rows = sqlx::query_as::<_, OrganizationShareCasePolicy>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_conflicting_case_policy(&self, policy: &CasePolicy) -> Result<Option<StringUuid>> {
        let id = match policy {
            CasePolicy::OrganizationAccess(p) => {
                sqlx::query_scalar::<_, StringUuid>(
                    "SELECT id FROM organization_access_case_policies WHERE organization_id = ? AND data_collection_id = ? AND id <> ?",
                )
                .bind(p.organization_id)
                .bind(p.data_collection_id)
                .bind(p.id)
                .fetch_optional(&self.pool)
                .await?
            }
            CasePolicy::UserAccess(p) => {
                sqlx::query_scalar::<_, StringUuid>(
                    "SELECT id FROM user_access_case_policies WHERE user_id = ? AND data_collection_id = ? AND id <> ?",
                )
                .bind(p.user_id)
                .bind(p.data_collection_id)
                .bind(p.id)
                .fetch_optional(&self.pool)
                .await?
            }
            CasePolicy::OrganizationShare(p) => {
                sqlx::query_scalar::<_, StringUuid>(
                    "SELECT id FROM organization_share_case_policies WHERE organization_id = ? AND data_collection_id = ? AND from_data_collection_id = ? AND id <> ?",
                )
                .bind(p.organization_id)
                .bind(p.data_collection_id)
                .bind(p.from_data_collection_id)
                .bind(p.id)
                .fetch_optional(&self.pool)
                .await?
            }
            CasePolicy::UserShare(p) => {
                sqlx::query_scalar::<_, StringUuid>(
                    "SELECT id FROM user_share_case_policies WHERE user_id = ? AND data_collection_id = ? AND from_data_collection_id = ? AND id <> ?",
                )
                .bind(p.user_id)
                .bind(p.data_collection_id)
                .bind(p.from_data_collection_id)
                .bind(p.id)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(id)
    }

    async fn insert_case_policy(&self, policy: &CasePolicy) -> Result<()> {
        let result = match policy {
            CasePolicy::OrganizationAccess(p) => {
                let query = sqlx::query(
                    r#"
                    INSERT INTO organization_access_case_policies (id, organization_id, data_collection_id, case_type_set_id, is_active, is_private,
                        add_case, remove_case, add_case_set, remove_case_set, read_case_set, write_case_set, read_case_type_col_set_id, write_case_type_col_set_id)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(p.id)
                .bind(p.organization_id)
                .bind(p.data_collection_id)
                .bind(p.case_type_set_id)
                .bind(p.is_active)
                .bind(p.is_private);
                bind_access_rights(query, &p.rights).execute(&self.pool).await
            }
            CasePolicy::UserAccess(p) => insert_user_access_policy(p).execute(&self.pool).await,
            CasePolicy::OrganizationShare(p) => {
                let query = sqlx::query(
                    r#"
                    INSERT INTO organization_share_case_policies (id, organization_id, data_collection_id, from_data_collection_id, case_type_set_id, is_active,
                        add_case, remove_case, add_case_set, remove_case_set)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(p.id)
                .bind(p.organization_id)
                .bind(p.data_collection_id)
                .bind(p.from_data_collection_id)
                .bind(p.case_type_set_id)
                .bind(p.is_active);
                bind_share_rights(query, &p.rights).execute(&self.pool).await
            }
            CasePolicy::UserShare(p) => insert_user_share_policy(p).execute(&self.pool).await,
        };

        result.map_err(|e| map_write_error(e, policy.kind()))?;
        Ok(())
    }

    async fn update_case_policy(&self, policy: &CasePolicy) -> Result<bool> {
        let result = match policy {
            CasePolicy::OrganizationAccess(p) => {
                let query = sqlx::query(
                    r#"
                    UPDATE organization_access_case_policies
                    SET organization_id = ?, data_collection_id = ?, case_type_set_id = ?, is_active = ?, is_private = ?,
                        add_case = ?, remove_case = ?, add_case_set = ?, remove_case_set = ?, read_case_set = ?, write_case_set = ?,
                        read_case_type_col_set_id = ?, write_case_type_col_set_id = ?
                    WHERE id = ?
                    "#,
                )
                .bind(p.organization_id)
                .bind(p.data_collection_id)
                .bind(p.case_type_set_id)
                .bind(p.is_active)
                .bind(p.is_private);
                bind_access_rights(query, &p.rights)
                    .bind(p.id)
                    .execute(&self.pool)
                    .await
            }
            CasePolicy::UserAccess(p) => {
                let query = sqlx::query(
                    r#"
                    UPDATE user_access_case_policies
                    SET user_id = ?, data_collection_id = ?, case_type_set_id = ?, is_active = ?,
                        add_case = ?, remove_case = ?, add_case_set = ?, remove_case_set = ?, read_case_set = ?, write_case_set = ?,
                        read_case_type_col_set_id = ?, write_case_type_col_set_id = ?
                    WHERE id = ?
                    "#,
                )
                .bind(p.user_id)
                .bind(p.data_collection_id)
                .bind(p.case_type_set_id)
                .bind(p.is_active);
                bind_access_rights(query, &p.rights)
                    .bind(p.id)
                    .execute(&self.pool)
                    .await
            }
            CasePolicy::OrganizationShare(p) => {
                let query = sqlx::query(
                    r#"
                    UPDATE organization_share_case_policies
                    SET organization_id = ?, data_collection_id = ?, from_data_collection_id = ?, case_type_set_id = ?, is_active = ?,
                        add_case = ?, remove_case = ?, add_case_set = ?, remove_case_set = ?
                    WHERE id = ?
                    "#,
                )
                .bind(p.organization_id)
                .bind(p.data_collection_id)
                .bind(p.from_data_collection_id)
                .bind(p.case_type_set_id)
                .bind(p.is_active);
                bind_share_rights(query, &p.rights)
                    .bind(p.id)
                    .execute(&self.pool)
                    .await
            }
            CasePolicy::UserShare(p) => {
                let query = sqlx::query(
                    r#"
                    UPDATE user_share_case_policies
                    SET user_id = ?, data_collection_id = ?, from_data_collection_id = ?, case_type_set_id = ?, is_active = ?,
                        add_case = ?, remove_case = ?, add_case_set = ?, remove_case_set = ?
                    WHERE id = ?
                    "#,
                )
                .bind(p.user_id)
                .bind(p.data_collection_id)
                .bind(p.from_data_collection_id)
                .bind(p.case_type_set_id)
                .bind(p.is_active);
                bind_share_rights(query, &p.rights)
                    .bind(p.id)
                    .execute(&self.pool)
                    .await
            }
        };

        let result = result.map_err(|e| map_write_error(e, policy.kind()))?;
        if result.rows_affected() > 0 {
            return Ok(true);
        }
        // MySQL reports zero affected rows for an update that changes nothing
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", policy_table(policy.kind()));
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(policy.id())
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn delete_case_policy(&self, kind: CasePolicyKind, id: StringUuid) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", policy_table(kind));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_user_policies_and_organization(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        access_policies: Vec<UserAccessCasePolicy>,
        share_policies: Vec<UserShareCasePolicy>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_access_case_policies WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_share_case_policies WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for policy in &access_policies {
            insert_user_access_policy(policy).execute(&mut *tx).await?;
        }
        for policy in &share_policies {
            insert_user_share_policy(policy).execute(&mut *tx).await?;
        }

        let result = sqlx::query("UPDATE users SET organization_id = ? WHERE id = ?")
            .bind(organization_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                return Err(AppError::NotFound(format!("User {} not found", user_id)));
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

fn insert_user_access_policy(policy: &UserAccessCasePolicy) -> Query<'_, MySql, MySqlArguments> {
    let query = sqlx::query(
        r#"
        INSERT INTO user_access_case_policies (id, user_id, data_collection_id, case_type_set_id, is_active,
            add_case, remove_case, add_case_set, remove_case_set, read_case_set, write_case_set, read_case_type_col_set_id, write_case_type_col_set_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(policy.id)
    .bind(policy.user_id)
    .bind(policy.data_collection_id)
    .bind(policy.case_type_set_id)
    .bind(policy.is_active);
    bind_access_rights(query, &policy.rights)
}

fn insert_user_share_policy(policy: &UserShareCasePolicy) -> Query<'_, MySql, MySqlArguments> {
    let query = sqlx::query(
        r#"
        INSERT INTO user_share_case_policies (id, user_id, data_collection_id, from_data_collection_id, case_type_set_id, is_active,
            add_case, remove_case, add_case_set, remove_case_set)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(policy.id)
    .bind(policy.user_id)
    .bind(policy.data_collection_id)
    .bind(policy.from_data_collection_id)
    .bind(policy.case_type_set_id)
    .bind(policy.is_active);
    bind_share_rights(query, &policy.rights)
}
