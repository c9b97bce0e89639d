//! User repository: accounts, roles, and reporting lines.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use expensa_core::workflow::{UserRole, WorkflowError};

use crate::entities::{
    sea_orm_active_enums, user_roles,
    users::{self, Model as UserModel},
};

/// A user together with their role assignment.
#[derive(Debug, Clone)]
pub struct UserWithRole {
    /// The user row.
    pub user: UserModel,
    /// Assigned role, defaulting to employee when no row exists.
    pub role: UserRole,
    /// Assigned manager, if any.
    pub manager_id: Option<Uuid>,
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Display name.
    pub name: String,
    /// Email address, unique across companies.
    pub email: String,
    /// Initial role.
    pub role: UserRole,
    /// Manager assignment; must belong to the same company.
    pub manager_id: Option<Uuid>,
}

/// Repository for user accounts and role assignments.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a user with the next employee number for the company.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager is invalid or the database
    /// operation fails.
    pub async fn create_user(
        &self,
        company_id: Uuid,
        input: CreateUserInput,
    ) -> Result<UserWithRole, WorkflowError> {
        if let Some(manager_id) = input.manager_id {
            self.ensure_same_company(company_id, manager_id).await?;
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        // Max + 1 within the creating transaction; employee numbers are
        // company-scoped and never reused.
        let last_number: Option<i32> = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .order_by_desc(users::Column::EmployeeNumber)
            .limit(1)
            .all(&txn)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .into_iter()
            .next()
            .map(|u| u.employee_number);

        let now = Utc::now().into();
        let user_id = Uuid::new_v4();

        let user = users::ActiveModel {
            id: Set(user_id),
            company_id: Set(company_id),
            name: Set(input.name),
            email: Set(input.email),
            employee_number: Set(last_number.unwrap_or(0) + 1),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let role_row = user_roles::ActiveModel {
            user_id: Set(user_id),
            role: Set(core_role_to_db(input.role)),
            manager_id: Set(input.manager_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| WorkflowError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(UserWithRole {
            user,
            role: db_role_to_core(&role_row.role),
            manager_id: role_row.manager_id,
        })
    }

    /// Lists all users of a company with their role assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_users(&self, company_id: Uuid) -> Result<Vec<UserWithRole>, WorkflowError> {
        let rows = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .find_also_related(user_roles::Entity)
            .order_by_asc(users::Column::EmployeeNumber)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(user, role_row)| match role_row {
                Some(r) => UserWithRole {
                    user,
                    role: db_role_to_core(&r.role),
                    manager_id: r.manager_id,
                },
                // No role row yet: treated as a plain employee.
                None => UserWithRole {
                    user,
                    role: UserRole::Employee,
                    manager_id: None,
                },
            })
            .collect())
    }

    /// Fetches one user of a company with their role assignment.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist in the
    /// company, or a database error.
    pub async fn get_user(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<UserWithRole, WorkflowError> {
        let row = users::Entity::find_by_id(user_id)
            .filter(users::Column::CompanyId.eq(company_id))
            .find_also_related(user_roles::Entity)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::UserNotFound(user_id))?;

        let (user, role_row) = row;
        Ok(match role_row {
            Some(r) => UserWithRole {
                user,
                role: db_role_to_core(&r.role),
                manager_id: r.manager_id,
            },
            None => UserWithRole {
                user,
                role: UserRole::Employee,
                manager_id: None,
            },
        })
    }

    /// Returns the manager of a user, if one is assigned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_manager_of(&self, user_id: Uuid) -> Result<Option<Uuid>, WorkflowError> {
        let role_row = user_roles::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(role_row.and_then(|r| r.manager_id))
    }

    /// Lists the admins of a company, ordered by employee number so the
    /// approval chain is deterministic.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_admins(&self, company_id: Uuid) -> Result<Vec<Uuid>, WorkflowError> {
        let rows = users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .find_also_related(user_roles::Entity)
            .order_by_asc(users::Column::EmployeeNumber)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(user, role_row)| {
                role_row
                    .filter(|r| r.role == sea_orm_active_enums::UserRole::Admin)
                    .map(|_| user.id)
            })
            .collect())
    }

    /// Changes a user's role and manager assignment.
    ///
    /// The manager must belong to the same company, must not be the
    /// user themselves, and must not close a reporting cycle.
    ///
    /// # Errors
    ///
    /// Returns `ManagerCycle` when the assignment would make the user
    /// their own (transitive) manager, `UserNotFound` when either user
    /// is outside the company, or a database error.
    pub async fn assign_role(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        role: UserRole,
        manager_id: Option<Uuid>,
    ) -> Result<UserWithRole, WorkflowError> {
        let user = users::Entity::find_by_id(user_id)
            .filter(users::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::UserNotFound(user_id))?;

        if let Some(manager_id) = manager_id {
            if manager_id == user_id {
                return Err(WorkflowError::ManagerCycle { user_id });
            }
            self.ensure_same_company(company_id, manager_id).await?;
            self.ensure_no_cycle(user_id, manager_id).await?;
        }

        let now = Utc::now().into();
        let existing = user_roles::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let role_row = match existing {
            Some(row) => {
                let mut active: user_roles::ActiveModel = row.into();
                active.role = Set(core_role_to_db(role));
                active.manager_id = Set(manager_id);
                active.updated_at = Set(now);
                active
                    .update(&self.db)
                    .await
                    .map_err(|e| WorkflowError::Database(e.to_string()))?
            }
            None => user_roles::ActiveModel {
                user_id: Set(user_id),
                role: Set(core_role_to_db(role)),
                manager_id: Set(manager_id),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?,
        };

        Ok(UserWithRole {
            user,
            role: db_role_to_core(&role_row.role),
            manager_id: role_row.manager_id,
        })
    }

    async fn ensure_same_company(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), WorkflowError> {
        users::Entity::find_by_id(user_id)
            .filter(users::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .ok_or(WorkflowError::UserNotFound(user_id))?;
        Ok(())
    }

    /// Walks the manager chain upward from `manager_id`; hitting
    /// `user_id` means the assignment would close a cycle.
    async fn ensure_no_cycle(&self, user_id: Uuid, manager_id: Uuid) -> Result<(), WorkflowError> {
        let mut current = Some(manager_id);
        let mut hops = 0u32;
        while let Some(id) = current {
            if id == user_id {
                return Err(WorkflowError::ManagerCycle { user_id });
            }
            // Bounded walk; a chain longer than this is itself corrupt.
            hops += 1;
            if hops > 1000 {
                return Err(WorkflowError::ManagerCycle { user_id });
            }
            current = self.get_manager_of(id).await?;
        }
        Ok(())
    }
}

pub(crate) fn db_role_to_core(role: &sea_orm_active_enums::UserRole) -> UserRole {
    match role {
        sea_orm_active_enums::UserRole::Admin => UserRole::Admin,
        sea_orm_active_enums::UserRole::Manager => UserRole::Manager,
        sea_orm_active_enums::UserRole::Employee => UserRole::Employee,
    }
}

pub(crate) fn core_role_to_db(role: UserRole) -> sea_orm_active_enums::UserRole {
    match role {
        UserRole::Admin => sea_orm_active_enums::UserRole::Admin,
        UserRole::Manager => sea_orm_active_enums::UserRole::Manager,
        UserRole::Employee => sea_orm_active_enums::UserRole::Employee,
    }
}
