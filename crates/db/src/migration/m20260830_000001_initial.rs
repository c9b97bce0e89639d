//! Initial database migration.
//!
//! Creates the enums and core tables: companies, users, user_roles,
//! expenses, approval_rules, and approval_records.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(USER_ROLES_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;
        db.execute_unprepared(APPROVAL_RULES_SQL).await?;
        db.execute_unprepared(APPROVAL_RECORDS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM (
    'admin',
    'manager',
    'employee'
);

CREATE TYPE expense_status AS ENUM (
    'pending',
    'approved',
    'rejected'
);

CREATE TYPE approval_decision AS ENUM (
    'pending',
    'approved',
    'rejected',
    'superseded'
);

CREATE TYPE rule_type AS ENUM (
    'percentage',
    'specific_approver',
    'hybrid'
);

CREATE TYPE hybrid_logic AS ENUM (
    'AND',
    'OR'
);
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    country VARCHAR(100) NOT NULL,
    currency CHAR(3) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    employee_number INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_users_company_employee_number UNIQUE (company_id, employee_number)
);

CREATE INDEX idx_users_company ON users(company_id);
";

const USER_ROLES_SQL: &str = r"
CREATE TABLE user_roles (
    user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    role user_role NOT NULL DEFAULT 'employee',
    manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_user_roles_not_own_manager CHECK (manager_id IS DISTINCT FROM user_id)
);

CREATE INDEX idx_user_roles_manager ON user_roles(manager_id);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    amount NUMERIC(19, 4) NOT NULL,
    currency CHAR(3) NOT NULL,
    original_amount NUMERIC(19, 4) NOT NULL,
    original_currency CHAR(3) NOT NULL,
    exchange_rate NUMERIC(19, 8) NOT NULL DEFAULT 1,
    category VARCHAR(100) NOT NULL,
    description TEXT NOT NULL,
    expense_date DATE NOT NULL,
    status expense_status NOT NULL DEFAULT 'pending',
    receipt_path TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_expenses_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_expenses_original_amount_positive CHECK (original_amount > 0)
);

CREATE INDEX idx_expenses_company ON expenses(company_id);
CREATE INDEX idx_expenses_owner ON expenses(owner_id);
CREATE INDEX idx_expenses_status ON expenses(company_id, status);
";

const APPROVAL_RULES_SQL: &str = r"
CREATE TABLE approval_rules (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    rule_type rule_type NOT NULL,
    required_percentage INTEGER,
    specific_approver_role user_role,
    hybrid_logic hybrid_logic,
    hybrid_percentage INTEGER,
    hybrid_approver_role user_role,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    sequence_order SMALLINT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_rules_required_percentage
        CHECK (required_percentage IS NULL OR (required_percentage BETWEEN 1 AND 100)),
    CONSTRAINT chk_rules_hybrid_percentage
        CHECK (hybrid_percentage IS NULL OR (hybrid_percentage BETWEEN 1 AND 100))
);

CREATE INDEX idx_approval_rules_company ON approval_rules(company_id, is_active);
";

const APPROVAL_RECORDS_SQL: &str = r"
CREATE TABLE approval_records (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    expense_id UUID NOT NULL REFERENCES expenses(id) ON DELETE CASCADE,
    approver_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    sequence_order SMALLINT NOT NULL,
    decision approval_decision NOT NULL DEFAULT 'pending',
    comment TEXT,
    decided_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_approval_records_expense_approver UNIQUE (expense_id, approver_id)
);

CREATE INDEX idx_approval_records_expense ON approval_records(expense_id, sequence_order);
CREATE INDEX idx_approval_records_approver ON approval_records(approver_id, decision);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS approval_records CASCADE;
DROP TABLE IF EXISTS approval_rules CASCADE;
DROP TABLE IF EXISTS expenses CASCADE;
DROP TABLE IF EXISTS user_roles CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

DROP TYPE IF EXISTS hybrid_logic;
DROP TYPE IF EXISTS rule_type;
DROP TYPE IF EXISTS approval_decision;
DROP TYPE IF EXISTS expense_status;
DROP TYPE IF EXISTS user_role;
";
