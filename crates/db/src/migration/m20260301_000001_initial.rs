//! Initial database migration.
//!
//! Creates the treasury schema: enums, balance tables, operation tables
//! and their indexes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: BALANCE STORE
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(VAULT_GROUPS_SQL).await?;
        db.execute_unprepared(VAULTS_SQL).await?;

        // ============================================================
        // PART 3: OPERATIONS
        // ============================================================
        db.execute_unprepared(COLLECTION_OPERATIONS_SQL).await?;
        db.execute_unprepared(DISBURSEMENT_OPERATIONS_SQL).await?;
        db.execute_unprepared(VAULT_MOVEMENTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE collection_type AS ENUM ('rejected', 'versement', 'operation');
CREATE TYPE disbursement_type AS ENUM ('frais', 'operation');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    number VARCHAR(64) NOT NULL,
    balance NUMERIC(14, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_accounts_name UNIQUE (name),
    CONSTRAINT chk_accounts_balance CHECK (balance >= 0)
);
";

const VAULT_GROUPS_SQL: &str = r"
CREATE TABLE vault_groups (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    can_fund_transfer BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_vault_groups_name UNIQUE (name)
);
";

const VAULTS_SQL: &str = r"
CREATE TABLE vaults (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    code VARCHAR(64) NOT NULL,
    balance NUMERIC(14, 2) NOT NULL DEFAULT 0,
    vault_group_id UUID NOT NULL REFERENCES vault_groups(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_vaults_balance CHECK (balance >= 0)
);

CREATE INDEX idx_vaults_group ON vaults(vault_group_id);
";

const COLLECTION_OPERATIONS_SQL: &str = r"
CREATE TABLE collection_operations (
    id UUID PRIMARY KEY,
    date DATE NOT NULL,
    motif TEXT NOT NULL,
    beneficiary TEXT NOT NULL,
    operation_type collection_type NOT NULL,
    reference VARCHAR(32) NOT NULL DEFAULT '-',
    attachment TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- One reference per year is embedded in the string itself
CREATE UNIQUE INDEX uq_collection_operations_reference
    ON collection_operations(reference) WHERE reference <> '-';
CREATE INDEX idx_collection_operations_date ON collection_operations(date);
CREATE INDEX idx_collection_operations_type_created
    ON collection_operations(operation_type, created_at);

CREATE TABLE collection_operation_details (
    id UUID PRIMARY KEY,
    operation_id UUID NOT NULL REFERENCES collection_operations(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
    amount NUMERIC(14, 2) NOT NULL,
    cheque_number VARCHAR(64),
    name VARCHAR(255),
    bank_name VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_collection_details_amount CHECK (amount > 0),
    CONSTRAINT uq_collection_details_position UNIQUE (operation_id, position)
);

CREATE INDEX idx_collection_details_account ON collection_operation_details(account_id);
";

const DISBURSEMENT_OPERATIONS_SQL: &str = r"
CREATE TABLE disbursement_operations (
    id UUID PRIMARY KEY,
    date DATE NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
    motif TEXT NOT NULL,
    beneficiary TEXT NOT NULL,
    operation_type disbursement_type NOT NULL,
    reference VARCHAR(32) NOT NULL DEFAULT '-',
    attachment TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX uq_disbursement_operations_reference
    ON disbursement_operations(reference) WHERE reference <> '-';
CREATE INDEX idx_disbursement_operations_date ON disbursement_operations(date);
CREATE INDEX idx_disbursement_operations_account ON disbursement_operations(account_id, date);
CREATE INDEX idx_disbursement_operations_type_created
    ON disbursement_operations(operation_type, created_at);

CREATE TABLE disbursement_operation_details (
    id UUID PRIMARY KEY,
    operation_id UUID NOT NULL REFERENCES disbursement_operations(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    name VARCHAR(255),
    bank_name VARCHAR(255),
    bank_account_number VARCHAR(64),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_disbursement_details_amount CHECK (amount > 0),
    CONSTRAINT uq_disbursement_details_position UNIQUE (operation_id, position)
);
";

const VAULT_MOVEMENTS_SQL: &str = r"
CREATE TABLE vault_deposits (
    id UUID PRIMARY KEY,
    vault_id UUID NOT NULL REFERENCES vaults(id) ON DELETE RESTRICT,
    amount NUMERIC(14, 2) NOT NULL,
    motif TEXT NOT NULL,
    date DATE NOT NULL,
    deposit_number VARCHAR(64),
    external_reference VARCHAR(255),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_vault_deposits_amount CHECK (amount > 0)
);

CREATE INDEX idx_vault_deposits_vault ON vault_deposits(vault_id, date);

CREATE TABLE vault_withdrawals (
    id UUID PRIMARY KEY,
    vault_id UUID NOT NULL REFERENCES vaults(id) ON DELETE RESTRICT,
    account_id UUID REFERENCES accounts(id) ON DELETE RESTRICT,
    amount NUMERIC(14, 2) NOT NULL,
    motif TEXT NOT NULL,
    date DATE NOT NULL,
    external_reference VARCHAR(255),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_vault_withdrawals_amount CHECK (amount > 0)
);

CREATE INDEX idx_vault_withdrawals_vault ON vault_withdrawals(vault_id, date);
CREATE INDEX idx_vault_withdrawals_account ON vault_withdrawals(account_id, date)
    WHERE account_id IS NOT NULL;
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS vault_withdrawals CASCADE;
DROP TABLE IF EXISTS vault_deposits CASCADE;
DROP TABLE IF EXISTS disbursement_operation_details CASCADE;
DROP TABLE IF EXISTS disbursement_operations CASCADE;
DROP TABLE IF EXISTS collection_operation_details CASCADE;
DROP TABLE IF EXISTS collection_operations CASCADE;
DROP TABLE IF EXISTS vaults CASCADE;
DROP TABLE IF EXISTS vault_groups CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

DROP TYPE IF EXISTS disbursement_type CASCADE;
DROP TYPE IF EXISTS collection_type CASCADE;
";
