//! Statement ("releve") and point-in-time balance reads.
//!
//! Both reads run in one repeatable-read, read-only transaction so the
//! current balance and the movements undone from it come from the same
//! snapshot.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    AccessMode, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, IsolationLevel,
    LoaderTrait, QueryFilter, TransactionTrait,
};
use serde_json::json;
use tracing::debug;
use tresor_core::ledger::{self, BalanceMovement, EntityRef, LedgerError, MovementKind};
use tresor_core::statement::{Statement, StatementBuilder, StatementLine, collection_label};

use crate::entities::{
    accounts, collection_operation_details, collection_operations,
    disbursement_operation_details, disbursement_operations, vault_deposits, vault_withdrawals,
    vaults,
};
use crate::error::TreasuryError;

/// Read-only repository for statements and historical balances.
#[derive(Debug, Clone)]
pub struct StatementRepository {
    db: DatabaseConnection,
}

impl StatementRepository {
    /// Creates a new statement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Balance of `entity` at the start of `as_of`.
    ///
    /// Every movement dated on or after `as_of` is undone from the current
    /// stored balance.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` / `VaultNotFound` for an unknown entity.
    pub async fn balance_as_of(
        &self,
        entity: EntityRef,
        as_of: NaiveDate,
    ) -> Result<Decimal, TreasuryError> {
        let txn = self.snapshot().await?;
        let current = current_balance(&txn, entity).await?;
        let lines = fetch_lines(&txn, entity, as_of).await?;
        txn.commit().await?;

        let balance = ledger::balance_as_of(current, &movements(&lines), as_of);
        debug!(?entity, %as_of, %current, %balance, undone = lines.len(), "balance reconstructed");
        Ok(balance)
    }

    /// Statement of `entity` over the inclusive range `[start, end]`.
    ///
    /// # Errors
    ///
    /// - `InvalidDateRange` if `start > end`
    /// - `AccountNotFound` / `VaultNotFound` for an unknown entity
    pub async fn statement(
        &self,
        entity: EntityRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Statement, TreasuryError> {
        StatementBuilder::validate_range(start, end)?;
        let closing_as_of = StatementBuilder::closing_as_of(end)?;

        let txn = self.snapshot().await?;
        let current = current_balance(&txn, entity).await?;
        let lines = fetch_lines(&txn, entity, start).await?;
        txn.commit().await?;

        let closing = ledger::balance_as_of(current, &movements(&lines), closing_as_of);
        let statement = StatementBuilder::build(entity, start, end, closing, lines)?;

        debug!(
            ?entity,
            %start,
            %end,
            opening = %statement.opening_balance,
            closing = %statement.closing_balance,
            entries = statement.entries.len(),
            "statement built"
        );
        Ok(statement)
    }

    async fn snapshot(&self) -> Result<DatabaseTransaction, TreasuryError> {
        Ok(self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await?)
    }
}

fn movements(lines: &[StatementLine]) -> Vec<BalanceMovement> {
    lines
        .iter()
        .map(|l| BalanceMovement::new(l.kind, l.date, l.amount))
        .collect()
}

async fn current_balance(txn: &DatabaseTransaction, entity: EntityRef) -> Result<Decimal, TreasuryError> {
    match entity {
        EntityRef::Account(id) => accounts::Entity::find_by_id(id.into_inner())
            .one(txn)
            .await?
            .map(|a| a.balance)
            .ok_or_else(|| LedgerError::AccountNotFound(id.into_inner()).into()),
        EntityRef::Vault(id) => vaults::Entity::find_by_id(id.into_inner())
            .one(txn)
            .await?
            .map(|v| v.balance)
            .ok_or_else(|| LedgerError::VaultNotFound(id.into_inner()).into()),
    }
}

/// Every movement of `entity` dated on or after `from`.
async fn fetch_lines(
    txn: &DatabaseTransaction,
    entity: EntityRef,
    from: NaiveDate,
) -> Result<Vec<StatementLine>, TreasuryError> {
    match entity {
        EntityRef::Account(id) => {
            let account = accounts::Entity::find_by_id(id.into_inner())
                .one(txn)
                .await?
                .ok_or(LedgerError::AccountNotFound(id.into_inner()))?;
            let mut lines = collection_lines(txn, &account, from).await?;
            lines.extend(disbursement_lines(txn, &account, from).await?);
            lines.extend(fund_transfer_lines(txn, &account, from).await?);
            Ok(lines)
        }
        EntityRef::Vault(id) => {
            let mut lines = deposit_lines(txn, id.into_inner(), from).await?;
            lines.extend(withdrawal_lines(txn, id.into_inner(), from).await?);
            Ok(lines)
        }
    }
}

async fn collection_lines(
    txn: &DatabaseTransaction,
    account: &accounts::Model,
    from: NaiveDate,
) -> Result<Vec<StatementLine>, TreasuryError> {
    let rows = collection_operation_details::Entity::find()
        .find_also_related(collection_operations::Entity)
        .filter(collection_operation_details::Column::AccountId.eq(account.id))
        .filter(collection_operations::Column::Date.gte(from))
        .all(txn)
        .await?;

    rows.into_iter()
        .map(|(detail, header)| -> Result<StatementLine, TreasuryError> {
            let header = header.ok_or(LedgerError::OperationNotFound(detail.operation_id))?;
            let operation_type = ledger::CollectionType::from(header.operation_type);
            Ok(StatementLine {
                source_id: detail.id,
                kind: MovementKind::Collection,
                date: header.date,
                created_at: header.created_at.with_timezone(&Utc),
                amount: detail.amount,
                label: collection_label(
                    operation_type,
                    detail.cheque_number.as_deref(),
                    &header.motif,
                ),
                metadata: json!({
                    "operation_id": header.id,
                    "reference": header.reference,
                    "operation_type": operation_type,
                    "cheque_number": detail.cheque_number,
                    "name": detail.name,
                    "bank_name": detail.bank_name,
                    "account": account.name,
                }),
            })
        })
        .collect()
}

async fn disbursement_lines(
    txn: &DatabaseTransaction,
    account: &accounts::Model,
    from: NaiveDate,
) -> Result<Vec<StatementLine>, TreasuryError> {
    let headers = disbursement_operations::Entity::find()
        .filter(disbursement_operations::Column::AccountId.eq(account.id))
        .filter(disbursement_operations::Column::Date.gte(from))
        .all(txn)
        .await?;
    let details = headers
        .load_many(disbursement_operation_details::Entity, txn)
        .await?;

    Ok(headers
        .into_iter()
        .zip(details)
        .map(|(header, details)| StatementLine {
            source_id: header.id,
            kind: MovementKind::Disbursement,
            date: header.date,
            created_at: header.created_at.with_timezone(&Utc),
            amount: details.iter().map(|d| d.amount).sum(),
            label: header.motif.clone(),
            metadata: json!({
                "operation_id": header.id,
                "reference": header.reference,
                "operation_type": ledger::DisbursementType::from(header.operation_type),
                "beneficiary": header.beneficiary,
                "account": account.name,
            }),
        })
        .collect())
}

async fn fund_transfer_lines(
    txn: &DatabaseTransaction,
    account: &accounts::Model,
    from: NaiveDate,
) -> Result<Vec<StatementLine>, TreasuryError> {
    let rows = vault_withdrawals::Entity::find()
        .find_also_related(vaults::Entity)
        .filter(vault_withdrawals::Column::AccountId.eq(account.id))
        .filter(vault_withdrawals::Column::Date.gte(from))
        .all(txn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(withdrawal, vault)| StatementLine {
            source_id: withdrawal.id,
            kind: MovementKind::FundTransferIn,
            date: withdrawal.date,
            created_at: withdrawal.created_at.with_timezone(&Utc),
            amount: withdrawal.amount,
            label: withdrawal.motif,
            metadata: json!({
                "vault": vault.map(|v| v.name),
                "external_reference": withdrawal.external_reference,
            }),
        })
        .collect())
}

async fn deposit_lines(
    txn: &DatabaseTransaction,
    vault_id: uuid::Uuid,
    from: NaiveDate,
) -> Result<Vec<StatementLine>, TreasuryError> {
    let rows = vault_deposits::Entity::find()
        .filter(vault_deposits::Column::VaultId.eq(vault_id))
        .filter(vault_deposits::Column::Date.gte(from))
        .all(txn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|deposit| StatementLine {
            source_id: deposit.id,
            kind: MovementKind::VaultDeposit,
            date: deposit.date,
            created_at: deposit.created_at.with_timezone(&Utc),
            amount: deposit.amount,
            label: deposit.motif,
            metadata: json!({
                "deposit_number": deposit.deposit_number,
                "external_reference": deposit.external_reference,
            }),
        })
        .collect())
}

async fn withdrawal_lines(
    txn: &DatabaseTransaction,
    vault_id: uuid::Uuid,
    from: NaiveDate,
) -> Result<Vec<StatementLine>, TreasuryError> {
    let rows = vault_withdrawals::Entity::find()
        .find_also_related(accounts::Entity)
        .filter(vault_withdrawals::Column::VaultId.eq(vault_id))
        .filter(vault_withdrawals::Column::Date.gte(from))
        .all(txn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(withdrawal, account)| StatementLine {
            source_id: withdrawal.id,
            kind: MovementKind::VaultWithdrawal,
            date: withdrawal.date,
            created_at: withdrawal.created_at.with_timezone(&Utc),
            amount: withdrawal.amount,
            label: withdrawal.motif,
            metadata: json!({
                "account": account.map(|a| a.name),
                "external_reference": withdrawal.external_reference,
            }),
        })
        .collect())
}
