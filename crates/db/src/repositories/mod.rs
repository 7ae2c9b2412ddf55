//! Repositories over the treasury tables.
//!
//! Every write runs in one Postgres transaction: the ledger core plans the
//! balance changes against rows locked `FOR UPDATE`, and the repository
//! writes the operation rows and the new balances before committing.

pub mod account;
pub mod collection;
pub mod disbursement;
pub mod filter;
mod locks;
pub mod reference;
pub mod statement;
pub mod stats;
pub mod vault;
pub mod vault_movement;

pub use account::{AccountRepository, CreateAccountInput};
pub use collection::{CollectionOperation, CollectionRepository};
pub use disbursement::{DisbursementOperation, DisbursementRepository};
pub use filter::OperationFilter;
pub use reference::ReferenceAllocator;
pub use statement::StatementRepository;
pub use stats::{OperationAttachment, StatsRepository};
pub use vault::{CreateVaultInput, VaultRepository, VaultWithGroup};
pub use vault_movement::VaultMovementRepository;
