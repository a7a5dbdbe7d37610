pub mod account;
pub mod category;
pub mod marker;
pub mod money;
pub mod transaction;

pub use account::{ExternalAccountId, LedgerAccount, LedgerAccountId};
pub use category::{CategoryDirection, CategoryId, LedgerCategory};
pub use marker::NoteMarker;
pub use money::{Money, MoneyError};
pub use transaction::{
    ExternalTransaction, ExternalTxId, ImportedTransactionRecord,
    LedgerTransactionId, RecordKind, TransferCandidate, TransferPair,
};
