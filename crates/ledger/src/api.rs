use bankport_core::{ImportedTransactionRecord, LedgerAccount, LedgerCategory, LedgerTransactionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("HTTP {status} from {endpoint}: {message}")]
    Http {
        endpoint: String,
        status: u16,
        message: String,
    },
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Ledger rejected {endpoint}: {message}")]
    Rejected { endpoint: String, message: String },
    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
    #[error("Invalid ledger settings: {0}")]
    InvalidSettings(String),
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Operations the importer needs from the budgeting ledger.
///
/// All calls are blocking and issued one at a time. Pages passed to
/// [`LedgerApi::list_transactions`] are 1-based; a page shorter than
/// `page_size` is the last one.
pub trait LedgerApi {
    fn list_accounts(&self) -> Result<Vec<LedgerAccount>, LedgerError>;

    fn list_categories(&self) -> Result<Vec<LedgerCategory>, LedgerError>;

    fn list_transactions(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ImportedTransactionRecord>, LedgerError>;

    fn create_transaction(
        &mut self,
        record: &ImportedTransactionRecord,
    ) -> Result<LedgerTransactionId, LedgerError>;

    fn health_check(&self) -> Result<(), LedgerError> {
        self.list_accounts().map(|_| ())
    }
}

impl<L: LedgerApi + ?Sized> LedgerApi for &mut L {
    fn list_accounts(&self) -> Result<Vec<LedgerAccount>, LedgerError> {
        (**self).list_accounts()
    }

    fn list_categories(&self) -> Result<Vec<LedgerCategory>, LedgerError> {
        (**self).list_categories()
    }

    fn list_transactions(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ImportedTransactionRecord>, LedgerError> {
        (**self).list_transactions(page, page_size)
    }

    fn create_transaction(
        &mut self,
        record: &ImportedTransactionRecord,
    ) -> Result<LedgerTransactionId, LedgerError> {
        (**self).create_transaction(record)
    }

    fn health_check(&self) -> Result<(), LedgerError> {
        (**self).health_check()
    }
}
