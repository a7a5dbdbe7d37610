use bankport_core::{
    ImportedTransactionRecord, LedgerAccount, LedgerCategory, LedgerTransactionId,
};

use crate::api::{LedgerApi, LedgerError};

/// Reads from the wrapped ledger but only logs writes.
pub struct DryRunLedger<L> {
    inner: L,
    suppressed: Vec<ImportedTransactionRecord>,
}

impl<L: LedgerApi> DryRunLedger<L> {
    pub fn new(inner: L) -> Self {
        Self { inner, suppressed: Vec::new() }
    }

    /// Records that would have been written.
    pub fn suppressed(&self) -> &[ImportedTransactionRecord] {
        &self.suppressed
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: LedgerApi> LedgerApi for DryRunLedger<L> {
    fn list_accounts(&self) -> Result<Vec<LedgerAccount>, LedgerError> {
        self.inner.list_accounts()
    }

    fn list_categories(&self) -> Result<Vec<LedgerCategory>, LedgerError> {
        self.inner.list_categories()
    }

    fn list_transactions(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ImportedTransactionRecord>, LedgerError> {
        self.inner.list_transactions(page, page_size)
    }

    fn create_transaction(
        &mut self,
        record: &ImportedTransactionRecord,
    ) -> Result<LedgerTransactionId, LedgerError> {
        tracing::info!(
            "[dry-run] would write {} {} on {} to account {}: {}",
            record.kind,
            record.amount,
            record.date,
            record.account,
            record.note
        );
        self.suppressed.push(record.clone());
        Ok(LedgerTransactionId(format!("dry-run-{}", self.suppressed.len())))
    }

    fn health_check(&self) -> Result<(), LedgerError> {
        self.inner.health_check()
    }
}
