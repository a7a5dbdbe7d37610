use bankport_core::{
    ImportedTransactionRecord, LedgerAccount, LedgerCategory, LedgerTransactionId,
};

use crate::api::{LedgerApi, LedgerError};

// ── In-process ledger (tests, local runs) ─────────────────────────────────────

/// Keeps accounts, categories and records in memory. Records are listed in
/// insertion order.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: Vec<LedgerAccount>,
    categories: Vec<LedgerCategory>,
    records: Vec<ImportedTransactionRecord>,
    next_id: u64,
    /// Remaining writes before `create_transaction` starts failing.
    writes_left: Option<usize>,
    unreachable: bool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: LedgerAccount) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn with_category(mut self, category: LedgerCategory) -> Self {
        self.categories.push(category);
        self
    }

    /// Seeds a record as if it had been written before this run.
    pub fn with_record(mut self, mut record: ImportedTransactionRecord) -> Self {
        record.id = Some(self.allocate_id());
        self.records.push(record);
        self
    }

    /// Let `n` more writes succeed, then fail every following one.
    pub fn fail_writes_after(&mut self, n: usize) {
        self.writes_left = Some(n);
    }

    /// Make every call fail, as if the ledger could not be reached.
    pub fn set_unreachable(&mut self, unreachable: bool) {
        self.unreachable = unreachable;
    }

    pub fn records(&self) -> &[ImportedTransactionRecord] {
        &self.records
    }

    fn allocate_id(&mut self) -> LedgerTransactionId {
        self.next_id += 1;
        LedgerTransactionId(self.next_id.to_string())
    }

    fn check_reachable(&self) -> Result<(), LedgerError> {
        if self.unreachable {
            Err(LedgerError::Unavailable("memory ledger marked unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl LedgerApi for MemoryLedger {
    fn list_accounts(&self) -> Result<Vec<LedgerAccount>, LedgerError> {
        self.check_reachable()?;
        Ok(self.accounts.clone())
    }

    fn list_categories(&self) -> Result<Vec<LedgerCategory>, LedgerError> {
        self.check_reachable()?;
        Ok(self.categories.clone())
    }

    fn list_transactions(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ImportedTransactionRecord>, LedgerError> {
        self.check_reachable()?;
        if page == 0 || page_size == 0 {
            return Ok(Vec::new());
        }
        let start = (page as usize - 1).saturating_mul(page_size as usize);
        Ok(self
            .records
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    fn create_transaction(
        &mut self,
        record: &ImportedTransactionRecord,
    ) -> Result<LedgerTransactionId, LedgerError> {
        self.check_reachable()?;
        if let Some(left) = self.writes_left.as_mut() {
            if *left == 0 {
                return Err(LedgerError::Unavailable("write refused".to_string()));
            }
            *left -= 1;
        }
        let id = self.allocate_id();
        let mut stored = record.clone();
        stored.id = Some(id.clone());
        self.records.push(stored);
        Ok(id)
    }
}
