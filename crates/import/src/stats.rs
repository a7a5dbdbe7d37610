use bankport_core::{ExternalAccountId, RecordKind};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Counters for one run. Returned on success and carried by a failed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStatistics {
    /// Export lines looked at, whatever became of them.
    pub scanned: usize,
    pub imported_by_kind: BTreeMap<RecordKind, usize>,
    pub skipped_duplicate: usize,
    pub skipped_unmapped_account: usize,
    pub skipped_before_min_date: usize,
    pub skipped_pending: usize,
    pub malformed: usize,
    pub category_fallbacks: usize,
    pub matched_pairs: usize,
    pub unmatched_transfers: usize,
    /// Malformed records and unreadable files per export account.
    pub failures_by_account: BTreeMap<ExternalAccountId, usize>,
}

impl ImportStatistics {
    pub fn record_import(&mut self, kind: RecordKind) {
        *self.imported_by_kind.entry(kind).or_default() += 1;
    }

    pub fn imported(&self, kind: RecordKind) -> usize {
        self.imported_by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_imported(&self) -> usize {
        self.imported_by_kind.values().sum()
    }

    pub fn record_failure(&mut self, account: &ExternalAccountId) {
        *self.failures_by_account.entry(account.clone()).or_default() += 1;
    }

    pub fn total_failures(&self) -> usize {
        self.failures_by_account.values().sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures_by_account.is_empty()
    }

    pub fn log_summary(&self) {
        info!(
            "Import finished: {} scanned, {} imported ({} income, {} expense, {} internal transfers, {} external transfers)",
            self.scanned,
            self.total_imported(),
            self.imported(RecordKind::Income),
            self.imported(RecordKind::Expense),
            self.imported(RecordKind::InternalTransfer),
            self.imported(RecordKind::ExternalTransfer),
        );
        info!(
            "Skipped: {} duplicates, {} unmapped account, {} before minimum date, {} pending",
            self.skipped_duplicate,
            self.skipped_unmapped_account,
            self.skipped_before_min_date,
            self.skipped_pending,
        );
        if self.category_fallbacks > 0 {
            info!("{} records used a fallback category", self.category_fallbacks);
        }
        for (account, failures) in &self.failures_by_account {
            warn!("Account {}: {} failures", account, failures);
        }
    }
}
