use bankport_core::marker::render_note;
use bankport_core::{
    CategoryDirection, CategoryId, ExternalTransaction, ExternalTxId, ImportedTransactionRecord,
    NoteMarker, RecordKind,
};
use bankport_ledger::LedgerApi;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::collector::TransferCollector;
use crate::dedup::DuplicateIndex;
use crate::directory::{
    AccountDirectory, CategoryDirectory, TransferCategories, DEFAULT_INTERNAL_TRANSFER_CATEGORY,
    DEFAULT_TRANSFER_IN_CATEGORY, DEFAULT_TRANSFER_OUT_CATEGORY,
};
use crate::error::{ImportError, RunFailure};
use crate::export::{list_export_files, ExportRecord, DEFAULT_TRANSFER_CATEGORY};
use crate::stats::ImportStatistics;
use crate::transfer_match::{TransferMatcher, DEFAULT_TOLERANCE_DAYS};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Characters of the sending leg's description kept in a paired transfer note.
const PAIR_DESCRIPTION_CHARS: usize = 100;
const EXTERNAL_TRANSFER_PREFIX: &str = "[Extern]";

#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub export_dir: PathBuf,
    /// Export lines dated before this are ignored entirely.
    pub min_date: Option<NaiveDate>,
    pub page_size: u32,
    pub transfer_tolerance_days: i64,
    /// Export category that flags a line as a transfer.
    pub transfer_marker_category: String,
    pub default_category: CategoryId,
    pub transfer_in_category: String,
    pub transfer_out_category: String,
    /// Transfer category for matched pairs.
    pub internal_transfer_category: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("."),
            min_date: None,
            page_size: DEFAULT_PAGE_SIZE,
            transfer_tolerance_days: DEFAULT_TOLERANCE_DAYS,
            transfer_marker_category: DEFAULT_TRANSFER_CATEGORY.to_string(),
            default_category: CategoryId::new("0"),
            transfer_in_category: DEFAULT_TRANSFER_IN_CATEGORY.to_string(),
            transfer_out_category: DEFAULT_TRANSFER_OUT_CATEGORY.to_string(),
            internal_transfer_category: DEFAULT_INTERNAL_TRANSFER_CATEGORY.to_string(),
        }
    }
}

/// Runs the three import phases against one ledger:
///
/// 1. read every external id already recorded in the ledger,
/// 2. write new non-transfer lines and collect transfer lines,
/// 3. pair collected transfers and write them.
///
/// Every write adds its external ids to the duplicate index right away, so a
/// run that aborts halfway can simply be started again.
pub struct ImportOrchestrator<L: LedgerApi> {
    ledger: L,
    settings: ImportSettings,
    stats: ImportStatistics,
}

struct RunContext {
    accounts: AccountDirectory,
    categories: CategoryDirectory,
    transfer: TransferCategories,
    seen: DuplicateIndex,
}

impl<L: LedgerApi> ImportOrchestrator<L> {
    pub fn new(ledger: L, settings: ImportSettings) -> Self {
        Self {
            ledger,
            settings,
            stats: ImportStatistics::default(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn into_ledger(self) -> L {
        self.ledger
    }

    pub fn run_import(&mut self) -> Result<ImportStatistics, RunFailure> {
        self.stats = ImportStatistics::default();
        let result = self.run();
        let stats = std::mem::take(&mut self.stats);
        match result {
            Ok(()) => {
                stats.log_summary();
                Ok(stats)
            }
            Err(cause) => {
                error!("{}", cause);
                stats.log_summary();
                Err(RunFailure { cause, stats })
            }
        }
    }

    fn run(&mut self) -> Result<(), ImportError> {
        info!(
            "Starting import from {} (min date {}, tolerance {} days)",
            self.settings.export_dir.display(),
            self.settings
                .min_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "none".to_string()),
            self.settings.transfer_tolerance_days
        );

        let accounts = AccountDirectory::load(&self.ledger)?;
        if accounts.is_empty() {
            warn!("No ledger account carries an account marker; nothing can be imported");
        }
        let categories =
            CategoryDirectory::load(&self.ledger, self.settings.default_category.clone())?;
        let transfer = categories.load_transfer_categories(
            &self.settings.transfer_in_category,
            &self.settings.transfer_out_category,
            &self.settings.internal_transfer_category,
        )?;

        info!("Phase 1: reading existing ledger records");
        let seen = DuplicateIndex::load(&self.ledger, self.settings.page_size)?;
        info!("{} external ids already imported", seen.len());

        let mut ctx = RunContext {
            accounts,
            categories,
            transfer,
            seen,
        };

        info!("Phase 2: importing records");
        let collector = self.import_records(&mut ctx)?;

        info!("Phase 3: matching {} transfer candidates", collector.len());
        self.import_transfers(&mut ctx, collector)
    }

    fn import_records(&mut self, ctx: &mut RunContext) -> Result<TransferCollector, ImportError> {
        let files = list_export_files(&self.settings.export_dir)?;
        if files.is_empty() {
            warn!(
                "No export files found in {}",
                self.settings.export_dir.display()
            );
        }

        let mut collector = TransferCollector::new();
        let mut collected: HashSet<ExternalTxId> = HashSet::new();

        for file in files {
            let records = match file.read(&self.settings.transfer_marker_category) {
                Ok(records) => records,
                Err(e) => {
                    error!("{}", e);
                    self.stats.record_failure(&file.account);
                    continue;
                }
            };
            let mapped = ctx.accounts.resolve(&file.account).is_some();
            if !mapped {
                warn!(
                    "No ledger account is linked to export account {}; its records are skipped",
                    file.account
                );
            }
            debug!("{}: {} records", file.path.display(), records.len());

            for record in records {
                self.stats.scanned += 1;
                let tx = match record {
                    ExportRecord::Booked(tx) => tx,
                    ExportRecord::Pending(position) => {
                        debug!("{} #{}: not booked yet", file.account, position);
                        self.stats.skipped_pending += 1;
                        continue;
                    }
                    ExportRecord::Malformed(e) => {
                        error!("{}", e);
                        self.stats.malformed += 1;
                        self.stats.record_failure(&file.account);
                        continue;
                    }
                };

                if self.settings.min_date.is_some_and(|min| tx.date < min) {
                    self.stats.skipped_before_min_date += 1;
                    continue;
                }
                if ctx.seen.contains(&tx.id) || collected.contains(&tx.id) {
                    debug!("{} already imported", tx.id);
                    self.stats.skipped_duplicate += 1;
                    continue;
                }
                if !mapped {
                    self.stats.skipped_unmapped_account += 1;
                    continue;
                }

                if tx.is_transfer {
                    debug!("{} held back as transfer candidate", tx.id);
                    collected.insert(tx.id.clone());
                    collector.add(tx.to_candidate());
                } else {
                    self.import_single(ctx, tx)?;
                }
            }
        }
        Ok(collector)
    }

    fn import_single(
        &mut self,
        ctx: &mut RunContext,
        tx: ExternalTransaction,
    ) -> Result<(), ImportError> {
        let Some(account) = ctx.accounts.resolve(&tx.account).cloned() else {
            self.stats.skipped_unmapped_account += 1;
            return Ok(());
        };
        let (kind, direction) = if tx.is_income() {
            (RecordKind::Income, CategoryDirection::Income)
        } else {
            (RecordKind::Expense, CategoryDirection::Expense)
        };
        let resolution = ctx.categories.resolve(&tx.category, direction);
        if resolution.is_fallback() {
            if !tx.category.is_empty() {
                debug!(
                    "{}: no {} category {:?}, using {}",
                    tx.id,
                    direction,
                    tx.category,
                    resolution.id()
                );
            }
            self.stats.category_fallbacks += 1;
        }

        let record = ImportedTransactionRecord {
            id: None,
            kind,
            amount: tx.amount,
            date: tx.date,
            account,
            destination: None,
            category: Some(resolution.id().clone()),
            note: render_note(&tx.description, &NoteMarker::Single(tx.id.clone())),
        };
        self.write(ctx, record, vec![tx.id])
    }

    fn import_transfers(
        &mut self,
        ctx: &mut RunContext,
        collector: TransferCollector,
    ) -> Result<(), ImportError> {
        let matcher = TransferMatcher::new(self.settings.transfer_tolerance_days);
        let outcome = matcher.match_candidates(collector.drain());

        for pair in outcome.pairs {
            let from = ctx.accounts.resolve(&pair.outgoing.account).cloned();
            let to = ctx.accounts.resolve(&pair.incoming.account).cloned();
            let (Some(from), Some(to)) = (from, to) else {
                self.stats.skipped_unmapped_account += 2;
                continue;
            };
            info!(
                "Internal transfer {} from {} to {} on {} ({} / {})",
                pair.amount(),
                pair.outgoing.account,
                pair.incoming.account,
                pair.date(),
                pair.outgoing.id,
                pair.incoming.id
            );
            let description: String = pair
                .outgoing
                .description
                .chars()
                .take(PAIR_DESCRIPTION_CHARS)
                .collect();
            let record = ImportedTransactionRecord {
                id: None,
                kind: RecordKind::InternalTransfer,
                amount: pair.amount(),
                date: pair.date(),
                account: from,
                destination: Some(to),
                category: ctx.transfer.internal.clone(),
                note: render_note(&format!("Transfer: {description}"), &pair.marker()),
            };
            let ids = vec![pair.outgoing.id.clone(), pair.incoming.id.clone()];
            self.write(ctx, record, ids)?;
            self.stats.matched_pairs += 1;
        }

        for leg in outcome.unmatched {
            let Some(account) = ctx.accounts.resolve(&leg.account).cloned() else {
                self.stats.skipped_unmapped_account += 1;
                continue;
            };
            warn!(
                "No counterpart for transfer {} ({} on {} in {}); importing as external transfer",
                leg.id, leg.amount, leg.date, leg.account
            );
            let category = if leg.is_incoming() {
                ctx.transfer.incoming.clone()
            } else {
                ctx.transfer.outgoing.clone()
            };
            let record = ImportedTransactionRecord {
                id: None,
                kind: RecordKind::ExternalTransfer,
                amount: leg.amount,
                date: leg.date,
                account,
                destination: None,
                category: Some(category),
                note: render_note(
                    &format!("{EXTERNAL_TRANSFER_PREFIX} {}", leg.description),
                    &NoteMarker::Single(leg.id.clone()),
                ),
            };
            self.write(ctx, record, vec![leg.id])?;
            self.stats.unmatched_transfers += 1;
        }
        Ok(())
    }

    fn write(
        &mut self,
        ctx: &mut RunContext,
        record: ImportedTransactionRecord,
        ids: Vec<ExternalTxId>,
    ) -> Result<(), ImportError> {
        let ledger_id = self.ledger.create_transaction(&record)?;
        debug!("Wrote {} as ledger record {}", record.note, ledger_id);
        for id in ids {
            if !ctx.seen.insert(id.clone()) {
                warn!("External id {id} was already recorded before this write");
            }
        }
        self.stats.record_import(record.kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankport_core::marker::parse_note_marker;
    use bankport_core::{LedgerAccount, LedgerAccountId, LedgerCategory, Money};
    use bankport_ledger::MemoryLedger;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn ledger() -> MemoryLedger {
        MemoryLedger::new()
            .with_account(LedgerAccount::new("1", "Checking", "[B4AccID:111]"))
            .with_account(LedgerAccount::new("2", "Savings", "[B4AccID:222]"))
            .with_category(LedgerCategory::new("10", "Food", CategoryDirection::Expense))
            .with_category(LedgerCategory::new("20", "Salary", CategoryDirection::Income))
            .with_category(LedgerCategory::new(
                "30",
                DEFAULT_TRANSFER_IN_CATEGORY,
                CategoryDirection::Income,
            ))
            .with_category(LedgerCategory::new(
                "31",
                DEFAULT_TRANSFER_OUT_CATEGORY,
                CategoryDirection::Expense,
            ))
    }

    fn line(id: &str, date: &str, cents: i64, category: &str, text: &str) -> String {
        let (amount, ind) = if cents < 0 {
            (-cents, "DBIT")
        } else {
            (cents, "CRDT")
        };
        format!(
            r#"{{"Id": "{id}", "BookgDt": "{date}", "Amt": "{}.{:02}", "CdtDbtInd": "{ind}",
                "RmtInf": "{text}", "Category": "{category}", "BookgSts": "BOOK"}}"#,
            amount / 100,
            amount % 100
        )
    }

    fn write_export(dir: &Path, account: &str, lines: &[String]) {
        fs::write(
            dir.join(format!("{account}.json")),
            format!("[{}]", lines.join(",")),
        )
        .unwrap();
    }

    fn settings(dir: &TempDir) -> ImportSettings {
        ImportSettings {
            export_dir: dir.path().to_path_buf(),
            ..ImportSettings::default()
        }
    }

    fn run(ledger: MemoryLedger, settings: ImportSettings) -> (ImportStatistics, MemoryLedger) {
        let mut orchestrator = ImportOrchestrator::new(ledger, settings);
        let stats = orchestrator.run_import().unwrap();
        (stats, orchestrator.into_ledger())
    }

    fn transfer_pair_export(dir: &Path, incoming_date: &str) {
        write_export(
            dir,
            "111",
            &[line("1001", "2024-02-01", -5000, "Umbuchung", "To savings")],
        );
        write_export(
            dir,
            "222",
            &[line("2001", incoming_date, 5000, "Umbuchung", "From checking")],
        );
    }

    #[test]
    fn matched_transfer_becomes_one_internal_record() {
        let dir = tempfile::tempdir().unwrap();
        transfer_pair_export(dir.path(), "2024-02-02");

        let (stats, ledger) = run(ledger(), settings(&dir));

        assert_eq!(stats.matched_pairs, 1);
        assert_eq!(stats.imported(RecordKind::InternalTransfer), 1);
        assert_eq!(stats.imported(RecordKind::ExternalTransfer), 0);

        let records = ledger.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.kind, RecordKind::InternalTransfer);
        assert_eq!(record.amount, Money::from_cents(5000));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(record.account, LedgerAccountId::new("1"));
        assert_eq!(record.destination, Some(LedgerAccountId::new("2")));
        assert_eq!(record.note, "Transfer: To savings [B4ID:1001_2001]");
    }

    #[test]
    fn distant_transfer_legs_become_external_transfers() {
        let dir = tempfile::tempdir().unwrap();
        transfer_pair_export(dir.path(), "2024-02-10");

        let (stats, ledger) = run(ledger(), settings(&dir));

        assert_eq!(stats.matched_pairs, 0);
        assert_eq!(stats.unmatched_transfers, 2);
        assert_eq!(stats.imported(RecordKind::ExternalTransfer), 2);

        let records = ledger.records();
        let outgoing = records
            .iter()
            .find(|r| r.amount.is_negative())
            .unwrap();
        assert_eq!(outgoing.category, Some(CategoryId::new("31")));
        assert_eq!(outgoing.note, "[Extern] To savings [B4ID:1001]");
        let incoming = records
            .iter()
            .find(|r| r.amount.is_positive())
            .unwrap();
        assert_eq!(incoming.category, Some(CategoryId::new("30")));
        assert_eq!(incoming.account, LedgerAccountId::new("2"));
    }

    #[test]
    fn second_run_imports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        transfer_pair_export(dir.path(), "2024-02-02");
        fs::write(
            dir.path().join("111.json"),
            format!(
                "[{},{}]",
                line("1001", "2024-02-01", -5000, "Umbuchung", "To savings"),
                line("1002", "2024-02-03", -1250, "Food", "Bakery"),
            ),
        )
        .unwrap();

        let (first, ledger) = run(ledger(), settings(&dir));
        assert_eq!(first.total_imported(), 2);
        let written = ledger.records().len();

        let (second, ledger) = run(ledger, settings(&dir));
        assert_eq!(second.total_imported(), 0);
        // Both legs of the pair plus the expense.
        assert_eq!(second.skipped_duplicate, 3);
        assert_eq!(ledger.records().len(), written);
    }

    #[test]
    fn lines_before_min_date_are_ignored_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        write_export(
            dir.path(),
            "111",
            &[
                line("1", "2023-12-31", -5000, "Umbuchung", "Old transfer"),
                line("2", "2023-12-30", -900, "Food", "Old lunch"),
                line("3", "2024-01-02", -900, "Food", "Lunch"),
            ],
        );

        let (stats, ledger) = run(
            ledger(),
            ImportSettings {
                min_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                ..settings(&dir)
            },
        );

        assert_eq!(stats.skipped_before_min_date, 2);
        assert_eq!(stats.unmatched_transfers, 0);
        assert_eq!(ledger.records().len(), 1);
        assert_eq!(ledger.records()[0].note, "Lunch [B4ID:3]");
    }

    #[test]
    fn unmapped_account_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_export(
            dir.path(),
            "999",
            &[
                line("1", "2024-01-02", -900, "Food", "Lunch"),
                line("2", "2024-01-03", -5000, "Umbuchung", "Somewhere"),
            ],
        );

        let (stats, ledger) = run(ledger(), settings(&dir));

        assert!(ledger.records().is_empty());
        assert_eq!(stats.skipped_unmapped_account, 2);
        assert_eq!(stats.total_imported(), 0);
    }

    #[test]
    fn leg_on_the_sending_account_is_never_a_partner() {
        let dir = tempfile::tempdir().unwrap();
        write_export(
            dir.path(),
            "111",
            &[
                line("50", "2024-03-01", -2000, "Umbuchung", "Out"),
                line("12", "2024-03-01", 2000, "Umbuchung", "Back"),
            ],
        );
        write_export(
            dir.path(),
            "222",
            &[line("9", "2024-03-01", 2000, "Umbuchung", "In")],
        );

        let (stats, ledger) = run(ledger(), settings(&dir));

        // "12" sits on the sending account, so "9" is the only valid partner.
        assert_eq!(stats.matched_pairs, 1);
        let pair = ledger
            .records()
            .iter()
            .find(|r| r.kind == RecordKind::InternalTransfer)
            .unwrap();
        assert!(pair.note.ends_with("[B4ID:50_9]"));
        assert_eq!(stats.unmatched_transfers, 1);
    }

    #[test]
    fn equal_gap_picks_smaller_id_across_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger().with_account(LedgerAccount::new("3", "Card", "[B4AccID:333]"));
        write_export(
            dir.path(),
            "111",
            &[line("50", "2024-03-01", -2000, "Umbuchung", "Out")],
        );
        write_export(
            dir.path(),
            "222",
            &[line("20", "2024-03-02", 2000, "Umbuchung", "In A")],
        );
        write_export(
            dir.path(),
            "333",
            &[line("10", "2024-03-02", 2000, "Umbuchung", "In B")],
        );

        let (_, ledger) = run(ledger, settings(&dir));

        let pair = ledger
            .records()
            .iter()
            .find(|r| r.kind == RecordKind::InternalTransfer)
            .unwrap();
        assert_eq!(pair.destination, Some(LedgerAccountId::new("3")));
        assert!(pair.note.ends_with("[B4ID:50_10]"));
    }

    #[test]
    fn aborted_run_keeps_statistics_and_resumes_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        write_export(
            dir.path(),
            "111",
            &[
                line("1", "2024-01-02", -100, "Food", "A"),
                line("2", "2024-01-03", -200, "Food", "B"),
                line("3", "2024-01-04", -300, "Food", "C"),
            ],
        );

        let mut failing = ledger();
        failing.fail_writes_after(2);
        let mut orchestrator = ImportOrchestrator::new(failing, settings(&dir));
        let failure = orchestrator.run_import().unwrap_err();
        assert!(matches!(failure.cause, ImportError::Ledger(_)));
        assert_eq!(failure.stats.total_imported(), 2);

        let mut ledger = orchestrator.into_ledger();
        ledger.fail_writes_after(usize::MAX);
        let (stats, ledger) = run(ledger, settings(&dir));
        assert_eq!(stats.total_imported(), 1);
        assert_eq!(stats.skipped_duplicate, 2);
        assert_eq!(ledger.records().len(), 3);
    }

    #[test]
    fn missing_transfer_categories_abort_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        write_export(
            dir.path(),
            "111",
            &[line("1", "2024-01-02", -100, "Food", "A")],
        );
        let bare = MemoryLedger::new()
            .with_account(LedgerAccount::new("1", "Checking", "[B4AccID:111]"));

        let mut orchestrator = ImportOrchestrator::new(bare, settings(&dir));
        let failure = orchestrator.run_import().unwrap_err();

        assert!(matches!(
            failure.cause,
            ImportError::MissingTransferCategory { .. }
        ));
        assert!(orchestrator.ledger().records().is_empty());
    }

    #[test]
    fn unreachable_ledger_aborts_before_phase_two() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ledger();
        ledger.set_unreachable(true);
        let mut orchestrator = ImportOrchestrator::new(ledger, settings(&dir));
        let failure = orchestrator.run_import().unwrap_err();
        assert!(matches!(failure.cause, ImportError::Ledger(_)));
        assert_eq!(failure.stats.scanned, 0);
    }

    #[test]
    fn missing_export_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ImportSettings {
            export_dir: dir.path().join("missing"),
            ..ImportSettings::default()
        };
        let mut orchestrator = ImportOrchestrator::new(ledger(), settings);
        let failure = orchestrator.run_import().unwrap_err();
        assert!(matches!(failure.cause, ImportError::Export(_)));
    }

    #[test]
    fn bad_lines_and_files_are_counted_per_account() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("111.json"),
            format!(
                r#"[{}, {{"Id": "x", "BookgDt": "yesterday"}},
                    {{"Id": "p", "Amt": "1.00", "CdtDbtInd": "DBIT", "BookgSts": "PDNG"}}]"#,
                line("1", "2024-01-02", -100, "Food", "A")
            ),
        )
        .unwrap();
        fs::write(dir.path().join("222.json"), "not json").unwrap();

        let (stats, ledger) = run(ledger(), settings(&dir));

        assert_eq!(ledger.records().len(), 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.skipped_pending, 1);
        assert_eq!(stats.scanned, 3);
        assert_eq!(stats.total_failures(), 2);
        assert_eq!(stats.failures_by_account.len(), 2);
    }

    #[test]
    fn categories_resolve_with_fallback() {
        let dir = tempfile::tempdir().unwrap();
        write_export(
            dir.path(),
            "111",
            &[
                line("1", "2024-01-02", -100, "Food", "Exact"),
                line("2", "2024-01-03", -100, "Food:Bakery", "Parent"),
                line("3", "2024-01-04", 300000, "Lottery", "Unknown"),
            ],
        );

        let (stats, ledger) = run(ledger(), settings(&dir));

        let categories: Vec<Option<CategoryId>> =
            ledger.records().iter().map(|r| r.category.clone()).collect();
        assert_eq!(
            categories,
            vec![
                Some(CategoryId::new("10")),
                Some(CategoryId::new("10")),
                Some(CategoryId::new("0")),
            ]
        );
        assert_eq!(stats.category_fallbacks, 2);
        assert_eq!(stats.imported(RecordKind::Income), 1);
        assert_eq!(stats.imported(RecordKind::Expense), 2);
    }

    #[test]
    fn repeated_id_in_export_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        write_export(
            dir.path(),
            "111",
            &[
                line("7", "2024-01-02", -100, "Food", "A"),
                line("7", "2024-01-02", -100, "Food", "A"),
            ],
        );

        let (stats, ledger) = run(ledger(), settings(&dir));

        assert_eq!(ledger.records().len(), 1);
        assert_eq!(stats.skipped_duplicate, 1);
    }

    #[test]
    fn every_written_note_carries_a_marker() {
        let dir = tempfile::tempdir().unwrap();
        transfer_pair_export(dir.path(), "2024-02-02");
        write_export(
            dir.path(),
            "111",
            &[
                line("1001", "2024-02-01", -5000, "Umbuchung", "To savings"),
                line("1003", "2024-02-05", 4200, "Salary", &"x".repeat(300)),
            ],
        );

        let (_, ledger) = run(ledger(), settings(&dir));

        for record in ledger.records() {
            assert!(parse_note_marker(&record.note).is_some(), "{}", record.note);
        }
    }
}
