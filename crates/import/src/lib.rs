pub mod collector;
pub mod dedup;
pub mod directory;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod stats;
pub mod transfer_match;

pub use collector::TransferCollector;
pub use dedup::DuplicateIndex;
pub use directory::{AccountDirectory, CategoryDirectory, CategoryResolution, TransferCategories};
pub use error::{ImportError, RunFailure};
pub use export::{ExportError, ExportFile, ExportRecord};
pub use orchestrator::{ImportOrchestrator, ImportSettings};
pub use stats::ImportStatistics;
pub use transfer_match::{MatchOutcome, TransferMatcher};

pub mod import {
    use crate::*;
    use bankport_ledger::LedgerApi;

    /// One-shot import: runs all phases and hands the ledger back with the
    /// outcome.
    pub fn run_once<L: LedgerApi>(
        ledger: L,
        settings: ImportSettings,
    ) -> (Result<ImportStatistics, RunFailure>, L) {
        let mut orchestrator = ImportOrchestrator::new(ledger, settings);
        let result = orchestrator.run_import();
        (result, orchestrator.into_ledger())
    }
}
