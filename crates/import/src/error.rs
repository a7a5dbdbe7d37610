use bankport_core::CategoryDirection;
use bankport_ledger::LedgerError;
use thiserror::Error;

use crate::export::ExportError;
use crate::stats::ImportStatistics;

/// Conditions that abort a run.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Ledger call failed: {0}")]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("No {direction} category for external transfers (expected one named {name:?})")]
    MissingTransferCategory {
        direction: CategoryDirection,
        name: String,
    },
}

/// An aborted run together with what it had done up to that point.
#[derive(Error, Debug)]
#[error("Import aborted: {cause}")]
pub struct RunFailure {
    #[source]
    pub cause: ImportError,
    pub stats: ImportStatistics,
}
