pub mod api;
pub mod dry_run;
pub mod http;
pub mod memory;
pub mod wire;

pub use api::{LedgerApi, LedgerError};
pub use dry_run::DryRunLedger;
pub use http::{HttpLedger, HttpLedgerSettings};
pub use memory::MemoryLedger;
