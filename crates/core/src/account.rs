use serde::{Deserialize, Serialize};
use std::fmt;

use crate::marker;

/// Account identifier used by the banking export (the export file stem).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExternalAccountId(pub String);

impl ExternalAccountId {
    pub fn new(id: impl Into<String>) -> Self {
        ExternalAccountId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerAccountId(pub String);

impl LedgerAccountId {
    pub fn new(id: impl Into<String>) -> Self {
        LedgerAccountId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LedgerAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account as listed by the ledger. The link to the banking export lives
/// in the free-text `note` as an account marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: LedgerAccountId,
    pub name: String,
    pub note: String,
}

impl LedgerAccount {
    pub fn new(id: &str, name: &str, note: &str) -> Self {
        LedgerAccount {
            id: LedgerAccountId::new(id),
            name: name.to_string(),
            note: note.to_string(),
        }
    }

    pub fn external_id(&self) -> Option<ExternalAccountId> {
        marker::parse_account_marker(&self.note)
    }
}
