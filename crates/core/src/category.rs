use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        CategoryId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryDirection {
    Income,
    Expense,
    TransferIn,
    TransferOut,
    /// Ledger-native category for movements between two managed accounts.
    Transfer,
}

impl fmt::Display for CategoryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryDirection::Income => write!(f, "income"),
            CategoryDirection::Expense => write!(f, "expense"),
            CategoryDirection::TransferIn => write!(f, "transfer_in"),
            CategoryDirection::TransferOut => write!(f, "transfer_out"),
            CategoryDirection::Transfer => write!(f, "transfer"),
        }
    }
}

/// A ledger category. Sub-categories carry their full `Main:Sub` path as name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerCategory {
    pub id: CategoryId,
    pub name: String,
    pub direction: CategoryDirection,
}

impl LedgerCategory {
    pub fn new(id: &str, name: &str, direction: CategoryDirection) -> Self {
        LedgerCategory {
            id: CategoryId::new(id),
            name: name.to_string(),
            direction,
        }
    }
}
