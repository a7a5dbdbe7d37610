use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::account::{ExternalAccountId, LedgerAccountId};
use super::category::CategoryId;
use super::marker::NoteMarker;
use super::money::Money;

/// Transaction identifier from the banking export.
///
/// Ordering is numeric for all-digit ids and lexicographic otherwise, with
/// numeric ids sorting first. Ties between `"007"` and `"7"` fall back to the
/// raw string so the order stays total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalTxId(pub String);

impl ExternalTxId {
    pub fn new(id: impl Into<String>) -> Self {
        ExternalTxId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can be embedded in a note marker and parsed back.
    pub fn is_marker_safe(&self) -> bool {
        !self.0.is_empty()
            && !self
                .0
                .chars()
                .any(|c| matches!(c, '[' | ']' | '_' | ':') || c.is_whitespace())
    }

    fn numeric_part(&self) -> Option<&str> {
        if !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit()) {
            let trimmed = self.0.trim_start_matches('0');
            Some(if trimmed.is_empty() { "0" } else { trimmed })
        } else {
            None
        }
    }
}

impl Ord for ExternalTxId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_part(), other.numeric_part()) {
            (Some(a), Some(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| a.cmp(b))
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ExternalTxId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ExternalTxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One booked line of a banking export. Read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalTransaction {
    pub id: ExternalTxId,
    pub account: ExternalAccountId,
    pub date: NaiveDate,
    /// Positive for money received, negative for money spent.
    pub amount: Money,
    pub description: String,
    pub category: String,
    pub is_transfer: bool,
    /// Counterpart account as given by the bank; may name an account that
    /// is not managed in the ledger.
    pub counterpart: Option<String>,
}

impl ExternalTransaction {
    pub fn is_income(&self) -> bool {
        self.amount.is_positive()
    }

    pub fn to_candidate(&self) -> TransferCandidate {
        TransferCandidate {
            id: self.id.clone(),
            account: self.account.clone(),
            date: self.date,
            amount: self.amount,
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Income,
    Expense,
    InternalTransfer,
    ExternalTransfer,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Income => write!(f, "income"),
            RecordKind::Expense => write!(f, "expense"),
            RecordKind::InternalTransfer => write!(f, "internal transfer"),
            RecordKind::ExternalTransfer => write!(f, "external transfer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerTransactionId(pub String);

impl fmt::Display for LedgerTransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ledger transaction written by (or listed from) the ledger.
///
/// `amount` is signed for single-leg records (income and incoming external
/// transfers positive, expenses and outgoing external transfers negative) and
/// positive for internal transfers, which move money from `account` to
/// `destination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedTransactionRecord {
    pub id: Option<LedgerTransactionId>,
    pub kind: RecordKind,
    pub amount: Money,
    pub date: NaiveDate,
    pub account: LedgerAccountId,
    pub destination: Option<LedgerAccountId>,
    pub category: Option<CategoryId>,
    pub note: String,
}

/// A transfer-flagged export line reduced to what pairing needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCandidate {
    pub id: ExternalTxId,
    pub account: ExternalAccountId,
    pub date: NaiveDate,
    pub amount: Money,
    pub description: String,
}

impl TransferCandidate {
    pub fn is_outgoing(&self) -> bool {
        self.amount.is_negative()
    }

    pub fn is_incoming(&self) -> bool {
        self.amount.is_positive()
    }

    pub fn day_gap(&self, other: &TransferCandidate) -> i64 {
        (self.date - other.date).num_days().abs()
    }
}

/// Two legs of one movement between managed accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPair {
    pub outgoing: TransferCandidate,
    pub incoming: TransferCandidate,
}

impl TransferPair {
    pub fn amount(&self) -> Money {
        self.incoming.amount
    }

    /// The earlier of the two posting dates.
    pub fn date(&self) -> NaiveDate {
        self.outgoing.date.min(self.incoming.date)
    }

    pub fn marker(&self) -> NoteMarker {
        NoteMarker::Pair {
            outgoing: self.outgoing.id.clone(),
            incoming: self.incoming.id.clone(),
        }
    }
}
