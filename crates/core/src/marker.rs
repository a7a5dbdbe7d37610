//! Markers embedded in ledger note fields.
//!
//! Two tags are recognised:
//!
//! * `[B4ID:<id>]` / `[B4ID:<outgoing>_<incoming>]` on transactions written by
//!   the importer. This is the only state persisted across runs, so the
//!   syntax must never change.
//! * `[B4AccID:<digits>]` on ledger accounts, linking them to an export.
//!
//! Parsing never fails: arbitrary text simply has no marker.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::account::ExternalAccountId;
use crate::transaction::ExternalTxId;

pub const TRANSACTION_TAG: &str = "B4ID";
pub const ACCOUNT_TAG: &str = "B4AccID";
pub const PAIR_SEPARATOR: char = '_';

/// Longest description kept in a note before the marker is appended.
pub const MAX_NOTE_DESCRIPTION_CHARS: usize = 200;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_transaction_marker,
    r"\[B4ID:([^\[\]_:\s]+)(?:_([^\[\]_:\s]+))?\]");
re!(re_account_marker,
    r"\[B4AccID:(\d+)\]");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteMarker {
    Single(ExternalTxId),
    Pair {
        outgoing: ExternalTxId,
        incoming: ExternalTxId,
    },
}

impl NoteMarker {
    pub fn ids(&self) -> Vec<&ExternalTxId> {
        match self {
            NoteMarker::Single(id) => vec![id],
            NoteMarker::Pair { outgoing, incoming } => vec![outgoing, incoming],
        }
    }

    pub fn into_ids(self) -> Vec<ExternalTxId> {
        match self {
            NoteMarker::Single(id) => vec![id],
            NoteMarker::Pair { outgoing, incoming } => vec![outgoing, incoming],
        }
    }
}

impl fmt::Display for NoteMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteMarker::Single(id) => write!(f, "[{TRANSACTION_TAG}:{id}]"),
            NoteMarker::Pair { outgoing, incoming } => {
                write!(f, "[{TRANSACTION_TAG}:{outgoing}{PAIR_SEPARATOR}{incoming}]")
            }
        }
    }
}

/// Returns the first well-formed transaction marker in `note`.
pub fn parse_note_marker(note: &str) -> Option<NoteMarker> {
    let caps = re_transaction_marker().captures(note)?;
    let first = ExternalTxId::new(caps.get(1)?.as_str());
    match caps.get(2) {
        Some(second) => Some(NoteMarker::Pair {
            outgoing: first,
            incoming: ExternalTxId::new(second.as_str()),
        }),
        None => Some(NoteMarker::Single(first)),
    }
}

pub fn parse_account_marker(note: &str) -> Option<ExternalAccountId> {
    re_account_marker()
        .captures(note)
        .and_then(|caps| caps.get(1))
        .map(|m| ExternalAccountId::new(m.as_str()))
}

/// True when the note carries an account tag at all, well-formed or not.
pub fn has_account_tag(note: &str) -> bool {
    note.contains(&format!("[{ACCOUNT_TAG}:"))
}

/// Builds the note written with an imported record: the (truncated)
/// description followed by the marker.
pub fn render_note(description: &str, marker: &NoteMarker) -> String {
    let description: String = description
        .trim()
        .chars()
        .take(MAX_NOTE_DESCRIPTION_CHARS)
        .collect();
    let description = description.trim_end();
    if description.is_empty() {
        marker.to_string()
    } else {
        format!("{description} {marker}")
    }
}
