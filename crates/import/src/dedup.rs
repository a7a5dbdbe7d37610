use bankport_core::marker::parse_note_marker;
use bankport_core::ExternalTxId;
use bankport_ledger::{LedgerApi, LedgerError};
use std::collections::HashSet;
use tracing::debug;

/// External ids already present in the ledger, read back from the note
/// markers of existing records. Ids are global: the same id seen on two
/// accounts counts as one.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    ids: HashSet<ExternalTxId>,
}

impl DuplicateIndex {
    /// Pages through every ledger record until a page comes back short.
    pub fn load<L: LedgerApi>(ledger: &L, page_size: u32) -> Result<Self, LedgerError> {
        let page_size = page_size.max(1);
        let mut index = Self::default();
        let mut page = 1;
        let mut scanned = 0usize;
        let mut unmarked = 0usize;

        loop {
            let records = ledger.list_transactions(page, page_size)?;
            scanned += records.len();
            for record in &records {
                match parse_note_marker(&record.note) {
                    Some(marker) => index.ids.extend(marker.into_ids()),
                    None => unmarked += 1,
                }
            }
            if records.len() < page_size as usize {
                break;
            }
            page += 1;
        }

        debug!(
            "Scanned {} ledger records over {} pages: {} known ids, {} without marker",
            scanned,
            page,
            index.ids.len(),
            unmarked
        );
        Ok(index)
    }

    pub fn contains(&self, id: &ExternalTxId) -> bool {
        self.ids.contains(id)
    }

    /// Returns false if the id was already known.
    pub fn insert(&mut self, id: ExternalTxId) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
