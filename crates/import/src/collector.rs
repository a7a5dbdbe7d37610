use bankport_core::{ExternalAccountId, TransferCandidate};
use std::collections::BTreeMap;

/// Holds transfer candidates from phase two until matching. Grouped by
/// account; accounts and candidates keep a stable order.
#[derive(Debug, Default)]
pub struct TransferCollector {
    by_account: BTreeMap<ExternalAccountId, Vec<TransferCandidate>>,
    count: usize,
}

impl TransferCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, candidate: TransferCandidate) {
        self.by_account
            .entry(candidate.account.clone())
            .or_default()
            .push(candidate);
        self.count += 1;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Hands out every candidate, grouped by account. Consumes the collector.
    pub fn drain(self) -> Vec<(ExternalAccountId, Vec<TransferCandidate>)> {
        self.by_account.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankport_core::{ExternalTxId, Money};
    use chrono::NaiveDate;

    fn candidate(id: &str, account: &str) -> TransferCandidate {
        TransferCandidate {
            id: ExternalTxId::new(id),
            account: ExternalAccountId::new(account),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            amount: Money::from_cents(-100),
            description: String::new(),
        }
    }

    #[test]
    fn groups_by_account_in_order() {
        let mut collector = TransferCollector::new();
        collector.add(candidate("3", "222"));
        collector.add(candidate("1", "111"));
        collector.add(candidate("2", "222"));
        assert_eq!(collector.len(), 3);

        let groups = collector.drain();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, ExternalAccountId::new("111"));
        let ids: Vec<&str> = groups[1].1.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);
    }
}
