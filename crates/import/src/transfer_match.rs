use bankport_core::{ExternalAccountId, TransferCandidate, TransferPair};

pub const DEFAULT_TOLERANCE_DAYS: i64 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub pairs: Vec<TransferPair>,
    /// Candidates without a counterpart: unmatched outgoing legs in matching
    /// order, then unmatched incoming legs.
    pub unmatched: Vec<TransferCandidate>,
}

/// Pairs outgoing and incoming transfer legs between different accounts.
///
/// Outgoing legs are taken in ascending date order (id breaks ties). Each one
/// claims the closest-dated open incoming leg of the opposite amount on
/// another account within the tolerance; equal gaps go to the smaller
/// incoming id. A leg is claimed at most once and earlier claims are never
/// revisited.
pub struct TransferMatcher {
    pub tolerance_days: i64,
}

impl Default for TransferMatcher {
    fn default() -> Self {
        Self {
            tolerance_days: DEFAULT_TOLERANCE_DAYS,
        }
    }
}

impl TransferMatcher {
    pub fn new(tolerance_days: i64) -> Self {
        Self {
            tolerance_days: tolerance_days.max(0),
        }
    }

    /// Whether `incoming` can be the counterpart of `outgoing`.
    pub fn is_match(&self, outgoing: &TransferCandidate, incoming: &TransferCandidate) -> bool {
        outgoing.is_outgoing()
            && incoming.is_incoming()
            && outgoing.account != incoming.account
            && incoming.amount == -outgoing.amount
            && outgoing.day_gap(incoming) <= self.tolerance_days
    }

    pub fn match_candidates(
        &self,
        groups: Vec<(ExternalAccountId, Vec<TransferCandidate>)>,
    ) -> MatchOutcome {
        let mut outgoing = Vec::new();
        let mut incoming = Vec::new();
        let mut unmatched = Vec::new();
        for candidate in groups.into_iter().flat_map(|(_, candidates)| candidates) {
            if candidate.is_outgoing() {
                outgoing.push(candidate);
            } else if candidate.is_incoming() {
                incoming.push(candidate);
            } else {
                // Zero amount: nothing to pair against.
                unmatched.push(candidate);
            }
        }
        outgoing.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        incoming.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        let mut open: Vec<Option<TransferCandidate>> = incoming.into_iter().map(Some).collect();
        let mut pairs = Vec::new();
        let mut unmatched_outgoing = Vec::new();

        for out in outgoing {
            let best = open
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| slot.as_ref().map(|c| (i, c)))
                .filter(|(_, inc)| self.is_match(&out, inc))
                .min_by(|(_, a), (_, b)| {
                    out.day_gap(a)
                        .cmp(&out.day_gap(b))
                        .then_with(|| a.id.cmp(&b.id))
                })
                .map(|(i, _)| i);

            match best.and_then(|i| open[i].take()) {
                Some(inc) => pairs.push(TransferPair {
                    outgoing: out,
                    incoming: inc,
                }),
                None => unmatched_outgoing.push(out),
            }
        }

        unmatched_outgoing.extend(open.into_iter().flatten());
        unmatched_outgoing.extend(unmatched);
        MatchOutcome {
            pairs,
            unmatched: unmatched_outgoing,
        }
    }
}
